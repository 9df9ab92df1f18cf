mod commands;
mod logger;

#[doc(hidden)]
pub use commands::{Args, Commands};
pub use logger::Logger;
