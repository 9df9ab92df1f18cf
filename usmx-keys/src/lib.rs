//! Movie key derivation and the persisted key database.
//!
//! Keys are derived from the version seeds a game server publishes with
//! every release ([`Release`]), then merged into a [`KeyDatabase`] which
//! accumulates the keys of all releases.
//!
//! # Example
//!
//! ```no_run
//! use usmx_keys::{GenerationSource, KeyDatabase, Release, VersionTable};
//!
//! let release = Release::load("releases", "3.8")?;
//! let mut versions = VersionTable::default();
//! let keys = usmx_keys::derive_release(&release, GenerationSource::Seed, &mut versions);
//!
//! let mut db = KeyDatabase::load_or_default("keys.json")?;
//! db.merge("StarRail", "3.8", &keys);
//! db.save("keys.json")?;
//! # Ok::<(), usmx_keys::Error>(())
//! ```

mod database;
mod derive;
mod error;
mod keygen;
mod release;

pub use database::{KeyDatabase, KeyMap, MergeSummary, TitleKeys, VersionTable};
pub use derive::{AssetKind, Context, GENERATION_FACTOR, Generation, KEY_MODULUS, derive};
pub use error::{Error, Result};
pub use keygen::{GenerationSource, derive_release};
pub use release::{EncryptionRow, Release, VideoConfigRow};
