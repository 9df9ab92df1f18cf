//! Demultiplexer for CRI USM movie containers.
//!
//! A container is read as a lazy sequence of [`Chunk`]s. Each chunk is
//! decrypted by a [`Dispatcher`] and handed to a [`Demuxer`], which either
//! forwards it to a queue in read order or reassembles the elementary streams
//! into files.
//!
//! # Example
//!
//! ```no_run
//! use usmx_demux::{CipherCache, Keys, Output};
//!
//! let cache = CipherCache::new();
//! let outcome = usmx_demux::demux_file(
//!     "movie.usm",
//!     Output::Directory("out".into()),
//!     Keys::new(0x1234_5678),
//!     Default::default(),
//!     &cache,
//! )?;
//! # Ok::<(), usmx_demux::Error>(())
//! ```

pub mod cipher;

mod chunk;
mod container;
mod demux;
mod dispatch;
mod error;
mod filter;
mod reader;
mod reassembly;

pub use chunk::{Chunk, StreamKind};
pub use cipher::CipherCache;
pub use container::UsmFile;
pub use demux::{Demuxer, Extracted, Outcome, Output, QueueItem, State};
pub use dispatch::{Dispatcher, Keys, SecondaryKey};
pub use error::{Error, Result};
pub use filter::{ChannelFilter, Selection};
pub use reassembly::{ChunkSink, Reassembly};

#[doc(hidden)]
pub use container::encode_chunk;

use std::path::Path;

/// Demultiplexes the container at `path`.
///
/// Output files are named after the container file stem.
pub fn demux_file<P: AsRef<Path>>(
    path: P,
    output: Output,
    keys: Keys,
    filter: ChannelFilter,
    cache: &CipherCache,
) -> Result<Outcome> {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .map(|x| x.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_owned());

    let chunks = UsmFile::open(path)?.filter(filter);
    let mut demuxer = Demuxer::new(stem, Dispatcher::new(keys, cache));
    demuxer.run(chunks, output)
}
