//! Error types for demultiplexing operations.

use thiserror::Error;

/// Errors that can occur while reading, decrypting or reassembling a USM container.
#[derive(Debug, Error)]
pub enum Error {
    /// Chunk signature is not one of the known USM chunk types.
    #[error("invalid chunk signature {0:?} at offset {1}")]
    InvalidSignature([u8; 4], u64),

    /// Input ended in the middle of a chunk.
    #[error("truncated chunk at offset {offset}: {reason}")]
    Truncated { offset: u64, reason: String },

    /// Chunk header describes a payload that does not fit in the chunk.
    #[error("malformed chunk at offset {offset}: {payload_offset} + {padding} exceeds size {size}")]
    Malformed {
        offset: u64,
        size: u32,
        payload_offset: u8,
        padding: u16,
    },

    /// A chunk arrived whose index was already passed by the drain pointer.
    #[error("late chunk {index} arrived after the drain pointer reached {expected}")]
    LateChunk { index: u64, expected: u64 },

    /// A chunk arrived with the index of a chunk already waiting in the backlog.
    #[error("duplicate chunk {index} in the backlog")]
    DuplicateChunk { index: u64 },

    /// A buffered chunk fell behind the drain pointer while the backlog was flushed.
    #[error("buffered chunk {index} fell behind the drain pointer {expected}")]
    StaleBacklog { index: u64, expected: u64 },

    /// Input ended but chunks are still waiting for their predecessors.
    #[error("{pending} chunks remain unflushed after the last chunk (next expected {expected})")]
    Unflushed { pending: usize, expected: u64 },

    /// More chunks were delivered than the container declared.
    #[error("more chunks observed than declared: delivered up to {delivered}, declared {declared}")]
    Overrun { delivered: u64, declared: u64 },

    /// Chunk payload could not be written completely.
    #[error("partial write of chunk {index}: expected {expected} bytes")]
    PartialWrite { index: u64, expected: usize },

    /// Consumer side of a queue output was dropped before the run finished.
    #[error("queue consumer disconnected")]
    QueueClosed,

    /// Invalid channel filter expression.
    #[error("invalid channel filter '{0}'")]
    InvalidFilter(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for demultiplexing operations.
pub type Result<T> = std::result::Result<T, Error>;
