//! Error types for Huffman coding.

use thiserror::Error;

/// Error variants for encoding, decoding and persisting Huffman data.
#[derive(Debug, Error)]
pub enum Error {
    /// Encode or decode was called with nothing to work on.
    #[error("empty input")]
    EmptyInput,

    /// A symbol in the input has no code in the table.
    #[error("symbol at position {position} has no code in the table")]
    MissingSymbol { position: usize },

    /// The bit stream does not decode cleanly against the tree.
    #[error("corrupt payload at bit {offset}: {reason}")]
    CorruptPayload { offset: usize, reason: &'static str },

    /// A code table failed structural validation.
    #[error("corrupt code table: {0}")]
    CorruptTable(&'static str),

    #[error("serialization failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("deserialization failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for Huffman operations.
pub type Result<T> = std::result::Result<T, Error>;
