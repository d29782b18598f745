use crate::codec::EncodingKind;
use thiserror::Error;

/// Custom error types for cipherfile operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The selected encoding has no implementation
    #[error("unsupported encoding: {0}")]
    Unsupported(EncodingKind),

    /// The value's shape cannot be represented by the selected encoding
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The byte stream is malformed for the selected encoding
    /// (includes truncated envelopes and failed decryption)
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Key derivation or key availability errors
    #[error("key error: {0}")]
    Key(String),

    /// File I/O errors; these always propagate, never a `LoadState`
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn decoding(msg: impl Into<String>) -> Self {
        Self::Decoding(msg.into())
    }

    pub fn key(msg: impl Into<String>) -> Self {
        Self::Key(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
