//! Value ↔ byte-stream conversion.
//!
//! This module provides [`Codec`], the pure serialization component of the
//! store. A codec is configured with an [`EncodingKind`] at construction and
//! holds no other state, so it is safe to share across calls and threads.
//!
//! Only the structured-text encoding (JSON) is implemented; selecting
//! [`EncodingKind::Binary`] fails with [`StoreError::Unsupported`] rather
//! than silently falling back.

use crate::error::{Result, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::error::Category;
use std::fmt;
use std::io::{self, Read, Write};

/// The structured representation used on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingKind {
    /// Structured text (JSON); always supported.
    Json,
    /// Compact binary form; reserved, currently unimplemented.
    Binary,
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingKind::Json => f.write_str("json"),
            EncodingKind::Binary => f.write_str("binary"),
        }
    }
}

/// Stateless converter between typed values and byte streams.
#[derive(Debug, Clone, Copy)]
pub struct Codec {
    kind: EncodingKind,
}

impl Codec {
    pub fn new(kind: EncodingKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> EncodingKind {
        self.kind
    }

    /// Serializes `value` directly into `writer`.
    ///
    /// Fails with [`StoreError::Encoding`] if the encoding cannot represent
    /// the value's shape, [`StoreError::Io`] if the writer fails, or
    /// [`StoreError::Unsupported`] for an unimplemented encoding.
    pub fn encode<W, T>(&self, writer: W, value: &T) -> Result<()>
    where
        W: Write,
        T: Serialize + ?Sized,
    {
        match self.kind {
            EncodingKind::Json => {
                serde_json::to_writer(writer, value).map_err(|e| classify(e, Fault::Encoding))
            }
            EncodingKind::Binary => Err(StoreError::Unsupported(self.kind)),
        }
    }

    /// Deserializes one value from `reader`.
    ///
    /// Fails with [`StoreError::Decoding`] if the byte stream is not
    /// well-formed for the selected encoding (malformed syntax, truncated or
    /// trailing data), [`StoreError::Io`] if the reader fails, or
    /// [`StoreError::Unsupported`] for an unimplemented encoding.
    pub fn decode<R, T>(&self, reader: R) -> Result<T>
    where
        R: Read,
        T: DeserializeOwned,
    {
        match self.kind {
            EncodingKind::Json => {
                serde_json::from_reader(reader).map_err(|e| classify(e, Fault::Decoding))
            }
            EncodingKind::Binary => Err(StoreError::Unsupported(self.kind)),
        }
    }

    /// Non-propagating variant of [`decode`](Self::decode).
    ///
    /// Absorbs exactly the format-shape failures — a malformed byte stream
    /// yields `Ok(None)` instead of an error. Infrastructure faults (reader
    /// I/O errors, unsupported encoding) still propagate: structural
    /// corruption is an expected, recoverable condition; a failing disk is
    /// not.
    pub fn try_decode<R, T>(&self, reader: R) -> Result<Option<T>>
    where
        R: Read,
        T: DeserializeOwned,
    {
        match self.kind {
            EncodingKind::Json => match serde_json::from_reader(reader) {
                Ok(value) => Ok(Some(value)),
                Err(e) if e.classify() == Category::Io => Err(classify(e, Fault::Decoding)),
                Err(_) => Ok(None),
            },
            EncodingKind::Binary => Err(StoreError::Unsupported(self.kind)),
        }
    }
}

enum Fault {
    Encoding,
    Decoding,
}

/// Maps a serde_json error onto the store taxonomy, keeping I/O faults
/// distinct from format faults.
fn classify(err: serde_json::Error, fault: Fault) -> StoreError {
    match err.io_error_kind() {
        Some(kind) => StoreError::Io(io::Error::new(kind, err)),
        None => match fault {
            Fault::Encoding => StoreError::encoding(err.to_string()),
            Fault::Decoding => StoreError::decoding(err.to_string()),
        },
    }
}
