//! Single-file typed persistence with optional encryption.
//!
//! This module provides [`EncryptedFileStore`], the primary interface of the
//! crate. A store owns one file path, one [`Codec`] and, when a passphrase
//! was supplied, one derived [`CipherKey`]; it orchestrates framing
//! detection, the encrypt/decrypt envelope and the checked/unchecked load
//! workflows.
//!
//! One store holds exactly one logical value. To persist several values,
//! use several stores.

use crate::codec::{Codec, EncodingKind};
use crate::envelope::{self, Framing};
use crate::error::{Result, StoreError};
use crate::key::CipherKey;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Outcome of a checked load. Terminal, one per [`EncryptedFileStore::try_load`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// The file does not exist.
    FileNotFound,
    /// Bytes were present but could not be decoded under the selected encoding.
    FileNotConverted,
    /// Decoded successfully but the value failed its consistency check.
    /// The decoded value is still handed to the caller.
    ConsistencyError,
    /// Loaded successfully.
    Complete,
    /// No checked load was performed.
    #[default]
    None,
}

/// Post-decode semantic validation, optionally refined by stored value types.
///
/// The default implementation accepts everything, so opting in is a one-line
/// empty `impl`; types with internal invariants override
/// [`consistency_check`](Self::consistency_check). The predicate is evaluated
/// once per checked load and is expected to be side-effect free. Its failure
/// does not discard the decoded value — the checked load reports
/// [`LoadState::ConsistencyError`] alongside it.
pub trait ConsistencyCheck {
    fn consistency_check(&self) -> bool {
        true
    }
}

/// Persists one value of type `T` in one file, optionally encrypted.
///
/// The path, the codec and the derived key are immutable for the store's
/// lifetime. Every operation opens and releases its own file handle; nothing
/// is shared between calls, so a store can be used from multiple threads
/// behind a shared reference.
pub struct EncryptedFileStore<T> {
    path: PathBuf,
    codec: Codec,
    key: Option<CipherKey>,
    _value: PhantomData<fn() -> T>,
}

impl<T> EncryptedFileStore<T> {
    /// Creates a plaintext store. The parent directory of `path` is created
    /// if it does not exist.
    pub fn new(path: impl Into<PathBuf>, encoding: EncodingKind) -> Result<Self> {
        let path = path.into();
        ensure_parent_dir(&path)?;
        Ok(Self {
            path,
            codec: Codec::new(encoding),
            key: None,
            _value: PhantomData,
        })
    }

    /// Creates an encrypting store keyed by `passphrase`.
    ///
    /// The key is derived once, here, and held for the store's lifetime.
    /// An empty passphrase is rejected with [`StoreError::Key`].
    pub fn with_passphrase(
        path: impl Into<PathBuf>,
        encoding: EncodingKind,
        passphrase: &str,
    ) -> Result<Self> {
        let path = path.into();
        ensure_parent_dir(&path)?;
        let key = CipherKey::derive(passphrase)?;
        Ok(Self {
            path,
            codec: Codec::new(encoding),
            key: Some(key),
            _value: PhantomData,
        })
    }

    /// The file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The structured encoding used for the payload.
    pub fn encoding(&self) -> EncodingKind {
        self.codec.kind()
    }

    /// Whether saves are encrypted (a passphrase was supplied).
    pub fn is_encrypted(&self) -> bool {
        self.key.is_some()
    }

    /// Whether the target file currently exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl<T> EncryptedFileStore<T>
where
    T: Serialize,
{
    /// Encodes `value` and writes it to the target file, truncating any
    /// prior contents.
    ///
    /// With encryption enabled the encoded bytes are produced in full before
    /// the envelope (marker, fresh IV, ciphertext) is written. The file is
    /// opened in overwrite mode either way; a save that fails partway leaves
    /// the file corrupted. Every failure propagates.
    pub fn save(&self, value: &T) -> Result<()> {
        debug!(path = %self.path.display(), encrypted = self.is_encrypted(), "saving value");

        match &self.key {
            Some(key) => {
                let mut encoded = Vec::new();
                self.codec.encode(&mut encoded, value)?;

                let mut file = File::create(&self.path)?;
                envelope::seal(&mut file, key, &encoded)?;
                info!(path = %self.path.display(), plaintext_size = encoded.len(), "value saved (encrypted)");
            }
            None => {
                let file = File::create(&self.path)?;
                let mut writer = BufWriter::new(file);
                self.codec.encode(&mut writer, value)?;
                writer.flush()?;
                info!(path = %self.path.display(), "value saved (plaintext)");
            }
        }
        Ok(())
    }
}

impl<T> EncryptedFileStore<T>
where
    T: DeserializeOwned,
{
    /// Unchecked load: detects the framing of the existing file and decodes
    /// accordingly. Every failure propagates — a missing file surfaces as an
    /// I/O error, a malformed payload as [`StoreError::Decoding`].
    ///
    /// Use this when the file is already known to exist and be well-formed;
    /// otherwise prefer [`try_load`](Self::try_load).
    pub fn load(&self) -> Result<T> {
        debug!(path = %self.path.display(), "loading value (unchecked)");

        let mut file = File::open(&self.path)?;
        let value = match envelope::detect(&mut file)? {
            Framing::Plain => self.codec.decode(BufReader::new(file)),
            Framing::Encrypted => {
                let key = self.require_key()?;
                let plaintext = envelope::open(&mut file, key)?;
                self.codec.decode(plaintext.as_slice())
            }
        };

        match &value {
            Ok(_) => info!(path = %self.path.display(), "value loaded"),
            Err(e) => error!(path = %self.path.display(), error = %e, "load failed"),
        }
        value
    }

    /// Checked load. Exactly two fault categories are absorbed into states:
    /// a missing file yields [`LoadState::FileNotFound`] and a payload that
    /// cannot be decoded (malformed encoding, truncated envelope, failed
    /// decryption) yields [`LoadState::FileNotConverted`], both paired with
    /// `T::default()`. A decoded value failing its [`ConsistencyCheck`]
    /// yields [`LoadState::ConsistencyError`] with the value still populated.
    /// Everything else — I/O faults, an unsupported encoding, an encrypted
    /// file without a key — propagates as an error.
    pub fn try_load(&self) -> Result<(LoadState, T)>
    where
        T: Default + ConsistencyCheck,
    {
        debug!(path = %self.path.display(), "loading value (checked)");

        if !self.path.exists() {
            info!(path = %self.path.display(), "file not found");
            return Ok((LoadState::FileNotFound, T::default()));
        }

        let mut file = File::open(&self.path)?;
        let decoded: Option<T> = match envelope::detect(&mut file)? {
            Framing::Plain => self.codec.try_decode(BufReader::new(file))?,
            Framing::Encrypted => {
                let key = self.require_key()?;
                match envelope::open(&mut file, key) {
                    Ok(plaintext) => self.codec.try_decode(plaintext.as_slice())?,
                    Err(StoreError::Decoding(reason)) => {
                        debug!(path = %self.path.display(), reason = %reason, "envelope rejected");
                        None
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        let outcome = match decoded {
            None => {
                warn!(path = %self.path.display(), "file could not be converted");
                (LoadState::FileNotConverted, T::default())
            }
            Some(value) if !value.consistency_check() => {
                warn!(path = %self.path.display(), "decoded value failed consistency check");
                (LoadState::ConsistencyError, value)
            }
            Some(value) => {
                info!(path = %self.path.display(), "value loaded");
                (LoadState::Complete, value)
            }
        };
        Ok(outcome)
    }

    fn require_key(&self) -> Result<&CipherKey> {
        self.key.as_ref().ok_or_else(|| {
            StoreError::key(format!(
                "{} carries the encryption marker but this store has no passphrase",
                self.path.display()
            ))
        })
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
