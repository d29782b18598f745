//! # cipherfile - Single-File Encrypted Value Persistence
//!
//! cipherfile persists one typed value per file: the value is serialized
//! through a pluggable structured encoding and, when a passphrase is
//! supplied, wrapped in a self-describing TripleDES-CBC envelope. Loading
//! reverses the process, auto-detecting whether the file on disk is
//! encrypted and optionally validating the decoded value's internal
//! consistency.
//!
//! ## Features
//!
//! - **Typed round trips**: any `Serialize + Deserialize` value
//! - **Optional encryption**: passphrase-keyed, off by default
//! - **Format auto-detection**: encrypted files carry a 10-byte marker
//! - **Checked loads**: missing or corrupt files become [`LoadState`]
//!   outcomes instead of errors
//! - **Consistency validation**: stored types may opt into a post-decode
//!   predicate via [`ConsistencyCheck`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use cipherfile::{ConsistencyCheck, EncodingKind, EncryptedFileStore, LoadState};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct Progress {
//!     level: u32,
//! }
//!
//! impl ConsistencyCheck for Progress {}
//!
//! fn main() -> Result<(), cipherfile::StoreError> {
//!     let store: EncryptedFileStore<Progress> =
//!         EncryptedFileStore::with_passphrase("save/progress.dat", EncodingKind::Json, "abc")?;
//!
//!     store.save(&Progress { level: 3 })?;
//!
//!     let (state, progress) = store.try_load()?;
//!     assert_eq!(state, LoadState::Complete);
//!     assert_eq!(progress.level, 3);
//!     Ok(())
//! }
//! ```
//!
//! ## On-Disk Format
//!
//! - **Plaintext record**: the encoded bytes, no header
//! - **Encrypted record**: `[ISCRYPTO]` (10 ASCII bytes), an 8-byte IV, then
//!   the PKCS7-padded ciphertext
//!
//! The passphrase-to-key derivation and the cipher are a legacy contract
//! kept for on-disk compatibility; see the `key` module docs before trusting
//! it with anything a determined attacker wants.

pub mod codec;
pub mod envelope;
pub mod error;
pub mod key;
pub mod store;

// Re-export common types for convenience
pub use codec::{Codec, EncodingKind};
pub use error::StoreError;
pub use store::{ConsistencyCheck, EncryptedFileStore, LoadState};
