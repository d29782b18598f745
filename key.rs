//! Passphrase-derived encryption keys.
//!
//! This module provides [`CipherKey`], the 24-byte symmetric key backing the
//! envelope cipher (TripleDES-EDE3 in CBC mode with PKCS7 padding). The
//! derivation is the storage format's literal contract: the passphrase bytes
//! are self-concatenated until the buffer holds at least 24 bytes, then
//! truncated to exactly 24. It is deterministic and it is weak — files keyed
//! this way are obfuscated, not protected against a serious adversary.
//!
//! Key bytes are zeroized on drop.

use crate::error::{Result, StoreError};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::Zeroize;

type TdesCbcEnc = cbc::Encryptor<des::TdesEde3>;
type TdesCbcDec = cbc::Decryptor<des::TdesEde3>;

/// Derived key length in bytes, fixed by the envelope cipher.
pub const KEY_LEN: usize = 24;

/// Cipher block / IV length in bytes.
pub const BLOCK_LEN: usize = 8;

/// A derived 24-byte symmetric key. Immutable for its lifetime.
pub struct CipherKey {
    bytes: [u8; KEY_LEN],
}

impl Drop for CipherKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl CipherKey {
    /// Derives a key from a passphrase by repeated self-concatenation,
    /// truncated to [`KEY_LEN`] bytes.
    ///
    /// An empty passphrase is rejected: there is nothing to repeat.
    pub fn derive(passphrase: &str) -> Result<Self> {
        if passphrase.is_empty() {
            return Err(StoreError::key("passphrase must not be empty"));
        }

        let mut buf = passphrase.as_bytes().to_vec();
        while buf.len() < KEY_LEN {
            buf.extend_from_within(..);
        }

        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&buf[..KEY_LEN]);
        buf.zeroize();

        Ok(Self { bytes })
    }

    /// Encrypts `plaintext` under this key and `iv`, returning the padded
    /// ciphertext. Output length is always a multiple of [`BLOCK_LEN`].
    pub fn encrypt(&self, iv: &[u8; BLOCK_LEN], plaintext: &[u8]) -> Vec<u8> {
        TdesCbcEnc::new((&self.bytes).into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
    }

    /// Decrypts `ciphertext` under this key and `iv`.
    ///
    /// A wrong key, a mangled IV, or corrupt ciphertext surfaces here as a
    /// padding failure, reported as [`StoreError::Decoding`] so the checked
    /// load path can classify it as an unconvertible file.
    pub fn decrypt(&self, iv: &[u8; BLOCK_LEN], ciphertext: &[u8]) -> Result<Vec<u8>> {
        TdesCbcDec::new((&self.bytes).into(), iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| StoreError::decoding("cipher text failed block unpadding"))
    }

    #[cfg(test)]
    pub(crate) fn bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}
