//! On-disk framing for encrypted records.
//!
//! ## Record layout
//!
//! ```text
//! Plaintext record:  [encoded-bytes]
//! Encrypted record:  [marker:10]["[ISCRYPTO]"][iv:8][ciphertext]
//! ```
//!
//! Detection is a pure leading-byte probe: the first ten bytes of the file
//! are compared against the marker, nothing else. There is no length field,
//! checksum, or version byte, so a plaintext payload that happens to start
//! with the marker bytes is misclassified as encrypted. That ambiguity is
//! part of the format and is preserved here; callers that need to store
//! marker-shaped plaintext must enable encryption.

use crate::error::{Result, StoreError};
use crate::key::{CipherKey, BLOCK_LEN};
use rand_core::{OsRng, RngCore};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

/// Fixed ASCII marker prefixed to every encrypted record.
pub const MARKER: [u8; 10] = *b"[ISCRYPTO]";

/// Initialization vector length in bytes, fixed by the cipher block size.
pub const IV_LEN: usize = BLOCK_LEN;

/// How a record on disk is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Raw encoded payload, no header.
    Plain,
    /// Marker + IV + ciphertext.
    Encrypted,
}

/// Probes `reader` for the encryption marker and positions the cursor at the
/// start of the chosen path's payload: offset 0 for a plaintext record, the
/// IV offset (immediately after the marker) for an encrypted one.
///
/// A file shorter than the marker is plaintext by definition.
pub fn detect<R: Read + Seek>(reader: &mut R) -> std::io::Result<Framing> {
    let mut probe = [0u8; MARKER.len()];
    let mut filled = 0;
    while filled < probe.len() {
        let n = reader.read(&mut probe[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    if filled == probe.len() && probe == MARKER {
        Ok(Framing::Encrypted)
    } else {
        reader.seek(SeekFrom::Start(0))?;
        Ok(Framing::Plain)
    }
}

/// Writes one encrypted record: marker, a fresh random IV, then the
/// ciphertext of `plaintext` under `key`.
pub fn seal<W: Write>(writer: &mut W, key: &CipherKey, plaintext: &[u8]) -> Result<()> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = key.encrypt(&iv, plaintext);

    writer.write_all(&MARKER)?;
    writer.write_all(&iv)?;
    writer.write_all(&ciphertext)?;
    Ok(())
}

/// Reads one encrypted record body from `reader`, which must be positioned
/// just past the marker (as [`detect`] leaves it): 8 bytes of IV, then
/// ciphertext to end of stream.
///
/// A stream too short to hold the IV is a truncated record and reports
/// [`StoreError::Decoding`]; genuine reader faults propagate as I/O errors.
pub fn open<R: Read>(reader: &mut R, key: &CipherKey) -> Result<Vec<u8>> {
    let mut iv = [0u8; IV_LEN];
    reader.read_exact(&mut iv).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            StoreError::decoding("truncated envelope: missing initialization vector")
        } else {
            StoreError::Io(e)
        }
    })?;

    let mut ciphertext = Vec::new();
    reader.read_to_end(&mut ciphertext)?;

    key.decrypt(&iv, &ciphertext)
}
