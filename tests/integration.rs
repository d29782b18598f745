use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use tempfile::TempDir;

use cipherfile::{ConsistencyCheck, EncodingKind, EncryptedFileStore, LoadState, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
struct SaveData {
    profile: String,
    score: i64,
    unlocked: Vec<String>,
}

impl ConsistencyCheck for SaveData {}

fn sample_data() -> SaveData {
    SaveData {
        profile: "player-one".into(),
        score: 9001,
        unlocked: vec!["forest".into(), "caves".into()],
    }
}

/// A type whose invariant (`current <= maximum`) can be violated by a
/// structurally valid file.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
struct Gauge {
    current: u32,
    maximum: u32,
}

impl ConsistencyCheck for Gauge {
    fn consistency_check(&self) -> bool {
        self.current <= self.maximum
    }
}

#[test]
fn plaintext_round_trip() -> Result<()> {
    let tmp = TempDir::new()?;
    let store: EncryptedFileStore<SaveData> =
        EncryptedFileStore::new(tmp.path().join("plain.json"), EncodingKind::Json)?;

    store.save(&sample_data())?;
    let loaded = store.load()?;
    assert_eq!(loaded, sample_data());

    // plaintext records carry no header
    let raw = fs::read(store.path())?;
    assert!(raw.starts_with(b"{"));
    Ok(())
}

#[test]
fn encrypted_round_trip() -> Result<()> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("save.dat");

    let writer: EncryptedFileStore<SaveData> =
        EncryptedFileStore::with_passphrase(&path, EncodingKind::Json, "abc")?;
    writer.save(&sample_data())?;

    // a fresh store with the same passphrase reads it back
    let reader: EncryptedFileStore<SaveData> =
        EncryptedFileStore::with_passphrase(&path, EncodingKind::Json, "abc")?;
    assert_eq!(reader.load()?, sample_data());

    let (state, value) = reader.try_load()?;
    assert_eq!(state, LoadState::Complete);
    assert_eq!(value, sample_data());
    Ok(())
}

#[test]
fn encrypted_file_carries_marker_and_hides_plaintext() -> Result<()> {
    let tmp = TempDir::new()?;
    let store: EncryptedFileStore<SaveData> =
        EncryptedFileStore::with_passphrase(tmp.path().join("save.dat"), EncodingKind::Json, "abc")?;
    store.save(&sample_data())?;

    let raw = fs::read(store.path())?;
    assert!(raw.starts_with(b"[ISCRYPTO]"));
    // marker + 8-byte IV + block-aligned ciphertext
    assert_eq!((raw.len() - 10 - 8) % 8, 0);
    // the payload must not leak through
    let haystack = String::from_utf8_lossy(&raw);
    assert!(!haystack.contains("player-one"));
    Ok(())
}

#[test]
fn wrong_passphrase_never_yields_the_value() -> Result<()> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("save.dat");

    let writer: EncryptedFileStore<SaveData> =
        EncryptedFileStore::with_passphrase(&path, EncodingKind::Json, "abc")?;
    writer.save(&sample_data())?;

    let reader: EncryptedFileStore<SaveData> =
        EncryptedFileStore::with_passphrase(&path, EncodingKind::Json, "xyz")?;

    // unchecked path fails
    assert!(reader.load().is_err());

    // checked path downgrades to FileNotConverted with a default value
    let (state, value) = reader.try_load()?;
    assert_eq!(state, LoadState::FileNotConverted);
    assert_eq!(value, SaveData::default());
    Ok(())
}

#[test]
fn missing_file_is_a_state_not_an_error() -> Result<()> {
    let tmp = TempDir::new()?;
    let store: EncryptedFileStore<SaveData> =
        EncryptedFileStore::new(tmp.path().join("never-written.json"), EncodingKind::Json)?;

    assert!(!store.exists());
    let (state, value) = store.try_load()?;
    assert_eq!(state, LoadState::FileNotFound);
    assert_eq!(value, SaveData::default());

    // the unchecked path propagates instead
    assert!(matches!(store.load(), Err(StoreError::Io(_))));
    Ok(())
}

#[test]
fn malformed_payload_reports_file_not_converted() -> Result<()> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("corrupt.json");
    fs::write(&path, b"\x00\x01this was never a record\xff")?;

    let store: EncryptedFileStore<SaveData> = EncryptedFileStore::new(&path, EncodingKind::Json)?;
    let (state, value) = store.try_load()?;
    assert_eq!(state, LoadState::FileNotConverted);
    assert_eq!(value, SaveData::default());

    assert!(matches!(store.load(), Err(StoreError::Decoding(_))));
    Ok(())
}

#[test]
fn empty_file_reports_file_not_converted() -> Result<()> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("empty.json");
    fs::write(&path, b"")?;

    let store: EncryptedFileStore<SaveData> = EncryptedFileStore::new(&path, EncodingKind::Json)?;
    let (state, _) = store.try_load()?;
    assert_eq!(state, LoadState::FileNotConverted);
    Ok(())
}

#[test]
fn truncated_envelope_reports_file_not_converted() -> Result<()> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("truncated.dat");
    // marker present, IV cut short
    fs::write(&path, b"[ISCRYPTO]\x01\x02\x03")?;

    let store: EncryptedFileStore<SaveData> =
        EncryptedFileStore::with_passphrase(&path, EncodingKind::Json, "abc")?;
    let (state, value) = store.try_load()?;
    assert_eq!(state, LoadState::FileNotConverted);
    assert_eq!(value, SaveData::default());
    Ok(())
}

#[test]
fn consistency_failure_keeps_the_decoded_value() -> Result<()> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("gauge.json");
    // structurally valid, semantically broken: current exceeds maximum
    fs::write(&path, br#"{"current":150,"maximum":100}"#)?;

    let store: EncryptedFileStore<Gauge> = EncryptedFileStore::new(&path, EncodingKind::Json)?;
    let (state, value) = store.try_load()?;
    assert_eq!(state, LoadState::ConsistencyError);
    assert_eq!(
        value,
        Gauge {
            current: 150,
            maximum: 100
        }
    );
    Ok(())
}

#[test]
fn consistency_holds_through_encryption() -> Result<()> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("gauge.dat");

    let store: EncryptedFileStore<Gauge> =
        EncryptedFileStore::with_passphrase(&path, EncodingKind::Json, "abc")?;
    store.save(&Gauge {
        current: 80,
        maximum: 100,
    })?;

    let (state, value) = store.try_load()?;
    assert_eq!(state, LoadState::Complete);
    assert_eq!(value.current, 80);
    Ok(())
}

/// Pins the documented detection ambiguity: a plaintext payload whose first
/// ten bytes spell the marker is treated as encrypted. A keyless store has
/// no way to proceed and reports a key fault on both paths.
#[test]
fn marker_collision_is_classified_as_encrypted() -> Result<()> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("collision.json");
    fs::write(&path, br#"[ISCRYPTO]{"profile":"x","score":0,"unlocked":[]}"#)?;

    let keyless: EncryptedFileStore<SaveData> = EncryptedFileStore::new(&path, EncodingKind::Json)?;
    assert!(matches!(keyless.load(), Err(StoreError::Key(_))));
    assert!(matches!(keyless.try_load(), Err(StoreError::Key(_))));

    // a keyed store decrypts garbage and downgrades on the checked path
    let keyed: EncryptedFileStore<SaveData> =
        EncryptedFileStore::with_passphrase(&path, EncodingKind::Json, "abc")?;
    let (state, _) = keyed.try_load()?;
    assert_eq!(state, LoadState::FileNotConverted);
    Ok(())
}

#[test]
fn binary_encoding_is_rejected_not_silently_swapped() -> Result<()> {
    let tmp = TempDir::new()?;
    let store: EncryptedFileStore<SaveData> =
        EncryptedFileStore::new(tmp.path().join("save.bin"), EncodingKind::Binary)?;
    assert_eq!(store.encoding(), EncodingKind::Binary);

    assert!(matches!(
        store.save(&sample_data()),
        Err(StoreError::Unsupported(EncodingKind::Binary))
    ));

    // decode side fails the same way once bytes exist
    fs::write(store.path(), b"whatever")?;
    assert!(matches!(
        store.load(),
        Err(StoreError::Unsupported(EncodingKind::Binary))
    ));
    Ok(())
}

#[test]
fn save_truncates_previous_contents() -> Result<()> {
    let tmp = TempDir::new()?;
    let store: EncryptedFileStore<SaveData> =
        EncryptedFileStore::new(tmp.path().join("slot.json"), EncodingKind::Json)?;

    let mut big = sample_data();
    big.unlocked = (0..64).map(|i| format!("area-{i}")).collect();
    store.save(&big)?;

    let small = SaveData {
        profile: "p".into(),
        score: 1,
        unlocked: vec![],
    };
    store.save(&small)?;
    assert_eq!(store.load()?, small);
    Ok(())
}

#[test]
fn construction_creates_parent_directory() -> Result<()> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("nested").join("deeper").join("save.json");

    let store: EncryptedFileStore<SaveData> = EncryptedFileStore::new(&path, EncodingKind::Json)?;
    assert!(path.parent().expect("has parent").is_dir());

    store.save(&sample_data())?;
    assert!(store.exists());
    Ok(())
}

#[test]
fn plaintext_writer_encrypted_reader_disagree_cleanly() -> Result<()> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("mixed.json");

    let plain: EncryptedFileStore<SaveData> = EncryptedFileStore::new(&path, EncodingKind::Json)?;
    plain.save(&sample_data())?;

    // a keyed reader still detects the missing marker and reads plaintext
    let keyed: EncryptedFileStore<SaveData> =
        EncryptedFileStore::with_passphrase(&path, EncodingKind::Json, "abc")?;
    assert_eq!(keyed.load()?, sample_data());
    Ok(())
}
