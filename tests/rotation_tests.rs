//! Integration tests for key rotation, including failure after the
//! vault has already been re-encrypted.

use std::fs;
use std::path::{Path, PathBuf};

use memevault::crypto::{
    load_identity, read_public_key, write_identity_file, Identity, IdentityWriter,
};
use memevault::errors::{MemeVaultError, Result};
use memevault::vault::{self, store, AccessList, Recipient, SecretMap};
use tempfile::TempDir;

/// Simulates a full disk when writing the new identity file.
struct FailingWriter;

impl IdentityWriter for FailingWriter {
    fn write(&self, _path: &Path, _identity: &Identity) -> Result<()> {
        Err(std::io::Error::other("disk full").into())
    }
}

struct Setup {
    _dir: TempDir,
    vault: PathBuf,
    key: PathBuf,
    owner: Identity,
}

fn setup(recorded: bool) -> Setup {
    let dir = TempDir::new().unwrap();
    let key = dir.path().join("memevault.key");
    let owner = Identity::generate();
    write_identity_file(&key, &owner).unwrap();

    let vault = dir.path().join("secrets.jpg");
    let mut map = SecretMap::new();
    map.set("DB_PASS", "hunter2").unwrap();

    if recorded {
        let list: AccessList = Recipient::new("alice", owner.public_key()).into();
        store::create(&vault, Some(b"cover-bytes".as_slice()), &mut map, &list).unwrap();
    } else {
        // No recorded recipients: encrypt directly for the owner.
        let plaintext = map.encode().unwrap();
        let ciphertext = memevault::crypto::encrypt(&plaintext, &[owner.public_key()]).unwrap();
        fs::write(&vault, ciphertext).unwrap();
    }

    Setup {
        _dir: dir,
        vault,
        key,
        owner,
    }
}

// ---------------------------------------------------------------------------
// Success path
// ---------------------------------------------------------------------------

#[test]
fn rotate_replaces_key_and_keeps_name() {
    let s = setup(true);

    let report = vault::rotate(&s.vault, &s.key).unwrap();

    assert_eq!(report.old_public_key, s.owner.public_key());
    assert_ne!(report.new_public_key, report.old_public_key);
    assert!(report.warnings.is_empty());

    // New identity file is in place and opens the vault.
    assert_eq!(read_public_key(&s.key).unwrap(), report.new_public_key);
    let map = store::load(&s.vault, &s.key).unwrap();
    assert_eq!(map.get("DB_PASS"), Some("hunter2"));

    let recipients = map.get_recipients();
    assert_eq!(recipients.len(), 1);
    assert_eq!(
        recipients.find_by_key(&report.new_public_key).unwrap().name,
        "alice"
    );

    // The old key is locked out; its backup still holds it.
    let err = store::load_with_key(&s.vault, s.owner.private_key()).unwrap_err();
    assert!(matches!(err, MemeVaultError::DecryptionFailed));
    assert_eq!(
        load_identity(&report.backup_path).unwrap().as_str(),
        s.owner.private_key()
    );
}

#[test]
fn rotate_implicit_vault_records_new_key_with_warning() {
    let s = setup(false);

    let report = vault::rotate(&s.vault, &s.key).unwrap();

    assert_eq!(report.warnings.len(), 1);
    let map = store::load(&s.vault, &s.key).unwrap();
    let recipients = map.get_recipients();
    assert_eq!(recipients.public_keys(), vec![report.new_public_key.as_str()]);
}

#[test]
fn rotate_keeps_embedded_cover() {
    let s = setup(true);
    vault::rotate(&s.vault, &s.key).unwrap();
    assert!(fs::read(&s.vault).unwrap().starts_with(b"cover-bytes"));
}

// ---------------------------------------------------------------------------
// Failure paths
// ---------------------------------------------------------------------------

#[test]
fn failed_identity_write_reports_recoverable_hazard() {
    let s = setup(true);
    let backup = s.key.with_file_name("memevault.key.bak");

    let err = vault::rotate_with(&s.vault, &s.key, &FailingWriter).unwrap_err();

    let MemeVaultError::RotationHazard {
        private_key,
        public_key,
        backup: reported_backup,
        ..
    } = &err
    else {
        panic!("expected RotationHazard, got {err:?}");
    };

    // The printed message carries the recovery key.
    assert!(err.to_string().contains(private_key.as_str()));

    // The vault is readable with the reported key only.
    let map = store::load_with_key(&s.vault, private_key).unwrap();
    assert_eq!(map.get("DB_PASS"), Some("hunter2"));
    assert!(map.get_recipients().contains_key(public_key));
    assert!(store::load_with_key(&s.vault, s.owner.private_key()).is_err());

    // The old identity is preserved, unmodified.
    assert_eq!(reported_backup.as_deref(), Some(backup.as_path()));
    assert_eq!(
        load_identity(&backup).unwrap().as_str(),
        s.owner.private_key()
    );
}

#[test]
fn wrong_key_fails_before_any_change() {
    let s = setup(true);
    let stranger = Identity::generate();
    fs::remove_file(&s.key).unwrap();
    write_identity_file(&s.key, &stranger).unwrap();

    let vault_before = fs::read(&s.vault).unwrap();
    let key_before = fs::read(&s.key).unwrap();

    let err = vault::rotate(&s.vault, &s.key).unwrap_err();
    assert!(matches!(err, MemeVaultError::DecryptionFailed));

    assert_eq!(fs::read(&s.vault).unwrap(), vault_before);
    assert_eq!(fs::read(&s.key).unwrap(), key_before);
    assert!(!s.key.with_file_name("memevault.key.bak").exists());
}

#[test]
fn identity_without_public_key_line_fails_before_any_change() {
    let s = setup(true);
    fs::write(&s.key, format!("{}\n", s.owner.private_key())).unwrap();
    let vault_before = fs::read(&s.vault).unwrap();

    let err = vault::rotate(&s.vault, &s.key).unwrap_err();
    assert!(matches!(err, MemeVaultError::PublicKeyNotFound(_)));
    assert_eq!(fs::read(&s.vault).unwrap(), vault_before);
}
