//! Key rotation: replace the caller's keypair without locking anyone out.
//!
//! Order of operations:
//!
//! 1. Load the vault with the current identity (fails without side effects).
//! 2. Read the current public key from the identity file.
//! 3. Generate a new identity.
//! 4. Swap the old key for the new one in the recorded recipients.
//! 5. Re-encrypt, save, and re-open the vault with the new key.
//! 6. Rename the old identity file to a backup.
//! 7. Write the new identity file.
//!
//! The old identity is only moved once the vault is proven to open with
//! the new key. A failure in steps 5–7 after the save is returned as
//! `RotationHazard`, which carries the new private key.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::recipient::{AccessList, Recipient};
use super::store::{self, VaultKind};
use crate::crypto::{load_identity, read_public_key, FsIdentityWriter, Identity, IdentityWriter};
use crate::errors::{MemeVaultError, Result};

/// Name given to the new key when the old one was not recorded.
const UNRECORDED_NAME: &str = "me";

/// What a successful rotation did.
#[derive(Debug, Clone)]
pub struct RotationReport {
    pub old_public_key: String,
    pub new_public_key: String,
    /// How the re-encrypted vault was written.
    pub vault_kind: VaultKind,
    /// Where the previous identity file now lives.
    pub backup_path: PathBuf,
    /// Non-fatal issues for the operator.
    pub warnings: Vec<String>,
}

/// Rotate the identity at `identity_path` for the vault at `vault_path`.
pub fn rotate(vault_path: &Path, identity_path: &Path) -> Result<RotationReport> {
    rotate_with(vault_path, identity_path, &FsIdentityWriter)
}

/// Same as `rotate`, writing the new identity through `writer`.
pub fn rotate_with<W: IdentityWriter>(
    vault_path: &Path,
    identity_path: &Path,
    writer: &W,
) -> Result<RotationReport> {
    // 1. Load.
    let old_private = load_identity(identity_path)?;
    let mut map = store::load_with_key(vault_path, &old_private)?;

    // 2. Resolve the old public key.
    let old_public_key = read_public_key(identity_path)?;

    // 3. Generate.
    let new_identity = Identity::generate();

    // 4. Swap.
    let mut warnings = Vec::new();
    let (recipients, found) = swap_key(
        &map.get_recipients(),
        &old_public_key,
        new_identity.public_key(),
    );
    if !found {
        warnings.push(
            "old key was not in the recorded recipients (implicit vault?); added the new key"
                .to_string(),
        );
    }
    map.set_recipients(recipients);

    // 5. Re-encrypt and persist, then prove the new key opens it.
    let vault_kind = store::save(vault_path, &mut map, &AccessList::new())?;
    store::load_with_key(vault_path, new_identity.private_key())
        .map_err(|e| hazard(&new_identity, "verifying the re-encrypted vault", e, None, false))?;

    // 6. Back up the old identity.
    let backup_path = backup_path_for(identity_path);
    fs::rename(identity_path, &backup_path).map_err(|e| {
        hazard(&new_identity, "backing up the old identity", e.into(), None, false)
    })?;

    // 7. Replace the identity file.
    if let Err(e) = writer.write(identity_path, &new_identity) {
        let restored = fs::copy(&backup_path, identity_path).is_ok();
        return Err(hazard(
            &new_identity,
            "writing the new identity",
            e,
            Some(backup_path),
            restored,
        ));
    }

    Ok(RotationReport {
        old_public_key,
        new_public_key: new_identity.public_key().to_string(),
        vault_kind,
        backup_path,
        warnings,
    })
}

/// Replace `old_key` with `new_key`, keeping its name. If `old_key` is
/// absent, `new_key` is appended. Returns whether `old_key` was found.
fn swap_key(recipients: &AccessList, old_key: &str, new_key: &str) -> (AccessList, bool) {
    let mut found = false;
    let mut swapped: AccessList = recipients
        .iter()
        .map(|r| {
            if r.public_key == old_key {
                found = true;
                Recipient::new(r.name.clone(), new_key)
            } else {
                r.clone()
            }
        })
        .collect();

    if !found {
        swapped.push(Recipient::new(UNRECORDED_NAME, new_key));
    }
    (swapped, found)
}

/// `<identity>.bak`, or a timestamped name if that is taken.
pub fn backup_path_for(identity_path: &Path) -> PathBuf {
    let plain = with_suffix(identity_path, ".bak");
    if !plain.exists() {
        return plain;
    }
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
    with_suffix(identity_path, &format!(".{stamp}.bak"))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn hazard(
    identity: &Identity,
    stage: &'static str,
    cause: MemeVaultError,
    backup: Option<PathBuf>,
    restored: bool,
) -> MemeVaultError {
    MemeVaultError::RotationHazard {
        stage,
        reason: cause.to_string(),
        backup,
        restored,
        private_key: identity.private_key().to_string(),
        public_key: identity.public_key().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn swap_keeps_name_and_position() {
        let list: AccessList = vec![
            Recipient::new("alice", "age1old"),
            Recipient::new("bob", "age1bob"),
        ]
        .into_iter()
        .collect();

        let (swapped, found) = swap_key(&list, "age1old", "age1new");
        assert!(found);
        assert_eq!(swapped.public_keys(), vec!["age1new", "age1bob"]);
        assert_eq!(swapped.find_by_key("age1new").unwrap().name, "alice");
    }

    #[test]
    fn swap_appends_when_old_key_unrecorded() {
        let list: AccessList = Recipient::new("bob", "age1bob").into();
        let (swapped, found) = swap_key(&list, "age1old", "age1new");
        assert!(!found);
        assert_eq!(swapped.public_keys(), vec!["age1bob", "age1new"]);
    }

    #[test]
    fn backup_path_avoids_existing_backup() {
        let dir = TempDir::new().unwrap();
        let key = dir.path().join("memevault.key");

        let first = backup_path_for(&key);
        assert_eq!(first, dir.path().join("memevault.key.bak"));

        fs::write(&first, "old backup").unwrap();
        let second = backup_path_for(&key);
        assert_ne!(second, first);
        assert!(second.to_string_lossy().ends_with(".bak"));
    }
}
