//! Loading and saving whole vaults.
//!
//! `load` and `save` compose the container codec, the age envelope,
//! and the secret map so that commands can work with a plain
//! `SecretMap`:
//!
//! ```text
//! load: file -> extract (or whole file) -> decrypt -> decode
//! save: encode -> encrypt for recipients -> re-embed (or atomic write)
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use super::recipient::AccessList;
use super::secret_map::SecretMap;
use crate::container;
use crate::crypto::{decrypt, encrypt, load_identity};
use crate::errors::{MemeVaultError, Result};

/// How the ciphertext is stored in the vault file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultKind {
    /// Hidden in a trailer after a cover image.
    Embedded,
    /// The whole file is the ciphertext.
    Standalone,
}

/// Decide how the vault at `path` is stored.
pub fn detect_kind(path: &Path) -> Result<VaultKind> {
    if !path.exists() {
        return Err(MemeVaultError::VaultNotFound(path.to_path_buf()));
    }
    let data = fs::read(path)?;
    if container::has_trailer(&data) {
        Ok(VaultKind::Embedded)
    } else {
        Ok(VaultKind::Standalone)
    }
}

/// Read the ciphertext from a vault file.
///
/// Tries the trailer first; a file without one is treated as a
/// standalone ciphertext.
pub fn read_ciphertext(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(MemeVaultError::VaultNotFound(path.to_path_buf()));
    }
    let data = fs::read(path)?;
    match container::extract(&data) {
        Ok(payload) => Ok(payload.to_vec()),
        Err(_) => Ok(data),
    }
}

/// Open the vault at `vault_path` with the identity file at `identity_path`.
pub fn load(vault_path: &Path, identity_path: &Path) -> Result<SecretMap> {
    let ciphertext = read_ciphertext(vault_path)?;
    let private_key = load_identity(identity_path)?;
    open(&ciphertext, &private_key)
}

/// Open the vault at `vault_path` with a private key string.
pub fn load_with_key(vault_path: &Path, private_key: &str) -> Result<SecretMap> {
    let ciphertext = read_ciphertext(vault_path)?;
    open(&ciphertext, private_key)
}

fn open(ciphertext: &[u8], private_key: &str) -> Result<SecretMap> {
    let plaintext = decrypt(ciphertext, private_key)?;
    SecretMap::decode(&plaintext)
}

/// Encrypt `map` and write it back to `vault_path`.
///
/// The recipients written are the union of those already recorded in
/// `map` and `recipients`; to drop a recipient, call
/// `SecretMap::set_recipients` first. The union is recorded in `map`.
///
/// Returns how the vault was written. Both paths are flushed to disk
/// before this returns.
pub fn save(
    vault_path: &Path,
    map: &mut SecretMap,
    recipients: &AccessList,
) -> Result<VaultKind> {
    let kind = detect_kind(vault_path)?;
    let ciphertext = seal_map(map, recipients)?;

    match kind {
        VaultKind::Embedded => container::re_embed(vault_path, &ciphertext)?,
        VaultKind::Standalone => write_atomic(vault_path, &ciphertext)?,
    }
    Ok(kind)
}

/// Create a new vault file at `vault_path`.
///
/// With `cover`, the ciphertext is hidden behind those bytes; without,
/// the file is a standalone ciphertext. Refuses to overwrite.
///
/// A cover that is itself a vault loses its old trailer first, so the
/// new file carries exactly one.
pub fn create(
    vault_path: &Path,
    cover: Option<&[u8]>,
    map: &mut SecretMap,
    recipients: &AccessList,
) -> Result<VaultKind> {
    if vault_path.exists() {
        return Err(MemeVaultError::VaultAlreadyExists(vault_path.to_path_buf()));
    }

    let ciphertext = seal_map(map, recipients)?;
    match cover {
        Some(prefix) => {
            let host = container::seal(container::strip_trailer(prefix), &ciphertext);
            write_atomic(vault_path, &host)?;
            Ok(VaultKind::Embedded)
        }
        None => {
            write_atomic(vault_path, &ciphertext)?;
            Ok(VaultKind::Standalone)
        }
    }
}

/// Merge recipients into `map`, encode, and encrypt for all of them.
fn seal_map(map: &mut SecretMap, recipients: &AccessList) -> Result<Vec<u8>> {
    let mut all = map.get_recipients();
    all.merge(recipients);
    if all.is_empty() {
        return Err(MemeVaultError::NoRecipients);
    }

    // Encrypt before recording so a bad key leaves `map` untouched.
    let mut staged = map.clone();
    staged.set_recipients(all.clone());
    let plaintext = staged.encode()?;
    let ciphertext = encrypt(&plaintext, &all.public_keys())?;

    map.set_recipients(all);
    Ok(ciphertext)
}

/// Write `bytes` to `path` via a synced temp file in the same directory
/// and a rename. On Unix the directory entry is synced as well.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    let staged = write_synced(&tmp_path, bytes).and_then(|()| fs::rename(&tmp_path, path));
    if let Err(e) = staged {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    #[cfg(unix)]
    File::open(parent)?.sync_all()?;

    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{write_identity_file, Identity};
    use crate::vault::Recipient;
    use tempfile::TempDir;

    fn identity_in(dir: &TempDir, name: &str) -> (Identity, std::path::PathBuf) {
        let id = Identity::generate();
        let path = dir.path().join(name);
        write_identity_file(&path, &id).unwrap();
        (id, path)
    }

    #[test]
    fn create_standalone_then_load() {
        let dir = TempDir::new().unwrap();
        let (me, key) = identity_in(&dir, "me.key");
        let vault = dir.path().join("vault.age");

        let mut map = SecretMap::new();
        map.set("A", "1").unwrap();
        create(&vault, None, &mut map, &Recipient::new("me", me.public_key()).into()).unwrap();

        assert_eq!(detect_kind(&vault).unwrap(), VaultKind::Standalone);
        let loaded = load(&vault, &key).unwrap();
        assert_eq!(loaded.get("A"), Some("1"));
        assert_eq!(loaded.get_recipients().len(), 1);
    }

    #[test]
    fn create_embedded_keeps_cover_prefix() {
        let dir = TempDir::new().unwrap();
        let (me, key) = identity_in(&dir, "me.key");
        let vault = dir.path().join("secrets.jpg");
        let cover: &[u8] = b"\xFF\xD8\xFFjpeg-ish bytes\xFF\xD9";

        let mut map = SecretMap::new();
        create(&vault, Some(cover), &mut map, &Recipient::new("me", me.public_key()).into())
            .unwrap();

        let data = fs::read(&vault).unwrap();
        assert!(data.starts_with(cover));
        assert_eq!(detect_kind(&vault).unwrap(), VaultKind::Embedded);
        assert!(load(&vault, &key).unwrap().is_empty());
    }

    #[test]
    fn create_over_old_vault_cover_keeps_one_trailer() {
        let dir = TempDir::new().unwrap();
        let (me, key) = identity_in(&dir, "me.key");
        let vault = dir.path().join("fresh.jpg");
        let image: &[u8] = b"\xFF\xD8\xFFjpeg-ish bytes\xFF\xD9";
        let old_vault = container::seal(image, b"stale ciphertext");

        let mut map = SecretMap::new();
        map.set("A", "1").unwrap();
        let me_list: AccessList = Recipient::new("me", me.public_key()).into();
        let kind = create(&vault, Some(old_vault.as_slice()), &mut map, &me_list).unwrap();
        assert_eq!(kind, VaultKind::Embedded);

        let data = fs::read(&vault).unwrap();
        assert_eq!(container::strip_trailer(&data), image);
        assert!(!data.windows(16).any(|w| w == b"stale ciphertext"));

        // A later save still leaves only the original image in front.
        save(&vault, &mut map, &AccessList::new()).unwrap();
        let data = fs::read(&vault).unwrap();
        assert_eq!(container::strip_trailer(&data), image);
        assert_eq!(load(&vault, &key).unwrap().get("A"), Some("1"));
    }

    #[test]
    fn standalone_save_replaces_file_and_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let (me, key) = identity_in(&dir, "me.key");
        let vault = dir.path().join("vault.age");
        let me_list: AccessList = Recipient::new("me", me.public_key()).into();

        let mut map = SecretMap::new();
        create(&vault, None, &mut map, &me_list).unwrap();
        map.set("B", "2").unwrap();
        let kind = save(&vault, &mut map, &AccessList::new()).unwrap();

        assert_eq!(kind, VaultKind::Standalone);
        assert_eq!(load(&vault, &key).unwrap().get("B"), Some("2"));
        assert!(!dir.path().join(".vault.age.tmp").exists());
    }

    #[test]
    fn create_refuses_existing_file() {
        let dir = TempDir::new().unwrap();
        let vault = dir.path().join("secrets.jpg");
        fs::write(&vault, b"cover").unwrap();

        let result = create(&vault, None, &mut SecretMap::new(), &AccessList::new());
        assert!(matches!(result, Err(MemeVaultError::VaultAlreadyExists(_))));
        assert_eq!(fs::read(&vault).unwrap(), b"cover");
    }

    #[test]
    fn save_with_no_recipients_fails_before_writing() {
        let dir = TempDir::new().unwrap();
        let vault = dir.path().join("vault.age");
        fs::write(&vault, b"old").unwrap();

        let result = save(&vault, &mut SecretMap::new(), &AccessList::new());
        assert!(matches!(result, Err(MemeVaultError::NoRecipients)));
        assert_eq!(fs::read(&vault).unwrap(), b"old");
    }

    #[test]
    fn save_with_bad_key_leaves_map_and_file_untouched() {
        let dir = TempDir::new().unwrap();
        let (me, _key) = identity_in(&dir, "me.key");
        let vault = dir.path().join("vault.age");

        let mut map = SecretMap::new();
        create(&vault, None, &mut map, &Recipient::new("me", me.public_key()).into()).unwrap();
        let before_file = fs::read(&vault).unwrap();
        let before_map = map.clone();

        let result = save(&vault, &mut map, &Recipient::new("bad", "age1bogus").into());
        assert!(matches!(result, Err(MemeVaultError::InvalidRecipient(_))));
        assert_eq!(map, before_map);
        assert_eq!(fs::read(&vault).unwrap(), before_file);
    }

    #[test]
    fn save_unions_recorded_and_passed_recipients() {
        let dir = TempDir::new().unwrap();
        let (me, my_key) = identity_in(&dir, "me.key");
        let (bob, bob_key) = identity_in(&dir, "bob.key");
        let vault = dir.path().join("secrets.jpg");

        let mut map = SecretMap::new();
        let me_list: AccessList = Recipient::new("me", me.public_key()).into();
        create(&vault, Some(b"cover".as_slice()), &mut map, &me_list).unwrap();

        // Passing only bob must not drop me.
        map.set("TOKEN", "t").unwrap();
        save(&vault, &mut map, &Recipient::new("bob", bob.public_key()).into()).unwrap();

        assert_eq!(load(&vault, &my_key).unwrap().get("TOKEN"), Some("t"));
        assert_eq!(load(&vault, &bob_key).unwrap().get("TOKEN"), Some("t"));
        assert_eq!(map.get_recipients().len(), 2);
    }

    #[test]
    fn repeated_saves_do_not_grow_embedded_vault() {
        let dir = TempDir::new().unwrap();
        let (me, key) = identity_in(&dir, "me.key");
        let vault = dir.path().join("secrets.jpg");
        let cover = vec![0xABu8; 512];
        let me_list: AccessList = Recipient::new("me", me.public_key()).into();

        let mut map = SecretMap::new();
        map.set("A", "1").unwrap();
        create(&vault, Some(cover.as_slice()), &mut map, &me_list).unwrap();
        let first_len = fs::metadata(&vault).unwrap().len();

        for _ in 0..3 {
            save(&vault, &mut map, &me_list).unwrap();
        }

        let data = fs::read(&vault).unwrap();
        assert_eq!(data.len() as u64, first_len);
        assert_eq!(container::strip_trailer(&data), &cover[..]);
        assert_eq!(load(&vault, &key).unwrap().get("A"), Some("1"));
    }

    #[test]
    fn load_with_wrong_identity_is_decryption_failure() {
        let dir = TempDir::new().unwrap();
        let (me, _) = identity_in(&dir, "me.key");
        let (_, stranger_key) = identity_in(&dir, "stranger.key");
        let vault = dir.path().join("vault.age");

        create(&vault, None, &mut SecretMap::new(), &Recipient::new("me", me.public_key()).into())
            .unwrap();

        assert!(matches!(
            load(&vault, &stranger_key),
            Err(MemeVaultError::DecryptionFailed)
        ));
    }

    #[test]
    fn load_missing_vault() {
        let dir = TempDir::new().unwrap();
        let (_, key) = identity_in(&dir, "me.key");
        assert!(matches!(
            load(&dir.path().join("nope.jpg"), &key),
            Err(MemeVaultError::VaultNotFound(_))
        ));
    }
}
