//! `memevault init`: create an identity (if needed) and a new vault.

use std::fs;
use std::path::Path;

use crate::audit::AuditEvent;
use crate::cli::output;
use crate::cli::{log_audit, Context};
use crate::cover::{self, CoverImage};
use crate::crypto::{read_public_key, write_identity_file, Identity};
use crate::errors::{MemeVaultError, Result};
use crate::vault::{store, AccessList, Recipient, SecretMap};

/// Seed entry so a fresh vault is never empty.
const EXAMPLE_KEY: &str = "Example";
const EXAMPLE_VALUE: &str = "Welcome to Memevault";

/// Execute the `init` command.
pub fn execute(ctx: &Context, image: Option<&str>, raw: bool, name: &str) -> Result<()> {
    if ctx.vault_path.exists() {
        return Err(MemeVaultError::VaultAlreadyExists(ctx.vault_path.clone()));
    }

    let public_key = ensure_identity(&ctx.identity_path)?;

    let cover = if raw {
        None
    } else {
        Some(choose_cover(ctx, image)?)
    };

    let mut map = SecretMap::new();
    map.set(EXAMPLE_KEY, EXAMPLE_VALUE)?;
    let recipients = AccessList::from(Recipient::new(name, public_key.as_str()));

    let kind = store::create(
        &ctx.vault_path,
        cover.as_ref().map(|c| c.bytes.as_slice()),
        &mut map,
        &recipients,
    )?;

    log_audit(
        ctx,
        Some(kind),
        AuditEvent::Init {
            owner_key: public_key.clone(),
        },
    );

    output::success(&format!("Created vault at {}", ctx.vault_path.display()));
    if let Some(c) = &cover {
        output::info(&format!("Cover image: {}", c.source));
    }
    output::info(&format!("Your public key: {public_key}"));
    output::tip("Share your public key with teammates so they can `memevault grant` you.");

    Ok(())
}

/// Reuse the identity at `path`, or generate one. Returns its public key.
fn ensure_identity(path: &Path) -> Result<String> {
    if path.exists() {
        let key = read_public_key(path)?;
        output::info(&format!("Using existing identity at {}", path.display()));
        return Ok(key);
    }

    if let Some(dir) = path.parent() {
        create_keys_dir(dir)?;
    }

    let identity = Identity::generate();
    write_identity_file(path, &identity)?;
    output::success(&format!("Generated new identity at {}", path.display()));
    Ok(identity.public_key().to_string())
}

/// Create the keys directory, owner-only on Unix.
fn create_keys_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }
    fs::create_dir_all(dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
    }

    Ok(())
}

fn choose_cover(ctx: &Context, image: Option<&str>) -> Result<CoverImage> {
    if let Some(path) = image {
        return cover::from_file(Path::new(path));
    }

    let (cover, failure) = cover::random_or_placeholder(&ctx.settings);
    if let Some(e) = failure {
        output::warning(&format!("Could not fetch a cover image ({e}); using placeholder."));
    }
    Ok(cover)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn ensure_identity_generates_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys").join("me.key");

        let first = ensure_identity(&path).unwrap();
        let second = ensure_identity(&path).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("age1"));
    }

    #[cfg(unix)]
    #[test]
    fn keys_dir_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let keys = dir.path().join("keys");
        create_keys_dir(&keys).unwrap();

        let mode = fs::metadata(&keys).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn ensure_identity_requires_public_key_comment() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bare.key");
        let identity = Identity::generate();
        fs::write(&path, format!("{}\n", identity.private_key())).unwrap();

        let err = ensure_identity(&path).unwrap_err();
        assert!(matches!(err, MemeVaultError::PublicKeyNotFound(_)));
    }
}
