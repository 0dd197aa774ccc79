//! X25519 identities and the identity file.
//!
//! An identity file holds the private key on its own line followed by
//! the matching public key as a comment, so the public key can be read
//! without parsing the private key:
//!
//! ```text
//! AGE-SECRET-KEY-1...
//! # Public Key: age1...
//! ```

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use age::secrecy::ExposeSecret;
use zeroize::Zeroizing;

use crate::errors::{MemeVaultError, Result};

/// Prefix of the comment line that carries the public key.
pub const PUBLIC_KEY_PREFIX: &str = "# Public Key: ";

/// A private/public keypair belonging to one principal.
pub struct Identity {
    private_key: Zeroizing<String>,
    public_key: String,
}

impl Identity {
    /// Generate a fresh X25519 keypair.
    pub fn generate() -> Self {
        let identity = age::x25519::Identity::generate();
        Self {
            private_key: Zeroizing::new(identity.to_string().expose_secret().clone()),
            public_key: identity.to_public().to_string(),
        }
    }

    /// Parse a private key string and derive its public key.
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let identity = private_key
            .trim()
            .parse::<age::x25519::Identity>()
            .map_err(|e| MemeVaultError::InvalidIdentity(e.to_string()))?;
        Ok(Self {
            private_key: Zeroizing::new(private_key.trim().to_string()),
            public_key: identity.to_public().to_string(),
        })
    }

    /// The private key (`AGE-SECRET-KEY-1...`).
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// The public key (`age1...`).
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Render the identity file contents.
    pub fn to_file_contents(&self) -> Zeroizing<String> {
        Zeroizing::new(format!(
            "{}\n{PUBLIC_KEY_PREFIX}{}\n",
            self.private_key.as_str(),
            self.public_key
        ))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// Read the private key from an identity file.
///
/// Blank lines and `#` comments are skipped; the first remaining line
/// is the private key.
pub fn load_identity(path: &Path) -> Result<Zeroizing<String>> {
    let content = Zeroizing::new(fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => MemeVaultError::NoIdentityFound(path.to_path_buf()),
        _ => MemeVaultError::Io(e),
    })?);

    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| Zeroizing::new(line.to_string()))
        .ok_or_else(|| MemeVaultError::NoIdentityFound(path.to_path_buf()))
}

/// Read the public key from the `# Public Key:` comment of an identity file.
pub fn read_public_key(path: &Path) -> Result<String> {
    let content = Zeroizing::new(fs::read_to_string(path)?);

    content
        .lines()
        .find_map(|line| line.strip_prefix(PUBLIC_KEY_PREFIX))
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| MemeVaultError::PublicKeyNotFound(path.to_path_buf()))
}

/// Write a new identity file at `path`.
///
/// Never overwrites: an existing file is an error. On Unix the file is
/// created owner-only (0600).
pub fn write_identity_file(path: &Path, identity: &Identity) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => MemeVaultError::IdentityAlreadyExists(path.to_path_buf()),
        _ => MemeVaultError::Io(e),
    })?;

    file.write_all(identity.to_file_contents().as_bytes())?;
    file.sync_all()?;
    Ok(())
}

/// Where the key rotation workflow writes the replacement identity.
pub trait IdentityWriter {
    fn write(&self, path: &Path, identity: &Identity) -> Result<()>;
}

/// Writes identity files to the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsIdentityWriter;

impl IdentityWriter for FsIdentityWriter {
    fn write(&self, path: &Path, identity: &Identity) -> Result<()> {
        write_identity_file(path, identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn generated_identity_has_age_shape() {
        let id = Identity::generate();
        assert!(id.private_key().starts_with("AGE-SECRET-KEY-1"));
        assert!(id.public_key().starts_with("age1"));
    }

    #[test]
    fn from_private_key_derives_same_public_key() {
        let id = Identity::generate();
        let parsed = Identity::from_private_key(id.private_key()).unwrap();
        assert_eq!(parsed.public_key(), id.public_key());
    }

    #[test]
    fn from_private_key_rejects_garbage() {
        assert!(matches!(
            Identity::from_private_key("not-a-key"),
            Err(MemeVaultError::InvalidIdentity(_))
        ));
    }

    #[test]
    fn debug_does_not_leak_private_key() {
        let id = Identity::generate();
        let rendered = format!("{id:?}");
        assert!(!rendered.contains(id.private_key()));
        assert!(rendered.contains(id.public_key()));
    }

    #[test]
    fn write_then_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memevault.key");
        let id = Identity::generate();

        write_identity_file(&path, &id).unwrap();

        assert_eq!(load_identity(&path).unwrap().as_str(), id.private_key());
        assert_eq!(read_public_key(&path).unwrap(), id.public_key());
    }

    #[test]
    fn write_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memevault.key");
        write_identity_file(&path, &Identity::generate()).unwrap();

        let result = write_identity_file(&path, &Identity::generate());
        assert!(matches!(result, Err(MemeVaultError::IdentityAlreadyExists(_))));
    }

    #[test]
    fn load_skips_comments_and_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("id.key");
        fs::write(&path, "\n# created: today\n\n  AGE-SECRET-KEY-1ABC  \n# trailing\n").unwrap();

        assert_eq!(load_identity(&path).unwrap().as_str(), "AGE-SECRET-KEY-1ABC");
    }

    #[test]
    fn load_fails_when_only_comments() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("id.key");
        fs::write(&path, "# Public Key: age1xyz\n\n").unwrap();

        assert!(matches!(
            load_identity(&path),
            Err(MemeVaultError::NoIdentityFound(_))
        ));
    }

    #[test]
    fn read_public_key_fails_without_comment() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("id.key");
        fs::write(&path, "AGE-SECRET-KEY-1ABC\n").unwrap();

        assert!(matches!(
            read_public_key(&path),
            Err(MemeVaultError::PublicKeyNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn identity_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memevault.key");
        write_identity_file(&path, &Identity::generate()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
