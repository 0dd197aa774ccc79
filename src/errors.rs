use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in Memevault.
#[derive(Debug, Error)]
pub enum MemeVaultError {
    // --- Container errors ---
    #[error("No vault payload found: {0}")]
    PayloadNotFound(String),

    #[error(
        "Failed to re-embed payload into {}: {reason} (previous trailer {})",
        .path.display(),
        restored_note(.restored)
    )]
    ReEmbedFailed {
        path: PathBuf,
        restored: bool,
        reason: String,
    },

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error(
        "Decryption failed; this identity has no access to the vault, or the data is corrupted"
    )]
    DecryptionFailed,

    #[error("Invalid recipient public key '{0}'")]
    InvalidRecipient(String),

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Cannot encrypt a vault with no recipients")]
    NoRecipients,

    // --- Identity file errors ---
    #[error("No identity found in {0}")]
    NoIdentityFound(PathBuf),

    #[error("No '# Public Key:' line found in {0}")]
    PublicKeyNotFound(PathBuf),

    #[error("Identity already exists at {0}")]
    IdentityAlreadyExists(PathBuf),

    // --- Vault errors ---
    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    #[error("Malformed vault contents: {0}")]
    MalformedVault(String),

    #[error("Secret '{0}' not found")]
    SecretNotFound(String),

    #[error("Invalid secret name '{0}'; must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidSecretName(String),

    // --- Access errors ---
    #[error("Refusing to revoke '{0}': it resolves to your own key")]
    SelfRevocation(String),

    #[error("Recipient '{0}' not found")]
    RecipientNotFound(String),

    // --- Rotation errors ---
    #[error(
        "CRITICAL: key rotation failed while {stage}: {reason}. \
         The vault is already encrypted for the NEW key. Backup of the old identity: {}. \
         Save this private key manually NOW:\n{private_key}\n# Public Key: {public_key}",
        backup_note(.backup, .restored)
    )]
    RotationHazard {
        stage: &'static str,
        reason: String,
        backup: Option<PathBuf>,
        restored: bool,
        private_key: String,
        public_key: String,
    },

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- Collaborator errors ---
    #[error("Cover image unavailable: {0}")]
    CoverImageFailed(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("Child process exited with code {0}")]
    ChildProcessFailed(i32),

    #[error("No command specified; use `memevault run -- <command>`")]
    NoCommandSpecified,

    #[error("Audit error: {0}")]
    AuditError(String),
}

fn restored_note(restored: &bool) -> &'static str {
    if *restored {
        "was restored"
    } else {
        "could NOT be restored; the file now holds only the cover image"
    }
}

fn backup_note(backup: &Option<PathBuf>, restored: &bool) -> String {
    match backup {
        Some(path) if *restored => format!("{} (restored to its original name)", path.display()),
        Some(path) => path.display().to_string(),
        None => "none (old identity untouched)".to_string(),
    }
}

/// Convenience type alias for Memevault results.
pub type Result<T> = std::result::Result<T, MemeVaultError>;
