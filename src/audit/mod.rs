//! Audit log: a local history of vault writes.
//!
//! Each entry is one typed [`AuditEvent`] against one vault file. Access
//! changes keep the recipient's public key and rotations keep both the
//! old and new key in their own columns, so `memevault audit` can show
//! who could read the vault at any point. With the `audit-log` feature
//! entries are stored in SQLite at `<state_dir>/audit.db`.

#[cfg(feature = "audit-log")]
mod db;

#[cfg(feature = "audit-log")]
pub use db::{AuditFilter, AuditLog, AuditRecord};

/// Every value the `op` column can hold.
pub const OPS: &[&str] = &["init", "add", "update", "unset", "grant", "revoke", "rotate"];

type Columns<'a> = (Option<&'a str>, Option<&'a str>, Option<&'a str>, Option<&'a str>);

/// Something that changed a vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    Init { owner_key: String },
    SecretSet { name: String, existed: bool },
    SecretUnset { name: String },
    Grant { name: String, public_key: String },
    Revoke { name: String, public_key: String },
    Rotate { old_key: String, new_key: String },
}

impl AuditEvent {
    /// Short operation label stored in the `op` column.
    pub fn op(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::SecretSet { existed: false, .. } => "add",
            Self::SecretSet { existed: true, .. } => "update",
            Self::SecretUnset { .. } => "unset",
            Self::Grant { .. } => "grant",
            Self::Revoke { .. } => "revoke",
            Self::Rotate { .. } => "rotate",
        }
    }

    /// `(secret, recipient, public_key, old_public_key)` column values.
    #[cfg_attr(not(feature = "audit-log"), allow(dead_code))]
    pub(crate) fn columns(&self) -> Columns<'_> {
        match self {
            Self::Init { owner_key } => (None, None, Some(owner_key.as_str()), None),
            Self::SecretSet { name, .. } | Self::SecretUnset { name } => {
                (Some(name.as_str()), None, None, None)
            }
            Self::Grant { name, public_key } | Self::Revoke { name, public_key } => {
                (None, Some(name.as_str()), Some(public_key.as_str()), None)
            }
            Self::Rotate { old_key, new_key } => {
                (None, None, Some(new_key.as_str()), Some(old_key.as_str()))
            }
        }
    }
}
