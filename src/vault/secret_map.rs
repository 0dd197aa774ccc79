//! The decrypted contents of a vault: user secrets plus recipient metadata.
//!
//! On disk the plaintext is one flat JSON object of string values. The
//! recorded recipients live under a reserved key inside that object so
//! that everything is encrypted together:
//!
//! ```json
//! { "DB_PASS": "x", "_envault_recipients": "[{\"name\":\"me\",\"public_key\":\"age1...\"}]" }
//! ```
//!
//! In memory the two are kept apart: the reserved key never shows up
//! in `get`, `names`, or `len`.

use std::collections::BTreeMap;

use zeroize::Zeroizing;

use super::recipient::{AccessList, RecipientList};
use crate::errors::{MemeVaultError, Result};

/// Reserved key that carries the serialized recipient list.
pub const RECIPIENTS_KEY: &str = "_envault_recipients";

/// In-memory secret map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretMap {
    /// User secrets, name -> value.
    secrets: BTreeMap<String, String>,

    /// Recorded recipients. `None` means no metadata (implicit vault).
    recipients: Option<RecipientList>,
}

impl SecretMap {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    /// Parse decrypted vault plaintext.
    ///
    /// Metadata that matches neither recipient format is dropped, which
    /// is the same as a vault with no recorded recipients.
    pub fn decode(plaintext: &[u8]) -> Result<Self> {
        let mut secrets: BTreeMap<String, String> = serde_json::from_slice(plaintext)
            .map_err(|e| MemeVaultError::MalformedVault(format!("secrets JSON: {e}")))?;

        let recipients = secrets
            .remove(RECIPIENTS_KEY)
            .and_then(|raw| RecipientList::parse(&raw));

        Ok(Self {
            secrets,
            recipients,
        })
    }

    /// Serialize to vault plaintext. Recipients are always written in
    /// the current format.
    pub fn encode(&self) -> Result<Zeroizing<Vec<u8>>> {
        let mut object: BTreeMap<&str, String> = self
            .secrets
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();

        if self.recipients.is_some() {
            let metadata = serde_json::to_string(&self.get_recipients())
                .map_err(|e| MemeVaultError::SerializationError(format!("recipients: {e}")))?;
            object.insert(RECIPIENTS_KEY, metadata);
        }

        let bytes = serde_json::to_vec(&object)
            .map_err(|e| MemeVaultError::SerializationError(format!("secrets: {e}")))?;

        for value in object.values_mut() {
            zeroize::Zeroize::zeroize(value);
        }

        Ok(Zeroizing::new(bytes))
    }

    // ------------------------------------------------------------------
    // Recipient metadata
    // ------------------------------------------------------------------

    /// The recorded recipients, normalized. Empty if none are recorded.
    pub fn get_recipients(&self) -> AccessList {
        self.recipients
            .as_ref()
            .map(RecipientList::to_access_list)
            .unwrap_or_default()
    }

    /// Replace the recorded recipients.
    pub fn set_recipients(&mut self, recipients: AccessList) {
        self.recipients = Some(RecipientList::Current(recipients.iter().cloned().collect()));
    }

    /// The recipient metadata exactly as decoded, if any.
    pub fn recipient_list(&self) -> Option<&RecipientList> {
        self.recipients.as_ref()
    }

    // ------------------------------------------------------------------
    // Secret operations
    // ------------------------------------------------------------------

    pub fn get(&self, name: &str) -> Option<&str> {
        self.secrets.get(name).map(String::as_str)
    }

    /// Add or update a secret. Returns `true` if it already existed.
    pub fn set(&mut self, name: &str, value: &str) -> Result<bool> {
        validate_secret_name(name)?;
        Ok(self
            .secrets
            .insert(name.to_string(), value.to_string())
            .is_some())
    }

    /// Remove a secret, returning its value.
    pub fn remove(&mut self, name: &str) -> Result<String> {
        self.secrets
            .remove(name)
            .ok_or_else(|| MemeVaultError::SecretNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.secrets.contains_key(name)
    }

    /// Secret names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.secrets.keys().map(String::as_str).collect()
    }

    /// `(name, value)` pairs, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.secrets.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

/// Returns `true` if `name` is usable as an environment variable name:
/// `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_env_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_alphabetic() || first == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Validate a user secret name. The reserved metadata key is rejected.
pub fn validate_secret_name(name: &str) -> Result<()> {
    if name == RECIPIENTS_KEY || !is_valid_env_name(name) {
        return Err(MemeVaultError::InvalidSecretName(name.to_string()));
    }
    Ok(())
}
