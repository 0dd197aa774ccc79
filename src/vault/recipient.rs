//! Recipients and the access list recorded inside a vault.
//!
//! Two generations of the recorded list exist on disk:
//!
//! - **V1 (legacy)**: a JSON array of bare public keys.
//! - **V2 (current)**: a JSON array of `{ "name", "public_key" }` records.
//!
//! Both decode into `RecipientList`; `AccessList` is the normalized form.

use serde::{Deserialize, Serialize};

/// How many leading characters of a public key go into a legacy name.
const LEGACY_NAME_KEY_CHARS: usize = 12;

/// A principal allowed to decrypt the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Display label (e.g. "alice"). Not used for cryptography.
    pub name: String,

    /// X25519 recipient string (`age1...`).
    pub public_key: String,
}

impl Recipient {
    pub fn new(name: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public_key: public_key.into(),
        }
    }

    /// Promote a bare legacy key to a recipient with a synthetic name.
    pub fn from_legacy_key(public_key: &str) -> Self {
        let prefix: String = public_key.chars().take(LEGACY_NAME_KEY_CHARS).collect();
        Self::new(format!("legacy-{prefix}"), public_key)
    }
}

/// The recorded recipient list, as found on disk.
///
/// Deserialization tries the current shape first and falls back to the
/// legacy one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RecipientList {
    Current(Vec<Recipient>),
    Legacy(Vec<String>),
}

impl RecipientList {
    /// Parse the raw metadata string. `None` if it matches neither shape.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }

    /// Normalize into a deduplicated `AccessList`.
    pub fn to_access_list(&self) -> AccessList {
        match self {
            Self::Current(recipients) => recipients.iter().cloned().collect(),
            Self::Legacy(keys) => keys.iter().map(|k| Recipient::from_legacy_key(k)).collect(),
        }
    }
}

/// An ordered list of recipients, unique by public key.
///
/// The first entry seen for a key wins; later duplicates (even with a
/// different name) are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccessList(Vec<Recipient>);

impl AccessList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `recipient` unless its key is already present.
    /// Returns `true` if it was added.
    pub fn push(&mut self, recipient: Recipient) -> bool {
        if self.contains_key(&recipient.public_key) {
            return false;
        }
        self.0.push(recipient);
        true
    }

    /// Append every entry of `other` whose key is not yet present.
    pub fn merge(&mut self, other: &AccessList) {
        for recipient in other {
            self.push(recipient.clone());
        }
    }

    pub fn contains_key(&self, public_key: &str) -> bool {
        self.0.iter().any(|r| r.public_key == public_key)
    }

    pub fn find_by_key(&self, public_key: &str) -> Option<&Recipient> {
        self.0.iter().find(|r| r.public_key == public_key)
    }

    /// Keep only the entries for which `keep` returns `true`.
    pub fn retain(&mut self, keep: impl FnMut(&Recipient) -> bool) {
        self.0.retain(keep);
    }

    /// Public keys in list order, ready for encryption.
    pub fn public_keys(&self) -> Vec<&str> {
        self.0.iter().map(|r| r.public_key.as_str()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Recipient> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Recipient> for AccessList {
    fn from_iter<I: IntoIterator<Item = Recipient>>(iter: I) -> Self {
        let mut list = Self::new();
        for recipient in iter {
            list.push(recipient);
        }
        list
    }
}

impl From<Recipient> for AccessList {
    fn from(recipient: Recipient) -> Self {
        Self(vec![recipient])
    }
}

impl<'a> IntoIterator for &'a AccessList {
    type Item = &'a Recipient;
    type IntoIter = std::slice::Iter<'a, Recipient>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
