//! Access manager: grant, revoke, and list vault recipients.
//!
//! These functions are pure: they compute a new `AccessList` from a
//! `SecretMap` and never touch the disk. Callers apply the result with
//! `SecretMap::set_recipients` and persist it with `store::save`.

use super::recipient::{AccessList, Recipient};
use super::secret_map::SecretMap;
use crate::crypto::validate_recipient;
use crate::errors::{MemeVaultError, Result};

/// What `list` found in a vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessListing {
    /// No recipients recorded: an implicit single-user (or legacy) vault.
    Implicit,
    /// The recorded recipients.
    Recorded(AccessList),
}

/// Union of the recorded recipients and `new_recipients`, by public key.
///
/// Recorded entries come first, so an existing recipient keeps its
/// name. Every new key is validated before anything is merged.
pub fn grant(map: &SecretMap, new_recipients: &AccessList) -> Result<AccessList> {
    for recipient in new_recipients {
        validate_recipient(&recipient.public_key)?;
    }

    let mut merged = map.get_recipients();
    merged.merge(new_recipients);
    Ok(merged)
}

/// Remove every recipient whose name or public key equals `target`.
///
/// Fails with `SelfRevocation` if `target` is `self_public_key` or the
/// name of an entry holding it, and with `RecipientNotFound` if nothing
/// matched.
pub fn revoke(map: &SecretMap, target: &str, self_public_key: &str) -> Result<AccessList> {
    let mut recipients = map.get_recipients();

    let hits_self = target == self_public_key
        || recipients
            .iter()
            .any(|r| r.name == target && r.public_key == self_public_key);
    if hits_self {
        return Err(MemeVaultError::SelfRevocation(target.to_string()));
    }

    let before = recipients.len();
    recipients.retain(|r| !matches_target(r, target));
    if recipients.len() == before {
        return Err(MemeVaultError::RecipientNotFound(target.to_string()));
    }

    Ok(recipients)
}

/// The recorded recipients, or `Implicit` if there are none.
pub fn list(map: &SecretMap) -> AccessListing {
    let recipients = map.get_recipients();
    if recipients.is_empty() {
        AccessListing::Implicit
    } else {
        AccessListing::Recorded(recipients)
    }
}

fn matches_target(recipient: &Recipient, target: &str) -> bool {
    recipient.name == target || recipient.public_key == target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Identity;

    fn map_with(recipients: &[Recipient]) -> SecretMap {
        let mut map = SecretMap::new();
        map.set_recipients(recipients.iter().cloned().collect());
        map
    }

    #[test]
    fn grant_rejects_malformed_key() {
        let map = SecretMap::new();
        let result = grant(&map, &Recipient::new("bob", "not-a-key").into());
        assert!(matches!(result, Err(MemeVaultError::InvalidRecipient(_))));
    }

    #[test]
    fn grant_on_implicit_vault_records_new_recipient() {
        let bob = Identity::generate();
        let map = SecretMap::new();

        let result = grant(&map, &Recipient::new("bob", bob.public_key()).into()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.find_by_key(bob.public_key()).unwrap().name, "bob");
    }

    #[test]
    fn revoke_by_name_removes_all_matches() {
        let map = map_with(&[
            Recipient::new("me", "age1me"),
            Recipient::new("bob", "age1bob-laptop"),
            Recipient::new("bob", "age1bob-desktop"),
        ]);

        let result = revoke(&map, "bob", "age1me").unwrap();
        assert_eq!(result.public_keys(), vec!["age1me"]);
    }

    #[test]
    fn revoke_by_key() {
        let map = map_with(&[Recipient::new("me", "age1me"), Recipient::new("bob", "age1bob")]);
        let result = revoke(&map, "age1bob", "age1me").unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn revoke_own_name_is_refused() {
        let map = map_with(&[Recipient::new("me", "age1me"), Recipient::new("bob", "age1bob")]);
        assert!(matches!(
            revoke(&map, "me", "age1me"),
            Err(MemeVaultError::SelfRevocation(_))
        ));
    }

    #[test]
    fn revoke_own_key_is_refused_even_if_unrecorded() {
        let map = SecretMap::new();
        assert!(matches!(
            revoke(&map, "age1me", "age1me"),
            Err(MemeVaultError::SelfRevocation(_))
        ));
    }

    #[test]
    fn revoke_unknown_target_fails() {
        let map = map_with(&[Recipient::new("me", "age1me")]);
        assert!(matches!(
            revoke(&map, "carol", "age1me"),
            Err(MemeVaultError::RecipientNotFound(_))
        ));
    }

    #[test]
    fn list_distinguishes_implicit_vault() {
        assert_eq!(list(&SecretMap::new()), AccessListing::Implicit);

        let map = map_with(&[Recipient::new("me", "age1me")]);
        match list(&map) {
            AccessListing::Recorded(recipients) => assert_eq!(recipients.len(), 1),
            AccessListing::Implicit => panic!("expected recorded recipients"),
        }
    }
}
