//! Vault module: the secret map, its access list, and persistence.
//!
//! This module provides:
//! - `Recipient`, `AccessList`, and the legacy/current `RecipientList` (`recipient`)
//! - `SecretMap` with embedded recipient metadata (`secret_map`)
//! - Grant / revoke / list (`access`)
//! - `load` / `save` over the container and envelope layers (`store`)
//! - Crash-safe key rotation (`rotation`)

pub mod access;
pub mod recipient;
pub mod rotation;
pub mod secret_map;
pub mod store;

// Re-export the most commonly used items.
pub use access::{grant, list, revoke, AccessListing};
pub use recipient::{AccessList, Recipient, RecipientList};
pub use rotation::{rotate, rotate_with, RotationReport};
pub use secret_map::{is_valid_env_name, validate_secret_name, SecretMap, RECIPIENTS_KEY};
pub use store::{load, load_with_key, save, VaultKind};
