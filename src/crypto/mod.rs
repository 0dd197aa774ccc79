//! Cryptographic layer for Memevault.
//!
//! This module provides:
//! - X25519 identities and the on-disk identity file (`identity`)
//! - Multi-recipient age encryption and decryption (`envelope`)

pub mod envelope;
pub mod identity;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, Identity, ...};
pub use envelope::{decrypt, encrypt, validate_recipient};
pub use identity::{
    load_identity, read_public_key, write_identity_file, FsIdentityWriter, Identity,
    IdentityWriter, PUBLIC_KEY_PREFIX,
};
