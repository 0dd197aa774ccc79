//! Multi-recipient authenticated encryption via the age format.
//!
//! A single ciphertext is sealed for every recipient public key at
//! once; any one of the matching private keys can open it. age
//! authenticates the whole payload, so decryption either returns the
//! exact plaintext or fails.

use std::io::{Read, Write};

use zeroize::Zeroizing;

use crate::errors::{MemeVaultError, Result};

/// Check that `public_key` is a well-formed X25519 recipient.
pub fn validate_recipient(public_key: &str) -> Result<()> {
    parse_recipient(public_key).map(|_| ())
}

fn parse_recipient(public_key: &str) -> Result<age::x25519::Recipient> {
    public_key
        .trim()
        .parse::<age::x25519::Recipient>()
        .map_err(|_| MemeVaultError::InvalidRecipient(public_key.to_string()))
}

/// Encrypt `plaintext` so that any of `recipients` can decrypt it.
///
/// Every key is parsed before anything is encrypted; one malformed
/// key fails the whole call with `InvalidRecipient`.
pub fn encrypt(plaintext: &[u8], recipients: &[&str]) -> Result<Vec<u8>> {
    let parsed = recipients
        .iter()
        .map(|key| {
            parse_recipient(key).map(|r| Box::new(r) as Box<dyn age::Recipient + Send>)
        })
        .collect::<Result<Vec<_>>>()?;

    let encryptor =
        age::Encryptor::with_recipients(parsed).ok_or(MemeVaultError::NoRecipients)?;

    let mut ciphertext = Vec::with_capacity(plaintext.len() + 256 * recipients.len());
    let mut writer = encryptor
        .wrap_output(&mut ciphertext)
        .map_err(|e| MemeVaultError::EncryptionFailed(e.to_string()))?;
    writer
        .write_all(plaintext)
        .map_err(|e| MemeVaultError::EncryptionFailed(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| MemeVaultError::EncryptionFailed(e.to_string()))?;

    Ok(ciphertext)
}

/// Decrypt `ciphertext` with the private key string `private_key`.
///
/// Returns `DecryptionFailed` if the key is not among the recipients
/// or the ciphertext was tampered with. Partial plaintext is wiped.
pub fn decrypt(ciphertext: &[u8], private_key: &str) -> Result<Zeroizing<Vec<u8>>> {
    let identity = private_key
        .trim()
        .parse::<age::x25519::Identity>()
        .map_err(|e| MemeVaultError::InvalidIdentity(e.to_string()))?;

    let decryptor = age::Decryptor::new(ciphertext).map_err(|_| MemeVaultError::DecryptionFailed)?;
    let decryptor = match decryptor {
        age::Decryptor::Recipients(d) => d,
        _ => return Err(MemeVaultError::DecryptionFailed),
    };

    let mut reader = decryptor
        .decrypt(std::iter::once(&identity as &dyn age::Identity))
        .map_err(|_| MemeVaultError::DecryptionFailed)?;

    let mut plaintext = Zeroizing::new(Vec::new());
    reader
        .read_to_end(&mut plaintext)
        .map_err(|_| MemeVaultError::DecryptionFailed)?;

    Ok(plaintext)
}
