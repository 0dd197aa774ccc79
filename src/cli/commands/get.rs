//! `memevault get`: print one secret, or every `KEY=VALUE` pair.

use crate::cli::Context;
use crate::errors::{MemeVaultError, Result};
use crate::vault::store;

/// Execute the `get` command.
pub fn execute(ctx: &Context, key: Option<&str>) -> Result<()> {
    let map = store::load(&ctx.vault_path, &ctx.identity_path)?;

    match key {
        Some(key) => {
            let value = map
                .get(key)
                .ok_or_else(|| MemeVaultError::SecretNotFound(key.to_string()))?;
            // Raw value only, so it can be piped.
            println!("{value}");
        }
        None => {
            for (name, value) in map.iter() {
                println!("{name}={value}");
            }
        }
    }

    Ok(())
}
