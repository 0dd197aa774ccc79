//! `memevault set`: add or update a secret in the vault.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::audit::AuditEvent;
use crate::cli::output;
use crate::cli::{log_audit, own_access, Context};
use crate::errors::{MemeVaultError, Result};
use crate::vault::{store, validate_secret_name};

/// Execute the `set` command.
pub fn execute(ctx: &Context, key: &str, value: Option<&str>) -> Result<()> {
    validate_secret_name(key)?;

    // Determine the secret value from one of three sources.
    let secret_value = Zeroizing::new(if let Some(v) = value {
        output::warning("Value provided on command line; it may appear in shell history.");
        v.to_string()
    } else if !io::stdin().is_terminal() {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf.trim_end().to_string()
    } else {
        dialoguer::Password::new()
            .with_prompt(format!("Enter value for {key}"))
            .interact()
            .map_err(|e| MemeVaultError::CommandFailed(format!("input prompt: {e}")))?
    });

    let mut map = store::load(&ctx.vault_path, &ctx.identity_path)?;
    let existed = map.set(key, &secret_value)?;
    let kind = store::save(&ctx.vault_path, &mut map, &own_access(ctx)?)?;

    log_audit(
        ctx,
        Some(kind),
        AuditEvent::SecretSet {
            name: key.to_string(),
            existed,
        },
    );

    let op_detail = if existed { "updated" } else { "added" };
    output::success(&format!(
        "Secret '{key}' {op_detail} ({} total)",
        map.len()
    ));
    output::tip("Run your app: memevault run -- <command>");

    Ok(())
}
