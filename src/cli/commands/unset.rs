//! `memevault unset`: remove a secret from the vault.

use dialoguer::Confirm;

use crate::audit::AuditEvent;
use crate::cli::output;
use crate::cli::{log_audit, own_access, Context};
use crate::errors::{MemeVaultError, Result};
use crate::vault::store;

/// Execute the `unset` command.
pub fn execute(ctx: &Context, key: &str, force: bool) -> Result<()> {
    let mut map = store::load(&ctx.vault_path, &ctx.identity_path)?;
    if !map.contains(key) {
        return Err(MemeVaultError::SecretNotFound(key.to_string()));
    }

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove secret '{key}'?"))
            .default(false)
            .interact()
            .map_err(|e| MemeVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    map.remove(key)?;
    let kind = store::save(&ctx.vault_path, &mut map, &own_access(ctx)?)?;

    log_audit(
        ctx,
        Some(kind),
        AuditEvent::SecretUnset {
            name: key.to_string(),
        },
    );
    output::success(&format!("Removed secret '{key}'"));

    Ok(())
}
