//! `memevault access`: list or revoke vault recipients.

use dialoguer::Confirm;

use crate::audit::AuditEvent;
use crate::cli::output;
use crate::cli::{log_audit, own_public_key, AccessAction, Context};
use crate::errors::{MemeVaultError, Result};
use crate::vault::{self, store, AccessList};

/// Execute an `access` subcommand.
pub fn execute(ctx: &Context, action: &AccessAction) -> Result<()> {
    match action {
        AccessAction::List => list(ctx),
        AccessAction::Remove { target, force } => remove(ctx, target, *force),
    }
}

fn list(ctx: &Context) -> Result<()> {
    let map = store::load(&ctx.vault_path, &ctx.identity_path)?;
    let own = own_public_key(ctx).ok();
    output::print_access_listing(&vault::list(&map), own.as_deref());
    Ok(())
}

fn remove(ctx: &Context, target: &str, force: bool) -> Result<()> {
    let mut map = store::load(&ctx.vault_path, &ctx.identity_path)?;
    let own = own_public_key(ctx)?;

    // Validate before prompting.
    let remaining = vault::revoke(&map, target, &own)?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Revoke access for '{target}'?"))
            .default(false)
            .interact()
            .map_err(|e| MemeVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let removed: Vec<AuditEvent> = map
        .get_recipients()
        .iter()
        .filter(|r| !remaining.contains_key(&r.public_key))
        .map(|r| AuditEvent::Revoke {
            name: r.name.clone(),
            public_key: r.public_key.clone(),
        })
        .collect();

    map.set_recipients(remaining);
    let kind = store::save(&ctx.vault_path, &mut map, &AccessList::new())?;

    for event in removed {
        log_audit(ctx, Some(kind), event);
    }
    output::success(&format!(
        "Revoked '{target}' ({} recipients remain)",
        map.get_recipients().len()
    ));
    output::warning("Copies they already pulled stay readable. Rotate the secrets themselves.");

    Ok(())
}
