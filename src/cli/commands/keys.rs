//! `memevault keys`: show or rotate your keypair.

use dialoguer::Confirm;

use crate::audit::AuditEvent;
use crate::cli::output;
use crate::cli::{log_audit, own_public_key, Context, KeysAction};
use crate::errors::{MemeVaultError, Result};
use crate::vault;

/// Execute a `keys` subcommand.
pub fn execute(ctx: &Context, action: &KeysAction) -> Result<()> {
    match action {
        KeysAction::Show => show(ctx),
        KeysAction::Rotate { force } => rotate(ctx, *force),
    }
}

fn show(ctx: &Context) -> Result<()> {
    if !ctx.identity_path.exists() {
        return Err(MemeVaultError::NoIdentityFound(ctx.identity_path.clone()));
    }
    // Bare key on stdout so it can be piped to a teammate.
    println!("{}", own_public_key(ctx)?);
    Ok(())
}

fn rotate(ctx: &Context, force: bool) -> Result<()> {
    if !force {
        let confirmed = Confirm::new()
            .with_prompt("Generate a new keypair and re-encrypt the vault for it?")
            .default(false)
            .interact()
            .map_err(|e| MemeVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    // A RotationHazard carries the new private key in its message;
    // main prints it through output::error.
    let report = vault::rotate(&ctx.vault_path, &ctx.identity_path)?;

    for w in &report.warnings {
        output::warning(w);
    }

    log_audit(
        ctx,
        Some(report.vault_kind),
        AuditEvent::Rotate {
            old_key: report.old_public_key.clone(),
            new_key: report.new_public_key.clone(),
        },
    );

    output::success("Key rotated. The vault is now encrypted for your new key.");
    output::info(&format!("Old public key: {}", report.old_public_key));
    output::info(&format!("New public key: {}", report.new_public_key));
    output::info(&format!("Old identity backed up to {}", report.backup_path.display()));
    output::tip("Send your new public key to anyone who maintains other copies of the vault.");

    Ok(())
}
