//! `memevault grant`: give another public key access to the vault.

use crate::audit::AuditEvent;
use crate::cli::output;
use crate::cli::{log_audit, own_access, Context};
use crate::errors::Result;
use crate::vault::{self, store, AccessList, Recipient};

/// Execute the `grant` command.
pub fn execute(ctx: &Context, name: &str, public_key: &str) -> Result<()> {
    let mut map = store::load(&ctx.vault_path, &ctx.identity_path)?;
    let already = map.get_recipients().contains_key(public_key);

    // Own key goes first so an implicit vault records its owner.
    let mut additions = own_access(ctx)?;
    additions.push(Recipient::new(name, public_key));

    let updated = vault::grant(&map, &additions)?;
    map.set_recipients(updated);
    let kind = store::save(&ctx.vault_path, &mut map, &AccessList::new())?;

    if already {
        output::info(&format!("{public_key} already had access; vault re-encrypted."));
        return Ok(());
    }

    log_audit(
        ctx,
        Some(kind),
        AuditEvent::Grant {
            name: name.to_string(),
            public_key: public_key.to_string(),
        },
    );
    output::success(&format!(
        "Granted access to '{name}' ({} recipients total)",
        map.get_recipients().len()
    ));
    output::tip("Commit the updated vault so they can pull it.");

    Ok(())
}
