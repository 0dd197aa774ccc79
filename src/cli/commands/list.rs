//! `memevault list`: show the names of all secrets.

use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;
use crate::vault::store;

/// Execute the `list` command.
pub fn execute(ctx: &Context) -> Result<()> {
    let map = store::load(&ctx.vault_path, &ctx.identity_path)?;
    output::print_secrets_table(&map.names());
    Ok(())
}
