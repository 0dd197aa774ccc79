//! `memevault run`: inject secrets into a child process.

use std::process::Command;

use crate::cli::output;
use crate::cli::Context;
use crate::errors::{MemeVaultError, Result};
use crate::vault::{is_valid_env_name, store};

/// Execute the `run` command.
pub fn execute(ctx: &Context, command: &[String], clean_env: bool) -> Result<()> {
    let (program, args) = command
        .split_first()
        .ok_or(MemeVaultError::NoCommandSpecified)?;

    let map = store::load(&ctx.vault_path, &ctx.identity_path)?;

    let mut injected = Vec::with_capacity(map.len());
    for (name, value) in map.iter() {
        if is_valid_env_name(name) {
            injected.push((name, value));
        } else {
            output::warning(&format!("Skipping '{name}': not a valid environment variable name"));
        }
    }

    let scope = if clean_env { "clean environment" } else { "environment" };
    output::success(&format!("Injected {} secrets into {scope}", injected.len()));

    let mut cmd = Command::new(program);
    cmd.args(args);

    if clean_env {
        // Start with a completely empty environment: only vault secrets.
        cmd.env_clear();
    }

    let status = cmd.envs(injected).status()?;

    // Forward the child's exit code.
    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(MemeVaultError::ChildProcessFailed(code)),
        None => Err(MemeVaultError::CommandFailed(
            "child process terminated by signal".into(),
        )),
    }
}
