//! `memevault scan`: find env vars the code uses but the vault lacks.

use std::path::PathBuf;

use console::style;

use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;
use crate::scan::Scanner;
use crate::vault::store;

/// Execute the `scan` command.
pub fn execute(ctx: &Context, path: Option<&str>) -> Result<()> {
    let root = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()?,
    };

    let scanner = Scanner::new()?;
    let found = scanner.scan_tree(&root);

    if found.is_empty() {
        output::info(&format!("No environment variable usage found in {}", root.display()));
        return Ok(());
    }

    // Unreadable vault: report everything as missing.
    let map = match store::load(&ctx.vault_path, &ctx.identity_path) {
        Ok(map) => Some(map),
        Err(e) => {
            output::warning(&format!("Could not load vault ({e}); treating all as missing."));
            None
        }
    };

    let missing: Vec<&String> = found
        .iter()
        .filter(|name| !map.as_ref().is_some_and(|m| m.contains(name)))
        .collect();

    output::info(&format!(
        "Found {} environment variables in {}",
        found.len(),
        root.display()
    ));

    if missing.is_empty() {
        output::success("Every variable used in code is in the vault.");
        return Ok(());
    }

    println!(
        "{}",
        style(format!("{} missing from the vault:", missing.len())).bold()
    );
    for name in &missing {
        println!("  {} {name}", style("-").red());
    }
    output::tip("Add them with `memevault set <KEY> <VALUE>`.");

    Ok(())
}
