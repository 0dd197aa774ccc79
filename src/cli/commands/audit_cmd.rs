//! `memevault audit`: show recorded vault writes, newest first.
//!
//! Access changes show the recipient's key and rotations show the old and
//! new key, so the table answers "who could read this vault, and since when".

use chrono::{DateTime, Duration, Utc};
use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::audit::{AuditFilter, AuditLog, AuditRecord, OPS};
use crate::cli::output;
use crate::cli::Context;
use crate::errors::{MemeVaultError, Result};

/// Characters of an age key kept before eliding the rest.
const KEY_PREFIX: usize = 16;

/// Execute the `audit` command.
pub fn execute(
    ctx: &Context,
    last: usize,
    since: Option<&str>,
    op: Option<&str>,
    key: Option<&str>,
) -> Result<()> {
    if let Some(op) = op {
        if !OPS.contains(&op) {
            return Err(MemeVaultError::CommandFailed(format!(
                "unknown operation '{op}'; expected one of: {}",
                OPS.join(", ")
            )));
        }
    }

    let filter = AuditFilter {
        limit: last,
        since: since.map(|s| parse_since(s, Utc::now())).transpose()?,
        op: op.map(str::to_string),
        public_key: key.map(str::to_string),
    };

    let records = AuditLog::open(&ctx.state_dir)?.recent(&filter)?;
    if records.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "Vault", "Detail"]);
    for record in &records {
        table.add_row(vec![
            record.at.format("%Y-%m-%d %H:%M:%S").to_string(),
            paint_op(&record.op),
            vault_cell(record),
            detail_cell(record),
        ]);
    }

    println!("{}", style(format!("{} audit entries:", records.len())).bold());
    println!("{table}");
    Ok(())
}

/// Resolve an age like `90s`, `30m`, `24h`, `7d` or `2w` against `now`.
fn parse_since(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let invalid = || {
        MemeVaultError::CommandFailed(format!(
            "invalid duration '{input}': use a number followed by s, m, h, d or w"
        ))
    };

    let input = input.trim();
    let split = input.len().checked_sub(1).ok_or_else(invalid)?;
    if !input.is_char_boundary(split) {
        return Err(invalid());
    }
    let (digits, unit) = input.split_at(split);
    let count: i64 = digits.parse().map_err(|_| invalid())?;
    if count < 0 {
        return Err(invalid());
    }

    let per_unit = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        "w" => 604_800,
        _ => return Err(invalid()),
    };
    let seconds = count.checked_mul(per_unit).ok_or_else(invalid)?;
    Duration::try_seconds(seconds)
        .and_then(|d| now.checked_sub_signed(d))
        .ok_or_else(invalid)
}

fn paint_op(op: &str) -> String {
    match op {
        "init" | "grant" => style(op).green().to_string(),
        "add" | "update" => style(op).blue().to_string(),
        "unset" | "revoke" => style(op).red().to_string(),
        "rotate" => style(op).yellow().to_string(),
        _ => op.to_string(),
    }
}

fn vault_cell(record: &AuditRecord) -> String {
    match &record.vault_kind {
        Some(kind) => format!("{} ({kind})", record.vault),
        None => record.vault.clone(),
    }
}

fn detail_cell(record: &AuditRecord) -> String {
    let key = record.public_key.as_deref().map(short_key);
    match record.op.as_str() {
        "grant" | "revoke" => format!(
            "{} ({})",
            record.recipient.as_deref().unwrap_or("?"),
            key.unwrap_or_default()
        ),
        "rotate" => format!(
            "{} -> {}",
            record.old_public_key.as_deref().map(short_key).unwrap_or_default(),
            key.unwrap_or_default()
        ),
        "init" => format!("owner {}", key.unwrap_or_default()),
        _ => record.secret.clone().unwrap_or_else(|| "-".into()),
    }
}

fn short_key(key: &str) -> String {
    match key.char_indices().nth(KEY_PREFIX) {
        Some((cut, _)) => format!("{}...", &key[..cut]),
        None => key.to_string(),
    }
}
