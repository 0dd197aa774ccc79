//! SQLite storage for audit events.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use super::AuditEvent;
use crate::errors::{MemeVaultError, Result};
use crate::vault::VaultKind;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS vault_events (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    at_ms           INTEGER NOT NULL,
    op              TEXT    NOT NULL,
    vault           TEXT    NOT NULL,
    vault_kind      TEXT,
    secret          TEXT,
    recipient       TEXT,
    public_key      TEXT,
    old_public_key  TEXT
);
CREATE INDEX IF NOT EXISTS vault_events_at ON vault_events (at_ms);
";

/// One stored row.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub at: DateTime<Utc>,
    pub op: String,
    pub vault: String,
    pub vault_kind: Option<String>,
    pub secret: Option<String>,
    pub recipient: Option<String>,
    pub public_key: Option<String>,
    pub old_public_key: Option<String>,
}

impl AuditRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let at_ms: i64 = row.get("at_ms")?;
        Ok(Self {
            at: DateTime::from_timestamp_millis(at_ms).unwrap_or_default(),
            op: row.get("op")?,
            vault: row.get("vault")?,
            vault_kind: row.get("vault_kind")?,
            secret: row.get("secret")?,
            recipient: row.get("recipient")?,
            public_key: row.get("public_key")?,
            old_public_key: row.get("old_public_key")?,
        })
    }
}

/// Which rows `AuditLog::recent` returns.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub limit: usize,
    pub since: Option<DateTime<Utc>>,
    pub op: Option<String>,
    pub public_key: Option<String>,
}

/// Handle on the audit database.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    pub fn open(state_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(state_dir)?;
        let path = Self::db_path(state_dir);
        let conn = Connection::open(&path).map_err(audit_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        }

        conn.execute_batch(SCHEMA).map_err(audit_err)?;
        Ok(Self { conn })
    }

    pub fn db_path(state_dir: &Path) -> PathBuf {
        state_dir.join("audit.db")
    }

    /// Append `event` for `vault`. `kind` is how the vault was written,
    /// when the event wrote it.
    pub fn record(
        &self,
        vault: &Path,
        kind: Option<VaultKind>,
        event: &AuditEvent,
    ) -> Result<()> {
        let (secret, recipient, public_key, old_public_key) = event.columns();
        self.conn
            .execute(
                "INSERT INTO vault_events
                     (at_ms, op, vault, vault_kind, secret, recipient, public_key, old_public_key)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    Utc::now().timestamp_millis(),
                    event.op(),
                    vault.display().to_string(),
                    kind.map(kind_label),
                    secret,
                    recipient,
                    public_key,
                    old_public_key,
                ],
            )
            .map_err(audit_err)?;
        Ok(())
    }

    /// Newest-first rows matching `filter`.
    ///
    /// `filter.public_key` matches either key column, so a rotated key
    /// shows both the rotation and its earlier grants.
    pub fn recent(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT * FROM vault_events
                 WHERE (?1 IS NULL OR at_ms >= ?1)
                   AND (?2 IS NULL OR op = ?2)
                   AND (?3 IS NULL OR public_key = ?3 OR old_public_key = ?3)
                 ORDER BY id DESC
                 LIMIT ?4",
            )
            .map_err(audit_err)?;

        let limit = i64::try_from(filter.limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(
                params![
                    filter.since.map(|t| t.timestamp_millis()),
                    filter.op,
                    filter.public_key,
                    limit,
                ],
                AuditRecord::from_row,
            )
            .map_err(audit_err)?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(audit_err)
    }
}

fn kind_label(kind: VaultKind) -> &'static str {
    match kind {
        VaultKind::Embedded => "embedded",
        VaultKind::Standalone => "standalone",
    }
}

fn audit_err(e: rusqlite::Error) -> MemeVaultError {
    MemeVaultError::AuditError(e.to_string())
}
