//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

use crate::config::Settings;
use crate::crypto::{load_identity, read_public_key, Identity};
use crate::errors::Result;
use crate::audit::AuditEvent;
use crate::vault::{AccessList, Recipient, VaultKind};

/// Label used for the caller's own key when it is not yet recorded.
pub const SELF_NAME: &str = "me";

/// Memevault CLI: encrypted environment variables hidden inside an image.
#[derive(Parser)]
#[command(
    name = "memevault",
    about = "Encrypted environment variables, hidden inside a meme",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the vault file (an image or a standalone ciphertext)
    #[arg(long, global = true, env = "MEMEVAULT_VAULT")]
    pub vault: Option<String>,

    /// Path to your private key file
    #[arg(long, global = true, env = "MEMEVAULT_KEY")]
    pub key: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create your identity (if needed) and a new vault
    Init {
        /// Hide the vault inside this local image instead of a random meme
        #[arg(long)]
        image: Option<String>,

        /// Write a plain encrypted file with no cover image
        #[arg(long, conflicts_with = "image")]
        raw: bool,

        /// Name recorded for your key in the access list
        #[arg(long, default_value = SELF_NAME)]
        name: String,
    },

    /// Set a secret (add or update)
    Set {
        /// Secret name (e.g. DATABASE_URL)
        key: String,
        /// Secret value (omit for interactive prompt)
        value: Option<String>,
    },

    /// Print one secret's value, or every KEY=VALUE pair
    Get {
        /// Secret name (omit to print all)
        key: Option<String>,
    },

    /// List secret names
    List,

    /// Remove a secret
    Unset {
        /// Secret name
        key: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Run a command with secrets injected
    Run {
        /// Command and arguments (after --)
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,

        /// Start with a clean environment (only vault secrets, no inherited vars)
        #[arg(long)]
        clean_env: bool,
    },

    /// Grant another user access by public key
    Grant {
        /// Display name for the new recipient
        name: String,
        /// Their public key (age1...)
        public_key: String,
    },

    /// Manage who can decrypt the vault
    Access {
        #[command(subcommand)]
        action: AccessAction,
    },

    /// Manage your keypair
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },

    /// Scan source code for environment variables missing from the vault
    Scan {
        /// Directory to scan (default: current directory)
        path: Option<String>,
    },

    /// View the audit log of vault operations
    Audit {
        /// Number of entries to show
        #[arg(long, default_value = "50")]
        last: usize,
        /// Only entries newer than this age (e.g. 90s, 30m, 24h, 7d, 2w)
        #[arg(long)]
        since: Option<String>,
        /// Only one operation (init, add, update, unset, grant, revoke, rotate)
        #[arg(long)]
        op: Option<String>,
        /// Only entries touching this public key
        #[arg(long = "recipient-key", value_name = "AGE_KEY")]
        recipient_key: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Access subcommands.
#[derive(clap::Subcommand)]
pub enum AccessAction {
    /// List everyone who can decrypt the vault
    List,

    /// Revoke a recipient by name or public key
    Remove {
        /// Recipient name or public key
        target: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Key subcommands.
#[derive(clap::Subcommand)]
pub enum KeysAction {
    /// Print your public key
    Show,

    /// Generate a new keypair and re-encrypt the vault for it
    Rotate {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolved paths and settings for one command invocation.
#[derive(Debug, Clone)]
pub struct Context {
    pub settings: Settings,
    pub vault_path: PathBuf,
    pub identity_path: PathBuf,
    pub state_dir: PathBuf,
}

impl Context {
    /// Resolve paths: CLI flags first, then `.memevault.toml`, then defaults.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let settings = Settings::load(&cwd)?;

        let vault_path = cwd.join(cli.vault.as_deref().unwrap_or(&settings.vault_file));
        let identity_path = match &cli.key {
            Some(path) => PathBuf::from(path),
            None => settings.identity_path()?,
        };
        let state_dir = settings.state_dir()?;

        Ok(Self {
            settings,
            vault_path,
            identity_path,
            state_dir,
        })
    }
}

/// The caller's public key.
///
/// Read from the identity file's comment line; if that is missing the
/// key is derived from the private key.
pub fn own_public_key(ctx: &Context) -> Result<String> {
    match read_public_key(&ctx.identity_path) {
        Ok(key) => Ok(key),
        Err(_) => {
            let private_key = load_identity(&ctx.identity_path)?;
            Ok(Identity::from_private_key(&private_key)?.public_key().to_string())
        }
    }
}

/// The caller as a one-entry access list, passed to every save so an
/// implicit vault stays readable by whoever last wrote it.
pub fn own_access(ctx: &Context) -> Result<AccessList> {
    Ok(Recipient::new(SELF_NAME, own_public_key(ctx)?).into())
}

/// Record `event` in the audit log. Never fails the command: an
/// unavailable log is reported as a warning.
pub fn log_audit(ctx: &Context, kind: Option<VaultKind>, event: AuditEvent) {
    #[cfg(feature = "audit-log")]
    {
        let written = crate::audit::AuditLog::open(&ctx.state_dir)
            .and_then(|log| log.record(&ctx.vault_path, kind, &event));
        if let Err(e) = written {
            output::warning(&format!("Audit log not updated: {e}"));
        }
    }

    #[cfg(not(feature = "audit-log"))]
    let _ = (ctx, kind, event);
}
