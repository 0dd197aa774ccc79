//! Source scanner: find environment variables a codebase reads.
//!
//! Heuristic, regex-based detection for Go, JavaScript/TypeScript,
//! Python, and Rust. Used by `memevault scan` to report variables that
//! are referenced in code but missing from the vault.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use regex::Regex;
use walkdir::{DirEntry, WalkDir};

use crate::errors::{MemeVaultError, Result};

/// Usage patterns; capture group 1 is the variable name.
const USAGE_PATTERNS: &[(&str, &str)] = &[
    ("Go os.Getenv", r#"os\.Getenv\(\s*["']([A-Z_][A-Z0-9_]*)["']\s*\)"#),
    ("JS process.env.X", r"process\.env\.([A-Z_][A-Z0-9_]*)"),
    (
        "JS process.env['X']",
        r#"process\.env\[\s*["']([A-Z_][A-Z0-9_]*)["']\s*\]"#,
    ),
    (
        "Python os.environ",
        r#"os\.environ(?:\[\s*["']|\.get\(\s*["'])([A-Z_][A-Z0-9_]*)["']"#,
    ),
    (
        "Python os.getenv",
        r#"os\.getenv\(\s*["']([A-Z_][A-Z0-9_]*)["']"#,
    ),
    (
        "Rust env::var",
        r#"env::var(?:_os)?\(\s*"([A-Z_][A-Z0-9_]*)"\s*\)"#,
    ),
    ("Rust env!", r#"(?:option_)?env!\(\s*"([A-Z_][A-Z0-9_]*)"\s*\)"#),
];

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules", "vendor", "target"];

/// File extensions that are never text worth scanning.
const SKIPPED_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "dylib", "jpg", "jpeg", "png", "gif", "webp", "ico", "db", "key", "zip",
    "gz", "tar", "pdf", "wasm",
];

/// Compiled usage patterns.
pub struct Scanner {
    patterns: Vec<Regex>,
}

impl Scanner {
    pub fn new() -> Result<Self> {
        let patterns = USAGE_PATTERNS
            .iter()
            .map(|(name, pattern)| {
                Regex::new(pattern).map_err(|e| {
                    MemeVaultError::CommandFailed(format!("bad scan pattern '{name}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Variable names referenced in `source`.
    pub fn scan_source(&self, source: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        for pattern in &self.patterns {
            for caps in pattern.captures_iter(source) {
                if let Some(name) = caps.get(1) {
                    found.insert(name.as_str().to_string());
                }
            }
        }
        found
    }

    /// Variable names referenced anywhere under `root`.
    ///
    /// Unreadable entries and non-UTF-8 files are skipped.
    pub fn scan_tree(&self, root: &Path) -> BTreeSet<String> {
        let mut found = BTreeSet::new();

        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e));

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() || has_skipped_extension(entry.path()) {
                continue;
            }
            if let Ok(source) = fs::read_to_string(entry.path()) {
                found.extend(self.scan_source(&source));
            }
        }

        found
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

fn has_skipped_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| SKIPPED_EXTENSIONS.contains(&ext.as_str()))
}
