//! One module per subcommand, each exposing `execute`.

pub mod access;
#[cfg(feature = "audit-log")]
pub mod audit_cmd;
pub mod completions;
pub mod get;
pub mod grant;
pub mod init;
pub mod keys;
pub mod list;
pub mod run;
pub mod scan;
pub mod set;
pub mod unset;
