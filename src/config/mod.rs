//! Project configuration (`.memevault.toml`).

pub mod settings;

pub use settings::Settings;
