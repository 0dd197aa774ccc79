pub mod audit;
pub mod cli;
pub mod config;
pub mod container;
pub mod cover;
pub mod crypto;
pub mod errors;
pub mod scan;
pub mod vault;
