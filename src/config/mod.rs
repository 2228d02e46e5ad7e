/// Database configuration and connection management
pub mod database;

/// Reference price catalog loading from catalog.toml
pub mod catalog;
