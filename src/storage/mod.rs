mod repository;

pub use repository::*;

/// SQL migration for accounts and entries
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// SQL migration for the patrimony registry
pub const MIGRATION_002_ASSETS: &str = include_str!("migrations/002_assets.sql");
