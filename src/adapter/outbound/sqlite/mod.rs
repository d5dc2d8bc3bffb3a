//! SQLite adapters: oracle registry storage and builtin oracle
//! providers, sharing one Diesel connection pool.

pub mod cache;
pub mod connection;
pub mod model;
pub mod provider;
pub mod registry;
pub mod schema;

pub use cache::AssociationCache;
pub use connection::{create_pool, run_migrations, DbPool};
pub use provider::BuiltinOracleProvider;
pub use registry::SqliteOracleRegistry;
