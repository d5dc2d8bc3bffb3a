//! Outbound adapters: concrete implementations of the storage and remote
//! oracle ports.

pub mod http;
pub mod sqlite;
