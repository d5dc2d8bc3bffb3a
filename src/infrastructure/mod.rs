//! Infrastructure concerns shared across the service: configuration and
//! logging setup.

pub mod config;
