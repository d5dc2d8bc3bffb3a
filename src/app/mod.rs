//! Application layer: the lookup aggregate, provider factory and service
//! lifecycle.

pub mod aggregate;
pub mod factory;
pub mod service;

pub use aggregate::LookupAggregate;
pub use factory::{OracleProviderFactory, ProviderFactory};
pub use service::Service;
