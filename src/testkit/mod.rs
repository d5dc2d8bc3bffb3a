//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`oracle`] — In-memory [`OracleRegistry`](crate::port::oracle_registry::OracleRegistry),
//!   [`OracleProvider`](crate::port::oracle_provider::OracleProvider) and
//!   [`ProviderFactory`](crate::app::factory::ProviderFactory) fakes.
//! - [`collaborator`] — Scripted participant directory and a recording
//!   event publisher.
//! - [`domain`] — Builders for envelopes, payloads and oracle inputs.

pub mod collaborator;
pub mod domain;
pub mod oracle;
