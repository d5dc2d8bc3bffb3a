//! Switchboard - Party lookup for an event-driven financial switch.
//!
//! This crate resolves which financial service provider (FSP) owns a
//! party identifier such as a phone number or an account, and manages
//! the durable associations behind those answers. Inbound domain events
//! are routed through a lookup aggregate that validates participants,
//! resolves the responsible oracle and answers every message with exactly
//! one typed success-or-error event.
//!
//! # Architecture
//!
//! The crate is organized around the [`app::LookupAggregate`]:
//!
//! - **`domain`** - Events, envelopes, oracle records, associations and
//!   the error taxonomy
//! - **`port`** - Traits at the seams: oracle registry, oracle provider,
//!   participant directory, event publisher
//! - **`adapter`** - Outbound implementations: SQLite-backed registry and
//!   builtin oracle, remote HTTP oracle
//! - **`app`** - The aggregate, the provider factory and service wiring
//! - **`infrastructure`** - Configuration loading and logging setup
//!
//! Transports stay outside the crate: the host feeds inbound envelopes to
//! the aggregate and supplies the publisher that carries outbound events.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use switchboard::app::Service;
//! use switchboard::infrastructure::config::Config;
//! use switchboard::port::participants::ParticipantDirectory;
//! use switchboard::port::publisher::LogPublisher;
//!
//! # async fn run(participants: Arc<dyn ParticipantDirectory>) -> switchboard::error::Result<()> {
//! let config = Config::default();
//! let service = Service::start(&config, participants, Arc::new(LogPublisher)).await?;
//! let aggregate = service.aggregate();
//! # let _ = aggregate;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `testkit` - In-memory fakes and builders for integration tests

pub mod adapter;
pub mod app;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
