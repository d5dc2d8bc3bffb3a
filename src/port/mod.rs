//! Ports: the async trait seams between the lookup core and everything
//! that does I/O on its behalf.

pub mod oracle_provider;
pub mod oracle_registry;
pub mod participants;
pub mod publisher;

pub use oracle_provider::OracleProvider;
pub use oracle_registry::OracleRegistry;
pub use participants::ParticipantDirectory;
pub use publisher::{EventPublisher, LogPublisher};
