//! Event publisher port.
//!
//! The aggregate answers every consumed message with exactly one outbound
//! envelope through this port; the host decides what transport carries it.

use async_trait::async_trait;
use tracing::info;

use crate::domain::message::OutboundMessage;
use crate::error::Result;

/// Sink for outbound lookup events.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - A publish failure is the only error that escapes event handling, so
///   implementations should retry internally where the transport allows
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, message: OutboundMessage) -> Result<()>;
}

/// A publisher that only logs, for hosts and harnesses without a
/// transport.
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, message: OutboundMessage) -> Result<()> {
        info!(
            msg_id = %message.msg_id,
            msg_name = message.msg_name(),
            "outbound event"
        );
        Ok(())
    }
}
