//! Adapters bridging the lookup core to concrete infrastructure.

pub mod outbound;
