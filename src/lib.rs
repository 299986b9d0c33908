// Library crate for roomcast
// This file exposes the public API for integration tests and embedders

pub mod channel;
pub mod shared;
pub mod transport;

// Re-export commonly used types for easier access
pub use channel::{Channel, ChannelRegistry, Payload, Room, Subscriber};
pub use shared::{BroadcastError, HubConfig};
pub use transport::{LocalBroadcastHub, Transport, TransportFactory};
