// Cross-context transport abstraction
//
// A transport carries structured payloads between execution contexts that
// opened the same name. How bytes actually travel is up to the implementation;
// the registry only relies on the contract below.

use serde_json::Value;

use crate::shared::BroadcastError;

pub use local::{LocalBroadcastHub, LocalBroadcastTransport};

mod local;

/// Notification handler invoked once per message received from another instance
pub type MessageHandler = Box<dyn Fn(Value) + Send + Sync>;

/// One named endpoint of a broadcast medium
///
/// Implementations deliver on a best-effort basis to every other live instance
/// bound to the same name. Whether an instance hears its own messages is the
/// implementation's business; callers must not rely on loopback.
pub trait Transport: Send + Sync {
    /// Name this instance is bound to
    fn name(&self) -> &str;

    /// Sends a payload to every other instance bound to the same name
    fn post_message(&self, payload: &Value) -> Result<(), BroadcastError>;

    /// Installs the message handler, replacing any previous one
    fn set_message_handler(&self, handler: MessageHandler);
}

/// Constructs transport instances bound to a name
pub trait TransportFactory: Send + Sync {
    fn open(&self, name: &str) -> Result<Box<dyn Transport>, BroadcastError>;
}
