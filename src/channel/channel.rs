use serde::{de::DeserializeOwned, Serialize};
use std::any::{self, Any};
use std::sync::Arc;
use tracing::{debug, warn};

use super::subscriber::{Subscriber, SubscriberSet};
use crate::shared::BroadcastError;
use crate::transport::{Transport, TransportFactory};

/// Data that can travel through a room
///
/// Anything that round-trips through serde qualifies. Use `serde_json::Value`
/// for rooms whose payloads are not known up front.
pub trait Payload: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Payload for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// One room: its local subscribers plus the transport bound to its name
pub struct Channel<T> {
    room: String,
    subscribers: Arc<SubscriberSet<T>>,
    transport: Box<dyn Transport>,
}

impl<T: Payload> Channel<T> {
    /// Opens the transport for `room` and routes its messages to the subscribers
    pub fn open(room: &str, factory: &dyn TransportFactory) -> Result<Self, BroadcastError> {
        let transport = factory.open(room)?;
        let subscribers = Arc::new(SubscriberSet::new());

        let remote_subscribers = Arc::clone(&subscribers);
        let remote_room = room.to_string();
        transport.set_message_handler(Box::new(move |value: serde_json::Value| {
            match serde_json::from_value::<T>(value) {
                Ok(data) => {
                    let delivered = remote_subscribers.dispatch(&data);
                    debug!(room = %remote_room, subscribers = delivered, "Delivered remote message");
                }
                Err(e) => {
                    warn!(
                        room = %remote_room,
                        error = %e,
                        "Dropping remote message that does not match the room payload type"
                    );
                }
            }
        }));
        debug!(transport = %transport.name(), "Installed remote message handler");

        Ok(Self {
            room: room.to_string(),
            subscribers,
            transport,
        })
    }

    /// Sends `data` to other contexts, then delivers it to local subscribers
    ///
    /// Local delivery has completed when this returns. If `data` cannot be
    /// serialized nothing is delivered anywhere.
    pub fn publish(&self, data: &T) -> Result<usize, BroadcastError> {
        let encoded = serde_json::to_value(data)?;
        self.transport.post_message(&encoded)?;

        let delivered = self.subscribers.dispatch(data);
        debug!(room = %self.room, subscribers = delivered, "Published message");
        Ok(delivered)
    }
}

impl<T> Channel<T> {
    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn subscribe(&self, subscriber: &Subscriber<T>) -> bool {
        self.subscribers.insert(subscriber)
    }

    pub fn unsubscribe(&self, subscriber: &Subscriber<T>) -> bool {
        self.subscribers.remove(subscriber)
    }

    pub fn is_subscribed(&self, subscriber: &Subscriber<T>) -> bool {
        self.subscribers.contains(subscriber)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Type-erased view the registry keeps of every channel
pub(crate) trait RoomChannel: Send + Sync {
    fn payload_type(&self) -> &'static str;

    fn subscriber_count(&self) -> usize;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Payload> RoomChannel for Channel<T> {
    fn payload_type(&self) -> &'static str {
        any::type_name::<T>()
    }

    fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
