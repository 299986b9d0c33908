use std::fmt;
use std::marker::PhantomData;

use super::channel::Payload;
use super::registry::ChannelRegistry;
use super::subscriber::Subscriber;
use crate::shared::BroadcastError;

/// A room name bound to the payload type it carries
///
/// Declaring rooms once and sharing the descriptor keeps every publisher and
/// subscriber of a room agreeing on its payload at compile time.
pub struct Room<T> {
    name: String,
    _payload: PhantomData<fn() -> T>,
}

impl<T: Payload> Room<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            _payload: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subscribe(
        &self,
        registry: &ChannelRegistry,
        subscriber: &Subscriber<T>,
    ) -> Result<(), BroadcastError> {
        registry.subscribe(&self.name, subscriber)
    }

    pub fn unsubscribe(
        &self,
        registry: &ChannelRegistry,
        subscriber: &Subscriber<T>,
    ) -> Result<(), BroadcastError> {
        registry.unsubscribe(&self.name, subscriber)
    }

    pub fn publish(&self, registry: &ChannelRegistry, data: &T) -> Result<usize, BroadcastError> {
        registry.publish(&self.name, data)
    }
}

impl<T> Clone for Room<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _payload: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Room<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("name", &self.name)
            .field("payload", &std::any::type_name::<T>())
            .finish()
    }
}
