use std::any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, instrument};

use super::channel::{Channel, Payload, RoomChannel};
use super::subscriber::Subscriber;
use crate::shared::BroadcastError;
use crate::transport::TransportFactory;

/// Registry of rooms for one execution context
///
/// Maps room names to lazily opened channels. A channel is created the first
/// time a room is subscribed to or published on, lives as long as the registry
/// and is never opened twice. Clones share the same rooms.
///
/// Build one per context at startup and hand it to whatever needs pub/sub.
#[derive(Clone)]
pub struct ChannelRegistry {
    /// room -> channel, typed by the payload of its first access
    channels: Arc<Mutex<HashMap<String, Arc<dyn RoomChannel>>>>,
    factory: Arc<dyn TransportFactory>,
}

impl ChannelRegistry {
    /// Creates an empty registry whose channels are opened through `factory`
    pub fn new(factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            factory,
        }
    }

    /// Returns the channel for `room`, opening it on first access
    ///
    /// The first access fixes the room's payload type; resolving the room
    /// later with another type fails with `PayloadTypeMismatch`.
    pub fn channel<T: Payload>(&self, room: &str) -> Result<Arc<Channel<T>>, BroadcastError> {
        validate_room(room)?;

        // Held across construction so concurrent callers cannot open a room twice
        let mut channels = self.lock_channels();
        if let Some(existing) = channels.get(room) {
            let existing = Arc::clone(existing);
            drop(channels);
            return downcast(room, existing);
        }

        let channel = Arc::new(Channel::<T>::open(room, self.factory.as_ref())?);
        channels.insert(room.to_string(), channel.clone());
        debug!(
            room = %room,
            payload = any::type_name::<T>(),
            rooms = channels.len(),
            "Created channel"
        );

        Ok(channel)
    }

    /// Registers `subscriber` for every later local or remote message on `room`
    ///
    /// Registering the same subscriber twice has no further effect.
    #[instrument(skip(self, subscriber))]
    pub fn subscribe<T: Payload>(
        &self,
        room: &str,
        subscriber: &Subscriber<T>,
    ) -> Result<(), BroadcastError> {
        let channel = self.channel::<T>(room)?;

        if channel.subscribe(subscriber) {
            debug!(
                room = %room,
                subscribers = channel.subscriber_count(),
                "Subscribed"
            );
        } else {
            debug!(room = %room, "Subscriber already registered");
        }

        Ok(())
    }

    /// Removes `subscriber` from `room`
    ///
    /// A no-op when the subscriber is not registered. Unknown rooms are left
    /// unopened.
    #[instrument(skip(self, subscriber))]
    pub fn unsubscribe<T: Payload>(
        &self,
        room: &str,
        subscriber: &Subscriber<T>,
    ) -> Result<(), BroadcastError> {
        validate_room(room)?;

        let existing = self.lock_channels().get(room).cloned();
        let Some(existing) = existing else {
            debug!(room = %room, "Unsubscribe from unopened room ignored");
            return Ok(());
        };

        // A subscriber of another payload type cannot be a member
        let Ok(channel) = downcast::<T>(room, existing) else {
            return Ok(());
        };

        if channel.unsubscribe(subscriber) {
            debug!(
                room = %room,
                subscribers = channel.subscriber_count(),
                "Unsubscribed"
            );
        }

        Ok(())
    }

    /// Sends `data` to other contexts, then delivers it to this context's
    /// subscribers before returning
    ///
    /// Returns how many local subscribers were called.
    #[instrument(skip(self, data))]
    pub fn publish<T: Payload>(&self, room: &str, data: &T) -> Result<usize, BroadcastError> {
        let channel = self.channel::<T>(room)?;
        channel.publish(data)
    }

    /// Names of every room opened so far, sorted
    pub fn rooms(&self) -> Vec<String> {
        let mut rooms: Vec<String> = self.lock_channels().keys().cloned().collect();
        rooms.sort();
        rooms
    }

    pub fn contains(&self, room: &str) -> bool {
        self.lock_channels().contains_key(room)
    }

    /// Local subscribers of `room`, zero for rooms never opened
    pub fn subscriber_count(&self, room: &str) -> usize {
        self.lock_channels()
            .get(room)
            .map(|channel| channel.subscriber_count())
            .unwrap_or(0)
    }

    fn lock_channels(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn RoomChannel>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate_room(room: &str) -> Result<(), BroadcastError> {
    if room.is_empty() {
        return Err(BroadcastError::InvalidRoom);
    }
    Ok(())
}

fn downcast<T: Payload>(
    room: &str,
    channel: Arc<dyn RoomChannel>,
) -> Result<Arc<Channel<T>>, BroadcastError> {
    let actual = channel.payload_type();
    channel
        .into_any()
        .downcast::<Channel<T>>()
        .map_err(|_| BroadcastError::PayloadTypeMismatch {
            room: room.to_string(),
            expected: any::type_name::<T>(),
            actual,
        })
}
