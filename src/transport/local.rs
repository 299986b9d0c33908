use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{MessageHandler, Transport, TransportFactory};
use crate::shared::{BroadcastError, HubConfig};

/// What goes over the wire when an instance posts
#[derive(Serialize)]
struct OutboundEnvelope<'a> {
    origin: Uuid,
    sent_at: DateTime<Utc>,
    data: &'a Value,
}

/// What a listener decodes from the wire
#[derive(Deserialize)]
struct InboundEnvelope {
    origin: Uuid,
    sent_at: DateTime<Utc>,
    data: Value,
}

/// In-process broadcast medium shared by every execution context of a process
///
/// Each context builds its own registry on top of a clone of the same hub, and
/// the hub plays the role a platform broadcast primitive plays between browser
/// tabs: messages are JSON-encoded on send and decoded on receipt, so only
/// data that survives a serialize/deserialize round trip can cross.
#[derive(Debug, Clone)]
pub struct LocalBroadcastHub {
    /// Name -> sender carrying encoded envelopes
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<Arc<str>>>>>,
    capacity: usize,
}

impl LocalBroadcastHub {
    /// Creates a hub whose rooms buffer `config.channel_capacity` messages
    pub fn new(config: HubConfig) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity: config.channel_capacity.max(1),
        }
    }

    /// Number of names that have been opened at least once
    pub fn room_count(&self) -> usize {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn sender_for(&self, name: &str) -> broadcast::Sender<Arc<str>> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(room = %name, capacity = self.capacity, "Creating hub channel");
                broadcast::channel(self.capacity).0
            })
            .clone()
    }
}

impl TransportFactory for LocalBroadcastHub {
    fn open(&self, name: &str) -> Result<Box<dyn Transport>, BroadcastError> {
        // Listeners run as tokio tasks, so there is nothing to open without a runtime
        let runtime = Handle::try_current()
            .map_err(|e| BroadcastError::TransportUnavailable(e.to_string()))?;

        let transport = LocalBroadcastTransport {
            id: Uuid::new_v4(),
            name: name.to_string(),
            sender: self.sender_for(name),
            runtime,
            listener: Mutex::new(None),
        };

        debug!(room = %name, instance = %transport.id, "Opened local broadcast transport");
        Ok(Box::new(transport))
    }
}

/// One instance bound to a name on a [`LocalBroadcastHub`]
///
/// Messages posted by this instance are never delivered back to it.
pub struct LocalBroadcastTransport {
    id: Uuid,
    name: String,
    sender: broadcast::Sender<Arc<str>>,
    runtime: Handle,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Transport for LocalBroadcastTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn post_message(&self, payload: &Value) -> Result<(), BroadcastError> {
        let envelope = OutboundEnvelope {
            origin: self.id,
            sent_at: Utc::now(),
            data: payload,
        };
        let encoded: Arc<str> = serde_json::to_string(&envelope)?.into();

        match self.sender.send(encoded) {
            Ok(receivers) => {
                debug!(room = %self.name, receivers = receivers, "Posted message to hub");
            }
            Err(_) => {
                debug!(room = %self.name, "Posted message to hub with no listeners");
            }
        }

        Ok(())
    }

    fn set_message_handler(&self, handler: MessageHandler) {
        let mut receiver = self.sender.subscribe();
        let own_id = self.id;
        let name = self.name.clone();

        let task = self.runtime.spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(encoded) => {
                        let envelope: InboundEnvelope = match serde_json::from_str(&encoded) {
                            Ok(envelope) => envelope,
                            Err(e) => {
                                warn!(room = %name, error = %e, "Dropping undecodable hub message");
                                continue;
                            }
                        };

                        if envelope.origin == own_id {
                            continue;
                        }

                        debug!(
                            room = %name,
                            origin = %envelope.origin,
                            latency_ms = (Utc::now() - envelope.sent_at).num_milliseconds(),
                            "Received remote message"
                        );
                        handler(envelope.data);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(room = %name, skipped = skipped, "Listener lagged behind, messages dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            debug!(room = %name, "Local broadcast listener stopped");
        });

        let mut listener = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = listener.replace(task) {
            previous.abort();
        }
    }
}

impl Drop for LocalBroadcastTransport {
    fn drop(&mut self) {
        let listener = self.listener.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = listener.take() {
            task.abort();
        }
    }
}
