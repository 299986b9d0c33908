use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use roomcast::transport::MessageHandler;
use roomcast::{BroadcastError, Transport, TransportFactory};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Transport factory standing in for another execution context
///
/// Records what every opened transport posts and lets a test push "remote"
/// messages into a room's handler.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct MockTransportFactory {
    opened: Arc<Mutex<Vec<String>>>,
    posted: Arc<Mutex<Vec<(String, Value)>>>,
    handlers: Arc<Mutex<HashMap<String, Arc<MessageHandler>>>>,
    reject_posts: bool,
}

#[allow(dead_code)]
impl MockTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every transport this factory opens refuses to send
    pub fn rejecting_posts() -> Self {
        Self {
            reject_posts: true,
            ..Self::default()
        }
    }

    pub fn open_count(&self, name: &str) -> usize {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .filter(|opened| opened.as_str() == name)
            .count()
    }

    pub fn posted(&self) -> Vec<(String, Value)> {
        self.posted.lock().unwrap().clone()
    }

    pub fn deliver_remote(&self, room: &str, payload: Value) {
        let handler = self.handlers.lock().unwrap().get(room).cloned();
        if let Some(handler) = handler {
            handler(payload);
        }
    }
}

impl TransportFactory for MockTransportFactory {
    fn open(&self, name: &str) -> Result<Box<dyn Transport>, BroadcastError> {
        self.opened.lock().unwrap().push(name.to_string());
        Ok(Box::new(MockTransport {
            name: name.to_string(),
            factory: self.clone(),
        }))
    }
}

struct MockTransport {
    name: String,
    factory: MockTransportFactory,
}

impl Transport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn post_message(&self, payload: &Value) -> Result<(), BroadcastError> {
        if self.factory.reject_posts {
            return Err(BroadcastError::Transport(
                "mock transport is offline".to_string(),
            ));
        }
        self.factory
            .posted
            .lock()
            .unwrap()
            .push((self.name.clone(), payload.clone()));
        Ok(())
    }

    fn set_message_handler(&self, handler: MessageHandler) {
        self.factory
            .handlers
            .lock()
            .unwrap()
            .insert(self.name.clone(), Arc::new(handler));
    }
}
