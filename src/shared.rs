use thiserror::Error;

/// Default buffer size of each room's broadcast channel on the local hub
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Error, Debug)]
pub enum BroadcastError {
    #[error("Room name must not be empty")]
    InvalidRoom,

    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Room '{room}' carries {actual} payloads, not {expected}")]
    PayloadTypeMismatch {
        room: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Configuration for the in-process broadcast hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// How many undelivered messages a room buffers before slow listeners lag
    pub channel_capacity: usize,
}

impl HubConfig {
    /// Reads `ROOMCAST_CHANNEL_CAPACITY`, falling back to the default
    pub fn from_env() -> Self {
        Self {
            channel_capacity: parse_capacity(std::env::var("ROOMCAST_CHANNEL_CAPACITY").ok()),
        }
    }

    pub fn with_channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.channel_capacity = channel_capacity.max(1);
        self
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Unparsable or zero capacities fall back to the default
fn parse_capacity(raw: Option<String>) -> usize {
    raw.and_then(|s| s.trim().parse().ok())
        .filter(|capacity| *capacity > 0)
        .unwrap_or(DEFAULT_CHANNEL_CAPACITY)
}
