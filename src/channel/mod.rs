// Room-scoped publish/subscribe
//
// The registry maps room names to channels. Each channel fans every message
// out to its local subscribers synchronously and hands it to a transport for
// delivery to other execution contexts.

// Public API - what other modules can use
pub use channel::{Channel, Payload};
pub use registry::ChannelRegistry;
pub use room::Room;
pub use subscriber::{Subscriber, SubscriberSet};

// Internal modules
#[allow(clippy::module_inception)]
mod channel;
mod registry;
mod room;
mod subscriber;
