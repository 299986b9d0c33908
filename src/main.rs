use roomcast::{ChannelRegistry, HubConfig, LocalBroadcastHub, Room, Subscriber};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    from: String,
    text: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roomcast=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = HubConfig::from_env();
    info!(
        channel_capacity = config.channel_capacity,
        "Starting roomcast demo"
    );

    // One hub per process, one registry per execution context
    let hub = Arc::new(LocalBroadcastHub::new(config));
    let chat = Room::<ChatMessage>::new("chat");

    let mut tabs = Vec::new();
    for _ in 0..2 {
        let label = petname::Petnames::default().generate_one(2, "-");
        let registry = ChannelRegistry::new(hub.clone());

        let tab = label.clone();
        let subscriber = Subscriber::new(move |message: &ChatMessage| {
            info!(
                tab = %tab,
                from = %message.from,
                text = %message.text,
                "Message delivered"
            );
        });

        if let Err(e) = chat.subscribe(&registry, &subscriber) {
            error!(tab = %label, error = %e, "Failed to subscribe");
            return;
        }
        tabs.push((label, registry));
    }

    for (label, registry) in &tabs {
        let message = ChatMessage {
            from: label.clone(),
            text: format!("hello from {}", label),
        };

        match chat.publish(registry, &message) {
            Ok(local) => info!(tab = %label, local_deliveries = local, "Published"),
            Err(e) => error!(tab = %label, error = %e, "Failed to publish"),
        }
    }

    // Remote deliveries arrive on listener tasks; give them a turn
    tokio::time::sleep(Duration::from_millis(50)).await;
    info!(hub_rooms = hub.room_count(), "Demo finished");
}
