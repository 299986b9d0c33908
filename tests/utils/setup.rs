use std::sync::{Arc, Mutex};

use roomcast::Subscriber;

/// Everything a recording subscriber has been called with
pub type Received<T> = Arc<Mutex<Vec<T>>>;

/// Builds a subscriber that stores a copy of every payload it receives
pub fn recording_subscriber<T: Clone + Send + 'static>() -> (Subscriber<T>, Received<T>) {
    let received: Received<T> = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    let subscriber = Subscriber::new(move |data: &T| sink.lock().unwrap().push(data.clone()));
    (subscriber, received)
}
