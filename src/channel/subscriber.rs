use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// A callback registered against a room
///
/// Identity lives in the allocation: clones of a handle are the same
/// subscriber, while two handles built from identical closures are not.
/// Keep the handle around to unsubscribe later.
pub struct Subscriber<T> {
    callback: Arc<dyn Fn(&T) + Send + Sync>,
}

impl<T> Subscriber<T> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Whether both handles refer to the same registration
    pub fn same_as(&self, other: &Subscriber<T>) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }

    pub(crate) fn call(&self, data: &T) {
        (self.callback)(data)
    }
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> PartialEq for Subscriber<T> {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl<T> Eq for Subscriber<T> {}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &Arc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}

/// Set of subscribers with membership by identity
pub struct SubscriberSet<T> {
    members: Mutex<Vec<Subscriber<T>>>,
}

impl<T> SubscriberSet<T> {
    pub fn new() -> Self {
        Self {
            members: Mutex::new(Vec::new()),
        }
    }

    /// Adds a subscriber, returns false if it was already a member
    pub fn insert(&self, subscriber: &Subscriber<T>) -> bool {
        let mut members = self.members.lock().unwrap_or_else(PoisonError::into_inner);
        if members.iter().any(|member| member.same_as(subscriber)) {
            return false;
        }
        members.push(subscriber.clone());
        true
    }

    /// Removes a subscriber, returns false if it was not a member
    pub fn remove(&self, subscriber: &Subscriber<T>) -> bool {
        let mut members = self.members.lock().unwrap_or_else(PoisonError::into_inner);
        let before = members.len();
        members.retain(|member| !member.same_as(subscriber));
        members.len() != before
    }

    pub fn contains(&self, subscriber: &Subscriber<T>) -> bool {
        self.members
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|member| member.same_as(subscriber))
    }

    pub fn len(&self) -> usize {
        self.members
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls every member once with `data`, returns how many were called
    ///
    /// Membership is snapshotted before the first call and the lock is released
    /// while callbacks run: changes made from inside a callback take effect on
    /// the next dispatch, never the current one.
    pub fn dispatch(&self, data: &T) -> usize {
        let snapshot = self
            .members
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for subscriber in &snapshot {
            subscriber.call(data);
        }

        snapshot.len()
    }
}

impl<T> Default for SubscriberSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
