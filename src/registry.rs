//! The three process-global registries — subscriber queues, archive handles,
//! and advertised paths — all guarded by one exclusive lock. The lock is
//! held only for pointer-sized mutations: it is never held across a blocking
//! send, a body read, or a disk write (the archive append lock, taken
//! separately per handle, is the one intentional exception).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::fs::File;
use tokio::sync::mpsc;

/// One relayed unit: a copied byte buffer, or a terminal marker closing the
/// subscriber's session.
#[derive(Debug, Clone)]
pub enum Chunk {
    Bytes(Arc<[u8]>),
    Terminal,
}

/// Queue depth bound per subscriber.
pub const QUEUE_DEPTH: usize = 30;

pub type SubscriberId = u64;

/// Sending half of a subscriber's bounded queue, installed in the registry.
pub type SubscriberSender = mpsc::Sender<Chunk>;

/// Receiving half, held by the subscriber session task.
pub type SubscriberReceiver = mpsc::Receiver<Chunk>;

#[derive(Default)]
struct PathSubscribers {
    next_id: AtomicU64,
    queues: HashMap<SubscriberId, SubscriberSender>,
}

/// Shared application hub: the subscriber registry, archive-handle map, and
/// advertisement set, all mutated under one lock.
pub struct Hub {
    subscribers: Mutex<HashMap<String, PathSubscribers>>,
    archives: Mutex<HashMap<String, Arc<tokio::sync::Mutex<File>>>>,
    advertised: Mutex<std::collections::HashSet<String>>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            archives: Mutex::new(HashMap::new()),
            advertised: Mutex::new(std::collections::HashSet::new()),
        }
    }

    /// Ensure the path's inner subscriber map exists without attaching anyone.
    pub fn ensure_path(&self, path: &str) {
        let mut subs = self.subscribers.lock();
        subs.entry(path.to_string()).or_default();
    }

    /// Attach a fresh subscriber queue, returning its id and the receiving
    /// half. The queue is bounded at [`QUEUE_DEPTH`].
    pub fn attach_subscriber(&self, path: &str) -> (SubscriberId, SubscriberReceiver) {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let mut subs = self.subscribers.lock();
        let entry = subs.entry(path.to_string()).or_default();
        let id = entry.next_id.fetch_add(1, Ordering::Relaxed);
        entry.queues.insert(id, tx);
        (id, rx)
    }

    /// Detach a subscriber. Dropping its sender closes the channel so any
    /// late publisher send observes a broken pipe instead of blocking.
    pub fn detach_subscriber(&self, path: &str, id: SubscriberId) {
        let mut subs = self.subscribers.lock();
        if let Some(entry) = subs.get_mut(path) {
            entry.queues.remove(&id);
        }
    }

    /// Shallow copy of the currently attached subscriber senders for `path`,
    /// taken under the lock; the caller may iterate and send without it.
    pub fn snapshot(&self, path: &str) -> Vec<SubscriberSender> {
        let subs = self.subscribers.lock();
        subs.get(path)
            .map(|entry| entry.queues.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of subscribers currently attached to `path`.
    pub fn subscriber_count(&self, path: &str) -> usize {
        let subs = self.subscribers.lock();
        subs.get(path).map(|entry| entry.queues.len()).unwrap_or(0)
    }

    /// Fetch the archive handle for `path`, if a publisher has already
    /// opened one this session.
    pub fn archive_handle(&self, path: &str) -> Option<Arc<tokio::sync::Mutex<File>>> {
        self.archives.lock().get(path).cloned()
    }

    /// Install a freshly opened archive handle for `path`.
    pub fn set_archive_handle(&self, path: &str, file: Arc<tokio::sync::Mutex<File>>) {
        self.archives.lock().insert(path.to_string(), file);
    }

    /// Close out the archive handle for `path` at publisher session end.
    pub fn clear_archive_handle(&self, path: &str) {
        self.archives.lock().remove(path);
    }

    /// Mark `path` as advertised.
    pub fn advertise(&self, path: &str) {
        self.advertised.lock().insert(path.to_string());
    }

    /// Unmark `path` as advertised.
    pub fn unadvertise(&self, path: &str) {
        self.advertised.lock().remove(path);
    }

    /// Currently advertised paths, with the leading `/` stripped, for the
    /// catalog page.
    pub fn advertised_paths(&self) -> Vec<String> {
        self.advertised
            .lock()
            .iter()
            .map(|p| p.trim_start_matches('/').to_string())
            .collect()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn attach_registers_a_queue_visible_in_snapshot() {
        let hub = Hub::new();
        let (id, _rx) = hub.attach_subscriber("/x");
        assert_eq!(hub.subscriber_count("/x"), 1);
        assert_eq!(hub.snapshot("/x").len(), 1);

        hub.detach_subscriber("/x", id);
        assert_eq!(hub.subscriber_count("/x"), 0);
    }

    #[tokio::test]
    async fn detaching_the_last_subscriber_keeps_the_path_reusable() {
        let hub = Hub::new();
        let (id, _rx) = hub.attach_subscriber("/x");
        hub.detach_subscriber("/x", id);

        // A later attach on the same path must still work and get a fresh id
        // distinct from the detached one (inner map survives emptying).
        let (second_id, _rx2) = hub.attach_subscriber("/x");
        assert_ne!(id, second_id);
        assert_eq!(hub.subscriber_count("/x"), 1);
    }

    #[tokio::test]
    async fn snapshot_is_isolated_per_path() {
        let hub = Hub::new();
        let (_id_a, _rx_a) = hub.attach_subscriber("/a");
        let (_id_b, _rx_b) = hub.attach_subscriber("/b");

        assert_eq!(hub.snapshot("/a").len(), 1);
        assert_eq!(hub.snapshot("/b").len(), 1);
        assert!(hub.snapshot("/unknown").is_empty());
    }

    #[test]
    fn ensure_path_does_not_attach_a_subscriber() {
        let hub = Hub::new();
        hub.ensure_path("/x");
        assert_eq!(hub.subscriber_count("/x"), 0);
        assert!(hub.snapshot("/x").is_empty());
    }

    #[test]
    fn advertisement_lifecycle_tracks_insert_and_remove() {
        let hub = Hub::new();
        assert!(hub.advertised_paths().is_empty());

        hub.advertise("/live");
        assert_eq!(hub.advertised_paths(), vec!["live".to_string()]);

        hub.unadvertise("/live");
        assert!(hub.advertised_paths().is_empty());
    }
}
