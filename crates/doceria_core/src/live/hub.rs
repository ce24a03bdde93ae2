//! Owner-scoped live query registry and subscription handles.
//!
//! # Responsibility
//! - Track standing item queries keyed by `SubscriptionId`.
//! - Fan out full snapshots to listeners of the owner whose items changed.
//!
//! # Invariants
//! - A snapshot published for owner `A` never reaches a listener of `B`.
//! - Snapshots are loaded and queued under the hub lock, so every listener
//!   receives them in load order and the newest queued one is never stale.
//! - A `Subscription` unregisters itself on `release()` or drop.

use crate::model::item::Item;
use log::debug;
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// Stable id of one registered live query.
pub type SubscriptionId = u64;

/// Full owner-filtered item list at one point in time.
pub type ItemSnapshot = Vec<Item>;

struct Listener {
    owner_id: String,
    sender: Sender<ItemSnapshot>,
}

#[derive(Default)]
struct HubState {
    next_id: SubscriptionId,
    listeners: BTreeMap<SubscriptionId, Listener>,
}

impl HubState {
    fn watches(&self, owner_id: &str) -> bool {
        self.listeners
            .values()
            .any(|listener| listener.owner_id == owner_id)
    }
}

/// Thread-safe registry of live item queries.
#[derive(Default)]
pub struct LiveQueryHub {
    state: Mutex<HubState>,
}

impl LiveQueryHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a live query for `owner_id` seeded with `load()`.
    ///
    /// `load` runs while the hub is locked; no publish can slip in between
    /// the initial read and its delivery. On error nothing stays registered.
    pub fn register_with<E>(
        self: &Arc<Self>,
        owner_id: &str,
        load: impl FnOnce() -> Result<ItemSnapshot, E>,
    ) -> Result<Subscription, E> {
        let (sender, receiver) = mpsc::channel();
        let id = {
            let mut state = self.lock();
            let initial = load()?;
            state.next_id += 1;
            let id = state.next_id;
            // Receiver is still held here, send cannot fail.
            let _ = sender.send(initial);
            state.listeners.insert(
                id,
                Listener {
                    owner_id: owner_id.to_string(),
                    sender,
                },
            );
            id
        };
        debug!("event=live_register module=live status=ok subscription_id={id}");

        Ok(Subscription {
            id,
            owner_id: owner_id.to_string(),
            receiver,
            hub: Arc::downgrade(self),
            released: false,
        })
    }

    /// Returns whether any live query currently watches `owner_id`.
    pub fn has_listeners(&self, owner_id: &str) -> bool {
        self.lock().watches(owner_id)
    }

    /// Loads a fresh snapshot for `owner_id` and delivers it to its listeners.
    ///
    /// `load` is skipped when nobody watches `owner_id`. Returns the number of
    /// listeners reached.
    pub fn publish_with<E>(
        &self,
        owner_id: &str,
        load: impl FnOnce() -> Result<ItemSnapshot, E>,
    ) -> Result<usize, E> {
        let state = self.lock();
        if !state.watches(owner_id) {
            return Ok(0);
        }
        let snapshot = load()?;

        let mut delivered = 0;
        for listener in state.listeners.values() {
            if listener.owner_id == owner_id && listener.sender.send(snapshot.clone()).is_ok() {
                delivered += 1;
            }
        }

        debug!(
            "event=live_publish module=live status=ok delivered={} items={}",
            delivered,
            snapshot.len()
        );
        Ok(delivered)
    }

    /// Removes one live query. Returns `false` when it was already gone.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        let removed = self.lock().listeners.remove(&id).is_some();
        if removed {
            debug!("event=live_unregister module=live status=ok subscription_id={id}");
        }
        removed
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Scoped handle for one standing item query.
///
/// The owning screen must keep this alive while visible and release it on
/// teardown. Dropping the handle releases it as well.
pub struct Subscription {
    id: SubscriptionId,
    owner_id: String,
    receiver: Receiver<ItemSnapshot>,
    hub: Weak<LiveQueryHub>,
    released: bool,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Identity whose items this query watches.
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Returns the next queued snapshot without blocking.
    pub fn try_next(&self) -> Option<ItemSnapshot> {
        match self.receiver.try_recv() {
            Ok(snapshot) => Some(snapshot),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Waits up to `timeout` for the next snapshot.
    pub fn next_timeout(&self, timeout: Duration) -> Option<ItemSnapshot> {
        match self.receiver.recv_timeout(timeout) {
            Ok(snapshot) => Some(snapshot),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Drains queued snapshots and returns only the newest one.
    pub fn latest(&self) -> Option<ItemSnapshot> {
        let mut newest = None;
        while let Some(snapshot) = self.try_next() {
            newest = Some(snapshot);
        }
        newest
    }

    /// Unregisters this query from its hub.
    pub fn release(mut self) {
        self.unregister();
    }

    fn unregister(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Some(hub) = self.hub.upgrade() {
            hub.unregister(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unregister();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("owner_id", &self.owner_id)
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{ItemSnapshot, LiveQueryHub, Subscription};
    use crate::model::item::{Item, ItemFields};
    use std::convert::Infallible;
    use std::sync::Arc;
    use std::time::Duration;

    fn item(id: &str, owner: &str) -> Item {
        Item::from_fields(id, owner, ItemFields::new("Brigadeiro", "Candy", 10, 2.5))
    }

    fn listen(hub: &Arc<LiveQueryHub>, owner: &str) -> Subscription {
        hub.register_with(owner, || Ok::<_, Infallible>(Vec::new()))
            .unwrap()
    }

    fn publish(hub: &LiveQueryHub, owner: &str, snapshot: ItemSnapshot) -> usize {
        hub.publish_with(owner, || Ok::<_, Infallible>(snapshot))
            .unwrap()
    }

    #[test]
    fn register_queues_initial_snapshot() {
        let hub = LiveQueryHub::new();
        let alice = hub
            .register_with("alice", || {
                Ok::<_, Infallible>(vec![item("a-1", "alice")])
            })
            .unwrap();

        let initial = alice.try_next().expect("initial snapshot queued");
        assert_eq!(initial, vec![item("a-1", "alice")]);
        assert!(alice.try_next().is_none());
    }

    #[test]
    fn failed_initial_load_leaves_nothing_registered() {
        let hub = LiveQueryHub::new();
        let result = hub.register_with("alice", || Err("disk gone"));

        assert_eq!(result.err(), Some("disk gone"));
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn publish_reaches_only_matching_owner() {
        let hub = LiveQueryHub::new();
        let alice = listen(&hub, "alice");
        let bob = listen(&hub, "bob");
        alice.latest();
        bob.latest();

        let delivered = publish(&hub, "alice", vec![item("a-1", "alice")]);
        assert_eq!(delivered, 1);

        let snapshot = alice.try_next().expect("alice should receive a snapshot");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].owner_id, "alice");
        assert!(bob.try_next().is_none());
    }

    #[test]
    fn publish_skips_load_without_listeners() {
        let hub = LiveQueryHub::new();
        let _bob = listen(&hub, "bob");

        let delivered = hub
            .publish_with("alice", || -> Result<ItemSnapshot, Infallible> {
                panic!("load must not run for unwatched owner")
            })
            .unwrap();
        assert_eq!(delivered, 0);
    }

    #[test]
    fn release_and_drop_unregister() {
        let hub = LiveQueryHub::new();
        let first = listen(&hub, "alice");
        let second = listen(&hub, "alice");
        assert_eq!(hub.listener_count(), 2);
        assert!(hub.has_listeners("alice"));

        first.release();
        assert_eq!(hub.listener_count(), 1);

        drop(second);
        assert_eq!(hub.listener_count(), 0);
        assert!(!hub.has_listeners("alice"));
        assert_eq!(publish(&hub, "alice", Vec::new()), 0);
    }

    #[test]
    fn latest_keeps_only_newest_snapshot() {
        let hub = LiveQueryHub::new();
        let subscription = listen(&hub, "alice");
        publish(&hub, "alice", vec![item("a-1", "alice")]);
        publish(
            &hub,
            "alice",
            vec![item("a-1", "alice"), item("a-2", "alice")],
        );

        let newest = subscription.latest().expect("snapshots were queued");
        assert_eq!(newest.len(), 2);
        assert!(subscription.try_next().is_none());
        assert!(subscription
            .next_timeout(Duration::from_millis(5))
            .is_none());
    }

    #[test]
    fn subscription_outliving_hub_releases_quietly() {
        let hub = LiveQueryHub::new();
        let subscription = listen(&hub, "alice");
        drop(hub);
        subscription.release();
    }
}
