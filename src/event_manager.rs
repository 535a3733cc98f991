//! Per-device event map (§3.4): a `key -> value` store with subscriber
//! callbacks run in registration order, a one-shot "first value" latch per
//! key for [`EventManager::wait_for`], and a child-task registry so a
//! device's `shutdown()` can await everything it spawned.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;

use crate::value::Value;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A subscriber callback. May return a transformed value that becomes what
/// later subscribers (and the stored value) see; `None` passes the
/// dispatched value through unchanged.
pub type Callback = Arc<dyn Fn(Value) -> BoxFuture<Option<Value>> + Send + Sync>;

struct Subscription {
    id: u64,
    callback: Callback,
}

#[derive(Default)]
struct State {
    data: HashMap<String, Value>,
    callbacks: HashMap<String, Vec<Subscription>>,
    latches: HashMap<String, Arc<Notify>>,
    fired: std::collections::HashSet<String>,
    next_id: u64,
}

/// A handle returned by [`EventManager::subscribe`], used to
/// [`EventManager::unsubscribe`] the same callback later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

pub struct EventManager {
    state: RwLock<State>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EventManager {
    pub fn new() -> Self {
        Self { state: RwLock::new(State::default()), tasks: Mutex::new(Vec::new()) }
    }

    fn latch(state: &mut State, key: &str) -> Arc<Notify> {
        state.latches.entry(key.to_string()).or_insert_with(|| Arc::new(Notify::new())).clone()
    }

    /// Suspends until `key` has been dispatched at least once. The
    /// `Notified` future is created before each check of `fired`, so a
    /// `dispatch` racing with this call between the check and the await is
    /// never missed (per `tokio::sync::Notify`'s guarantee that a
    /// `notify_waiters()` call occurring after a `Notified` was created is
    /// always observed by it).
    pub async fn wait_for(&self, key: &str) {
        let notify = {
            let mut state = self.state.write().await;
            Self::latch(&mut state, key)
        };
        loop {
            let notified = notify.notified();
            if self.state.read().await.fired.contains(key) {
                return;
            }
            notified.await;
        }
    }

    /// Equivalent to `wait_for(key)` followed by a clone of the stored value.
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.wait_for(key).await;
        self.state.read().await.data.get(key).cloned()
    }

    /// Returns the stored value without waiting for it to exist. Returns
    /// `None` both when the key is absent and when the map is momentarily
    /// locked by a concurrent dispatch.
    pub fn get_nowait(&self, key: &str) -> Option<Value> {
        self.state.try_read().ok()?.data.get(key).cloned()
    }

    /// Async, wait-free variant of [`EventManager::get_nowait`] that never
    /// misses a value due to lock contention.
    pub async fn get_nowait_async(&self, key: &str) -> Option<Value> {
        self.state.read().await.data.get(key).cloned()
    }

    pub async fn subscribe(&self, key: &str, callback: Callback) -> SubscriptionId {
        let mut state = self.state.write().await;
        let id = state.next_id;
        state.next_id += 1;
        state.callbacks.entry(key.to_string()).or_default().push(Subscription { id, callback });
        SubscriptionId(id)
    }

    /// Subscribes a callback that unsubscribes itself after its first firing.
    pub async fn subscribe_once(self: &Arc<Self>, key: &str, callback: Callback) -> SubscriptionId {
        let key = key.to_string();
        let manager = Arc::downgrade(self);
        let id_slot: Arc<std::sync::OnceLock<SubscriptionId>> = Arc::new(std::sync::OnceLock::new());
        let id_slot_for_cb = id_slot.clone();
        let key_for_cb = key.clone();
        let wrapped: Callback = Arc::new(move |value| {
            let manager = manager.clone();
            let callback = callback.clone();
            let id_slot = id_slot_for_cb.clone();
            let key = key_for_cb.clone();
            Box::pin(async move {
                if let Some(manager) = manager.upgrade() {
                    if let Some(id) = id_slot.get() {
                        manager.unsubscribe(&key, *id).await;
                    }
                }
                callback(value).await
            })
        });
        let id = self.subscribe(&key, wrapped).await;
        let _ = id_slot.set(id);
        id
    }

    pub async fn unsubscribe(&self, key: &str, id: SubscriptionId) {
        if let Some(subs) = self.state.write().await.callbacks.get_mut(key) {
            subs.retain(|s| s.id != id.0);
        }
    }

    /// Runs `key`'s subscribers in registration order, stores the resulting
    /// value, and sets the key's latch (§3.4 invariants).
    pub async fn dispatch(&self, key: &str, mut value: Value) {
        let callbacks: Vec<Callback> = {
            let state = self.state.read().await;
            state.callbacks.get(key).map(|subs| subs.iter().map(|s| s.callback.clone()).collect()).unwrap_or_default()
        };

        for callback in callbacks {
            if let Some(transformed) = callback(value.clone()).await {
                value = transformed;
            }
        }

        let mut state = self.state.write().await;
        state.data.insert(key.to_string(), value);
        state.fired.insert(key.to_string());
        if let Some(notify) = state.latches.get(key) {
            notify.notify_waiters();
        }
    }

    /// Spawns `fut` and tracks it so [`EventManager::shutdown`] can cancel
    /// and await it.
    pub fn spawn_tracked(self: &Arc<Self>, fut: impl Future<Output = ()> + Send + 'static) {
        let handle = tokio::spawn(fut);
        if let Ok(mut tasks) = self.tasks.try_lock() {
            tasks.push(handle);
        }
    }

    /// Spawns [`EventManager::dispatch`] as a tracked child task.
    pub fn dispatch_nowait(self: &Arc<Self>, key: String, value: Value) {
        let manager = self.clone();
        self.spawn_tracked(async move { manager.dispatch(&key, value).await });
    }

    /// Loads a whole payload at once, dispatching each entry as its own task.
    pub fn load(self: &Arc<Self>, data: crate::value::EventDataType) {
        for (key, value) in data {
            self.dispatch_nowait(key, value);
        }
    }

    /// Cancels every tracked task and awaits their completion.
    pub async fn shutdown(&self) {
        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock().await);
        for task in &tasks {
            task.abort();
        }
        for task in tasks {
            let _ = task.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_waits_for_first_dispatch() {
        let manager = Arc::new(EventManager::new());
        let waiter = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.get("state").await })
        };
        tokio::task::yield_now().await;
        manager.dispatch("state", Value::U8(3)).await;
        assert_eq!(waiter.await.unwrap(), Some(Value::U8(3)));
    }

    #[tokio::test]
    async fn subscribers_run_in_order_and_can_transform() {
        let manager = Arc::new(EventManager::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let log1 = log.clone();
        manager
            .subscribe(
                "x",
                Arc::new(move |v| {
                    let log1 = log1.clone();
                    Box::pin(async move {
                        log1.lock().await.push(1);
                        Some(Value::U8(v.as_i64().unwrap() as u8 + 1))
                    })
                }),
            )
            .await;

        let log2 = log.clone();
        manager
            .subscribe(
                "x",
                Arc::new(move |v| {
                    let log2 = log2.clone();
                    Box::pin(async move {
                        log2.lock().await.push(v.as_i64().unwrap());
                        None
                    })
                }),
            )
            .await;

        manager.dispatch("x", Value::U8(1)).await;
        assert_eq!(manager.get_nowait_async("x").await, Some(Value::U8(2)));
        assert_eq!(*log.lock().await, vec![1, 2]);
    }

    #[tokio::test]
    async fn subscribe_once_fires_a_single_time() {
        let manager = Arc::new(EventManager::new());
        let count = Arc::new(Mutex::new(0));
        let count_cb = count.clone();
        manager
            .subscribe_once(
                "x",
                Arc::new(move |_| {
                    let count_cb = count_cb.clone();
                    Box::pin(async move {
                        *count_cb.lock().await += 1;
                        None
                    })
                }),
            )
            .await;

        manager.dispatch("x", Value::U8(1)).await;
        manager.dispatch("x", Value::U8(2)).await;
        assert_eq!(*count.lock().await, 1);
    }
}
