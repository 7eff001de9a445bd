//! Thread-scoped diagnostic context
//!
//! This module provides:
//! - `ContextStore`: per-thread flat key/value map plus named stacks
//! - `ContextGuard`: RAII guard removing a key when a scope ends
//!
//! Values written on one thread are never visible from another. Nothing is
//! cleared automatically: hosts that reuse threads (worker pools) must call
//! [`ContextStore::clear`] or [`ContextStore::reset`] between units of work.
//!
//! Per-thread storage of a store is released once its last handle is
//! dropped: immediately on the dropping thread, and on any other thread the
//! next time a new store starts writing there.

use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(0);

struct ThreadContext {
    owner: Weak<StoreId>,
    map: Option<HashMap<String, String>>,
    stacks: Option<HashMap<String, Vec<String>>>,
}

impl ThreadContext {
    fn new(owner: Weak<StoreId>) -> Self {
        Self {
            owner,
            map: None,
            stacks: None,
        }
    }
}

#[derive(Debug)]
struct StoreId(u64);

impl Drop for StoreId {
    fn drop(&mut self) {
        let _ = CONTEXTS.try_with(|contexts| {
            if let Ok(mut contexts) = contexts.try_borrow_mut() {
                contexts.remove(&self.0);
            }
        });
    }
}

thread_local! {
    static CONTEXTS: RefCell<HashMap<u64, ThreadContext>> = RefCell::new(HashMap::new());
}

/// Mapped diagnostic context
///
/// Each store has its own identity, so two pipelines running in the same
/// process keep separate tags even on the same thread. Cloning a store
/// yields a handle to the same storage.
///
/// # Example
///
/// ```
/// use rust_context_logger::ContextStore;
///
/// let store = ContextStore::new();
/// store.put("ip", "10.0.0.7");
/// assert_eq!(store.get("ip").as_deref(), Some("10.0.0.7"));
///
/// store.push_by_key("span", "outer");
/// store.push_by_key("span", "inner");
/// assert_eq!(store.pop_by_key("span").as_deref(), Some("inner"));
/// ```
#[derive(Debug, Clone)]
pub struct ContextStore {
    id: Arc<StoreId>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self {
            id: Arc::new(StoreId(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed))),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut ThreadContext) -> R) -> R {
        CONTEXTS.with(|contexts| {
            let mut contexts = contexts.borrow_mut();
            if !contexts.contains_key(&self.id.0) {
                contexts.retain(|_, ctx| ctx.owner.strong_count() > 0);
            }
            let ctx = contexts
                .entry(self.id.0)
                .or_insert_with(|| ThreadContext::new(Arc::downgrade(&self.id)));
            f(ctx)
        })
    }

    fn read<R>(&self, f: impl FnOnce(Option<&ThreadContext>) -> R) -> R {
        CONTEXTS.with(|contexts| f(contexts.borrow().get(&self.id.0)))
    }

    /// Set a value on the current thread, replacing any previous one
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.with(|ctx| {
            ctx.map
                .get_or_insert_with(HashMap::new)
                .insert(key.into(), value.into());
        });
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.read(|ctx| ctx.and_then(|c| c.map.as_ref()?.get(key).cloned()))
    }

    /// Remove a value; does nothing when the key is absent
    pub fn remove(&self, key: &str) {
        self.with(|ctx| {
            if let Some(map) = ctx.map.as_mut() {
                map.remove(key);
            }
        });
    }

    /// Clear the flat map of the current thread. Stacks are left untouched.
    pub fn clear(&self) {
        self.with(|ctx| {
            if let Some(map) = ctx.map.as_mut() {
                map.clear();
            }
        });
    }

    /// Snapshot of the flat map, `None` if it was never written on this thread
    pub fn copy_of_context_map(&self) -> Option<HashMap<String, String>> {
        self.read(|ctx| ctx.and_then(|c| c.map.clone()))
    }

    /// Replace the flat map wholesale
    pub fn set_context_map(&self, map: HashMap<String, String>) {
        self.with(|ctx| {
            let current = ctx.map.get_or_insert_with(HashMap::new);
            current.clear();
            current.extend(map);
        });
    }

    /// Push onto the stack named `key`, creating it on first use
    pub fn push_by_key(&self, key: impl Into<String>, value: impl Into<String>) {
        self.with(|ctx| {
            ctx.stacks
                .get_or_insert_with(HashMap::new)
                .entry(key.into())
                .or_default()
                .push(value.into());
        });
    }

    /// Pop the top of the stack named `key`; `None` when empty or missing
    pub fn pop_by_key(&self, key: &str) -> Option<String> {
        self.with(|ctx| ctx.stacks.as_mut()?.get_mut(key)?.pop())
    }

    pub fn peek_by_key(&self, key: &str) -> Option<String> {
        self.read(|ctx| ctx.and_then(|c| c.stacks.as_ref()?.get(key)?.last().cloned()))
    }

    /// Copy of the stack named `key`, top of stack first
    pub fn copy_of_stack_by_key(&self, key: &str) -> Option<Vec<String>> {
        self.read(|ctx| {
            ctx.and_then(|c| {
                c.stacks
                    .as_ref()?
                    .get(key)
                    .map(|stack| stack.iter().rev().cloned().collect())
            })
        })
    }

    pub fn clear_by_key(&self, key: &str) {
        self.with(|ctx| {
            if let Some(stack) = ctx.stacks.as_mut().and_then(|s| s.get_mut(key)) {
                stack.clear();
            }
        });
    }

    /// Drop every value and stack this store holds for the current thread
    pub fn reset(&self) {
        CONTEXTS.with(|contexts| {
            contexts.borrow_mut().remove(&self.id.0);
        });
    }

    /// Set a value for the lifetime of the returned guard
    ///
    /// # Example
    ///
    /// ```
    /// use rust_context_logger::ContextStore;
    ///
    /// let store = ContextStore::new();
    /// {
    ///     let _guard = store.put_scoped("user", "alice");
    ///     assert!(store.get("user").is_some());
    /// }
    /// assert!(store.get("user").is_none());
    /// ```
    #[must_use = "the value is removed as soon as the guard is dropped"]
    pub fn put_scoped(&self, key: impl Into<String>, value: impl Into<String>) -> ContextGuard {
        let key = key.into();
        self.put(key.clone(), value);
        ContextGuard::new(self.clone(), key)
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard for a scoped context value
///
/// Removes its key from the owning thread's map when dropped. The guard is
/// tied to the thread that created it and cannot be sent elsewhere.
pub struct ContextGuard {
    store: ContextStore,
    key: String,
    _thread_bound: PhantomData<*const ()>,
}

impl ContextGuard {
    fn new(store: ContextStore, key: String) -> Self {
        Self {
            store,
            key,
            _thread_bound: PhantomData,
        }
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        self.store.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        let store = ContextStore::new();
        assert!(store.get("ip").is_none());

        store.put("ip", "1.2.3.4");
        store.put("ip", "5.6.7.8");
        assert_eq!(store.get("ip").as_deref(), Some("5.6.7.8"));

        store.remove("ip");
        assert!(store.get("ip").is_none());
        store.remove("never-set");
    }

    #[test]
    fn test_copy_is_none_until_written() {
        let store = ContextStore::new();
        assert!(store.copy_of_context_map().is_none());

        store.push_by_key("stack", "v");
        assert!(store.copy_of_context_map().is_none());

        store.put("k", "v");
        let copy = store.copy_of_context_map().expect("map written");
        assert_eq!(copy.get("k").map(String::as_str), Some("v"));

        store.clear();
        assert_eq!(store.copy_of_context_map(), Some(HashMap::new()));
    }

    #[test]
    fn test_copy_is_defensive() {
        let store = ContextStore::new();
        store.put("k", "v");
        let mut copy = store.copy_of_context_map().unwrap();
        copy.insert("other".into(), "x".into());
        assert!(store.get("other").is_none());
    }

    #[test]
    fn test_set_context_map_replaces() {
        let store = ContextStore::new();
        store.put("stale", "1");

        let mut map = HashMap::new();
        map.insert("fresh".to_string(), "2".to_string());
        store.set_context_map(map);

        assert!(store.get("stale").is_none());
        assert_eq!(store.get("fresh").as_deref(), Some("2"));
    }

    #[test]
    fn test_stack_lifo() {
        let store = ContextStore::new();
        store.push_by_key("k", "v1");
        store.push_by_key("k", "v2");
        assert_eq!(store.peek_by_key("k").as_deref(), Some("v2"));
        assert_eq!(store.pop_by_key("k").as_deref(), Some("v2"));
        assert_eq!(store.pop_by_key("k").as_deref(), Some("v1"));
        assert_eq!(store.pop_by_key("k"), None);
        assert_eq!(store.pop_by_key("missing"), None);
    }

    #[test]
    fn test_stacks_are_independent() {
        let store = ContextStore::new();
        store.push_by_key("a", "1");
        store.push_by_key("b", "2");
        store.push_by_key("a", "3");
        assert_eq!(
            store.copy_of_stack_by_key("a"),
            Some(vec!["3".to_string(), "1".to_string()])
        );

        store.clear_by_key("a");
        assert_eq!(store.pop_by_key("a"), None);
        assert_eq!(store.pop_by_key("b").as_deref(), Some("2"));
    }

    #[test]
    fn test_clear_keeps_stacks() {
        let store = ContextStore::new();
        store.put("k", "v");
        store.push_by_key("s", "1");
        store.clear();
        assert!(store.get("k").is_none());
        assert_eq!(store.peek_by_key("s").as_deref(), Some("1"));

        store.reset();
        assert!(store.peek_by_key("s").is_none());
        assert!(store.copy_of_context_map().is_none());
    }

    #[test]
    fn test_thread_isolation() {
        let store = ContextStore::new();
        store.put("ip", "main");

        let other = store.clone();
        let seen = std::thread::spawn(move || {
            let before = other.get("ip");
            other.put("ip", "worker");
            (before, other.get("ip"))
        })
        .join()
        .unwrap();

        assert_eq!(seen, (None, Some("worker".to_string())));
        assert_eq!(store.get("ip").as_deref(), Some("main"));
    }

    #[test]
    fn test_store_isolation() {
        let first = ContextStore::new();
        let second = ContextStore::new();
        first.put("user", "alice");
        assert!(second.get("user").is_none());
    }

    fn tracked_stores() -> usize {
        CONTEXTS.with(|contexts| contexts.borrow().len())
    }

    #[test]
    fn test_dropped_store_releases_thread_storage() {
        let baseline = tracked_stores();
        let store = ContextStore::new();
        let handle = store.clone();
        store.put("k", "v");
        assert_eq!(tracked_stores(), baseline + 1);

        drop(store);
        assert_eq!(tracked_stores(), baseline + 1);
        drop(handle);
        assert_eq!(tracked_stores(), baseline);
    }

    #[test]
    fn test_store_dropped_elsewhere_is_pruned() {
        let (tx, rx) = std::sync::mpsc::channel();
        let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();
        let worker = std::thread::spawn(move || {
            let store: ContextStore = rx.recv().unwrap();
            store.put("k", "v");
            drop(store);
            let before = tracked_stores();
            done_tx.send(()).unwrap();
            // wait until the owner dropped its handle
            let _ = rx.recv();
            let fresh = ContextStore::new();
            fresh.put("k", "v");
            (before, tracked_stores())
        });

        let store = ContextStore::new();
        tx.send(store.clone()).unwrap();
        done_rx.recv().unwrap();
        drop(store);
        drop(tx);

        let (before, after) = worker.join().unwrap();
        assert_eq!(before, 1);
        assert_eq!(after, 1);
    }

    #[test]
    fn test_guard_removes_on_drop() {
        let store = ContextStore::new();
        {
            let _guard = store.put_scoped("request", "42");
            assert_eq!(store.get("request").as_deref(), Some("42"));
        }
        assert!(store.get("request").is_none());
    }
}
