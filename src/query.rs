//! Keyed memoization of derived view models with explicit invalidation.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

/// Ordered key segments, e.g. `["interface_data", "dialogue"]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

struct CacheEntry {
    value: Rc<dyn Any>,
    stale: bool,
}

/// Last computed value per query key.
///
/// Invalidated entries keep their value so the next computation can consult it.
#[derive(Default)]
pub struct QueryCache {
    entries: RefCell<HashMap<QueryKey, CacheEntry>>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.borrow();
        f.debug_struct("QueryCache")
            .field("entries", &entries.len())
            .finish()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value if it is fresh, computing it otherwise.
    pub fn fetch<T, F>(&self, key: &QueryKey, compute: F) -> Rc<T>
    where
        T: 'static,
        F: FnOnce() -> T,
    {
        self.fetch_with_previous(key, |_| Rc::new(compute()))
    }

    /// Like [`QueryCache::fetch`], handing the previous value (fresh or not)
    /// to the computation. Returning that same `Rc` keeps its identity.
    pub fn fetch_with_previous<T, F>(&self, key: &QueryKey, compute: F) -> Rc<T>
    where
        T: 'static,
        F: FnOnce(Option<Rc<T>>) -> Rc<T>,
    {
        let previous = {
            let entries = self.entries.borrow();
            match entries.get(key) {
                Some(entry) => match Rc::clone(&entry.value).downcast::<T>() {
                    Ok(value) if !entry.stale => return value,
                    Ok(value) => Some(value),
                    Err(_) => None,
                },
                None => None,
            }
        };

        debug!(%key, "recomputing query");
        let value = compute(previous);
        self.entries.borrow_mut().insert(
            key.clone(),
            CacheEntry {
                value: Rc::clone(&value) as Rc<dyn Any>,
                stale: false,
            },
        );
        value
    }

    /// Reads the stored value regardless of freshness.
    pub fn get<T: 'static>(&self, key: &QueryKey) -> Option<Rc<T>> {
        let entries = self.entries.borrow();
        let entry = entries.get(key)?;
        Rc::clone(&entry.value).downcast::<T>().ok()
    }

    pub fn set<T: 'static>(&self, key: QueryKey, value: T) {
        self.entries.borrow_mut().insert(
            key,
            CacheEntry {
                value: Rc::new(value),
                stale: false,
            },
        );
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries
            .borrow()
            .get(key)
            .map(|entry| entry.stale)
            .unwrap_or(true)
    }

    /// Marks every entry under `prefix` stale and returns how many were hit.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut hit = 0;
        for (key, entry) in self.entries.borrow_mut().iter_mut() {
            if key.starts_with(prefix) {
                entry.stale = true;
                hit += 1;
            }
        }
        debug!(%prefix, hit, "invalidated queries");
        hit
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn key(segments: &[&str]) -> QueryKey {
        QueryKey::new(segments.iter().copied())
    }

    #[test]
    fn fresh_values_are_not_recomputed() {
        let cache = QueryCache::new();
        let calls = Cell::new(0);
        let k = key(&["interface_data", "can_go_back"]);
        for _ in 0..3 {
            let value = cache.fetch(&k, || {
                calls.set(calls.get() + 1);
                true
            });
            assert!(*value);
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn invalidation_is_prefix_based() {
        let cache = QueryCache::new();
        let root = key(&["interface_data"]);
        cache.set(root.child("dialogue"), 1u32);
        cache.set(root.child("history"), 2u32);
        cache.set(key(&["settings"]), 3u32);

        assert_eq!(cache.invalidate(&root), 2);
        assert!(cache.is_stale(&root.child("dialogue")));
        assert!(cache.is_stale(&root.child("history")));
        assert!(!cache.is_stale(&key(&["settings"])));
    }

    #[test]
    fn stale_value_is_handed_to_recomputation() {
        let cache = QueryCache::new();
        let k = key(&["interface_data", "dialogue"]);
        let first = cache.fetch(&k, || String::from("first"));
        cache.invalidate(&k);

        let second = cache.fetch_with_previous(&k, |previous: Option<Rc<String>>| {
            let previous = previous.expect("stale value kept");
            assert_eq!(previous.as_str(), "first");
            previous
        });
        assert!(Rc::ptr_eq(&first, &second));
        assert!(!cache.is_stale(&k));
    }

    #[test]
    fn type_mismatch_recomputes() {
        let cache = QueryCache::new();
        let k = key(&["mixed"]);
        cache.set(k.clone(), 7u8);
        let value = cache.fetch(&k, || "text");
        assert_eq!(*value, "text");
        assert!(cache.get::<u8>(&k).is_none());
    }

    #[test]
    fn keys_render_their_segments() {
        assert_eq!(key(&["a", "b"]).to_string(), "[a, b]");
        assert!(key(&["a", "b", "c"]).starts_with(&key(&["a", "b"])));
        assert!(!key(&["a"]).starts_with(&key(&["a", "b"])));
    }
}
