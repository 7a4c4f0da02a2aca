use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

/// Identity of a logical request. Two requests are the same iff their keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey(String);

impl RequestKey {
    /// `METHOD:path`, method uppercased and defaulting to `GET`.
    pub fn from_method(method: &str, path: &str) -> Self {
        let method = method.trim();
        let method = if method.is_empty() { "GET".to_string() } else { method.to_uppercase() };
        Self(format!("{method}:{path}"))
    }

    /// `call_name:uri` for dispatcher calls.
    pub fn for_call(call_name: &str, uri: &str) -> Self {
        Self(format!("{call_name}:{uri}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ticket for one registered request. The token must be observed by the I/O.
#[derive(Debug, Clone)]
pub struct InFlight {
    pub key: RequestKey,
    pub token: CancellationToken,
    generation: u64,
}

#[derive(Default)]
struct Registry {
    next_generation: u64,
    handles: HashMap<RequestKey, (u64, CancellationToken)>,
}

/// At most one in-flight request per key; a newer request cancels the older one.
#[derive(Default)]
pub struct RequestTracker {
    inner: Mutex<Registry>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels whatever is registered under `key`, then registers a fresh handle.
    /// Both happen under one lock so no stale request can observe a gap.
    pub fn begin_request(&self, key: RequestKey) -> InFlight {
        let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, previous)) = registry.handles.remove(&key) {
            tracing::debug!(key = %key, "canceling superseded request");
            previous.cancel();
        }
        registry.next_generation += 1;
        let generation = registry.next_generation;
        let token = CancellationToken::new();
        registry.handles.insert(key.clone(), (generation, token.clone()));
        InFlight { key, token, generation }
    }

    /// Drops the mapping for this ticket. No-op if the key is gone or owned by a newer request.
    pub fn end_request(&self, request: &InFlight) {
        let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let owned = registry
            .handles
            .get(&request.key)
            .is_some_and(|(generation, _)| *generation == request.generation);
        if owned {
            registry.handles.remove(&request.key);
        }
    }

    /// Runs `commit` and drops the mapping, but only while `request` is still the
    /// registered one. A superseded request gets `None` and commits nothing.
    ///
    /// `commit` runs under the tracker lock: keep it short and never call back into the tracker.
    pub fn complete<R>(&self, request: &InFlight, commit: impl FnOnce() -> R) -> Option<R> {
        let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let current = !request.token.is_cancelled()
            && registry
                .handles
                .get(&request.key)
                .is_some_and(|(generation, _)| *generation == request.generation);
        if !current {
            return None;
        }
        let result = commit();
        registry.handles.remove(&request.key);
        Some(result)
    }

    pub fn is_in_flight(&self, key: &RequestKey) -> bool {
        let registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        registry.handles.contains_key(key)
    }

    pub fn in_flight(&self) -> usize {
        let registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        registry.handles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_keys_are_uppercased_with_get_default() {
        assert_eq!(RequestKey::from_method("get", "/api/x").as_str(), "GET:/api/x");
        assert_eq!(RequestKey::from_method("", "/api/x").as_str(), "GET:/api/x");
        assert_eq!(RequestKey::from_method("Post", "/a"), RequestKey::from_method("POST", "/a"));
        assert_eq!(
            RequestKey::for_call("search", "/products/search?q=lamp").as_str(),
            "search:/products/search?q=lamp"
        );
    }

    #[test]
    fn second_begin_cancels_first() {
        let tracker = RequestTracker::new();
        let key = RequestKey::for_call("search", "/s?q=a");
        let first = tracker.begin_request(key.clone());
        assert!(!first.token.is_cancelled());
        let second = tracker.begin_request(key.clone());
        assert!(first.token.is_cancelled());
        assert!(!second.token.is_cancelled());
        assert_eq!(tracker.in_flight(), 1);
    }

    #[test]
    fn distinct_keys_do_not_interfere() {
        let tracker = RequestTracker::new();
        let a = tracker.begin_request(RequestKey::for_call("search", "/s?q=a"));
        let b = tracker.begin_request(RequestKey::for_call("search", "/s?q=b"));
        assert!(!a.token.is_cancelled());
        assert!(!b.token.is_cancelled());
        assert_eq!(tracker.in_flight(), 2);
    }

    #[test]
    fn stale_end_keeps_newer_mapping() {
        let tracker = RequestTracker::new();
        let key = RequestKey::for_call("products", "/products?page=1");
        let old = tracker.begin_request(key.clone());
        let new = tracker.begin_request(key.clone());
        tracker.end_request(&old);
        assert!(tracker.is_in_flight(&key));
        tracker.end_request(&new);
        assert!(!tracker.is_in_flight(&key));
        tracker.end_request(&new);
        assert_eq!(tracker.in_flight(), 0);
    }

    #[test]
    fn complete_only_commits_for_the_current_request() {
        let tracker = RequestTracker::new();
        let key = RequestKey::from_method("GET", "/api/public/config/read");
        let old = tracker.begin_request(key.clone());
        let new = tracker.begin_request(key.clone());
        assert_eq!(tracker.complete(&old, || "stale"), None);
        assert!(tracker.is_in_flight(&key));
        assert_eq!(tracker.complete(&new, || "fresh"), Some("fresh"));
        assert!(!tracker.is_in_flight(&key));
        assert_eq!(tracker.complete(&new, || "again"), None);
    }
}
