//! Long-lived provider caches for transport sender handles.
//!
//! Creating a transport sender is expensive, so exactly one instance exists
//! per distinct `(request_queue, reply_queue)` pair for the provider's
//! lifetime. The cache is a concurrent map: racing first-time constructions
//! are allowed, but only one winner is retained — losers are simply
//! discarded, not errors.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Cache key: the queue pair a sender is bound to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SenderKey {
    /// Queue the requests go out on.
    pub request_queue: String,
    /// Queue the replies come back on.
    pub reply_queue: String,
}

impl SenderKey {
    /// Creates a key from its queue pair.
    #[must_use]
    pub fn new(request_queue: impl Into<String>, reply_queue: impl Into<String>) -> Self {
        Self {
            request_queue: request_queue.into(),
            reply_queue: reply_queue.into(),
        }
    }
}

/// One-instance-per-key provider of sender handles.
///
/// Injected at startup and shared as an `Arc`; senders are dropped together
/// with the provider when the owning scope ends.
pub struct ReplySenderProvider<S> {
    create: Box<dyn Fn(&SenderKey) -> S + Send + Sync>,
    senders: RwLock<HashMap<SenderKey, Arc<S>>>,
}

impl<S> ReplySenderProvider<S> {
    /// Creates a provider constructing senders with `create`.
    #[must_use]
    pub fn new(create: impl Fn(&SenderKey) -> S + Send + Sync + 'static) -> Self {
        Self {
            create: Box::new(create),
            senders: RwLock::new(HashMap::new()),
        }
    }

    /// The sender for `key`, constructing it on first use.
    ///
    /// Concurrent first-time calls may each construct a candidate, but all
    /// callers receive the single retained instance.
    pub fn get_instance(&self, key: &SenderKey) -> Arc<S> {
        {
            let guard = self
                .senders
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(sender) = guard.get(key) {
                return Arc::clone(sender);
            }
        }

        // Construct outside the write lock; a racing loser is discarded.
        let candidate = Arc::new((self.create)(key));
        let mut guard = self
            .senders
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(guard.entry(key.clone()).or_insert(candidate))
    }

    /// Number of distinct senders currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when no sender has been constructed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sender {
        key: SenderKey,
    }

    fn provider() -> ReplySenderProvider<Sender> {
        ReplySenderProvider::new(|key: &SenderKey| Sender { key: key.clone() })
    }

    #[test]
    fn same_key_returns_the_same_instance() {
        let provider = provider();
        let key = SenderKey::new("create-link-request", "create-link-reply");
        let first = provider.get_instance(&key);
        let second = provider.get_instance(&key);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn different_keys_return_different_instances() {
        let provider = provider();
        let first = provider.get_instance(&SenderKey::new("req-a", "reply-a"));
        let second = provider.get_instance(&SenderKey::new("req-b", "reply-b"));
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.key.request_queue, "req-a");
        assert_eq!(second.key.request_queue, "req-b");
        assert_eq!(provider.len(), 2);
    }

    #[test]
    fn concurrent_first_calls_retain_a_single_winner() {
        let provider = Arc::new(provider());
        let key = SenderKey::new("req", "reply");
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provider = Arc::clone(&provider);
                let key = key.clone();
                std::thread::spawn(move || provider.get_instance(&key))
            })
            .collect();
        let instances: Vec<Arc<Sender>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(
            instances
                .iter()
                .all(|instance| Arc::ptr_eq(instance, &instances[0]))
        );
        assert_eq!(provider.len(), 1);
    }
}
