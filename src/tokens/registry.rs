//! Concurrent registry of live tokens and their remaining uses.

use dashmap::{mapref::entry::Entry, DashMap};

#[derive(Debug, Clone, Copy)]
struct Slot {
    remaining: u32,
    expires_at: i64,
}

#[derive(Debug, Default)]
pub struct TokenRegistry {
    slots: DashMap<String, Slot>,
}

impl TokenRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a token. A zero use budget is never stored.
    pub fn insert(&self, token: String, uses: u32, expires_at: i64) {
        if uses == 0 {
            return;
        }
        self.slots.insert(
            token,
            Slot {
                remaining: uses,
                expires_at,
            },
        );
    }

    /// Spend one use of `token`, returning how many are left.
    ///
    /// The decrement and the eviction at zero run under the shard write lock of
    /// the entry, so no two callers can observe the same count.
    /// Returns `None` if the token is not live.
    pub fn consume(&self, token: &str) -> Option<u32> {
        match self.slots.entry(token.to_string()) {
            Entry::Occupied(mut slot) => {
                let left = slot.get().remaining.saturating_sub(1);
                if left == 0 {
                    slot.remove();
                } else {
                    slot.get_mut().remaining = left;
                }
                Some(left)
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Drop a token. Returns whether it was live.
    pub fn remove(&self, token: &str) -> bool {
        self.slots.remove(token).is_some()
    }

    #[must_use]
    pub fn remaining(&self, token: &str) -> Option<u32> {
        self.slots.get(token).map(|slot| slot.remaining)
    }

    /// Remove every token whose absolute expiry is at or before `now`.
    pub fn sweep_expired(&self, now: i64) -> usize {
        let mut removed = 0;
        self.slots.retain(|_, slot| {
            let keep = slot.expires_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn consume_counts_down_and_evicts_at_zero() {
        let registry = TokenRegistry::new();
        registry.insert("t".to_string(), 3, i64::MAX);

        assert_eq!(registry.consume("t"), Some(2));
        assert_eq!(registry.consume("t"), Some(1));
        assert_eq!(registry.consume("t"), Some(0));
        assert_eq!(registry.remaining("t"), None);
        assert_eq!(registry.consume("t"), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_token_is_not_created_by_consume() {
        let registry = TokenRegistry::new();
        assert_eq!(registry.consume("ghost"), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn zero_budget_is_never_stored() {
        let registry = TokenRegistry::new();
        registry.insert("t".to_string(), 0, i64::MAX);
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_is_idempotent() {
        let registry = TokenRegistry::new();
        registry.insert("t".to_string(), 5, i64::MAX);
        assert!(registry.remove("t"));
        assert!(!registry.remove("t"));
    }

    #[test]
    fn sweep_only_drops_expired_entries() {
        let registry = TokenRegistry::new();
        registry.insert("old".to_string(), 5, 100);
        registry.insert("edge".to_string(), 5, 200);
        registry.insert("fresh".to_string(), 5, 300);

        assert_eq!(registry.sweep_expired(200), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.remaining("fresh"), Some(5));
    }

    #[test]
    fn concurrent_consumers_never_share_a_count() {
        const USES: u32 = 64;
        const WORKERS: usize = 16;

        let registry = Arc::new(TokenRegistry::new());
        registry.insert("shared".to_string(), USES, i64::MAX);

        let handles: Vec<_> = (0..WORKERS)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Some(left) = registry.consume("shared") {
                        seen.push(left);
                    }
                    seen
                })
            })
            .collect();

        let mut seen: Vec<u32> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap_or_default())
            .collect();
        seen.sort_unstable();

        let expected: Vec<u32> = (0..USES).collect();
        assert_eq!(seen, expected);
        assert!(registry.is_empty());
    }
}
