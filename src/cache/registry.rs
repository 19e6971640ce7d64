//! Bidirectional purge registry.
//!
//! Maps purge targets to the stored responses that depend on them, and each
//! stored response back to its targets so evictions leave no dangling links.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use super::keys::{PurgeTarget, StoreKey};
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::registry";

pub struct CacheRegistry {
    target_to_keys: RwLock<HashMap<PurgeTarget, HashSet<StoreKey>>>,
    key_to_targets: RwLock<HashMap<StoreKey, HashSet<PurgeTarget>>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self {
            target_to_keys: RwLock::new(HashMap::new()),
            key_to_targets: RwLock::new(HashMap::new()),
        }
    }

    /// Register a stored response under every target it depends on.
    ///
    /// Replaces any earlier registration of the same key.
    pub fn register(&self, key: StoreKey, targets: HashSet<PurgeTarget>) {
        let mut t2k = rw_write(&self.target_to_keys, SOURCE, "register.target_to_keys");
        let mut k2t = rw_write(&self.key_to_targets, SOURCE, "register.key_to_targets");

        if let Some(previous) = k2t.remove(&key) {
            detach(&mut t2k, &key, previous);
        }
        for target in &targets {
            t2k.entry(target.clone()).or_default().insert(key.clone());
        }
        k2t.insert(key, targets);
    }

    /// Stored responses that depend on `target`.
    pub fn keys_for(&self, target: &PurgeTarget) -> HashSet<StoreKey> {
        rw_read(&self.target_to_keys, SOURCE, "keys_for")
            .get(target)
            .cloned()
            .unwrap_or_default()
    }

    pub fn targets_for(&self, key: &StoreKey) -> HashSet<PurgeTarget> {
        rw_read(&self.key_to_targets, SOURCE, "targets_for")
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Forget a stored response (after eviction or purge).
    pub fn unregister(&self, key: &StoreKey) {
        let mut t2k = rw_write(&self.target_to_keys, SOURCE, "unregister.target_to_keys");
        let mut k2t = rw_write(&self.key_to_targets, SOURCE, "unregister.key_to_targets");

        if let Some(targets) = k2t.remove(key) {
            detach(&mut t2k, key, targets);
        }
    }

    pub fn clear(&self) {
        rw_write(&self.target_to_keys, SOURCE, "clear.target_to_keys").clear();
        rw_write(&self.key_to_targets, SOURCE, "clear.key_to_targets").clear();
    }

    pub fn target_count(&self) -> usize {
        rw_read(&self.target_to_keys, SOURCE, "target_count").len()
    }

    pub fn key_count(&self) -> usize {
        rw_read(&self.key_to_targets, SOURCE, "key_count").len()
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn detach(
    t2k: &mut HashMap<PurgeTarget, HashSet<StoreKey>>,
    key: &StoreKey,
    targets: HashSet<PurgeTarget>,
) {
    for target in targets {
        if let Some(keys) = t2k.get_mut(&target) {
            keys.remove(key);
            if keys.is_empty() {
                t2k.remove(&target);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use crate::cache::keys::{AggregateTag, CacheKey};
    use crate::domain::locale::Locale;

    use super::*;

    fn store_key(path: &str, variant: u64) -> StoreKey {
        StoreKey {
            key: CacheKey::new(path, Locale::parse("en").expect("valid locale")),
            variant,
        }
    }

    fn path_target(path: &str) -> PurgeTarget {
        PurgeTarget::Path(store_key(path, 0).key)
    }

    fn tag() -> PurgeTarget {
        PurgeTarget::Tag(AggregateTag::new("posts-sitemap"))
    }

    #[test]
    fn register_and_lookup() {
        let registry = CacheRegistry::new();
        let plain = store_key("/en/posts", 0);
        let filtered = store_key("/en/posts", 42);

        registry.register(plain.clone(), HashSet::from([path_target("/en/posts")]));
        registry.register(
            filtered.clone(),
            HashSet::from([path_target("/en/posts"), tag()]),
        );

        let keys = registry.keys_for(&path_target("/en/posts"));
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&filtered));
        assert_eq!(registry.keys_for(&tag()), HashSet::from([filtered.clone()]));
        assert_eq!(registry.targets_for(&filtered).len(), 2);
    }

    #[test]
    fn unregister_cleans_both_directions() {
        let registry = CacheRegistry::new();
        let key = store_key("/en/posts", 0);
        registry.register(key.clone(), HashSet::from([path_target("/en/posts"), tag()]));

        registry.unregister(&key);

        assert_eq!(registry.key_count(), 0);
        assert_eq!(registry.target_count(), 0);
        assert!(registry.keys_for(&tag()).is_empty());
    }

    #[test]
    fn re_register_replaces_targets() {
        let registry = CacheRegistry::new();
        let key = store_key("/en/posts", 0);
        registry.register(key.clone(), HashSet::from([tag()]));
        registry.register(key.clone(), HashSet::from([path_target("/en/posts")]));

        assert!(registry.keys_for(&tag()).is_empty());
        assert_eq!(registry.target_count(), 1);
    }

    #[test]
    fn registry_recovers_from_poisoned_lock() {
        let registry = CacheRegistry::new();

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = registry
                .target_to_keys
                .write()
                .expect("registry lock should be acquired");
            panic!("poison registry lock");
        }));

        registry.register(store_key("/en", 0), HashSet::from([tag()]));
        assert_eq!(registry.key_count(), 1);
    }
}
