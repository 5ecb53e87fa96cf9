/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! At-most-once keyed cache shared by topic and topic-name resolution.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use tokio::sync::RwLock;

/// A [`KeyedCache`] maps a stable key to a value that, once published, never
/// changes for the lifetime of the cache.
///
/// Values are published through [`KeyedCache::get_or_insert_with`], which runs
/// the check-and-insert under a single write lock. The factory is therefore
/// invoked at most once per key even when many callers race on the same key,
/// and every loser observes the winner's value. The lock is never held
/// across an `.await` of caller code: callers perform their remote work
/// first and only hand the finished value to the cache.
pub struct KeyedCache<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for KeyedCache<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> KeyedCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the published value for `key`, if any.
    pub async fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.read().await.get(key).cloned()
    }

    /// Returns the value already published for `key`, or publishes the one
    /// produced by `factory`. The first published value always wins.
    pub async fn get_or_insert_with<F>(&self, key: K, factory: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(existing) = self.entries.read().await.get(&key) {
            return existing.clone();
        }

        let mut entries = self.entries.write().await;
        entries.entry(key).or_insert_with(factory).clone()
    }

    /// Publishes `value` unless a value is already present, in which case the
    /// present value is returned and `value` is dropped.
    pub async fn get_or_insert(&self, key: K, value: V) -> V {
        self.get_or_insert_with(key, move || value).await
    }
}

#[cfg(test)]
mod tests {
    use super::KeyedCache;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn get_returns_none_until_published() {
        let cache: KeyedCache<String, u32> = KeyedCache::new();

        assert_eq!(cache.get("orders").await, None);
        assert_eq!(cache.get_or_insert("orders".to_string(), 7).await, 7);
        assert_eq!(cache.get("orders").await, Some(7));
    }

    #[tokio::test]
    async fn first_published_value_wins() {
        let cache: KeyedCache<&'static str, &'static str> = KeyedCache::new();

        let first = cache.get_or_insert("key", "first").await;
        let second = cache.get_or_insert("key", "second").await;

        assert_eq!(first, "first");
        assert_eq!(second, "first");
        assert_eq!(cache.get("key").await, Some("first"));
    }

    #[tokio::test]
    async fn factory_is_not_called_when_value_present() {
        let cache: KeyedCache<u8, u8> = KeyedCache::new();
        cache.get_or_insert(1, 10).await;

        let value = cache
            .get_or_insert_with(1, || panic!("factory must not run for a cached key"))
            .await;

        assert_eq!(value, 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_callers_invoke_factory_at_most_once() {
        let cache: Arc<KeyedCache<String, usize>> = Arc::new(KeyedCache::new());
        let invocations = Arc::new(AtomicUsize::new(0));

        let callers = (0..32).map(|caller| {
            let cache = cache.clone();
            let invocations = invocations.clone();
            tokio::spawn(async move {
                cache
                    .get_or_insert_with("shared".to_string(), || {
                        invocations.fetch_add(1, Ordering::SeqCst);
                        caller
                    })
                    .await
            })
        });

        let observed: Vec<usize> = futures::future::join_all(callers)
            .await
            .into_iter()
            .map(|joined| joined.expect("caller task should not panic"))
            .collect();

        assert_eq!(invocations.load(Ordering::SeqCst), 1);
        assert!(observed.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(cache.get("shared").await, Some(observed[0]));
    }

    #[tokio::test]
    async fn distinct_keys_are_independent() {
        let cache: KeyedCache<&'static str, u32> = KeyedCache::new();

        cache.get_or_insert("a", 1).await;
        cache.get_or_insert("b", 2).await;

        assert_eq!(cache.get("a").await, Some(1));
        assert_eq!(cache.get("b").await, Some(2));
        assert_eq!(cache.get("c").await, None);
    }
}
