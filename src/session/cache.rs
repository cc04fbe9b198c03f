//! Single-flight TTL cache for enriched profiles.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::profile::GameProfile;

/// Profile property snapshots stay fresh for six hours.
pub(super) const PROFILE_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Cache key: profile identity, i.e. id plus name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct ProfileKey {
    id: Option<Uuid>,
    name: Option<String>,
}

impl ProfileKey {
    pub(super) fn of(profile: &GameProfile) -> Self {
        Self {
            id: profile.id(),
            name: profile.name().map(str::to_string),
        }
    }
}

type FetchFuture = Shared<BoxFuture<'static, Option<GameProfile>>>;

enum Slot {
    Ready {
        profile: GameProfile,
        inserted_at: Instant,
    },
    Pending(FetchFuture),
}

/// A concurrency-safe map from profile key to either a fresh snapshot or
/// the single outstanding fetch for that key.
///
/// All concurrent callers for one key subscribe to the same fetch and
/// observe its result. A fetch that yields `None` (the soft-failure
/// passthrough) is never cached, so a later lookup retries.
pub(super) struct ProfileCache {
    ttl: Duration,
    entries: Mutex<HashMap<ProfileKey, Slot>>,
}

impl ProfileCache {
    pub(super) fn new() -> Self {
        Self::with_ttl(PROFILE_TTL)
    }

    pub(super) fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the fresh cached value for `key`, or join/start the single
    /// in-flight fetch for it.
    pub(super) async fn get_or_fetch<F>(&self, key: ProfileKey, fetch: F) -> Option<GameProfile>
    where
        F: FnOnce() -> BoxFuture<'static, Option<GameProfile>>,
    {
        let shared = {
            let mut entries = self.entries.lock().await;
            match entries.get(&key) {
                Some(Slot::Ready {
                    profile,
                    inserted_at,
                }) if inserted_at.elapsed() < self.ttl => {
                    return Some(profile.clone());
                }
                Some(Slot::Pending(in_flight)) => in_flight.clone(),
                // Absent or expired: start a fetch and publish it.
                _ => {
                    let in_flight = fetch().shared();
                    entries.insert(key.clone(), Slot::Pending(in_flight.clone()));
                    in_flight
                }
            }
        };

        let result = shared.clone().await;

        // Write back only if the slot still holds this fetch; a concurrent
        // expiry/refetch cycle must not be clobbered with an older result.
        let mut entries = self.entries.lock().await;
        if let Some(Slot::Pending(current)) = entries.get(&key)
            && current.ptr_eq(&shared)
        {
            match &result {
                Some(profile) => {
                    entries.insert(
                        key,
                        Slot::Ready {
                            profile: profile.clone(),
                            inserted_at: Instant::now(),
                        },
                    );
                }
                None => {
                    entries.remove(&key);
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn profile() -> GameProfile {
        GameProfile::complete(
            "069a79f4-44e9-4726-a5be-fca90e38aaf5".parse().unwrap(),
            "Notch",
        )
    }

    fn counted_fetch(
        calls: &Arc<AtomicUsize>,
        result: Option<GameProfile>,
    ) -> impl FnOnce() -> BoxFuture<'static, Option<GameProfile>> {
        let calls = Arc::clone(calls);
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                result
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn concurrent_lookups_share_one_fetch() {
        let cache = ProfileCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = ProfileKey::of(&profile());

        let (a, b) = tokio::join!(
            cache.get_or_fetch(key.clone(), counted_fetch(&calls, Some(profile()))),
            cache.get_or_fetch(key.clone(), counted_fetch(&calls, Some(profile()))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a, Some(profile()));
        assert_eq!(b, Some(profile()));
    }

    #[tokio::test]
    async fn fresh_entries_are_served_without_a_fetch() {
        let cache = ProfileCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = ProfileKey::of(&profile());

        cache
            .get_or_fetch(key.clone(), counted_fetch(&calls, Some(profile())))
            .await;
        cache
            .get_or_fetch(key.clone(), counted_fetch(&calls, Some(profile())))
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = ProfileCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = ProfileKey::of(&profile());

        let miss = cache
            .get_or_fetch(key.clone(), counted_fetch(&calls, None))
            .await;
        assert!(miss.is_none());

        let hit = cache
            .get_or_fetch(key.clone(), counted_fetch(&calls, Some(profile())))
            .await;
        assert_eq!(hit, Some(profile()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_entries_trigger_a_refetch() {
        let cache = ProfileCache::with_ttl(Duration::ZERO);
        let calls = Arc::new(AtomicUsize::new(0));
        let key = ProfileKey::of(&profile());

        cache
            .get_or_fetch(key.clone(), counted_fetch(&calls, Some(profile())))
            .await;
        cache
            .get_or_fetch(key.clone(), counted_fetch(&calls, Some(profile())))
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
