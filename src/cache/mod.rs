//! Process-local read cache sitting between the resource hooks and the document store.
//!
//! Guarantees, per [`CacheKey`]:
//! - at most one fetch is in flight; concurrent readers share it,
//! - a fresh value is served without touching the store,
//! - a stale value is served immediately while a refresh runs in the background,
//! - a failed fetch never evicts the previous value,
//! - invalidation drops every entry of a resource type, in-flight fetches included.

pub mod clock;
mod key;
mod state;

use std::{
    any::Any,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use dashmap::DashMap;
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use thiserror::Error;
use tokio::{sync::broadcast, time::sleep};
use tracing::{debug, warn};

use crate::dao::storage::{StorageError, StorageResult};

pub use self::clock::{Clock, ManualClock, SystemClock};
pub use self::key::{CacheKey, ResourceType};
pub use self::state::QueryState;

type CachedValue = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, StorageResult<CachedValue>>>;

/// Attempts per fetch when retrying is enabled, first attempt included.
const MAX_FETCH_ATTEMPTS: u32 = 3;
const INVALIDATION_CHANNEL_CAPACITY: usize = 64;

/// Freshness and retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Age after which a cached value is refreshed on the next read.
    pub stale_after: Duration,
    /// Retry fetches that fail with a transient error.
    pub retry_on_error: bool,
    /// Delay before the first retry; doubled for each further attempt.
    pub retry_delay: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(30),
            retry_on_error: true,
            retry_delay: Duration::from_millis(250),
        }
    }
}

/// Keyed read cache with single-flight fetches and coarse invalidation.
///
/// Clones share the same entries.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    entries: DashMap<CacheKey, Slot>,
    next_fetch_id: AtomicU64,
    invalidations: broadcast::Sender<ResourceType>,
}

#[derive(Default)]
struct Slot {
    value: Option<(CachedValue, Instant)>,
    error: Option<(StorageError, Instant)>,
    in_flight: Option<InFlight>,
}

struct InFlight {
    id: u64,
    future: SharedFetch,
    /// Set by invalidation: the result is handed to existing waiters but never cached.
    orphaned: bool,
}

enum Lookup {
    Ready(CachedValue),
    Failed(StorageError),
    Pending(SharedFetch),
}

/// Two different value types were requested under the same key.
#[derive(Debug, Error)]
#[error("cached value for `{0}` has an unexpected type")]
struct TypeMismatch(String);

impl QueryCache {
    /// Cache using the system clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Cache using an injected clock.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let (invalidations, _rx) = broadcast::channel(INVALIDATION_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(CacheInner {
                config,
                clock,
                entries: DashMap::new(),
                next_fetch_id: AtomicU64::new(0),
                invalidations,
            }),
        }
    }

    /// Active freshness and retry policy.
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Resolve `key`, fetching through `fetcher` only when needed.
    ///
    /// Fresh and stale values return immediately; otherwise the caller waits
    /// for the single in-flight fetch of this key. Dropping the returned
    /// future does not cancel that fetch.
    pub async fn read<T, F, Fut>(&self, key: CacheKey, fetcher: F) -> StorageResult<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StorageResult<T>> + Send + 'static,
    {
        let value = match self.lookup(&key, fetcher) {
            Lookup::Ready(value) => value,
            Lookup::Failed(err) => return Err(err),
            Lookup::Pending(fetch) => fetch.await?,
        };
        downcast(&key, value)
    }

    /// Non-blocking snapshot of `key`, starting a fetch when one is needed.
    pub fn observe<T, F, Fut>(&self, key: CacheKey, fetcher: F) -> QueryState<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StorageResult<T>> + Send + 'static,
    {
        match self.lookup(&key, fetcher) {
            Lookup::Ready(value) => downcast(&key, value).into(),
            Lookup::Failed(err) => QueryState::Error(err),
            Lookup::Pending(_) => QueryState::Loading,
        }
    }

    /// Drop every entry of `resource`, returning how many were cleared.
    ///
    /// Fetches still running for the cleared entries complete for their own
    /// waiters but no longer populate the cache. The next read of such a key
    /// queues its refetch behind the orphaned one, so a key never has two
    /// fetches on the wire.
    pub fn invalidate(&self, resource: ResourceType) -> usize {
        let mut removed = 0;
        self.inner.entries.retain(|key, slot| {
            if key.resource() != resource {
                return true;
            }
            removed += 1;
            match slot.in_flight.as_mut() {
                Some(in_flight) => {
                    in_flight.orphaned = true;
                    slot.value = None;
                    slot.error = None;
                    true
                }
                None => false,
            }
        });
        debug!(%resource, removed, "cache invalidated");
        let _ = self.inner.invalidations.send(resource);
        removed
    }

    /// Subscribe to invalidation notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ResourceType> {
        self.inner.invalidations.subscribe()
    }

    /// Whether a fetch for `key` is currently running.
    pub fn is_in_flight(&self, key: &CacheKey) -> bool {
        self.inner
            .entries
            .get(key)
            .is_some_and(|slot| slot.in_flight.is_some())
    }

    fn lookup<T, F, Fut>(&self, key: &CacheKey, fetcher: F) -> Lookup
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StorageResult<T>> + Send + 'static,
    {
        let now = self.inner.clock.now();
        let mut slot = self.inner.entries.entry(key.clone()).or_default();

        let cached = slot.value.as_ref().map(|(value, at)| (value.clone(), *at));
        if let Some((value, fetched_at)) = cached {
            if self.inner.is_fresh(fetched_at, now) {
                return Lookup::Ready(value);
            }
            if slot.in_flight.is_none() {
                debug!(%key, "serving stale value while revalidating");
                slot.in_flight = Some(self.spawn_fetch(key.clone(), fetcher, None));
            }
            return Lookup::Ready(value);
        }

        let orphan = match &slot.in_flight {
            Some(in_flight) if !in_flight.orphaned => {
                return Lookup::Pending(in_flight.future.clone());
            }
            Some(in_flight) => Some((in_flight.id, in_flight.future.clone())),
            None => None,
        };
        if let Some((orphan_id, orphan)) = orphan {
            debug!(%key, fetch_id = orphan_id, "queueing refetch behind invalidated fetch");
            let queued = self.spawn_fetch(key.clone(), fetcher, Some(orphan));
            let future = queued.future.clone();
            slot.in_flight = Some(queued);
            return Lookup::Pending(future);
        }

        if let Some((err, failed_at)) = &slot.error {
            if self.inner.is_fresh(*failed_at, now) {
                return Lookup::Failed(err.clone());
            }
        }

        let in_flight = self.spawn_fetch(key.clone(), fetcher, None);
        let future = in_flight.future.clone();
        slot.in_flight = Some(in_flight);
        Lookup::Pending(future)
    }

    /// Start a fetch for `key`, first waiting for `after` when given.
    fn spawn_fetch<T, F, Fut>(&self, key: CacheKey, fetcher: F, after: Option<SharedFetch>) -> InFlight
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StorageResult<T>> + Send + 'static,
    {
        let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let inner = self.inner.clone();
        debug!(%key, fetch_id = id, "fetch started");

        let task = tokio::spawn(async move {
            if let Some(previous) = after {
                let _ = previous.await;
            }
            let outcome = fetch_with_retry(&inner.config, &key, &fetcher)
                .await
                .map(|value| Arc::new(value) as CachedValue);
            inner.complete(&key, id, &outcome);
            outcome
        });

        let future = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(join_err) => Err(StorageError::unavailable("cache fetch task failed", join_err)),
            }
        }
        .boxed()
        .shared();

        InFlight {
            id,
            future,
            orphaned: false,
        }
    }
}

impl CacheInner {
    fn is_fresh(&self, at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(at) < self.config.stale_after
    }

    /// Record a finished fetch, unless its entry was invalidated meanwhile.
    fn complete(&self, key: &CacheKey, id: u64, outcome: &StorageResult<CachedValue>) {
        let Some(mut slot) = self.entries.get_mut(key) else {
            debug!(%key, fetch_id = id, "entry gone; discarding fetch result");
            return;
        };
        if slot.in_flight.as_ref().map(|f| f.id) != Some(id) {
            debug!(%key, fetch_id = id, "fetch superseded; discarding");
            return;
        }

        let orphaned = slot.in_flight.as_ref().is_some_and(|f| f.orphaned);
        slot.in_flight = None;
        if orphaned {
            debug!(%key, fetch_id = id, "fetch finished after invalidation; discarding");
            return;
        }

        let now = self.clock.now();
        match outcome {
            Ok(value) => {
                slot.value = Some((value.clone(), now));
                slot.error = None;
            }
            Err(err) => {
                warn!(%key, error = %err, kept_stale = slot.value.is_some(), "fetch failed");
                slot.error = Some((err.clone(), now));
            }
        }
    }
}

async fn fetch_with_retry<T, F, Fut>(config: &CacheConfig, key: &CacheKey, fetcher: &F) -> StorageResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = StorageResult<T>>,
{
    let mut attempt = 1;
    let mut delay = config.retry_delay;
    loop {
        match fetcher().await {
            Ok(value) => return Ok(value),
            Err(err) if config.retry_on_error && err.is_transient() && attempt < MAX_FETCH_ATTEMPTS => {
                debug!(%key, attempt, error = %err, "fetch failed; retrying");
                sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn downcast<T: Send + Sync + 'static>(key: &CacheKey, value: CachedValue) -> StorageResult<Arc<T>> {
    value
        .downcast::<T>()
        .map_err(|_| StorageError::unavailable("cache type mismatch", TypeMismatch(key.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Semaphore;

    use crate::dao::{document_store::Collection, storage::Degraded};

    struct Harness {
        cache: QueryCache,
        clock: Arc<ManualClock>,
    }

    fn harness(retry_on_error: bool) -> Harness {
        let clock = Arc::new(ManualClock::new());
        let config = CacheConfig {
            stale_after: Duration::from_secs(30),
            retry_on_error,
            retry_delay: Duration::ZERO,
        };
        Harness {
            cache: QueryCache::with_clock(config, clock.clone()),
            clock,
        }
    }

    fn teams_key() -> CacheKey {
        CacheKey::all(ResourceType::Teams)
    }

    fn unavailable() -> StorageError {
        StorageError::unavailable("store down", Degraded("down"))
    }

    /// Fetcher returning successive values from `script`, counting calls.
    fn scripted(
        calls: Arc<AtomicUsize>,
        script: Vec<StorageResult<u32>>,
    ) -> impl Fn() -> BoxFuture<'static, StorageResult<u32>> + Send + Sync + 'static {
        let script = Arc::new(script);
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            let outcome = script
                .get(n)
                .or_else(|| script.last())
                .cloned()
                .unwrap_or(Ok(0));
            Box::pin(async move { outcome })
        }
    }

    /// Fetcher that blocks until a permit is added to `gate`.
    fn gated(
        calls: Arc<AtomicUsize>,
        gate: Arc<Semaphore>,
        value: u32,
    ) -> impl Fn() -> BoxFuture<'static, StorageResult<u32>> + Send + Sync + 'static {
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            let gate = gate.clone();
            Box::pin(async move {
                let _permit = gate
                    .acquire()
                    .await
                    .map_err(|err| StorageError::unavailable("gate closed", err))?;
                Ok(value)
            })
        }
    }

    async fn settle(cache: &QueryCache, key: &CacheKey) {
        while cache.is_in_flight(key) {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn concurrent_readers_share_one_fetch() {
        let Harness { cache, .. } = harness(false);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Semaphore::new(0));

        for _ in 0..3 {
            let state = cache.observe::<u32, _, _>(teams_key(), gated(calls.clone(), gate.clone(), 7));
            assert!(state.is_loading());
        }
        assert!(cache.is_in_flight(&teams_key()));

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                let fetcher = gated(calls.clone(), gate.clone(), 7);
                tokio::spawn(async move { cache.read::<u32, _, _>(teams_key(), fetcher).await })
            })
            .collect();
        tokio::task::yield_now().await;
        gate.add_permits(1);

        for waiter in waiters {
            assert_eq!(*waiter.await.unwrap().unwrap(), 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fresh_value_is_served_without_fetching() {
        let Harness { cache, clock } = harness(false);
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .read::<u32, _, _>(teams_key(), scripted(calls.clone(), vec![Ok(1), Ok(2)]))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(29));
        let second = cache
            .read::<u32, _, _>(teams_key(), scripted(calls.clone(), vec![Ok(1), Ok(2)]))
            .await
            .unwrap();

        assert_eq!((*first, *second), (1, 1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_value_is_served_while_revalidating() {
        let Harness { cache, clock } = harness(false);
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = || scripted(calls.clone(), vec![Ok(1), Ok(2)]);

        cache.read::<u32, _, _>(teams_key(), fetcher()).await.unwrap();
        clock.advance(Duration::from_secs(31));

        let stale = cache.read::<u32, _, _>(teams_key(), fetcher()).await.unwrap();
        assert_eq!(*stale, 1);
        assert!(cache.is_in_flight(&teams_key()));

        settle(&cache, &teams_key()).await;
        let refreshed = cache.read::<u32, _, _>(teams_key(), fetcher()).await.unwrap();
        assert_eq!(*refreshed, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_value() {
        let Harness { cache, clock } = harness(false);
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = || scripted(calls.clone(), vec![Ok(5), Err(unavailable())]);

        cache.read::<u32, _, _>(teams_key(), fetcher()).await.unwrap();
        clock.advance(Duration::from_secs(31));
        cache.read::<u32, _, _>(teams_key(), fetcher()).await.unwrap();
        settle(&cache, &teams_key()).await;

        match cache.observe::<u32, _, _>(teams_key(), fetcher()) {
            QueryState::Success(value) => assert_eq!(*value, 5),
            other => panic!("expected stale success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_without_value_settles_for_the_freshness_window() {
        let Harness { cache, clock } = harness(false);
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = || scripted(calls.clone(), vec![Err(unavailable()), Ok(9)]);

        assert!(cache.observe::<u32, _, _>(teams_key(), fetcher()).is_loading());
        settle(&cache, &teams_key()).await;

        assert!(matches!(
            cache.observe::<u32, _, _>(teams_key(), fetcher()),
            QueryState::Error(StorageError::Unavailable { .. })
        ));
        assert!(cache.read::<u32, _, _>(teams_key(), fetcher()).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(31));
        let value = cache.read::<u32, _, _>(teams_key(), fetcher()).await.unwrap();
        assert_eq!(*value, 9);
    }

    #[tokio::test]
    async fn invalidation_is_coarse_and_forces_refetch() {
        let Harness { cache, .. } = harness(false);
        let calls = Arc::new(AtomicUsize::new(0));
        let mut events = cache.subscribe();
        let match_key = CacheKey::with_params(ResourceType::Matches, "m1");

        cache
            .read::<u32, _, _>(teams_key(), scripted(calls.clone(), vec![Ok(1), Ok(2)]))
            .await
            .unwrap();
        cache
            .read::<u32, _, _>(CacheKey::with_params(ResourceType::Teams, "t1"), scripted(Arc::default(), vec![Ok(3)]))
            .await
            .unwrap();
        cache
            .read::<u32, _, _>(match_key.clone(), scripted(Arc::default(), vec![Ok(4)]))
            .await
            .unwrap();

        assert_eq!(cache.invalidate(ResourceType::Teams), 2);
        assert_eq!(events.recv().await.unwrap(), ResourceType::Teams);

        let refreshed = cache
            .read::<u32, _, _>(teams_key(), scripted(calls.clone(), vec![Ok(1), Ok(2)]))
            .await
            .unwrap();
        assert_eq!(*refreshed, 2);

        let untouched = cache
            .read::<u32, _, _>(match_key, scripted(Arc::default(), vec![Ok(99)]))
            .await
            .unwrap();
        assert_eq!(*untouched, 4);
    }

    #[tokio::test]
    async fn fetch_orphaned_by_invalidation_does_not_repopulate() {
        let Harness { cache, .. } = harness(false);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Semaphore::new(0));

        assert!(cache.observe::<u32, _, _>(teams_key(), gated(calls.clone(), gate.clone(), 1)).is_loading());
        cache.invalidate(ResourceType::Teams);
        gate.add_permits(1);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        // The released permit returns to the gate, so the next fetch passes straight through.
        assert!(cache.observe::<u32, _, _>(teams_key(), gated(calls.clone(), gate.clone(), 2)).is_loading());
        let value = cache
            .read::<u32, _, _>(teams_key(), gated(calls.clone(), gate.clone(), 3))
            .await
            .unwrap();
        assert_eq!(*value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn refetch_after_invalidation_waits_for_the_orphaned_fetch() {
        let Harness { cache, .. } = harness(false);
        let calls = Arc::new(AtomicUsize::new(0));
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Semaphore::new(0));

        let tracked = |value: u32| {
            let (calls, running, peak, gate) =
                (calls.clone(), running.clone(), peak.clone(), gate.clone());
            move || -> BoxFuture<'static, StorageResult<u32>> {
                calls.fetch_add(1, Ordering::SeqCst);
                let (running, peak, gate) = (running.clone(), peak.clone(), gate.clone());
                Box::pin(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    let permit = gate.acquire().await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    permit.map_err(|err| StorageError::unavailable("gate closed", err))?;
                    Ok(value)
                })
            }
        };

        assert!(cache.observe::<u32, _, _>(teams_key(), tracked(1)).is_loading());
        tokio::task::yield_now().await;
        assert_eq!(running.load(Ordering::SeqCst), 1);

        cache.invalidate(ResourceType::Teams);
        assert!(cache.observe::<u32, _, _>(teams_key(), tracked(2)).is_loading());
        assert!(cache.observe::<u32, _, _>(teams_key(), tracked(3)).is_loading());
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(running.load(Ordering::SeqCst), 1);

        gate.add_permits(1);
        let value = cache
            .read::<u32, _, _>(teams_key(), tracked(4))
            .await
            .unwrap();
        assert_eq!(*value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_errors_are_retried_when_enabled() {
        let Harness { cache, .. } = harness(true);
        let calls = Arc::new(AtomicUsize::new(0));
        let script = vec![Err(unavailable()), Err(unavailable()), Ok(3)];

        let value = cache
            .read::<u32, _, _>(teams_key(), scripted(calls.clone(), script))
            .await
            .unwrap();
        assert_eq!(*value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_gives_up_after_three_attempts() {
        let Harness { cache, .. } = harness(true);
        let calls = Arc::new(AtomicUsize::new(0));

        let err = cache
            .read::<u32, _, _>(teams_key(), scripted(calls.clone(), vec![Err(unavailable())]))
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_FETCH_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn not_found_is_never_retried() {
        let Harness { cache, .. } = harness(true);
        let calls = Arc::new(AtomicUsize::new(0));
        let missing = StorageError::not_found(Collection::Teams, "t1");

        let err = cache
            .read::<u32, _, _>(teams_key(), scripted(calls.clone(), vec![Err(missing)]))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_retry_when_disabled() {
        let Harness { cache, .. } = harness(false);
        let calls = Arc::new(AtomicUsize::new(0));
        let script = vec![Err(unavailable()), Ok(3)];

        assert!(cache
            .read::<u32, _, _>(teams_key(), scripted(calls.clone(), script))
            .await
            .is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn abandoned_reader_does_not_cancel_fetch() {
        let Harness { cache, .. } = harness(false);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Semaphore::new(0));

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            cache.read::<u32, _, _>(teams_key(), gated(calls.clone(), gate.clone(), 11)),
        )
        .await;
        assert!(abandoned.is_err());

        gate.add_permits(1);
        settle(&cache, &teams_key()).await;
        match cache.observe::<u32, _, _>(teams_key(), gated(calls.clone(), gate.clone(), 12)) {
            QueryState::Success(value) => assert_eq!(*value, 11),
            other => panic!("expected populated entry, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
