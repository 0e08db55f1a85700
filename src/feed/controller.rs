// src/feed/controller.rs

//! Paginated fetch controller.
//!
//! Owns one [`PaginatedCollection`] and the rules for growing it:
//! - at most one fetch in flight per feed, so pages append in request order
//! - `load_more()` is a no-op once the backend reports no further pages
//! - a failed fetch leaves the collection untouched and can be retried
//! - responses that arrive after `close()` or after a newer refresh are dropped

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::Result;
use crate::feed::{FeedError, Identified, LoadGate, PaginatedCollection};
use crate::models::Page;

/// Resource-specific page fetch: `(page, limit) -> Page<T>`.
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<Page<T>>;
}

#[async_trait]
impl<T, F, Fut> PageSource<T> for F
where
    T: Send + 'static,
    F: Fn(u32, u32) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Page<T>>> + Send + 'static,
{
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<Page<T>> {
        (self)(page, limit).await
    }
}

/// Whether a load starts over or extends what is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Page 1 replaces the collection
    Refresh,
    /// Pages `1..=through` replace the collection together
    Reload { through: u32 },
    Append,
}

impl LoadMode {
    fn replaces(self) -> bool {
        !matches!(self, LoadMode::Append)
    }
}

/// A page request, kept so a failure can be re-issued verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    pub page: u32,
    pub mode: LoadMode,
}

/// Why a load call did not touch the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another fetch for this feed is still running
    InFlight,
    /// The backend reported no further pages
    Exhausted,
    /// The feed was closed
    Closed,
    /// `retry()` without a preceding failure
    NothingToRetry,
}

/// Result of a load call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was merged into the collection
    Loaded { page: u32, received: usize },
    /// No request was sent
    Skipped(SkipReason),
    /// The response arrived too late and was dropped
    Discarded,
}

/// Point-in-time view of a feed for rendering.
#[derive(Debug)]
pub struct FeedSnapshot<T> {
    pub items: Arc<Vec<T>>,
    pub current_page: u32,
    pub has_next_page: bool,
    pub total_count: u64,
    /// A refresh or reload is running
    pub is_loading: bool,
    /// An append is running
    pub is_loading_more: bool,
    pub error: Option<FeedError>,
}

impl<T> FeedSnapshot<T> {
    /// Show a full-page spinner only when there is nothing to show yet.
    pub fn is_initial_load(&self) -> bool {
        self.is_loading && self.items.is_empty()
    }
}

struct FeedState<T> {
    collection: PaginatedCollection<T>,
    in_flight: Option<LoadRequest>,
    failed: Option<(LoadRequest, FeedError)>,
    /// Bumped by every refresh; responses from older generations are stale
    generation: u64,
    closed: bool,
}

/// Controller for one paginated collection.
pub struct PaginatedFeed<T> {
    source: Arc<dyn PageSource<T>>,
    page_size: u32,
    state: Mutex<FeedState<T>>,
}

impl<T> PaginatedFeed<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(source: impl PageSource<T> + 'static, page_size: u32) -> Self {
        Self::from_source(Arc::new(source), page_size)
    }

    pub fn from_source(source: Arc<dyn PageSource<T>>, page_size: u32) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            state: Mutex::new(FeedState {
                collection: PaginatedCollection::new(),
                in_flight: None,
                failed: None,
                generation: 0,
                closed: false,
            }),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn lock(&self) -> MutexGuard<'_, FeedState<T>> {
        // State is only ever replaced wholesale, so a poisoned value is still consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> FeedSnapshot<T> {
        let state = self.lock();
        FeedSnapshot {
            items: state.collection.items(),
            current_page: state.collection.current_page(),
            has_next_page: state.collection.has_next_page(),
            total_count: state.collection.total_count(),
            is_loading: state.in_flight.is_some_and(|r| r.mode.replaces()),
            is_loading_more: state.in_flight.is_some_and(|r| r.mode == LoadMode::Append),
            error: state.failed.as_ref().map(|(_, e)| e.clone()),
        }
    }

    /// Inputs for the infinite-scroll trigger.
    pub fn gate(&self) -> LoadGate {
        let state = self.lock();
        LoadGate {
            has_next_page: state.collection.has_next_page() && !state.closed,
            is_loading: state.in_flight.is_some(),
        }
    }

    /// Stop accepting results; in-flight responses will be discarded.
    pub fn close(&self) {
        let mut state = self.lock();
        if !state.closed {
            log::debug!("Feed closed");
        }
        state.closed = true;
        state.in_flight = None;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Fetch page 1 and replace the collection with it.
    pub async fn refresh(&self) -> Result<LoadOutcome> {
        let request = LoadRequest {
            page: 1,
            mode: LoadMode::Refresh,
        };
        let generation = match self.begin_refresh(request) {
            Ok(generation) => generation,
            Err(reason) => return Ok(LoadOutcome::Skipped(reason)),
        };

        let result = self.fetch(request).await;
        self.finish(request, generation, result)
    }

    /// Re-fetch every page loaded so far and swap the result in at once.
    ///
    /// This is the authoritative reset used after a rejected mutation. A
    /// failed reload is retried as a whole.
    pub async fn reload(&self) -> Result<LoadOutcome> {
        let through = self.lock().collection.current_page().max(1);
        let request = LoadRequest {
            page: 1,
            mode: LoadMode::Reload { through },
        };
        let generation = match self.begin_refresh(request) {
            Ok(generation) => generation,
            Err(reason) => return Ok(LoadOutcome::Skipped(reason)),
        };

        let result = self.fetch(request).await;
        self.finish(request, generation, result)
    }

    async fn fetch(&self, request: LoadRequest) -> Result<Page<T>> {
        match request.mode {
            LoadMode::Reload { through } => self.fetch_through(through).await,
            LoadMode::Refresh | LoadMode::Append => {
                self.source.fetch_page(request.page, self.page_size).await
            }
        }
    }

    /// Pages `1..=through` merged into one, stopping early at the last page.
    async fn fetch_through(&self, through: u32) -> Result<Page<T>> {
        let mut merged: Option<Page<T>> = None;
        for page in 1..=through {
            let next = self.source.fetch_page(page, self.page_size).await?;
            let more = next.has_next_page;
            merged = Some(match merged {
                None => next,
                Some(mut acc) => {
                    acc.items.extend(next.items);
                    acc.current_page = next.current_page;
                    acc.has_next_page = next.has_next_page;
                    acc.total_count = next.total_count;
                    acc
                }
            });
            if !more {
                break;
            }
        }
        Ok(merged.unwrap_or_else(|| Page::complete(Vec::new())))
    }

    /// Fetch the next page and append it.
    ///
    /// Skipped without a network call while another fetch is running or
    /// once the backend reported the last page.
    pub async fn load_more(&self) -> Result<LoadOutcome> {
        let (request, generation) = {
            let mut state = self.lock();
            if state.closed {
                return Ok(LoadOutcome::Skipped(SkipReason::Closed));
            }
            if state.in_flight.is_some() {
                log::debug!("load_more skipped: fetch already in flight");
                return Ok(LoadOutcome::Skipped(SkipReason::InFlight));
            }
            if !state.collection.has_next_page() {
                log::debug!("load_more skipped: no further pages");
                return Ok(LoadOutcome::Skipped(SkipReason::Exhausted));
            }
            let request = LoadRequest {
                page: state.collection.next_page(),
                mode: LoadMode::Append,
            };
            state.in_flight = Some(request);
            (request, state.generation)
        };

        let result = self.fetch(request).await;
        self.finish(request, generation, result)
    }

    /// Re-issue the request that failed last.
    pub async fn retry(&self) -> Result<LoadOutcome> {
        let (request, generation) = {
            let mut state = self.lock();
            if state.closed {
                return Ok(LoadOutcome::Skipped(SkipReason::Closed));
            }
            if state.in_flight.is_some() {
                return Ok(LoadOutcome::Skipped(SkipReason::InFlight));
            }
            let Some((request, _)) = state.failed.clone() else {
                return Ok(LoadOutcome::Skipped(SkipReason::NothingToRetry));
            };
            if request.mode.replaces() {
                state.generation += 1;
            }
            state.in_flight = Some(request);
            (request, state.generation)
        };

        log::info!("Retrying page {} ({:?})", request.page, request.mode);
        let result = self.fetch(request).await;
        self.finish(request, generation, result)
    }

    fn begin_refresh(&self, request: LoadRequest) -> std::result::Result<u64, SkipReason> {
        let mut state = self.lock();
        if state.closed {
            return Err(SkipReason::Closed);
        }
        state.generation += 1;
        state.in_flight = Some(request);
        Ok(state.generation)
    }

    fn finish(
        &self,
        request: LoadRequest,
        generation: u64,
        result: Result<Page<T>>,
    ) -> Result<LoadOutcome> {
        let mut state = self.lock();
        if state.closed || state.generation != generation {
            log::debug!(
                "Discarding stale response for page {} ({:?})",
                request.page,
                request.mode
            );
            return Ok(LoadOutcome::Discarded);
        }

        state.in_flight = None;
        match result {
            Ok(page) => {
                let received = page.items.len();
                let page_no = page.current_page;
                match request.mode {
                    LoadMode::Append => state.collection.append(page),
                    LoadMode::Refresh | LoadMode::Reload { .. } => state.collection.replace(page),
                }
                state.failed = None;
                log::info!(
                    "Loaded page {} ({} items, {} of {} loaded)",
                    page_no,
                    received,
                    state.collection.len(),
                    state.collection.total_count()
                );
                Ok(LoadOutcome::Loaded {
                    page: page_no,
                    received,
                })
            }
            Err(e) => {
                log::warn!("Failed to load page {}: {}", request.page, e);
                state.failed = Some((request, FeedError::from(&e)));
                Err(e)
            }
        }
    }
}

impl<T> PaginatedFeed<T>
where
    T: Clone + Identified + Send + Sync + 'static,
{
    /// Current value of the item with `id`, if loaded.
    pub fn find(&self, id: &str) -> Option<T> {
        self.lock().collection.find(id).cloned()
    }

    /// Atomically replace one item; returns its previous value.
    pub fn update_item(&self, id: &str, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut state = self.lock();
        if state.closed {
            return None;
        }
        state.collection.update(id, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Serves `total` numbered items; pages listed in `fail_pages` error once.
    struct NumberSource {
        total: u32,
        calls: Mutex<Vec<u32>>,
        fail_next: AtomicUsize,
    }

    impl NumberSource {
        fn new(total: u32) -> Arc<Self> {
            Arc::new(Self {
                total,
                calls: Mutex::new(Vec::new()),
                fail_next: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> Vec<u32> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource<u32> for NumberSource {
        async fn fetch_page(&self, page: u32, limit: u32) -> Result<Page<u32>> {
            self.calls.lock().unwrap().push(page);
            if self.fail_next.load(Ordering::SeqCst) > 0 {
                self.fail_next.fetch_sub(1, Ordering::SeqCst);
                return Err(AppError::Server {
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            let start = (page - 1) * limit;
            let end = (start + limit).min(self.total);
            Ok(Page {
                items: (start..end).collect(),
                current_page: page,
                has_next_page: end < self.total,
                total_count: u64::from(self.total),
            })
        }
    }

    #[tokio::test]
    async fn test_pages_append_in_order() {
        let source = NumberSource::new(37);
        let feed = PaginatedFeed::<u32>::from_source(source.clone(), 10);

        feed.refresh().await.unwrap();
        let outcome = feed.load_more().await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { page: 2, received: 10 });

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.items.len(), 20);
        assert_eq!(snapshot.total_count, 37);
        assert!(snapshot.has_next_page);
        assert_eq!(*snapshot.items, (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_load_more_after_last_page_is_noop() {
        let source = NumberSource::new(15);
        let feed = PaginatedFeed::<u32>::from_source(source.clone(), 10);

        feed.refresh().await.unwrap();
        feed.load_more().await.unwrap();
        assert!(!feed.snapshot().has_next_page);

        let outcome = feed.load_more().await.unwrap();
        assert_eq!(outcome, LoadOutcome::Skipped(SkipReason::Exhausted));
        assert_eq!(source.calls(), vec![1, 2]);
        assert_eq!(feed.snapshot().items.len(), 15);
    }

    #[tokio::test]
    async fn test_exhausting_loads_every_page_once() {
        let source = NumberSource::new(95);
        let feed = PaginatedFeed::<u32>::from_source(source.clone(), 10);

        while feed.gate().has_next_page {
            feed.load_more().await.unwrap();
        }

        assert_eq!(source.calls(), (1..=10).collect::<Vec<_>>());
        assert_eq!(feed.snapshot().items.len(), 95);
    }

    #[tokio::test]
    async fn test_failure_leaves_collection_and_retry_reissues_same_page() {
        let source = NumberSource::new(30);
        let feed = PaginatedFeed::<u32>::from_source(source.clone(), 10);
        feed.refresh().await.unwrap();

        source.fail_next.store(1, Ordering::SeqCst);
        assert!(feed.load_more().await.is_err());

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.items.len(), 10);
        assert_eq!(snapshot.current_page, 1);
        assert!(snapshot.error.is_some());
        assert!(!snapshot.is_loading_more);

        let outcome = feed.retry().await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { page: 2, received: 10 });
        assert_eq!(source.calls(), vec![1, 2, 2]);
        assert!(feed.snapshot().error.is_none());

        assert_eq!(
            feed.retry().await.unwrap(),
            LoadOutcome::Skipped(SkipReason::NothingToRetry)
        );
    }

    /// Blocks every fetch until released.
    struct GatedSource {
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageSource<u32> for GatedSource {
        async fn fetch_page(&self, page: u32, _limit: u32) -> Result<Page<u32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok(Page {
                items: vec![page * 100],
                current_page: page,
                has_next_page: true,
                total_count: 100,
            })
        }
    }

    #[tokio::test]
    async fn test_concurrent_load_more_is_suppressed() {
        let source = Arc::new(GatedSource {
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let feed = Arc::new(PaginatedFeed::<u32>::from_source(source.clone(), 10));

        let first = tokio::spawn({
            let feed = Arc::clone(&feed);
            async move { feed.load_more().await }
        });
        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(feed.gate().is_loading);

        let second = feed.load_more().await.unwrap();
        assert_eq!(second, LoadOutcome::Skipped(SkipReason::InFlight));

        source.release.notify_one();
        let first = first.await.unwrap().unwrap();
        assert_eq!(first, LoadOutcome::Loaded { page: 1, received: 1 });
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_response_after_close_is_discarded() {
        let source = Arc::new(GatedSource {
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let feed = Arc::new(PaginatedFeed::<u32>::from_source(source.clone(), 10));

        let pending = tokio::spawn({
            let feed = Arc::clone(&feed);
            async move { feed.refresh().await }
        });
        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        feed.close();
        source.release.notify_one();

        assert_eq!(pending.await.unwrap().unwrap(), LoadOutcome::Discarded);
        assert!(feed.snapshot().items.is_empty());
        assert_eq!(
            feed.load_more().await.unwrap(),
            LoadOutcome::Skipped(SkipReason::Closed)
        );
    }

    #[tokio::test]
    async fn test_refresh_supersedes_in_flight_append() {
        let source = Arc::new(GatedSource {
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let feed = Arc::new(PaginatedFeed::<u32>::from_source(source.clone(), 10));

        let append = tokio::spawn({
            let feed = Arc::clone(&feed);
            async move { feed.load_more().await }
        });
        while source.calls.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }
        let refresh = tokio::spawn({
            let feed = Arc::clone(&feed);
            async move { feed.refresh().await }
        });
        while source.calls.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }

        // Release the append first: it belongs to the old generation.
        source.release.notify_one();
        assert_eq!(append.await.unwrap().unwrap(), LoadOutcome::Discarded);
        source.release.notify_one();
        assert!(matches!(
            refresh.await.unwrap().unwrap(),
            LoadOutcome::Loaded { page: 1, .. }
        ));
        assert_eq!(*feed.snapshot().items, vec![100]);
    }

    #[tokio::test]
    async fn test_reload_refetches_every_loaded_page() {
        let source = NumberSource::new(37);
        let feed = PaginatedFeed::<u32>::from_source(source.clone(), 10);
        feed.refresh().await.unwrap();
        feed.load_more().await.unwrap();
        feed.load_more().await.unwrap();

        feed.reload().await.unwrap();

        assert_eq!(source.calls(), vec![1, 2, 3, 1, 2, 3]);
        let snapshot = feed.snapshot();
        assert_eq!(snapshot.items.len(), 30);
        assert_eq!(snapshot.current_page, 3);
    }

    #[tokio::test]
    async fn test_retry_after_failed_reload_restores_every_page() {
        let source = NumberSource::new(37);
        let feed = PaginatedFeed::<u32>::from_source(source.clone(), 10);
        feed.refresh().await.unwrap();
        feed.load_more().await.unwrap();
        feed.load_more().await.unwrap();

        source.fail_next.store(1, Ordering::SeqCst);
        assert!(feed.reload().await.is_err());
        assert_eq!(feed.snapshot().items.len(), 30);

        let outcome = feed.retry().await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { page: 3, received: 30 });
        assert_eq!(source.calls(), vec![1, 2, 3, 1, 1, 2, 3]);

        let snapshot = feed.snapshot();
        assert_eq!(*snapshot.items, (0..30).collect::<Vec<_>>());
        assert_eq!(snapshot.current_page, 3);
        assert!(snapshot.has_next_page);
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn test_closure_source() {
        let feed = PaginatedFeed::new(
            |page: u32, _limit: u32| async move {
                Ok::<_, AppError>(Page {
                    items: vec![format!("page-{page}")],
                    current_page: page,
                    has_next_page: page < 2,
                    total_count: 2,
                })
            },
            10,
        );

        feed.refresh().await.unwrap();
        feed.load_more().await.unwrap();
        assert_eq!(*feed.snapshot().items, vec!["page-1", "page-2"]);
    }
}
