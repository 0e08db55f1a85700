//! Loading/error/data holders around one-off async operations.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use crate::error::Result;
use crate::feed::FeedError;

#[derive(Debug)]
struct QueryState<T> {
    data: Option<T>,
    loading: bool,
    error: Option<FeedError>,
    generation: u64,
    closed: bool,
}

/// Read operation state (a profile, a comment list, search results).
///
/// Data from the last success is kept while a refetch runs, so a view can
/// keep showing it under a spinner.
#[derive(Debug)]
pub struct Query<T> {
    state: Mutex<QueryState<T>>,
}

impl<T: Clone> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Query<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueryState {
                data: None,
                loading: false,
                error: None,
                generation: 0,
                closed: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueryState<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `op` and record its result.
    ///
    /// Returns `Ok(None)` when a newer fetch or `close()` made this result stale.
    pub async fn fetch<F>(&self, op: F) -> Result<Option<T>>
    where
        F: Future<Output = Result<T>>,
    {
        let generation = {
            let mut state = self.lock();
            if state.closed {
                return Ok(None);
            }
            state.generation += 1;
            state.loading = true;
            state.error = None;
            state.generation
        };

        let result = op.await;

        let mut state = self.lock();
        if state.closed || state.generation != generation {
            return Ok(None);
        }
        state.loading = false;
        match result {
            Ok(value) => {
                state.data = Some(value.clone());
                Ok(Some(value))
            }
            Err(e) => {
                state.error = Some(FeedError::from(&e));
                Err(e)
            }
        }
    }

    pub fn data(&self) -> Option<T> {
        self.lock().data.clone()
    }

    pub fn error(&self) -> Option<FeedError> {
        self.lock().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    /// Loading with nothing to show yet.
    pub fn is_initial_load(&self) -> bool {
        let state = self.lock();
        state.loading && state.data.is_none()
    }

    /// Ignore every result that arrives from now on.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.loading = false;
    }
}

#[derive(Debug)]
struct MutationState<T> {
    data: Option<T>,
    loading: bool,
    error: Option<FeedError>,
}

/// Write operation state (create review, post comment, join club).
#[derive(Debug)]
pub struct Mutation<T> {
    state: Mutex<MutationState<T>>,
}

impl<T: Clone> Default for Mutation<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Mutation<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MutationState {
                data: None,
                loading: false,
                error: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MutationState<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `op`; `None` on failure with the error kept for display.
    pub async fn mutate<F>(&self, op: F) -> Option<T>
    where
        F: Future<Output = Result<T>>,
    {
        {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
        }

        let result = op.await;

        let mut state = self.lock();
        state.loading = false;
        match result {
            Ok(value) => {
                state.data = Some(value.clone());
                Some(value)
            }
            Err(e) => {
                log::warn!("Mutation failed: {}", e);
                state.error = Some(FeedError::from(&e));
                None
            }
        }
    }

    pub fn data(&self) -> Option<T> {
        self.lock().data.clone()
    }

    pub fn error(&self) -> Option<FeedError> {
        self.lock().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn reset(&self) {
        let mut state = self.lock();
        state.data = None;
        state.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ErrorKind};
    use std::sync::Arc;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_query_keeps_data_across_failed_refetch() {
        let query = Query::new();

        let loaded = query.fetch(async { Ok(vec!["c1".to_string()]) }).await;
        assert_eq!(loaded.unwrap(), Some(vec!["c1".to_string()]));

        let failed = query
            .fetch(async { Err::<Vec<String>, _>(AppError::RateLimited("slow down".into())) })
            .await;
        assert!(failed.is_err());

        assert_eq!(query.data(), Some(vec!["c1".to_string()]));
        let error = query.error().unwrap();
        assert_eq!(error.kind, ErrorKind::RateLimited);
        assert_eq!(error.message, "slow down");
        assert!(!query.is_loading());
    }

    #[tokio::test]
    async fn test_query_initial_load_flag() {
        let query = Arc::new(Query::<u32>::new());
        let (tx, rx) = oneshot::channel::<u32>();

        let pending = tokio::spawn({
            let query = Arc::clone(&query);
            async move {
                query
                    .fetch(async move { rx.await.map_err(|_| AppError::config("dropped")) })
                    .await
            }
        });
        while !query.is_loading() {
            tokio::task::yield_now().await;
        }
        assert!(query.is_initial_load());

        tx.send(7).unwrap();
        assert_eq!(pending.await.unwrap().unwrap(), Some(7));
        assert!(!query.is_initial_load());
    }

    #[tokio::test]
    async fn test_query_ignores_results_after_close() {
        let query = Arc::new(Query::<u32>::new());
        let (tx, rx) = oneshot::channel::<u32>();

        let pending = tokio::spawn({
            let query = Arc::clone(&query);
            async move {
                query
                    .fetch(async move { rx.await.map_err(|_| AppError::config("dropped")) })
                    .await
            }
        });
        while !query.is_loading() {
            tokio::task::yield_now().await;
        }

        query.close();
        tx.send(7).unwrap();

        assert_eq!(pending.await.unwrap().unwrap(), None);
        assert_eq!(query.data(), None);
    }

    #[tokio::test]
    async fn test_mutation_records_error_and_resets() {
        let mutation = Mutation::<String>::new();

        let ok = mutation.mutate(async { Ok("created".to_string()) }).await;
        assert_eq!(ok.as_deref(), Some("created"));

        let failed = mutation
            .mutate(async { Err(AppError::validation("Rating must be between 1 and 5")) })
            .await;
        assert!(failed.is_none());
        assert_eq!(
            mutation.error().unwrap().message,
            "Rating must be between 1 and 5"
        );

        mutation.reset();
        assert!(mutation.error().is_none());
        assert!(mutation.data().is_none());
    }
}
