//! Optimistic toggles (like/unlike, join/leave).
//!
//! The local item flips immediately; the backend call follows. If the
//! backend rejects the change the feed is reconciled according to the
//! configured [`ReconcilePolicy`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::feed::{Identified, PaginatedFeed};
use crate::models::ReconcilePolicy;

/// An item the viewer can engage with, carrying a denormalized counter.
pub trait Engageable: Identified + Clone + Send + Sync + 'static {
    fn is_engaged(&self, viewer: &str) -> bool;

    fn engagement_count(&self) -> u32;

    /// Set the viewer's state, adjusting the counter; no-op when unchanged.
    fn set_engaged(&mut self, viewer: &str, engaged: bool);
}

/// Backend calls behind a toggle.
#[async_trait]
pub trait EngagementBackend: Send + Sync {
    async fn engage(&self, id: &str) -> Result<()>;

    async fn disengage(&self, id: &str) -> Result<()>;
}

/// A toggle applied locally and not yet confirmed.
#[derive(Debug, Clone)]
#[must_use = "a pending toggle does nothing until confirmed"]
pub struct PendingToggle<T> {
    id: String,
    engaged: bool,
    before: T,
}

impl<T> PendingToggle<T> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// State the item was switched to.
    pub fn engaged(&self) -> bool {
        self.engaged
    }

    /// The item as it was before the local write.
    pub fn before(&self) -> &T {
        &self.before
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The backend accepted the change
    Confirmed { engaged: bool },
    /// No item with that id is loaded; nothing was sent
    NotLoaded,
}

/// Toggles engagement on items of one feed.
pub struct OptimisticToggler<T> {
    feed: Arc<PaginatedFeed<T>>,
    backend: Arc<dyn EngagementBackend>,
    viewer: String,
    policy: ReconcilePolicy,
}

impl<T: Engageable> OptimisticToggler<T> {
    pub fn new(
        feed: Arc<PaginatedFeed<T>>,
        backend: Arc<dyn EngagementBackend>,
        viewer: impl Into<String>,
    ) -> Self {
        Self {
            feed,
            backend,
            viewer: viewer.into(),
            policy: ReconcilePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReconcilePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn feed(&self) -> &Arc<PaginatedFeed<T>> {
        &self.feed
    }

    /// Flip the item locally. Visible in the next snapshot.
    pub fn apply(&self, id: &str) -> Option<PendingToggle<T>> {
        let viewer = self.viewer.as_str();
        let mut engaged = false;
        let before = self.feed.update_item(id, |item| {
            engaged = !item.is_engaged(viewer);
            item.set_engaged(viewer, engaged);
        })?;

        log::debug!(
            "Optimistic toggle on {}: engaged={} count {} -> {}",
            id,
            engaged,
            before.engagement_count(),
            if engaged {
                before.engagement_count().saturating_add(1)
            } else {
                before.engagement_count().saturating_sub(1)
            }
        );
        Some(PendingToggle {
            id: id.to_string(),
            engaged,
            before,
        })
    }

    /// Send the backend call for an applied toggle.
    ///
    /// On failure the feed is reconciled before the error is returned.
    pub async fn confirm(&self, pending: PendingToggle<T>) -> Result<ToggleOutcome> {
        let result = if pending.engaged {
            self.backend.engage(&pending.id).await
        } else {
            self.backend.disengage(&pending.id).await
        };

        match result {
            Ok(()) => Ok(ToggleOutcome::Confirmed {
                engaged: pending.engaged,
            }),
            Err(e) => {
                log::warn!("Toggle on {} rejected: {}", pending.id, e);
                self.reconcile(pending).await;
                Err(e)
            }
        }
    }

    /// Apply then confirm.
    pub async fn toggle(&self, id: &str) -> Result<ToggleOutcome> {
        match self.apply(id) {
            Some(pending) => self.confirm(pending).await,
            None => Ok(ToggleOutcome::NotLoaded),
        }
    }

    async fn reconcile(&self, pending: PendingToggle<T>) {
        match self.policy {
            ReconcilePolicy::Refetch => {
                if let Err(e) = self.feed.reload().await {
                    // The feed keeps the error for its retry action.
                    log::warn!("Reload after rejected toggle failed: {}", e);
                }
            }
            ReconcilePolicy::RestoreSnapshot => {
                let PendingToggle { id, before, .. } = pending;
                if self.feed.update_item(&id, |item| *item = before).is_none() {
                    log::debug!("Item {} no longer loaded, nothing to restore", id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::feed::PageSource;
    use crate::models::Page;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Debug, Clone, PartialEq)]
    struct Post {
        id: String,
        likers: Vec<String>,
        likes: u32,
    }

    impl Identified for Post {
        fn id(&self) -> &str {
            &self.id
        }
    }

    impl Engageable for Post {
        fn is_engaged(&self, viewer: &str) -> bool {
            self.likers.iter().any(|v| v == viewer)
        }

        fn engagement_count(&self) -> u32 {
            self.likes
        }

        fn set_engaged(&mut self, viewer: &str, engaged: bool) {
            if engaged == self.is_engaged(viewer) {
                return;
            }
            if engaged {
                self.likers.push(viewer.to_string());
                self.likes += 1;
            } else {
                self.likers.retain(|v| v != viewer);
                self.likes -= 1;
            }
        }
    }

    /// Server-side truth the feed reloads from.
    struct Server {
        posts: Mutex<Vec<Post>>,
    }

    #[async_trait]
    impl PageSource<Post> for Server {
        async fn fetch_page(&self, page: u32, _limit: u32) -> Result<Page<Post>> {
            let items = self.posts.lock().unwrap().clone();
            Ok(Page {
                total_count: items.len() as u64,
                items,
                current_page: page,
                has_next_page: false,
            })
        }
    }

    enum Mode {
        Accept,
        Reject,
        Hold(Arc<Notify>),
    }

    struct Backend {
        mode: Mode,
        calls: Mutex<Vec<(String, bool)>>,
    }

    impl Backend {
        fn new(mode: Mode) -> Arc<Self> {
            Arc::new(Self {
                mode,
                calls: Mutex::new(Vec::new()),
            })
        }

        async fn call(&self, id: &str, engaged: bool) -> Result<()> {
            self.calls.lock().unwrap().push((id.to_string(), engaged));
            match &self.mode {
                Mode::Accept => Ok(()),
                Mode::Reject => Err(AppError::Server {
                    status: 500,
                    message: "boom".into(),
                }),
                Mode::Hold(release) => {
                    release.notified().await;
                    Ok(())
                }
            }
        }
    }

    #[async_trait]
    impl EngagementBackend for Backend {
        async fn engage(&self, id: &str) -> Result<()> {
            self.call(id, true).await
        }

        async fn disengage(&self, id: &str) -> Result<()> {
            self.call(id, false).await
        }
    }

    async fn loaded_feed(likes: u32) -> Arc<PaginatedFeed<Post>> {
        let server = Arc::new(Server {
            posts: Mutex::new(vec![Post {
                id: "r1".into(),
                likers: Vec::new(),
                likes,
            }]),
        });
        let feed = Arc::new(PaginatedFeed::<Post>::from_source(server, 10));
        feed.refresh().await.unwrap();
        feed
    }

    #[tokio::test]
    async fn test_like_shows_immediately_and_confirms() {
        let feed = loaded_feed(5).await;
        let backend = Backend::new(Mode::Accept);
        let toggler = OptimisticToggler::new(feed.clone(), backend.clone(), "me");

        let pending = toggler.apply("r1").unwrap();
        let shown = feed.find("r1").unwrap();
        assert_eq!(shown.likes, 6);
        assert!(shown.is_engaged("me"));
        assert_eq!(pending.before().likes, 5);

        let outcome = toggler.confirm(pending).await.unwrap();
        assert_eq!(outcome, ToggleOutcome::Confirmed { engaged: true });
        assert_eq!(feed.find("r1").unwrap().likes, 6);
        assert_eq!(*backend.calls.lock().unwrap(), vec![("r1".to_string(), true)]);
    }

    #[tokio::test]
    async fn test_rejected_like_reverts_after_refetch() {
        let feed = loaded_feed(5).await;
        let toggler = OptimisticToggler::new(feed.clone(), Backend::new(Mode::Reject), "me");

        let result = toggler.toggle("r1").await;

        assert!(matches!(result, Err(AppError::Server { .. })));
        let item = feed.find("r1").unwrap();
        assert_eq!(item.likes, 5);
        assert!(!item.is_engaged("me"));
    }

    #[tokio::test]
    async fn test_rejected_like_restores_snapshot() {
        let feed = loaded_feed(5).await;
        let toggler = OptimisticToggler::new(feed.clone(), Backend::new(Mode::Reject), "me")
            .with_policy(ReconcilePolicy::RestoreSnapshot);

        assert!(toggler.toggle("r1").await.is_err());
        assert_eq!(feed.find("r1").unwrap().likes, 5);
    }

    #[tokio::test]
    async fn test_rapid_toggles_flip_before_resolution() {
        let feed = loaded_feed(10).await;
        let release = Arc::new(Notify::new());
        let backend = Backend::new(Mode::Hold(release.clone()));
        let toggler = Arc::new(OptimisticToggler::new(feed.clone(), backend.clone(), "me"));

        let first = toggler.apply("r1").unwrap();
        assert_eq!(feed.find("r1").unwrap().likes, 11);
        let second = toggler.apply("r1").unwrap();
        let item = feed.find("r1").unwrap();
        assert_eq!(item.likes, 10);
        assert!(!item.is_engaged("me"));

        let a = tokio::spawn({
            let toggler = Arc::clone(&toggler);
            async move { toggler.confirm(first).await }
        });
        let b = tokio::spawn({
            let toggler = Arc::clone(&toggler);
            async move { toggler.confirm(second).await }
        });
        while backend.calls.lock().unwrap().len() < 2 {
            tokio::task::yield_now().await;
        }
        release.notify_one();
        release.notify_one();

        assert!(a.await.unwrap().is_ok());
        assert!(b.await.unwrap().is_ok());
        assert_eq!(feed.find("r1").unwrap().likes, 10);
    }

    #[tokio::test]
    async fn test_unknown_item_sends_nothing() {
        let feed = loaded_feed(0).await;
        let backend = Backend::new(Mode::Accept);
        let toggler = OptimisticToggler::new(feed, backend.clone(), "me");

        assert_eq!(
            toggler.toggle("missing").await.unwrap(),
            ToggleOutcome::NotLoaded
        );
        assert!(backend.calls.lock().unwrap().is_empty());
    }
}
