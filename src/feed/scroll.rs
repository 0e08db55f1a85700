//! Infinite-scroll trigger.
//!
//! Turns a stream of scroll observations into `load_more()` calls. The
//! trigger fires once per entry into the load zone and only while the feed
//! has more pages and nothing is loading.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::feed::{LoadOutcome, PaginatedFeed};

/// Feed state the trigger needs to decide whether to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadGate {
    pub has_next_page: bool,
    pub is_loading: bool,
}

/// Scroll container geometry in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub viewport_height: f64,
    pub content_height: f64,
}

impl ScrollMetrics {
    pub fn distance_to_bottom(&self) -> f64 {
        self.content_height - (self.scroll_top + self.viewport_height)
    }
}

/// One event from the view layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollObservation {
    /// Container scrolled or resized
    Position(ScrollMetrics),
    /// Sentinel element entered (`true`) or left (`false`) the viewport
    Intersection(bool),
}

/// How "near the end" is detected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerStrategy {
    /// Within `distance_px` of the bottom of the content
    Threshold { distance_px: f64 },
    /// A sentinel after the last item is visible
    Sentinel,
}

impl TriggerStrategy {
    /// `None` when the observation does not belong to this strategy.
    fn in_zone(&self, observation: &ScrollObservation) -> Option<bool> {
        match (self, observation) {
            (Self::Threshold { distance_px }, ScrollObservation::Position(metrics)) => {
                Some(metrics.distance_to_bottom() <= *distance_px)
            }
            (Self::Sentinel, ScrollObservation::Intersection(visible)) => Some(*visible),
            _ => None,
        }
    }
}

/// Edge-triggered load decision.
#[derive(Debug, Clone)]
pub struct ScrollTrigger {
    strategy: TriggerStrategy,
    armed: bool,
}

impl ScrollTrigger {
    pub fn new(strategy: TriggerStrategy) -> Self {
        Self {
            strategy,
            armed: true,
        }
    }

    pub fn threshold(distance_px: f64) -> Self {
        Self::new(TriggerStrategy::Threshold { distance_px })
    }

    pub fn sentinel() -> Self {
        Self::new(TriggerStrategy::Sentinel)
    }

    pub fn strategy(&self) -> TriggerStrategy {
        self.strategy
    }

    /// Returns true when the caller should issue exactly one `load_more()`.
    ///
    /// After firing the trigger stays quiet until the observer leaves the
    /// zone or a load is seen in flight, so a burst of scroll events at the
    /// bottom produces a single request.
    pub fn observe(&mut self, observation: &ScrollObservation, gate: LoadGate) -> bool {
        let Some(in_zone) = self.strategy.in_zone(observation) else {
            return false;
        };

        if !in_zone || gate.is_loading {
            self.armed = true;
            return false;
        }
        if !gate.has_next_page || !self.armed {
            return false;
        }

        self.armed = false;
        true
    }
}

/// Something the scroll listener can ask for more items.
#[async_trait]
pub trait LoadMoreTarget: Send + Sync {
    fn gate(&self) -> LoadGate;

    async fn load_more(&self) -> Result<LoadOutcome>;
}

#[async_trait]
impl<T> LoadMoreTarget for PaginatedFeed<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn gate(&self) -> LoadGate {
        PaginatedFeed::gate(self)
    }

    async fn load_more(&self) -> Result<LoadOutcome> {
        PaginatedFeed::load_more(self).await
    }
}

/// Background task wiring scroll observations to a feed.
///
/// Dropping the listener detaches it; no further loads are issued.
pub struct ScrollListener {
    task: JoinHandle<()>,
}

impl ScrollListener {
    pub fn attach(
        target: Arc<dyn LoadMoreTarget>,
        strategy: TriggerStrategy,
        mut observations: watch::Receiver<ScrollObservation>,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut trigger = ScrollTrigger::new(strategy);
            while observations.changed().await.is_ok() {
                let observation = *observations.borrow_and_update();
                if !trigger.observe(&observation, target.gate()) {
                    continue;
                }

                let target = Arc::clone(&target);
                tokio::spawn(async move {
                    if let Err(e) = target.load_more().await {
                        log::warn!("Scroll-triggered load failed: {}", e);
                    }
                });
            }
            log::debug!("Scroll observations closed, listener stopped");
        });

        Self { task }
    }

    pub fn detach(self) {}

    pub fn is_attached(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for ScrollListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const OPEN: LoadGate = LoadGate {
        has_next_page: true,
        is_loading: false,
    };

    fn at(scroll_top: f64) -> ScrollObservation {
        ScrollObservation::Position(ScrollMetrics {
            scroll_top,
            viewport_height: 800.0,
            content_height: 2000.0,
        })
    }

    #[test]
    fn test_threshold_fires_once_per_entry() {
        let mut trigger = ScrollTrigger::threshold(200.0);

        assert!(!trigger.observe(&at(100.0), OPEN));
        assert!(trigger.observe(&at(1000.0), OPEN));
        // Still in the zone: no second request.
        assert!(!trigger.observe(&at(1100.0), OPEN));
        assert!(!trigger.observe(&at(1200.0), OPEN));

        assert!(!trigger.observe(&at(500.0), OPEN));
        assert!(trigger.observe(&at(1050.0), OPEN));
    }

    #[test]
    fn test_no_fire_without_next_page_or_while_loading() {
        let mut trigger = ScrollTrigger::threshold(200.0);
        let exhausted = LoadGate {
            has_next_page: false,
            is_loading: false,
        };
        let loading = LoadGate {
            has_next_page: true,
            is_loading: true,
        };

        assert!(!trigger.observe(&at(1200.0), exhausted));
        assert!(!trigger.observe(&at(1200.0), loading));
        // Load finished while still at the bottom: a fresh page may be needed.
        assert!(trigger.observe(&at(1200.0), OPEN));
    }

    #[test]
    fn test_sentinel_strategy() {
        let mut trigger = ScrollTrigger::sentinel();

        assert!(!trigger.observe(&at(1200.0), OPEN));
        assert!(trigger.observe(&ScrollObservation::Intersection(true), OPEN));
        assert!(!trigger.observe(&ScrollObservation::Intersection(true), OPEN));
        assert!(!trigger.observe(&ScrollObservation::Intersection(false), OPEN));
        assert!(trigger.observe(&ScrollObservation::Intersection(true), OPEN));
    }

    struct CountingTarget {
        calls: AtomicUsize,
        has_next_page: bool,
    }

    #[async_trait]
    impl LoadMoreTarget for CountingTarget {
        fn gate(&self) -> LoadGate {
            LoadGate {
                has_next_page: self.has_next_page,
                is_loading: false,
            }
        }

        async fn load_more(&self) -> Result<LoadOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(LoadOutcome::Loaded {
                page: 2,
                received: 10,
            })
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_listener_triggers_and_stops_on_drop() {
        let target = Arc::new(CountingTarget {
            calls: AtomicUsize::new(0),
            has_next_page: true,
        });
        let (tx, rx) = watch::channel(ScrollObservation::Intersection(false));
        let listener = ScrollListener::attach(target.clone(), TriggerStrategy::Sentinel, rx);

        tx.send(ScrollObservation::Intersection(true)).unwrap();
        settle().await;
        assert_eq!(target.calls.load(Ordering::SeqCst), 1);

        drop(listener);
        settle().await;
        tx.send(ScrollObservation::Intersection(false)).ok();
        tx.send(ScrollObservation::Intersection(true)).ok();
        settle().await;
        assert_eq!(target.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_listener_respects_exhausted_feed() {
        let target = Arc::new(CountingTarget {
            calls: AtomicUsize::new(0),
            has_next_page: false,
        });
        let (tx, rx) = watch::channel(ScrollObservation::Intersection(false));
        let _listener = ScrollListener::attach(target.clone(), TriggerStrategy::Sentinel, rx);

        tx.send(ScrollObservation::Intersection(true)).unwrap();
        settle().await;
        assert_eq!(target.calls.load(Ordering::SeqCst), 0);
    }
}
