//! Incremental past-broadcast loading driven by calendar navigation.
//!
//! Each visible range is split into month buckets; only months this session
//! has not requested yet are fetched. The first viewport callback comes from
//! the initial render, whose data the login-time sync already loaded, so it
//! is always suppressed.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use streamcal_core::{Error, Result, YearMonth};

use crate::bus::{ClientEvent, EventBus};
use crate::month_cache::MonthCache;

/// Requests past broadcasts for `channel_ids` published in `[start, end]`.
#[async_trait]
pub trait RangeFetcher: Send + Sync {
    async fn fetch_range(&self, channel_ids: &[String], start: NaiveDate, end: NaiveDate)
        -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Month,
    Week,
    Day,
}

impl ViewKind {
    /// Day views never trigger history loading.
    pub fn loads_history(self) -> bool {
        matches!(self, ViewKind::Month | ViewKind::Week)
    }
}

impl FromStr for ViewKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "month" | "dayGridMonth" => Ok(ViewKind::Month),
            "week" | "timeGridWeek" => Ok(ViewKind::Week),
            "day" | "timeGridDay" => Ok(ViewKind::Day),
            other => Err(Error::InvalidRequest(format!("unknown view: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewportReport {
    pub fetched: Vec<YearMonth>,
    pub failed: Vec<YearMonth>,
    pub beyond_horizon: Vec<YearMonth>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewportOutcome {
    /// Initial render callback.
    Suppressed,
    /// Day view, or nothing to load for.
    Ignored,
    Synced(ViewportReport),
    /// The session closed while the callback was running; results were dropped.
    Discarded,
}

/// Current date as the session sees it.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct CalendarSync {
    fetcher: Arc<dyn RangeFetcher>,
    clock: Clock,
    bus: EventBus,
    channel_ids: Vec<String>,
    cache: Mutex<MonthCache>,
    mounted: AtomicBool,
    closed: AtomicBool,
    generation: AtomicU64,
}

impl CalendarSync {
    /// Seeds the month cache from `today`; later horizon checks read the
    /// UTC system date unless [`CalendarSync::with_clock`] replaces it.
    pub fn new(
        fetcher: Arc<dyn RangeFetcher>,
        bus: EventBus,
        channel_ids: Vec<String>,
        today: NaiveDate,
    ) -> Self {
        Self {
            fetcher,
            clock: Arc::new(|| Utc::now().date_naive()),
            bus,
            channel_ids,
            cache: Mutex::new(MonthCache::seeded(today)),
            mounted: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub async fn on_viewport_change(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        view: ViewKind,
    ) -> ViewportOutcome {
        if !self.mounted.swap(true, Ordering::SeqCst) {
            debug!(%start, %end, "initial viewport callback suppressed");
            return ViewportOutcome::Suppressed;
        }
        if self.closed.load(Ordering::SeqCst) {
            return ViewportOutcome::Discarded;
        }
        if !view.loads_history() || self.channel_ids.is_empty() {
            return ViewportOutcome::Ignored;
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let today = (self.clock)();
        let (to_fetch, beyond_horizon) = self.cache.lock().await.plan(start, end, today);
        if !beyond_horizon.is_empty() {
            debug!(months = ?beyond_horizon, "months past the fetch horizon skipped");
        }

        let mut report = ViewportReport {
            beyond_horizon,
            ..Default::default()
        };

        for month in to_fetch {
            let result = self
                .fetcher
                .fetch_range(&self.channel_ids, month.first_day(), month.last_day())
                .await;
            if self.is_stale(generation) {
                debug!(%month, "session closed during fetch; result dropped");
                return ViewportOutcome::Discarded;
            }
            match result {
                Ok(()) => {
                    self.cache.lock().await.insert(month);
                    report.fetched.push(month);
                }
                Err(err) => {
                    warn!(%month, error = %err, "failed to load past broadcasts for month");
                    report.failed.push(month);
                }
            }
        }

        if !report.fetched.is_empty() {
            info!(months = ?report.fetched, "past broadcasts loaded");
            self.bus.publish(ClientEvent::EventsChanged {
                months: report.fetched.clone(),
            });
        }
        ViewportOutcome::Synced(report)
    }

    /// Invalidates in-flight callbacks and ignores later ones.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn cached_months(&self) -> Vec<YearMonth> {
        self.cache.lock().await.months()
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingFetcher {
        calls: StdMutex<Vec<(NaiveDate, NaiveDate)>>,
        fail_on: Option<NaiveDate>,
        delay: Option<Duration>,
    }

    impl RecordingFetcher {
        fn calls(&self) -> Vec<(NaiveDate, NaiveDate)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RangeFetcher for RecordingFetcher {
        async fn fetch_range(
            &self,
            _channel_ids: &[String],
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<()> {
            self.calls.lock().unwrap().push((start, end));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_on == Some(start) {
                return Err(Error::Timeout(Duration::from_secs(30)));
            }
            Ok(())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    fn session(fetcher: Arc<RecordingFetcher>, today: NaiveDate) -> (CalendarSync, EventBus) {
        let bus = EventBus::default();
        let sync = CalendarSync::new(fetcher, bus.clone(), vec!["UC1".to_string()], today)
            .with_clock(Arc::new(move || today));
        (sync, bus)
    }

    async fn show_month(sync: &CalendarSync, month: YearMonth) -> ViewportOutcome {
        sync.on_viewport_change(month.first_day(), month.last_day(), ViewKind::Month)
            .await
    }

    #[tokio::test]
    async fn test_first_callback_is_suppressed() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let (sync, _bus) = session(fetcher.clone(), date(2025, 3, 10));

        let outcome = show_month(&sync, ym(2024, 12)).await;

        assert_eq!(outcome, ViewportOutcome::Suppressed);
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_late_month_session_fetches_only_month_after_next() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let (sync, _bus) = session(fetcher.clone(), date(2025, 3, 25));
        show_month(&sync, ym(2025, 3)).await;

        show_month(&sync, ym(2025, 3)).await;
        show_month(&sync, ym(2025, 4)).await;
        assert!(fetcher.calls().is_empty());

        show_month(&sync, ym(2025, 5)).await;
        assert_eq!(fetcher.calls(), vec![(date(2025, 5, 1), date(2025, 5, 31))]);

        // Cached now.
        show_month(&sync, ym(2025, 5)).await;
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_week_spanning_two_months_fetches_both() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let (sync, bus) = session(fetcher.clone(), date(2025, 3, 10));
        let mut rx = bus.subscribe();
        show_month(&sync, ym(2025, 3)).await;

        let outcome = sync
            .on_viewport_change(date(2025, 1, 27), date(2025, 2, 2), ViewKind::Week)
            .await;

        let expected = vec![ym(2025, 1), ym(2025, 2)];
        assert_eq!(
            outcome,
            ViewportOutcome::Synced(ViewportReport {
                fetched: expected.clone(),
                ..Default::default()
            })
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            ClientEvent::EventsChanged { months: expected }
        );
    }

    #[tokio::test]
    async fn test_day_view_never_fetches() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let (sync, _bus) = session(fetcher.clone(), date(2025, 3, 10));
        show_month(&sync, ym(2025, 3)).await;

        let outcome = sync
            .on_viewport_change(date(2025, 1, 15), date(2025, 1, 15), ViewKind::Day)
            .await;

        assert_eq!(outcome, ViewportOutcome::Ignored);
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_far_future_is_skipped_and_not_cached() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let (sync, _bus) = session(fetcher.clone(), date(2025, 3, 10));
        show_month(&sync, ym(2025, 3)).await;

        let outcome = show_month(&sync, ym(2025, 6)).await;

        assert_eq!(
            outcome,
            ViewportOutcome::Synced(ViewportReport {
                beyond_horizon: vec![ym(2025, 6)],
                ..Default::default()
            })
        );
        assert!(fetcher.calls().is_empty());
        assert!(!sync.cached_months().await.contains(&ym(2025, 6)));
    }

    #[tokio::test]
    async fn test_horizon_advances_with_the_clock() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let today = Arc::new(StdMutex::new(date(2025, 3, 10)));
        let clock = {
            let today = today.clone();
            Arc::new(move || *today.lock().unwrap())
        };
        let sync = CalendarSync::new(
            fetcher.clone(),
            EventBus::default(),
            vec!["UC1".to_string()],
            date(2025, 3, 10),
        )
        .with_clock(clock);
        show_month(&sync, ym(2025, 3)).await;

        let outcome = show_month(&sync, ym(2025, 5)).await;
        assert!(matches!(outcome, ViewportOutcome::Synced(r) if r.beyond_horizon == vec![ym(2025, 5)]));

        // The session stays open into April; May is now within reach.
        *today.lock().unwrap() = date(2025, 4, 2);
        show_month(&sync, ym(2025, 5)).await;
        assert_eq!(fetcher.calls(), vec![(date(2025, 5, 1), date(2025, 5, 31))]);
    }

    #[tokio::test]
    async fn test_failed_month_stays_uncached_and_others_continue() {
        let fetcher = Arc::new(RecordingFetcher {
            fail_on: Some(date(2025, 1, 1)),
            ..Default::default()
        });
        let (sync, bus) = session(fetcher.clone(), date(2025, 3, 10));
        let mut rx = bus.subscribe();
        show_month(&sync, ym(2025, 3)).await;

        let outcome = sync
            .on_viewport_change(date(2024, 12, 30), date(2025, 1, 5), ViewKind::Week)
            .await;

        assert_eq!(
            outcome,
            ViewportOutcome::Synced(ViewportReport {
                fetched: vec![ym(2024, 12)],
                failed: vec![ym(2025, 1)],
                beyond_horizon: Vec::new(),
            })
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            ClientEvent::EventsChanged {
                months: vec![ym(2024, 12)]
            }
        );

        // January is retried on the next visit.
        show_month(&sync, ym(2025, 1)).await;
        assert_eq!(fetcher.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_nothing_new_publishes_nothing() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let (sync, bus) = session(fetcher.clone(), date(2025, 3, 10));
        let mut rx = bus.subscribe();
        show_month(&sync, ym(2025, 3)).await;

        show_month(&sync, ym(2025, 3)).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_close_discards_in_flight_results() {
        let fetcher = Arc::new(RecordingFetcher {
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let (sync, bus) = session(fetcher.clone(), date(2025, 3, 10));
        let mut rx = bus.subscribe();
        let sync = Arc::new(sync);
        show_month(&sync, ym(2025, 3)).await;

        let pending = {
            let sync = sync.clone();
            tokio::spawn(async move { show_month(&sync, ym(2025, 1)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        sync.close();

        assert_eq!(pending.await.unwrap(), ViewportOutcome::Discarded);
        assert!(!sync.cached_months().await.contains(&ym(2025, 1)));
        assert!(rx.try_recv().is_err());
        assert_eq!(show_month(&sync, ym(2025, 2)).await, ViewportOutcome::Discarded);
    }

    #[test]
    fn test_view_kind_parse() {
        assert_eq!("dayGridMonth".parse::<ViewKind>().unwrap(), ViewKind::Month);
        assert_eq!("week".parse::<ViewKind>().unwrap(), ViewKind::Week);
        assert_eq!("timeGridDay".parse::<ViewKind>().unwrap(), ViewKind::Day);
        assert!("listWeek".parse::<ViewKind>().is_err());
    }
}
