use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDateTime;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::engine::{self, EngineError};
use crate::ingest::normalize_scrape;
use crate::model::*;
use crate::notify::{NotifyHub, OpeningAlert};
use crate::observability::*;
use crate::store::{SnapshotStore, StoreError};

#[derive(Debug)]
pub enum CycleError {
    /// A cycle for this facility is already running.
    Busy(String),
    Engine(EngineError),
    Store(StoreError),
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleError::Busy(facility) => write!(f, "cycle already running for {facility}"),
            CycleError::Engine(e) => write!(f, "engine error: {e}"),
            CycleError::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for CycleError {}

impl From<EngineError> for CycleError {
    fn from(e: EngineError) -> Self {
        CycleError::Engine(e)
    }
}

impl From<StoreError> for CycleError {
    fn from(e: StoreError) -> Self {
        CycleError::Store(e)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CycleOptions {
    /// Also persist the facility's full opening set at this minimum duration.
    pub persist_openings: Option<u32>,
}

/// Outcome of one facility cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub facility: String,
    /// Slots in the new snapshot.
    pub slots: usize,
    /// Slots that were not in the previous snapshot.
    pub new_slots: usize,
    /// New openings per subscriber email.
    pub alerts: HashMap<String, Vec<Opening>>,
}

impl CycleReport {
    /// One alert per subscriber, ordered by email.
    pub fn into_alerts(self) -> Vec<OpeningAlert> {
        let mut alerts: Vec<OpeningAlert> = self
            .alerts
            .into_iter()
            .map(|(email, openings)| OpeningAlert {
                facility: self.facility.clone(),
                email,
                openings,
            })
            .collect();
        alerts.sort_by(|a, b| a.email.cmp(&b.email));
        alerts
    }
}

/// Runs scrape → diff → persist → notify for one facility at a time.
///
/// Different facilities run independently; a facility whose previous cycle is
/// still in flight is refused rather than queued.
pub struct CycleRunner<S: SnapshotStore> {
    store: Arc<S>,
    notify: Arc<NotifyHub>,
    running: DashMap<String, Arc<Mutex<()>>>,
    options: CycleOptions,
}

impl<S: SnapshotStore> CycleRunner<S> {
    pub fn new(store: Arc<S>, notify: Arc<NotifyHub>, options: CycleOptions) -> Self {
        Self {
            store,
            notify,
            running: DashMap::new(),
            options,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn run(
        &self,
        facility: &FacilityConfig,
        scraped: Vec<ScrapedDay>,
        now: NaiveDateTime,
    ) -> Result<CycleReport, CycleError> {
        let started = Instant::now();
        let result = self.run_locked(facility, scraped, now).await;

        let name = facility.name.clone();
        metrics::counter!(CYCLES_TOTAL, "facility" => name.clone(), "status" => status_label(&result))
            .increment(1);
        metrics::histogram!(CYCLE_DURATION_SECONDS, "facility" => name)
            .record(started.elapsed().as_secs_f64());
        result
    }

    async fn run_locked(
        &self,
        facility: &FacilityConfig,
        scraped: Vec<ScrapedDay>,
        now: NaiveDateTime,
    ) -> Result<CycleReport, CycleError> {
        let lock = self
            .running
            .entry(facility.name.clone())
            .or_default()
            .clone();
        let Ok(_guard) = lock.try_lock() else {
            warn!(facility = %facility.name, "previous cycle still running, skipping");
            return Err(CycleError::Busy(facility.name.clone()));
        };

        let name = facility.name.as_str();
        let current = normalize_scrape(name, scraped, now, facility.max_days_in_advance);
        let previous = self.store.previous_slots(name).await?;
        let new_slots = engine::new_half_hour_openings(&current, &previous);

        let mut report = CycleReport {
            facility: facility.name.clone(),
            slots: current.len(),
            new_slots: new_slots.len(),
            alerts: HashMap::new(),
        };

        if new_slots.is_empty() {
            debug!(facility = name, "no new slots");
        } else {
            let subscriptions = self.store.subscriptions(name).await?;
            report.alerts =
                engine::new_openings_by_subscriber(name, &subscriptions, &current, &previous)?;
        }

        let openings = match self.options.persist_openings {
            Some(min_duration) => Some(engine::derive_openings(
                name,
                &current,
                &Preferences::unrestricted(min_duration),
            )?),
            None => None,
        };
        self.store.replace_snapshot(name, current, openings).await?;

        let mut notified = 0;
        for (email, openings) in &report.alerts {
            notified += openings.len();
            self.notify.send(
                name,
                &OpeningAlert {
                    facility: facility.name.clone(),
                    email: email.clone(),
                    openings: openings.clone(),
                },
            );
        }

        metrics::gauge!(SLOTS_CURRENT, "facility" => facility.name.clone()).set(report.slots as f64);
        metrics::counter!(NEW_SLOTS_TOTAL, "facility" => facility.name.clone())
            .increment(report.new_slots as u64);
        metrics::counter!(OPENINGS_NOTIFIED_TOTAL, "facility" => facility.name.clone())
            .increment(notified as u64);
        info!(
            facility = name,
            slots = report.slots,
            new_slots = report.new_slots,
            subscribers = report.alerts.len(),
            openings = notified,
            "cycle complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{Duration, NaiveDate};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn facility() -> FacilityConfig {
        FacilityConfig {
            name: "usta".into(),
            courts: vec!["1".into()],
            max_days_in_advance: 7,
            open_hour: None,
            close_hour: None,
        }
    }

    fn day(count: i64) -> Vec<ScrapedDay> {
        vec![ScrapedDay {
            date: at(0, 0).date(),
            slots: (0..count)
                .map(|i| CourtSlot {
                    court: "1".into(),
                    datetime: at(12, 0) + Duration::minutes(30 * i),
                })
                .collect(),
            error: None,
        }]
    }

    fn runner(options: CycleOptions) -> CycleRunner<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .subscribe(
                "usta",
                Subscription {
                    email: "a@example.com".into(),
                    preferences: Preferences::unrestricted(60),
                },
            )
            .unwrap();
        CycleRunner::new(store, Arc::new(NotifyHub::new()), options)
    }

    #[tokio::test]
    async fn first_cycle_reports_everything() {
        let runner = runner(CycleOptions::default());
        let report = runner.run(&facility(), day(2), at(8, 0)).await.unwrap();
        assert_eq!(report.slots, 2);
        assert_eq!(report.new_slots, 2);
        assert_eq!(report.alerts["a@example.com"].len(), 1);
    }

    #[tokio::test]
    async fn repeat_cycle_reports_nothing() {
        let runner = runner(CycleOptions::default());
        runner.run(&facility(), day(4), at(8, 0)).await.unwrap();
        let report = runner.run(&facility(), day(4), at(8, 5)).await.unwrap();
        assert_eq!(report.new_slots, 0);
        assert!(report.alerts.is_empty());
    }

    #[tokio::test]
    async fn snapshot_replaced_when_slots_disappear() {
        let runner = runner(CycleOptions::default());
        runner.run(&facility(), day(4), at(8, 0)).await.unwrap();
        let report = runner.run(&facility(), day(2), at(8, 5)).await.unwrap();
        assert_eq!(report.new_slots, 0);
        assert_eq!(runner.store().previous_slots("usta").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn persists_openings_when_asked() {
        let runner = runner(CycleOptions {
            persist_openings: Some(30),
        });
        runner.run(&facility(), day(3), at(8, 0)).await.unwrap();
        // 3 slots at 30 minutes minimum: 3 + 2 + 1 windows.
        assert_eq!(runner.store().openings("usta").len(), 6);
    }

    #[tokio::test]
    async fn overlapping_cycle_is_refused() {
        let runner = runner(CycleOptions::default());
        let lock = runner.running.entry("usta".into()).or_default().clone();
        let _held = lock.lock().await;
        let result = runner.run(&facility(), day(2), at(8, 0)).await;
        assert!(matches!(result, Err(CycleError::Busy(name)) if name == "usta"));
    }
}
