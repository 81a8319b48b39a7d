use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::model::*;

#[derive(Debug)]
pub enum StoreError {
    InvalidSubscription(InvalidPreferences),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::InvalidSubscription(e) => write!(f, "rejected subscription: {e}"),
            StoreError::Io(e) => write!(f, "state file error: {e}"),
            StoreError::Json(e) => write!(f, "state file is not valid JSON: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e)
    }
}

/// What the cycle runner needs from persistence.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Slots stored by the last completed cycle for this facility.
    async fn previous_slots(&self, facility: &str) -> Result<Vec<HalfHourOpening>, StoreError>;

    async fn subscriptions(&self, facility: &str) -> Result<Vec<Subscription>, StoreError>;

    /// Delete-then-insert: the facility's stored slots (and openings, when
    /// given) become exactly these.
    async fn replace_snapshot(
        &self,
        facility: &str,
        slots: Vec<HalfHourOpening>,
        openings: Option<Vec<Opening>>,
    ) -> Result<(), StoreError>;
}

/// Everything stored for one facility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilitySnapshot {
    #[serde(default)]
    pub slots: Vec<HalfHourOpening>,
    #[serde(default)]
    pub openings: Vec<Opening>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
}

/// In-process store, optionally backed by a JSON file between runs.
#[derive(Default)]
pub struct MemoryStore {
    facilities: DashMap<String, FacilitySnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load state written by `save_json`. A missing file is an empty store.
    pub fn load_json(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let bytes = std::fs::read(path)?;
        let state: BTreeMap<String, FacilitySnapshot> = serde_json::from_slice(&bytes)?;
        Ok(Self {
            facilities: state.into_iter().collect(),
        })
    }

    /// Write the whole store. Written to a sibling temp file first, then renamed.
    pub fn save_json(&self, path: &Path) -> Result<(), StoreError> {
        let state: BTreeMap<String, FacilitySnapshot> = self
            .facilities
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&state)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Add a subscription after checking its preferences.
    pub fn subscribe(&self, facility: &str, subscription: Subscription) -> Result<(), StoreError> {
        subscription
            .preferences
            .validate()
            .map_err(StoreError::InvalidSubscription)?;
        self.facilities
            .entry(facility.to_string())
            .or_default()
            .subscriptions
            .push(subscription);
        Ok(())
    }

    /// Remove every subscription held by `email`, at every facility.
    /// Returns how many were removed.
    pub fn unsubscribe(&self, email: &str) -> usize {
        let mut removed = 0;
        for mut entry in self.facilities.iter_mut() {
            let subs = &mut entry.value_mut().subscriptions;
            let before = subs.len();
            subs.retain(|s| s.email != email);
            removed += before - subs.len();
        }
        removed
    }

    /// Derived openings persisted by the last cycle.
    pub fn openings(&self, facility: &str) -> Vec<Opening> {
        self.facilities
            .get(facility)
            .map(|f| f.openings.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn previous_slots(&self, facility: &str) -> Result<Vec<HalfHourOpening>, StoreError> {
        Ok(self
            .facilities
            .get(facility)
            .map(|f| f.slots.clone())
            .unwrap_or_default())
    }

    async fn subscriptions(&self, facility: &str) -> Result<Vec<Subscription>, StoreError> {
        Ok(self
            .facilities
            .get(facility)
            .map(|f| f.subscriptions.clone())
            .unwrap_or_default())
    }

    async fn replace_snapshot(
        &self,
        facility: &str,
        slots: Vec<HalfHourOpening>,
        openings: Option<Vec<Opening>>,
    ) -> Result<(), StoreError> {
        let mut entry = self.facilities.entry(facility.to_string()).or_default();
        entry.slots = slots;
        entry.openings = openings.unwrap_or_default();
        Ok(())
    }
}
