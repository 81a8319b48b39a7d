use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use tracing::debug;

use crate::model::*;

use super::{derive_openings, EngineError};

/// Slots in `current` that were not in `previous`, keyed by (court, datetime).
pub fn new_half_hour_openings(
    current: &[HalfHourOpening],
    previous: &[HalfHourOpening],
) -> Vec<HalfHourOpening> {
    let seen: HashSet<(&str, NaiveDateTime)> = previous.iter().map(HalfHourOpening::key).collect();
    current
        .iter()
        .filter(|slot| !seen.contains(&slot.key()))
        .cloned()
        .collect()
}

/// Openings derivable from `current` but not from `previous` under one
/// subscriber's preferences. Compared on (start, duration) only.
pub fn new_openings_for_preferences(
    facility: &str,
    preferences: &Preferences,
    current: &[HalfHourOpening],
    previous: &[HalfHourOpening],
) -> Result<Vec<Opening>, EngineError> {
    let before: HashSet<OpeningKey> = derive_openings(facility, previous, preferences)?
        .iter()
        .map(Opening::key)
        .collect();
    let mut fresh = derive_openings(facility, current, preferences)?;
    fresh.retain(|o| !before.contains(&o.key()));
    Ok(fresh)
}

/// Per-subscriber new openings across all of a facility's subscriptions.
///
/// Openings matched by more than one subscription of the same email are
/// reported once. Subscribers with nothing new are left out of the map.
pub fn new_openings_by_subscriber(
    facility: &str,
    subscriptions: &[Subscription],
    current: &[HalfHourOpening],
    previous: &[HalfHourOpening],
) -> Result<HashMap<String, Vec<Opening>>, EngineError> {
    let mut by_email: HashMap<String, (HashSet<OpeningKey>, Vec<Opening>)> = HashMap::new();

    for sub in subscriptions {
        let fresh = new_openings_for_preferences(facility, &sub.preferences, current, previous)?;
        debug!(
            facility,
            email = %sub.email,
            new = fresh.len(),
            "subscription diffed"
        );
        if fresh.is_empty() {
            continue;
        }
        let (keys, openings) = by_email.entry(sub.email.clone()).or_default();
        for opening in fresh {
            if keys.insert(opening.key()) {
                openings.push(opening);
            }
        }
    }

    Ok(by_email
        .into_iter()
        .map(|(email, (_, openings))| (email, openings))
        .collect())
}
