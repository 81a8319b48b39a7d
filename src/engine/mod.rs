//! Turns per-court half-hour availability into bookable openings and works
//! out which of them are new since the previous snapshot.
//!
//! Everything here is synchronous and free of shared state, so separate
//! facilities can be processed in parallel.

mod chunk;
mod diff;
mod error;
mod filter;
mod generate;
mod path;

pub use chunk::{build_chunks, chunk_slots, condense};
pub use diff::{new_half_hour_openings, new_openings_by_subscriber, new_openings_for_preferences};
pub use error::EngineError;
pub use filter::filter_by_preferences;
pub use generate::openings_from_chunk;
pub use path::find_path;

use crate::model::*;

/// Chunk `slots` as-is and enumerate windows of at least `min_duration`.
pub fn openings_for_slots(
    slots: &[HalfHourOpening],
    min_duration: u32,
) -> Result<Vec<OpeningWindow>, EngineError> {
    let mut openings = Vec::new();
    for chunk in chunk_slots(slots) {
        openings.extend(openings_from_chunk(&chunk, min_duration)?);
    }
    Ok(openings)
}

/// Full pipeline: preference filter, chunking, window enumeration, court paths.
pub fn derive_openings(
    facility: &str,
    slots: &[HalfHourOpening],
    preferences: &Preferences,
) -> Result<Vec<Opening>, EngineError> {
    let filtered = filter_by_preferences(slots, preferences);
    Ok(openings_for_slots(&filtered, preferences.min_duration)?
        .into_iter()
        .map(|window| Opening {
            facility: facility.to_string(),
            window,
        })
        .collect())
}
