use chrono::Duration;

use crate::limits::*;
use crate::model::*;

use super::path::find_path;
use super::EngineError;

/// Every (start, length) window of the chunk from `min_duration` up to three
/// hours, each with its court assignment. Windows come out ordered by start,
/// then by length.
pub fn openings_from_chunk(
    chunk: &OpeningChunk,
    min_duration: u32,
) -> Result<Vec<OpeningWindow>, EngineError> {
    let num_slots = chunk.len();
    let min_slots = (min_duration.div_ceil(SLOT_MINUTES as u32) as usize).max(1);
    let mut openings = Vec::new();

    for start in 0..num_slots {
        let longest = (num_slots - start).min(MAX_SLOTS_PER_OPENING);
        for len in min_slots..=longest {
            let range = &chunk.slots[start..start + len];
            let duration_minutes = (len as i64 * SLOT_MINUTES) as u32;
            let opening_start = range[0].start;
            openings.push(OpeningWindow {
                start: opening_start,
                end: opening_start + Duration::minutes(duration_minutes as i64),
                duration_minutes,
                assignment: find_path(range)?,
            });
        }
    }

    Ok(openings)
}
