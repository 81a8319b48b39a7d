use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDateTime};

use crate::limits::SLOT_MINUTES;
use crate::model::*;

pub(crate) fn slot_length() -> Duration {
    Duration::minutes(SLOT_MINUTES)
}

/// Group slots by start time. Result is sorted ascending by start.
pub fn condense(slots: &[HalfHourOpening]) -> Vec<CondensedHalfHourOpening> {
    let mut by_time: BTreeMap<NaiveDateTime, BTreeSet<String>> = BTreeMap::new();
    for slot in slots {
        by_time
            .entry(slot.datetime)
            .or_default()
            .insert(slot.court.clone());
    }
    by_time
        .into_iter()
        .map(|(start, courts)| CondensedHalfHourOpening { start, courts })
        .collect()
}

/// Split sorted condensed openings into maximal gap-free chunks.
pub fn build_chunks(condensed: Vec<CondensedHalfHourOpening>) -> Vec<OpeningChunk> {
    let mut chunks: Vec<OpeningChunk> = Vec::new();
    for slot in condensed {
        let end = slot.start + slot_length();
        if let Some(last) = chunks.last_mut()
            && last.end == slot.start {
                last.end = end;
                last.slots.push(slot);
                continue;
            }
        chunks.push(OpeningChunk {
            start: slot.start,
            end,
            slots: vec![slot],
        });
    }
    chunks
}

/// `condense` then `build_chunks`.
pub fn chunk_slots(slots: &[HalfHourOpening]) -> Vec<OpeningChunk> {
    build_chunks(condense(slots))
}
