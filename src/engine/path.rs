use std::collections::BTreeSet;

use crate::model::*;

use super::EngineError;

/// A single-slot run found during the scan, revisited once the scan is done.
#[derive(Debug)]
struct Recheck {
    index: usize,
    courts: BTreeSet<String>,
}

/// Assign one court per slot over a contiguous range, switching courts as
/// rarely as the greedy scan allows.
///
/// Runs left to right keeping the set of courts that could cover the current
/// run. When that set empties the run is committed to its first court and a
/// new run starts. Runs of a single slot are queued and, after the scan, pulled
/// onto a court shared with the preceding slot when one exists. This is a local
/// fix-up, not a global minimum.
///
/// Returns `Courts` when no switch is needed anywhere in the range (always the
/// case for a single slot), otherwise `Path` with exactly one entry per slot.
pub fn find_path(slots: &[CondensedHalfHourOpening]) -> Result<CourtAssignment, EngineError> {
    let Some(first) = slots.first() else {
        return Err(EngineError::EmptyRange);
    };
    if let Some(empty) = slots.iter().find(|s| s.courts.is_empty()) {
        return Err(EngineError::UnsatisfiableSlot { start: empty.start });
    }

    let mut path: Vec<String> = Vec::with_capacity(slots.len());
    let mut possible = first.courts.clone();
    let mut run_len = 1usize;
    let mut switched = false;
    let mut rechecks: Vec<Recheck> = Vec::new();

    for (i, slot) in slots.iter().enumerate().skip(1) {
        let shared: BTreeSet<String> = possible.intersection(&slot.courts).cloned().collect();
        if !shared.is_empty() {
            possible = shared;
            run_len += 1;
            continue;
        }

        if run_len == 1 && i > 1 {
            rechecks.push(Recheck {
                index: i - 1,
                courts: possible.clone(),
            });
        }
        commit_run(&mut path, &possible, run_len, slots[i - 1].start)?;
        possible = slot.courts.clone();
        run_len = 1;
        switched = true;
    }

    if !switched {
        return Ok(CourtAssignment::Courts(possible.into_iter().collect()));
    }

    let last = slots.len() - 1;
    if run_len == 1 {
        rechecks.push(Recheck {
            index: last,
            courts: possible.clone(),
        });
    }
    commit_run(&mut path, &possible, run_len, slots[last].start)?;

    for recheck in rechecks {
        let before = &slots[recheck.index - 1];
        if let Some(court) = recheck.courts.intersection(&before.courts).next() {
            path[recheck.index] = court.clone();
            path[recheck.index - 1] = court.clone();
        }
    }

    debug_assert_eq!(path.len(), slots.len());
    Ok(CourtAssignment::Path(path))
}

fn commit_run(
    path: &mut Vec<String>,
    possible: &BTreeSet<String>,
    run_len: usize,
    run_last_start: chrono::NaiveDateTime,
) -> Result<(), EngineError> {
    let court = possible
        .iter()
        .next()
        .ok_or(EngineError::UnsatisfiableSlot { start: run_last_start })?;
    path.extend(std::iter::repeat_n(court.clone(), run_len));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    /// One condensed slot per entry, 30 minutes apart.
    fn slots(courts: &[&[&str]]) -> Vec<CondensedHalfHourOpening> {
        courts
            .iter()
            .enumerate()
            .map(|(i, cs)| CondensedHalfHourOpening {
                start: base() + Duration::minutes(30 * i as i64),
                courts: cs.iter().map(|c| c.to_string()).collect(),
            })
            .collect()
    }

    fn path(courts: &[&str]) -> CourtAssignment {
        CourtAssignment::Path(courts.iter().map(|c| c.to_string()).collect())
    }

    fn courts(courts: &[&str]) -> CourtAssignment {
        CourtAssignment::Courts(courts.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn single_slot_reports_all_courts() {
        assert_eq!(find_path(&slots(&[&["2", "1"]])).unwrap(), courts(&["1", "2"]));
    }

    #[test]
    fn common_court_needs_no_path() {
        let s = slots(&[&["1", "2"], &["2"], &["1", "2"]]);
        assert_eq!(find_path(&s).unwrap(), courts(&["2"]));
    }

    #[test]
    fn switches_once_when_forced() {
        let s = slots(&[&["1"], &["1"], &["1", "2"], &["2"]]);
        assert_eq!(find_path(&s).unwrap(), path(&["1", "1", "2", "2"]));
    }

    #[test]
    fn trailing_single_slot_joins_previous_slot() {
        let s = slots(&[&["1"], &["1", "2"], &["2"]]);
        assert_eq!(find_path(&s).unwrap(), path(&["1", "2", "2"]));
    }

    #[test]
    fn middle_single_slot_pulled_back() {
        let s = slots(&[&["1"], &["1", "2"], &["2"], &["3"]]);
        assert_eq!(find_path(&s).unwrap(), path(&["1", "2", "2", "3"]));
    }

    #[test]
    fn leading_single_slot_keeps_its_court() {
        // The first slot has no predecessor to be pulled onto.
        let s = slots(&[&["1"], &["2"], &["2"]]);
        assert_eq!(find_path(&s).unwrap(), path(&["1", "2", "2"]));
    }

    #[test]
    fn second_slot_alone_cannot_join_first() {
        // Slot 1 is a run of its own but shares nothing with slot 0.
        let s = slots(&[&["1"], &["2"], &["3"], &["3"]]);
        assert_eq!(find_path(&s).unwrap(), path(&["1", "2", "3", "3"]));
    }

    #[test]
    fn alternating_courts_stay_valid() {
        let s = slots(&[&["1"], &["2"], &["1"], &["2"]]);
        assert_eq!(find_path(&s).unwrap(), path(&["1", "2", "1", "2"]));
    }

    #[test]
    fn path_entries_drawn_from_slot_courts() {
        let s = slots(&[
            &["1", "3"],
            &["2"],
            &["2", "3"],
            &["3"],
            &["1"],
            &["1", "2"],
        ]);
        match find_path(&s).unwrap() {
            CourtAssignment::Path(p) => {
                assert_eq!(p.len(), s.len());
                for (court, slot) in p.iter().zip(&s) {
                    assert!(slot.courts.contains(court), "{court} not free at {}", slot.start);
                }
            }
            other => panic!("expected a path, got {other:?}"),
        }
    }

    #[test]
    fn empty_range_is_an_error() {
        assert_eq!(find_path(&[]), Err(EngineError::EmptyRange));
    }

    #[test]
    fn slot_without_courts_is_an_error() {
        let s = slots(&[&["1"], &[], &["1"]]);
        assert_eq!(
            find_path(&s),
            Err(EngineError::UnsatisfiableSlot {
                start: base() + Duration::minutes(30)
            })
        );
    }
}
