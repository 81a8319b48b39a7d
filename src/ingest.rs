use std::collections::HashSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::limits::*;
use crate::model::*;

/// Dates a scraper should fetch: today through `max_days_in_advance` days out.
///
/// Used by the per-facility scrapers that write the `ScrapedDay` files the
/// cycle reads; nothing inside the cycle calls it.
pub fn fetch_dates(today: NaiveDate, max_days_in_advance: u32) -> Vec<NaiveDate> {
    let days = max_days_in_advance.min(MAX_DAYS_IN_ADVANCE);
    today.iter_days().take(days as usize + 1).collect()
}

/// Flatten per-day scrape results into one facility snapshot.
///
/// Failed days are logged and skipped. Slots past `now + max_days_in_advance`
/// are dropped. The result is sorted by time and free of duplicate
/// (court, datetime) pairs.
pub fn normalize_scrape(
    facility: &str,
    days: Vec<ScrapedDay>,
    now: NaiveDateTime,
    max_days_in_advance: u32,
) -> Vec<HalfHourOpening> {
    let horizon = now + Duration::days(max_days_in_advance as i64);
    let mut seen: HashSet<(String, NaiveDateTime)> = HashSet::new();
    let mut slots = Vec::new();

    for day in days {
        if let Some(error) = &day.error {
            warn!(facility, date = %day.date, "failed to fetch day: {error}");
            metrics::counter!(crate::observability::SCRAPE_DAYS_FAILED_TOTAL).increment(1);
            continue;
        }
        for slot in day.slots {
            if slot.datetime > horizon {
                continue;
            }
            if seen.insert((slot.court.clone(), slot.datetime)) {
                slots.push(HalfHourOpening::new(facility, slot.court, slot.datetime));
            }
        }
    }

    slots.sort_by(|a, b| a.datetime.cmp(&b.datetime).then_with(|| a.court.cmp(&b.court)));
    slots
}

/// Free half-hour slots on `date` for each court, given that day's reservations.
///
/// The day runs from `open_hour` (default 06:00) to `close_hour` (default 23:00);
/// a close hour of 0 means midnight at the end of `date`. A slot is free when
/// it does not overlap any reservation on the same court.
///
/// For scrapers whose upstream lists reservations instead of free times; they
/// turn each day into a `ScrapedDay` with this before the cycle runs.
pub fn free_slots_from_reservations(
    reservations: &[Reservation],
    courts: &[String],
    date: NaiveDate,
    open_hour: Option<u32>,
    close_hour: Option<u32>,
) -> Vec<CourtSlot> {
    let midnight = NaiveDateTime::from(date);
    let open = midnight + Duration::hours(open_hour.unwrap_or(DEFAULT_OPEN_HOUR) as i64);
    let close = match close_hour.unwrap_or(DEFAULT_CLOSE_HOUR) {
        0 => midnight + Duration::days(1),
        h => midnight + Duration::hours(h as i64),
    };
    let step = Duration::minutes(SLOT_MINUTES);

    let mut slots = Vec::new();
    for court in courts {
        let booked: Vec<&Reservation> = reservations.iter().filter(|r| &r.court == court).collect();
        let mut start = open;
        while start < close {
            let end = start + step;
            let taken = booked.iter().any(|r| start < r.end && r.start < end);
            if !taken {
                slots.push(CourtSlot {
                    court: court.clone(),
                    datetime: start,
                });
            }
            start = end;
        }
    }
    slots
}
