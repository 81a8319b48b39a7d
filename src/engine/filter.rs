use crate::model::*;

/// Keep the slots a subscriber could actually book: right day, inside the
/// time window, not on an omitted court. Input order is preserved.
pub fn filter_by_preferences(
    slots: &[HalfHourOpening],
    preferences: &Preferences,
) -> Vec<HalfHourOpening> {
    slots
        .iter()
        .filter(|slot| preferences.matches_day(slot.datetime.date()))
        .filter(|slot| preferences.matches_time(Time::of(&slot.datetime)))
        .filter(|slot| !preferences.omitted_courts.contains(&slot.court))
        .cloned()
        .collect()
}
