/// Length of one bookable slot.
pub const SLOT_MINUTES: i64 = 30;

/// Shortest opening a subscriber may ask for.
pub const MIN_DURATION_MINUTES: u32 = 30;

/// Longest opening a subscriber may ask for.
pub const MAX_DURATION_MINUTES: u32 = 180;

/// Openings are enumerated up to this many slots (3 hours) even inside longer chunks.
pub const MAX_SLOTS_PER_OPENING: usize = (MAX_DURATION_MINUTES as usize) / (SLOT_MINUTES as usize);

/// Facility opening hour when the facility config does not name one.
pub const DEFAULT_OPEN_HOUR: u32 = 6;

/// Facility closing hour when the facility config does not name one. 0 means midnight.
pub const DEFAULT_CLOSE_HOUR: u32 = 23;

/// Upper bound on `max_days_in_advance` accepted from facility config.
pub const MAX_DAYS_IN_ADVANCE: u32 = 60;
