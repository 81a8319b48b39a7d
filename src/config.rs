use std::path::{Path, PathBuf};

use crate::limits::MAX_DAYS_IN_ADVANCE;
use crate::model::{FacilityConfig, Preferences};

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Json(PathBuf, serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "cannot read {}: {e}", path.display()),
            ConfigError::Json(path, e) => write!(f, "cannot parse {}: {e}", path.display()),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Process configuration, read from `COURTWATCH_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub facilities_path: PathBuf,
    pub scrape_dir: PathBuf,
    pub state_path: PathBuf,
    pub persist_openings: Option<u32>,
    pub metrics_port: Option<u16>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, with the variable source injected.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let path = |key: &str, default: &str| PathBuf::from(get(key).unwrap_or_else(|| default.into()));
        Ok(Self {
            facilities_path: path("COURTWATCH_FACILITIES", "./facilities.json"),
            scrape_dir: path("COURTWATCH_SCRAPE_DIR", "./scrapes"),
            state_path: path("COURTWATCH_STATE", "./state.json"),
            persist_openings: get("COURTWATCH_PERSIST_OPENINGS")
                .map(|s| parse_persist_openings(&s))
                .transpose()?,
            metrics_port: get("COURTWATCH_METRICS_PORT").and_then(|s| s.parse().ok()),
        })
    }

    /// Scrape output for one facility: `<scrape_dir>/<facility>.json`.
    pub fn scrape_path(&self, facility: &str) -> PathBuf {
        let safe_name: String = facility
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        self.scrape_dir.join(format!("{safe_name}.json"))
    }
}

/// The persisted opening set is derived with the same duration rules a
/// subscription must follow.
fn parse_persist_openings(raw: &str) -> Result<u32, ConfigError> {
    let min_duration: u32 = raw.trim().parse().map_err(|_| {
        ConfigError::Invalid(format!("COURTWATCH_PERSIST_OPENINGS={raw:?} is not a number"))
    })?;
    Preferences::unrestricted(min_duration)
        .validate()
        .map_err(|e| ConfigError::Invalid(format!("COURTWATCH_PERSIST_OPENINGS={min_duration}: {e}")))?;
    Ok(min_duration)
}

/// Read and check the facility list.
pub fn load_facilities(path: &Path) -> Result<Vec<FacilityConfig>, ConfigError> {
    let bytes = std::fs::read(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    let facilities: Vec<FacilityConfig> =
        serde_json::from_slice(&bytes).map_err(|e| ConfigError::Json(path.to_path_buf(), e))?;
    for facility in &facilities {
        validate_facility(facility)?;
    }
    Ok(facilities)
}

fn validate_facility(facility: &FacilityConfig) -> Result<(), ConfigError> {
    if facility.name.trim().is_empty() {
        return Err(ConfigError::Invalid("facility with empty name".into()));
    }
    if facility.max_days_in_advance > MAX_DAYS_IN_ADVANCE {
        return Err(ConfigError::Invalid(format!(
            "{}: max_days_in_advance {} exceeds {MAX_DAYS_IN_ADVANCE}",
            facility.name, facility.max_days_in_advance
        )));
    }
    if let (Some(open), Some(close)) = (facility.open_hour, facility.close_hour)
        && close != 0
        && close <= open
    {
        return Err(ConfigError::Invalid(format!(
            "{}: closes at {close} before opening at {open}",
            facility.name
        )));
    }
    Ok(())
}
