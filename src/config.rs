use crate::types::TrackOptions;
use std::time::Duration;

/// Default cycle period.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(3);

/// Shortest sleep between cycles; the loop never spins without yielding.
pub const MIN_SLEEP: Duration = Duration::from_millis(1);

pub const ENV_PERIOD_MS: &str = "TRACKCORE_PERIOD_MS";
pub const ENV_TCOMP: &str = "TRACKCORE_TCOMP";
pub const ENV_TCOMP_TZ: &str = "TRACKCORE_TCOMP_TZ";

/// Scheduler and pipeline settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Target cycle period.
    pub period: Duration,
    /// Global toggles applied at start; `None` keeps the pipeline's own.
    /// Can be changed at runtime on the tracker either way.
    pub options: Option<TrackOptions>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            period: DEFAULT_PERIOD,
            options: None,
        }
    }
}

impl Settings {
    /// Defaults with overrides from `TRACKCORE_*` environment variables.
    pub fn from_env() -> Settings {
        Settings::default().with_env()
    }

    /// Apply environment overrides on top of `self`.
    pub fn with_env(mut self) -> Settings {
        if let Some(ms) = read_env_u64(ENV_PERIOD_MS) {
            if ms >= 1 {
                self.period = Duration::from_millis(ms);
            } else {
                log::warn!("Ignoring {}=0, keeping {:?}", ENV_PERIOD_MS, self.period);
            }
        }
        if let Some(on) = read_env_bool(ENV_TCOMP) {
            self.options
                .get_or_insert_with(TrackOptions::empty)
                .set(TrackOptions::TCOMP, on);
        }
        if let Some(on) = read_env_bool(ENV_TCOMP_TZ) {
            self.options
                .get_or_insert_with(TrackOptions::empty)
                .set(TrackOptions::TCOMP_PRESERVE_Z, on);
        }
        log::debug!("Settings: period={:?} options={:?}", self.period, self.options);
        self
    }

    /// Replace the pipeline's toggles when the tracker starts.
    pub fn with_options(mut self, options: TrackOptions) -> Settings {
        self.options = Some(options);
        self
    }

    pub fn with_period(mut self, period: Duration) -> Settings {
        self.period = period;
        self
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn read_env_bool(name: &str) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    let parsed = parse_bool(&raw);
    if parsed.is_none() {
        log::warn!("Ignoring {}='{}' (expected a boolean)", name, raw);
    }
    parsed
}

fn read_env_u64(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    let parsed = raw.trim().parse::<u64>().ok();
    if parsed.is_none() {
        log::warn!("Ignoring {}='{}' (expected an integer)", name, raw);
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.period, Duration::from_millis(3));
        assert_eq!(s.options, None);
        assert_eq!(
            s.with_options(TrackOptions::TCOMP).options,
            Some(TrackOptions::TCOMP)
        );
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool(" Yes "), Some(true));
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("OFF"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_env_overrides() {
        // Only this test touches these variables.
        std::env::set_var(ENV_PERIOD_MS, "5");
        std::env::set_var(ENV_TCOMP, "true");
        std::env::set_var(ENV_TCOMP_TZ, "garbage");
        let s = Settings::from_env();
        std::env::remove_var(ENV_PERIOD_MS);
        std::env::remove_var(ENV_TCOMP);
        std::env::remove_var(ENV_TCOMP_TZ);

        assert_eq!(s.period, Duration::from_millis(5));
        assert_eq!(s.options, Some(TrackOptions::TCOMP));

        // Unset variables leave the options untouched.
        let s = Settings::default().with_env();
        assert_eq!(s.options, None);
    }
}
