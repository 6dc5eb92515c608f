/*!
 * Scheduler Configuration
 *
 * Clock granularity and presentation settings. None of these change which
 * process runs when; they only set how fast simulated time passes and how
 * much is logged.
 */

use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::time::{SimTime, MILLIS_PER_UNIT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default real time per simulated unit
pub const DEFAULT_UNIT: Duration = Duration::from_secs(1);

/// Default clock increment (half a unit)
pub const DEFAULT_RESOLUTION: SimTime = SimTime::from_millis(500);

/// Verbosity for the operator console: dispatch, preemption and completion
/// lines are visible
pub const INTERACTIVE_VERBOSE: u8 = 1;

/// Default legacy time slice
pub const DEFAULT_TIME_SLICE: SimTime = SimTime::from_units(2);

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Legacy round-robin slice, accepted for compatibility and ignored by SRTF
    pub time_slice: SimTime,

    /// Log verbosity (0 = quiet)
    pub verbose: u8,

    /// Real time corresponding to one simulated unit
    #[serde(rename = "unit_ms", with = "duration_millis")]
    pub unit: Duration,

    /// Simulated time added per clock tick
    pub resolution: SimTime,
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self {
            time_slice: DEFAULT_TIME_SLICE,
            verbose: 0,
            unit: DEFAULT_UNIT,
            resolution: DEFAULT_RESOLUTION,
        }
    }

    /// Parse a JSON configuration document; missing fields take defaults
    pub fn from_json(json: &str) -> SchedulerResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SchedulerError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read overrides from the environment
    ///
    /// Environment variables:
    /// - SRTF_VERBOSE: log verbosity (default: 0)
    /// - SRTF_UNIT_MS: real milliseconds per simulated unit (default: 1000)
    /// - SRTF_RESOLUTION_MS: clock increment in milli-units (default: 500)
    /// - SRTF_TIME_SLICE: legacy slice in units (default: 2)
    pub fn from_env() -> SchedulerResult<Self> {
        Self::from_lookup(Self::new(), |key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), but logs scheduling decisions at
    /// `info` unless SRTF_VERBOSE says otherwise
    pub fn from_env_interactive() -> SchedulerResult<Self> {
        Self::from_lookup(
            Self::new().with_verbose(INTERACTIVE_VERBOSE),
            |key| std::env::var(key).ok(),
        )
    }

    pub(crate) fn from_lookup<F>(base: Self, lookup: F) -> SchedulerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = base;

        if let Some(v) = lookup("SRTF_VERBOSE") {
            config.verbose = parse_var("SRTF_VERBOSE", &v)?;
        }
        if let Some(v) = lookup("SRTF_UNIT_MS") {
            config.unit = Duration::from_millis(parse_var("SRTF_UNIT_MS", &v)?);
        }
        if let Some(v) = lookup("SRTF_RESOLUTION_MS") {
            config.resolution = SimTime::from_millis(parse_var("SRTF_RESOLUTION_MS", &v)?);
        }
        if let Some(v) = lookup("SRTF_TIME_SLICE") {
            let units: f64 = parse_var("SRTF_TIME_SLICE", &v)?;
            config.time_slice = SimTime::from_units_f64(units).ok_or_else(|| {
                SchedulerError::InvalidConfig(format!("SRTF_TIME_SLICE out of range: {}", v))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Builder-style overrides
    pub fn with_unit(mut self, unit: Duration) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_resolution(mut self, resolution: SimTime) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn validate(&self) -> SchedulerResult<()> {
        if self.unit.is_zero() {
            return Err(SchedulerError::InvalidConfig("unit must be non-zero".into()));
        }
        if self.resolution.is_zero() {
            return Err(SchedulerError::InvalidConfig(
                "resolution must be non-zero".into(),
            ));
        }
        if self.resolution.as_millis() > MILLIS_PER_UNIT {
            return Err(SchedulerError::InvalidConfig(format!(
                "resolution {} exceeds one unit",
                self.resolution
            )));
        }
        Ok(())
    }

    /// Real time between clock ticks
    pub fn tick_period(&self) -> Duration {
        self.real_duration(self.resolution)
    }

    /// Real time corresponding to a span of simulated time
    pub fn real_duration(&self, span: SimTime) -> Duration {
        let nanos = self.unit.as_nanos() * span.as_millis() as u128 / MILLIS_PER_UNIT as u128;
        Duration::from_nanos(nanos.min(u64::MAX as u128) as u64)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> SchedulerResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| SchedulerError::InvalidConfig(format!("{}={:?}: {}", key, value, e)))
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
