use crate::error::AcsError;
use std::time::Duration;

pub const DEFAULT_CLERK_NUM: usize = 4;
pub const DEFAULT_CLASS_NUM: usize = 2;

// Simulated units between two periodic queue logs.
pub const DEFAULT_LOG_PERIOD: u64 = 1;

// Clerk poll interval. It is a wall-clock value, not a simulated one.
pub const CLERK_POLL: Duration = Duration::from_millis(1);

// Unit every simulated delay is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    #[default]
    Seconds,
    Millis,
}

impl TimeUnit {
    pub fn duration(self, units: u64) -> Duration {
        match self {
            TimeUnit::Seconds => Duration::from_secs(units),
            TimeUnit::Millis => Duration::from_millis(units),
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Millis => "ms",
        }
    }

    // Formats a wall-clock duration in this unit with two decimals, e.g. `1.25s`.
    pub fn format(self, elapsed: Duration) -> String {
        let value = match self {
            TimeUnit::Seconds => elapsed.as_secs_f64(),
            TimeUnit::Millis => elapsed.as_secs_f64() * 1000.0,
        };
        format!("{:.2}{}", value, self.suffix())
    }
}

// Run configuration.
//
// Attributes:
// * `clerks`: Number of clerk tasks.
// * `classes`: Number of priority classes, customer classes must be below it.
// * `time_unit`: Scale of every simulated delay.
// * `real_time`: Log every customer transition instead of periodic queue dumps.
// * `json`: Periodic dumps are emitted as JSON snapshots.
// * `log_period`: Simulated units between periodic dumps.
// * `clerk_poll`: Pause at the top of every clerk scan.
#[derive(Debug, Clone)]
pub struct Config {
    pub clerks: usize,
    pub classes: usize,
    pub time_unit: TimeUnit,
    pub real_time: bool,
    pub json: bool,
    pub log_period: u64,
    pub clerk_poll: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            clerks: DEFAULT_CLERK_NUM,
            classes: DEFAULT_CLASS_NUM,
            time_unit: TimeUnit::Seconds,
            real_time: false,
            json: false,
            log_period: DEFAULT_LOG_PERIOD,
            clerk_poll: CLERK_POLL,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), AcsError> {
        if self.clerks == 0 {
            return Err(AcsError::NoClerks);
        }
        if self.classes == 0 {
            return Err(AcsError::NoClasses);
        }
        Ok(())
    }

    pub fn log_interval(&self) -> Duration {
        self.time_unit.duration(self.log_period.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_scale_uniformly() {
        assert_eq!(TimeUnit::Seconds.duration(3), Duration::from_secs(3));
        assert_eq!(TimeUnit::Millis.duration(3), Duration::from_millis(3));
    }

    #[test]
    fn elapsed_is_formatted_with_unit() {
        assert_eq!(TimeUnit::Seconds.format(Duration::from_millis(1250)), "1.25s");
        assert_eq!(TimeUnit::Millis.format(Duration::from_micros(2500)), "2.50ms");
    }

    #[test]
    fn empty_counter_is_rejected() {
        let config = Config {
            clerks: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AcsError::NoClerks)));

        let config = Config {
            classes: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AcsError::NoClasses)));
        assert!(Config::default().validate().is_ok());
    }
}
