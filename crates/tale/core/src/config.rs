//! Scheduler configuration and tunable parameters.

use tracing::warn;

use crate::collections::{MAX_CAPACITY, VacuumPolicy, ceil_power_of_two, is_power_of_two};
use crate::pool::PoolCapacity;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} = {value} exceeds the maximum container capacity {max}", max = MAX_CAPACITY)]
    CapacityTooLarge { field: String, value: usize },
}

/// Capacity and vacuum settings for one container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ContainerConfig {
    /// Initial capacity, and the floor vacuuming shrinks back to. Power of two.
    pub base_capacity: usize,
    /// Whether `vacuum()` may shrink the container at all.
    pub vacuum: bool,
    /// Growing past this capacity arms the vacuum. Power of two, at least `base_capacity`.
    pub vacuum_capacity: usize,
    /// Shrink once occupancy is at most `capacity / vacuum_factor`. At least 2.
    pub vacuum_factor: usize,
}

impl ContainerConfig {
    pub const DEFAULT_BASE_CAPACITY: usize = 64;
    pub const DEFAULT_VACUUM_CAPACITY: usize = 8192;
    pub const DEFAULT_VACUUM_FACTOR: usize = 4;

    pub fn new() -> Self {
        Self {
            base_capacity: Self::DEFAULT_BASE_CAPACITY,
            vacuum: true,
            vacuum_capacity: Self::DEFAULT_VACUUM_CAPACITY,
            vacuum_factor: Self::DEFAULT_VACUUM_FACTOR,
        }
    }

    pub fn with_base_capacity(base_capacity: usize) -> Self {
        Self {
            base_capacity,
            ..Self::new()
        }
    }

    /// Rounds invalid values to the nearest legal ones, warning for each fix.
    ///
    /// `label` names the container in log output (`"queue"`, `"parallel"`).
    pub fn sanitized(self, label: &str) -> Result<Self, ConfigError> {
        let mut config = self;

        config.base_capacity = round_capacity(label, "base_capacity", config.base_capacity)?;
        config.vacuum_capacity =
            round_capacity(label, "vacuum_capacity", config.vacuum_capacity)?;

        if config.vacuum_capacity < config.base_capacity {
            warn!(
                container = label,
                vacuum_capacity = config.vacuum_capacity,
                base_capacity = config.base_capacity,
                "vacuum_capacity below base_capacity; raising it"
            );
            config.vacuum_capacity = config.base_capacity;
        }

        if config.vacuum_factor < 2 {
            warn!(
                container = label,
                vacuum_factor = config.vacuum_factor,
                "vacuum_factor must be at least 2; using 2"
            );
            config.vacuum_factor = 2;
        }

        Ok(config)
    }

    pub fn policy(&self) -> VacuumPolicy {
        VacuumPolicy::new(
            self.base_capacity,
            self.vacuum,
            self.vacuum_capacity,
            self.vacuum_factor,
        )
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn round_capacity(label: &str, field: &str, value: usize) -> Result<usize, ConfigError> {
    if value > MAX_CAPACITY {
        return Err(ConfigError::CapacityTooLarge {
            field: format!("{label}.{field}"),
            value,
        });
    }
    if is_power_of_two(value) {
        return Ok(value);
    }

    let rounded = ceil_power_of_two(value).max(2);
    warn!(
        container = label,
        field,
        value,
        rounded,
        "capacity is not a power of two; rounding up"
    );
    Ok(rounded)
}

/// Action pool limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Pooled allocations kept per action type. `-1` is unlimited, `0` disables pooling.
    pub max_capacity: i64,
}

impl PoolConfig {
    pub const DEFAULT_MAX_CAPACITY: i64 = 4096;

    pub fn capacity(&self) -> PoolCapacity {
        PoolCapacity::from_knob(self.max_capacity)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_capacity: Self::DEFAULT_MAX_CAPACITY,
        }
    }
}

/// Everything a [`Scheduler`](crate::Scheduler) is built from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SchedulerConfig {
    pub queue: ContainerConfig,
    pub parallel: ContainerConfig,
    pub pool: PoolConfig,
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sanitized(self) -> Result<Self, ConfigError> {
        Ok(Self {
            queue: self.queue.sanitized("queue")?,
            parallel: self.parallel.sanitized("parallel")?,
            pool: self.pool,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use super::*;

    /// Counts `WARN` events seen while it is the default subscriber.
    #[derive(Clone, Default)]
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn warnings_during<R>(f: impl FnOnce() -> R) -> (R, usize) {
        let counter = WarnCounter::default();
        let subscriber = tracing_subscriber::registry().with(counter.clone());
        let out = tracing::subscriber::with_default(subscriber, f);
        (out, counter.0.load(Ordering::Relaxed))
    }

    #[test]
    fn defaults_match_engine_tuning() {
        let config = SchedulerConfig::default();
        assert_eq!(config.queue.base_capacity, 64);
        assert!(config.queue.vacuum);
        assert_eq!(config.parallel.vacuum_capacity, 8192);
        assert_eq!(config.parallel.vacuum_factor, 4);
        assert_eq!(config.pool.capacity(), PoolCapacity::Limited(4096));
    }

    #[test]
    fn sanitize_rounds_up_invalid_values() {
        let config = ContainerConfig {
            base_capacity: 100,
            vacuum: true,
            vacuum_capacity: 3,
            vacuum_factor: 1,
        }
        .sanitized("queue")
        .unwrap();

        assert_eq!(config.base_capacity, 128);
        assert_eq!(config.vacuum_capacity, 128);
        assert_eq!(config.vacuum_factor, 2);
    }

    #[test]
    fn every_sanitize_fix_is_logged() {
        let invalid = ContainerConfig {
            base_capacity: 100,
            vacuum: true,
            vacuum_capacity: 3,
            vacuum_factor: 1,
        };
        let (config, warnings) = warnings_during(|| invalid.sanitized("queue"));
        assert!(config.is_ok());
        // base rounded, vacuum rounded, vacuum raised to base, factor raised.
        assert_eq!(warnings, 4);

        let (config, warnings) = warnings_during(|| SchedulerConfig::default().sanitized());
        assert!(config.is_ok());
        assert_eq!(warnings, 0);
    }

    #[test]
    fn zero_capacity_becomes_two() {
        let config = ContainerConfig::with_base_capacity(0).sanitized("parallel").unwrap();
        assert_eq!(config.base_capacity, 2);
    }

    #[test]
    fn oversized_capacity_is_rejected() {
        let err = ContainerConfig::with_base_capacity(MAX_CAPACITY + 1)
            .sanitized("queue")
            .unwrap_err();
        assert!(matches!(err, ConfigError::CapacityTooLarge { .. }));
        assert!(err.to_string().starts_with("queue.base_capacity"));
    }
}
