//! Runtime configuration: TOML files plus `TALE_*` environment overrides.

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tale_core::SchedulerConfig;
use tracing::{debug, warn};

use crate::error::{Result, RuntimeError};

/// What the director does when an action fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecoveryPolicy {
    /// Cancel the failing top-level action and keep playing.
    #[default]
    ForceComplete,
    /// Stop and hand the error to the caller.
    Halt,
}

impl FromStr for RecoveryPolicy {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "force-complete" => Ok(RecoveryPolicy::ForceComplete),
            "halt" => Ok(RecoveryPolicy::Halt),
            other => Err(format!("unknown recovery policy `{other}`")),
        }
    }
}

impl fmt::Display for RecoveryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecoveryPolicy::ForceComplete => "force-complete",
            RecoveryPolicy::Halt => "halt",
        };
        f.write_str(label)
    }
}

/// Settings for one [`Director`](crate::Director).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    pub scheduler: SchedulerConfig,
    pub recovery: RecoveryPolicy,
    pub time_scale: f32,
    /// Shrink both containers whenever the scene changes.
    pub vacuum_on_scene_change: bool,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            recovery: RecoveryPolicy::default(),
            time_scale: 1.0,
            vacuum_on_scene_change: true,
        }
    }
}

/// Top-level configuration file.
///
/// ```toml
/// fps = 60
///
/// [director]
/// recovery = "halt"
///
/// [director.scheduler.queue]
/// base_capacity = 128
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub director: DirectorConfig,
    /// Frame rate used when the host drives frames at a fixed step.
    pub fps: u32,
    /// Upper bound on frames played by a headless run.
    pub max_frames: u64,
}

impl RuntimeConfig {
    pub const DEFAULT_FPS: u32 = 60;
    pub const DEFAULT_MAX_FRAMES: u64 = 36_000;

    /// Defaults overridden by the process environment.
    ///
    /// Environment variables:
    /// - `TALE_QUEUE_BASE_CAPACITY` - initial queue capacity
    /// - `TALE_PARALLEL_BASE_CAPACITY` - initial concurrent set capacity
    /// - `TALE_POOL_MAX_CAPACITY` - pooled actions per type (`-1` unlimited, `0` off)
    /// - `TALE_RECOVERY` - `force-complete` or `halt`
    /// - `TALE_TIME_SCALE` - scaled time multiplier
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| env::var(key).ok());
    }

    /// Applies overrides from `lookup`. Unparsable values are logged and skipped.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let director = &mut self.director;

        if let Some(value) = read_var(&lookup, "TALE_QUEUE_BASE_CAPACITY") {
            director.scheduler.queue.base_capacity = value;
        }
        if let Some(value) = read_var(&lookup, "TALE_PARALLEL_BASE_CAPACITY") {
            director.scheduler.parallel.base_capacity = value;
        }
        if let Some(value) = read_var(&lookup, "TALE_POOL_MAX_CAPACITY") {
            director.scheduler.pool.max_capacity = value;
        }
        if let Some(value) = read_var(&lookup, "TALE_RECOVERY") {
            director.recovery = value;
        }
        if let Some(value) = read_var(&lookup, "TALE_TIME_SCALE") {
            director.time_scale = value;
        }
    }

    /// Seconds per frame at the configured frame rate.
    pub fn frame_delta(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            director: DirectorConfig::default(),
            fps: Self::DEFAULT_FPS,
            max_frames: Self::DEFAULT_MAX_FRAMES,
        }
    }
}

fn read_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => {
            debug!(key, value = %raw, "config override from environment");
            Some(value)
        }
        Err(err) => {
            warn!(key, value = %raw, error = %err, "ignoring invalid environment override");
            None
        }
    }
}

/// Loader for runtime configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a [`RuntimeConfig`] from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<RuntimeConfig> {
        let content = fs::read_to_string(path).map_err(|source| RuntimeError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<RuntimeConfig> {
        toml::from_str(content).map_err(|source| RuntimeError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = RuntimeConfig::default();
        config.apply_env_with(lookup(&[
            ("TALE_QUEUE_BASE_CAPACITY", "128"),
            ("TALE_POOL_MAX_CAPACITY", "-1"),
            ("TALE_RECOVERY", "halt"),
            ("TALE_TIME_SCALE", "0.5"),
        ]));

        let director = &config.director;
        assert_eq!(director.scheduler.queue.base_capacity, 128);
        assert_eq!(director.scheduler.parallel.base_capacity, 64);
        assert_eq!(director.scheduler.pool.max_capacity, -1);
        assert_eq!(director.recovery, RecoveryPolicy::Halt);
        assert_eq!(director.time_scale, 0.5);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut config = RuntimeConfig::default();
        config.apply_env_with(lookup(&[
            ("TALE_PARALLEL_BASE_CAPACITY", "lots"),
            ("TALE_RECOVERY", "panic"),
        ]));
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn recovery_policy_parses_loosely() {
        assert_eq!("Force_Complete".parse::<RecoveryPolicy>(), Ok(RecoveryPolicy::ForceComplete));
        assert_eq!(RecoveryPolicy::Halt.to_string(), "halt");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ConfigLoader::parse(
            Path::new("inline.toml"),
            "fps = 30\n[director.scheduler.parallel]\nvacuum = false\n",
        )
        .unwrap();

        assert_eq!(config.fps, 30);
        assert!(!config.director.scheduler.parallel.vacuum);
        assert_eq!(config.director.scheduler.parallel.base_capacity, 64);
        assert_eq!(config.director.recovery, RecoveryPolicy::ForceComplete);
        assert!((config.frame_delta() - 1.0 / 30.0).abs() < f32::EPSILON);
    }

    #[test]
    fn malformed_toml_names_the_file() {
        let err = ConfigLoader::parse(Path::new("broken.toml"), "fps = \"fast\"").unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
