use facelabel_core::{Policy, StatusDebouncer};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Interval between evaluation passes.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("tick interval must be greater than zero")]
    ZeroTickInterval,
}

/// Overlay loop configuration.
///
/// Sources, lowest precedence first: defaults, an optional TOML file,
/// `FACELABEL_*` environment variables, then CLI flags applied by the caller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Status debounce policy (default: shared-cooldown).
    pub policy: Policy,
    /// Milliseconds between evaluation passes (default: 100).
    pub tick_interval_ms: u64,
    /// Seed for reproducible status draws; entropy when unset.
    pub seed: Option<u64>,
    /// Forget identities not seen for this many frames; never when unset.
    pub evict_after_frames: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: Policy::default(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            seed: None,
            evict_after_frames: None,
        }
    }
}

impl Config {
    /// Load from `path` (if given), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Override fields from `FACELABEL_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Invalid values are logged and ignored.
    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(policy) = parse_var(&lookup, "FACELABEL_POLICY") {
            self.policy = policy;
        }
        if let Some(ms) = parse_var(&lookup, "FACELABEL_TICK_MS") {
            self.tick_interval_ms = ms;
        }
        if let Some(seed) = parse_var(&lookup, "FACELABEL_SEED") {
            self.seed = Some(seed);
        }
        if let Some(frames) = parse_var(&lookup, "FACELABEL_EVICT_AFTER") {
            self.evict_after_frames = Some(frames);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Debouncer for this configuration, driven by `rand`.
    pub fn build_debouncer(&self) -> StatusDebouncer {
        let debouncer = StatusDebouncer::with_seed(self.policy, self.seed);
        match self.evict_after_frames {
            Some(frames) => debouncer.with_idle_eviction(frames),
            None => debouncer,
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring invalid environment value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.policy, Policy::SharedCooldown);
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_partial() {
        let config = Config::from_toml_str("policy = \"flip\"\nseed = 7\n").unwrap();
        assert_eq!(config.policy, Policy::Flip);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
    }

    #[test]
    fn test_bundled_example_config_parses() {
        let text = include_str!("../../../contrib/facelabel.toml");
        let config = Config::from_toml_str(text).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_toml_rejects_unknown_fields_and_policies() {
        assert!(Config::from_toml_str("tick = 5").is_err());
        assert!(Config::from_toml_str("policy = \"sometimes\"").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_vars(vars(&[
            ("FACELABEL_POLICY", "per-face-cooldown"),
            ("FACELABEL_TICK_MS", "250"),
            ("FACELABEL_SEED", "42"),
            ("FACELABEL_EVICT_AFTER", "30"),
        ]));
        assert_eq!(config.policy, Policy::PerFaceCooldown);
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.evict_after_frames, Some(30));
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_vars(vars(&[("FACELABEL_TICK_MS", "fast"), ("FACELABEL_POLICY", "nope")]));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_zero_tick_rejected() {
        let config = Config {
            tick_interval_ms: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTickInterval)));
    }

    #[test]
    fn test_build_debouncer() {
        let config = Config {
            policy: Policy::Flip,
            seed: Some(3),
            evict_after_frames: Some(0),
            ..Config::default()
        };
        let mut debouncer = config.build_debouncer();
        assert_eq!(debouncer.policy(), Policy::Flip);
        debouncer.evaluate(Some(2));
        assert_eq!(debouncer.begin_frame(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/facelabel.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
