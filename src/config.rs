// src/config.rs
use std::path::Path;
use std::time::Duration;
use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use crate::signal::registry::{DEFAULT_CHANNELS, MAX_SAMPLE_SPAN};
use crate::signal::{ChannelConfig, ChannelRegistry, SpectralMethod, TelemetryError};
/// Environment variable naming a JSON configuration file.
pub const CONFIG_ENV: &str = "TESTSTAND_CONFIG";
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// Chart pipeline period.
    pub tick_interval_ms: u64,
    /// Reading simulation period.
    pub reading_interval_ms: u64,
    /// Half-width of the random-walk step, in channel units. Shared by all channels.
    pub drift_magnitude: f32,
    pub default_channel: String,
    pub spectral_method: SpectralMethod,
    pub seed: Option<u64>,
    pub channels: Vec<ChannelConfig>,
}
impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1200,
            reading_interval_ms: 1200,
            drift_magnitude: 0.05,
            default_channel: "sensor-p1".to_owned(),
            spectral_method: SpectralMethod::Direct,
            seed: None,
            channels: DEFAULT_CHANNELS.clone(),
        }
    }
}
impl DashboardConfig {
    /// Reads the file named by `TESTSTAND_CONFIG`, or returns the built-in defaults.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => {
                info!("{CONFIG_ENV} not set, using built-in channel table");
                Ok(Self::default())
            }
        }
    }
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_json_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!("loaded {} channels from {}", config.channels.len(), path.display());
        Ok(config)
    }
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
    pub fn reading_interval(&self) -> Duration {
        Duration::from_millis(self.reading_interval_ms)
    }
    /// Checks scalar settings and builds the registry, so every startup error surfaces here.
    pub fn validate(&self) -> Result<ChannelRegistry, TelemetryError> {
        if self.tick_interval_ms == 0 || self.reading_interval_ms == 0 {
            return Err(TelemetryError::InvalidConfig(
                "tick intervals must be greater than zero".into(),
            ));
        }
        // The walk step is drawn from `-drift..=drift`.
        let step_span = self.drift_magnitude * 2.0;
        if !(self.drift_magnitude >= 0.0) || !(step_span <= MAX_SAMPLE_SPAN) {
            return Err(TelemetryError::InvalidConfig(format!(
                "drift_magnitude must be between 0 and {}, got {}",
                MAX_SAMPLE_SPAN / 2.0,
                self.drift_magnitude
            )));
        }
        let registry = ChannelRegistry::from_configs(self.channels.iter().cloned())?;
        registry.selectable(&self.default_channel).map_err(|_| {
            TelemetryError::InvalidConfig(format!(
                "default_channel `{}` is not a chartable channel",
                self.default_channel
            ))
        })?;
        Ok(registry)
    }
}
