use std::collections::HashMap;
use once_cell::sync::Lazy;
use rand::Rng;
use serde::{Deserialize, Serialize};
use crate::signal::TelemetryError;
/// Raw channel record as it appears in configuration. Every field is explicit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    pub id: String,
    pub label: String,
    pub min: f32,
    pub max: f32,
    pub unit: String,
    pub decimals: u8,
    pub chartable: bool,
}
impl ChannelConfig {
    fn new(id: &str, label: &str, min: f32, max: f32, unit: &str, decimals: u8) -> Self {
        Self {
            id: id.to_owned(),
            label: label.to_owned(),
            min,
            max,
            unit: unit.to_owned(),
            decimals,
            chartable: true,
        }
    }
}
/// Channel table of the test stand schematic.
pub static DEFAULT_CHANNELS: Lazy<Vec<ChannelConfig>> = Lazy::new(|| {
    vec![
        ChannelConfig::new("sensor-p1", "P1", 0.0, 1.5, " bar", 2),
        ChannelConfig::new("sensor-p2", "P2", 0.0, 1.5, " bar", 2),
        ChannelConfig::new("sensor-p3", "P3", 0.0, 1.2, " bar", 2),
        ChannelConfig::new("sensor-p4", "P4", 0.0, 1.2, " bar", 2),
        ChannelConfig::new("sensor-t1", "T1", -10.0, 30.0, "℃", 1),
        ChannelConfig::new("sensor-t2", "T2", -10.0, 30.0, "℃", 1),
        ChannelConfig::new("sensor-t3", "T3", -10.0, 30.0, "℃", 1),
        ChannelConfig::new("sensor-dp1", "DP1", 0.0, 5.0, " kPa", 2),
        ChannelConfig::new("sensor-dp2", "DP2", 0.0, 5.0, " kPa", 2),
        ChannelConfig::new("sensor-flow1", "", 0.0, 0.8, " g/s", 2),
        ChannelConfig::new("sensor-flow2", "", 0.0, 0.8, " g/s", 2),
        ChannelConfig::new("sensor-l1", "L1", 0.0, 5.0, " N", 2),
        ChannelConfig::new("sensor-p5", "P5", 0.0, 1.2, " bar", 2),
        ChannelConfig::new("sensor-p6", "P6", 0.0, 1.2, " bar", 2),
    ]
});
/// Widest range uniform draws accept; wider spans overflow inside the sampler.
pub const MAX_SAMPLE_SPAN: f32 = f32::MAX / 2.0;
/// Validated, immutable description of one telemetry channel.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelSpec {
    id: String,
    label: String,
    min: f32,
    max: f32,
    unit: String,
    decimals: u8,
    chartable: bool,
}
impl ChannelSpec {
    pub fn new(config: ChannelConfig) -> Result<Self, TelemetryError> {
        // Also rejects NaN and infinite bounds.
        let span = config.max - config.min;
        if !(config.min < config.max) || !(span <= MAX_SAMPLE_SPAN) {
            return Err(TelemetryError::DivisionDegenerate {
                id: config.id,
                min: config.min,
                max: config.max,
            });
        }
        Ok(Self {
            id: config.id,
            label: config.label,
            min: config.min,
            max: config.max,
            unit: config.unit,
            decimals: config.decimals,
            chartable: config.chartable,
        })
    }
    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn min(&self) -> f32 {
        self.min
    }
    pub fn max(&self) -> f32 {
        self.max
    }
    #[cfg(test)]
    pub fn decimals(&self) -> u8 {
        self.decimals
    }
    pub fn is_chartable(&self) -> bool {
        self.chartable
    }
    /// Label shown in pickers; falls back to the id for unlabeled channels.
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
    /// Maps `raw` onto `[0, 1]` relative to the channel bounds (not clamped).
    pub fn normalize(&self, raw: f32) -> f32 {
        (raw - self.min) / (self.max - self.min)
    }
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
    /// Uniform draw from `[min, max]`.
    pub fn random_value<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        rng.gen_range(self.min..=self.max)
    }
    /// Readout text such as `P1 0.73 bar`; unlabeled channels show only value and unit.
    pub fn format_readout(&self, value: f32) -> String {
        let decimals = self.decimals as usize;
        if self.label.is_empty() {
            format!("{value:.decimals$}{}", self.unit)
        } else {
            format!("{} {value:.decimals$}{}", self.label, self.unit)
        }
    }
}
/// Opaque handle to a registered channel. Only the registry hands these out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(usize);
/// Immutable set of channels known to the dashboard.
#[derive(Clone, Debug)]
pub struct ChannelRegistry {
    specs: Vec<ChannelSpec>,
    by_id: HashMap<String, ChannelId>,
}
impl ChannelRegistry {
    pub fn from_configs(
        configs: impl IntoIterator<Item = ChannelConfig>,
    ) -> Result<Self, TelemetryError> {
        let mut specs = Vec::new();
        let mut by_id = HashMap::new();
        for config in configs {
            let spec = ChannelSpec::new(config)?;
            if by_id.contains_key(spec.id()) {
                return Err(TelemetryError::DuplicateChannel(spec.id.clone()));
            }
            by_id.insert(spec.id.clone(), ChannelId(specs.len()));
            specs.push(spec);
        }
        if specs.is_empty() {
            return Err(TelemetryError::InvalidConfig(
                "at least one channel is required".into(),
            ));
        }
        Ok(Self { specs, by_id })
    }
    #[cfg(test)]
    pub fn with_defaults() -> Result<Self, TelemetryError> {
        Self::from_configs(DEFAULT_CHANNELS.iter().cloned())
    }
    pub fn len(&self) -> usize {
        self.specs.len()
    }
    pub fn lookup(&self, id: &str) -> Result<ChannelId, TelemetryError> {
        self.by_id
            .get(id)
            .copied()
            .ok_or_else(|| TelemetryError::UnknownChannel(id.to_owned()))
    }
    /// Like [`lookup`](Self::lookup) but restricted to channels eligible for charting.
    pub fn selectable(&self, id: &str) -> Result<ChannelId, TelemetryError> {
        let channel = self.lookup(id)?;
        if self.spec(channel).is_chartable() {
            Ok(channel)
        } else {
            Err(TelemetryError::UnknownChannel(id.to_owned()))
        }
    }
    pub fn spec(&self, channel: ChannelId) -> &ChannelSpec {
        &self.specs[channel.0]
    }
    pub fn iter(&self) -> impl Iterator<Item = (ChannelId, &ChannelSpec)> {
        self.specs
            .iter()
            .enumerate()
            .map(|(idx, spec)| (ChannelId(idx), spec))
    }
    pub fn selectable_series(&self) -> impl Iterator<Item = (ChannelId, &ChannelSpec)> {
        self.iter().filter(|(_, spec)| spec.is_chartable())
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    #[test]
    fn default_table_is_valid() {
        let registry = ChannelRegistry::with_defaults().unwrap();
        assert_eq!(registry.len(), 14);
        let t1 = registry.lookup("sensor-t1").unwrap();
        assert_eq!(registry.spec(t1).decimals(), 1);
        assert_eq!(registry.spec(t1).min(), -10.0);
    }
    #[test]
    fn rejects_degenerate_range() {
        let mut config = DEFAULT_CHANNELS[0].clone();
        config.max = config.min;
        let err = ChannelRegistry::from_configs(vec![config]).unwrap_err();
        assert!(matches!(err, TelemetryError::DivisionDegenerate { .. }));
    }
    #[test]
    fn rejects_nan_and_unbounded_ranges() {
        let cases = [
            (f32::NAN, 1.0),
            (0.0, f32::NAN),
            (0.0, f32::INFINITY),
            (f32::NEG_INFINITY, 0.0),
            (-f32::MAX, f32::MAX),
            (0.0, f32::MAX),
        ];
        for (min, max) in cases {
            let config = ChannelConfig::new("p", "P", min, max, " bar", 2);
            assert!(
                matches!(ChannelSpec::new(config), Err(TelemetryError::DivisionDegenerate { .. })),
                "{min}..{max} accepted"
            );
        }
    }
    #[test]
    fn wide_finite_range_draws_in_bounds() {
        let spec =
            ChannelSpec::new(ChannelConfig::new("p", "P", -5.0e37, 5.0e37, " bar", 2)).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let v = spec.random_value(&mut rng);
            assert!(v >= spec.min() && v <= spec.max());
        }
    }
    #[test]
    fn rejects_duplicate_ids() {
        let config = DEFAULT_CHANNELS[0].clone();
        let err = ChannelRegistry::from_configs(vec![config.clone(), config]).unwrap_err();
        assert!(matches!(err, TelemetryError::DuplicateChannel(id) if id == "sensor-p1"));
    }
    #[test]
    fn lookup_fails_closed() {
        let registry = ChannelRegistry::with_defaults().unwrap();
        assert!(matches!(
            registry.lookup("sensor-x9"),
            Err(TelemetryError::UnknownChannel(_))
        ));
    }
    #[test]
    fn non_chartable_channels_are_not_selectable() {
        let mut hidden = DEFAULT_CHANNELS[1].clone();
        hidden.chartable = false;
        let registry =
            ChannelRegistry::from_configs(vec![DEFAULT_CHANNELS[0].clone(), hidden]).unwrap();
        assert!(registry.lookup("sensor-p2").is_ok());
        assert!(registry.selectable("sensor-p2").is_err());
        assert_eq!(registry.selectable_series().count(), 1);
    }
    #[test]
    fn normalize_hits_range_ends() {
        let spec = ChannelSpec::new(ChannelConfig::new("p", "P", 0.0, 1.4, " bar", 2)).unwrap();
        assert_eq!(spec.normalize(0.0), 0.0);
        assert_eq!(spec.normalize(1.4), 1.0);
        assert!((spec.normalize(0.7) - 0.5).abs() < 1e-6);
    }
    #[test]
    fn readout_formatting_matches_dashboard() {
        let registry = ChannelRegistry::with_defaults().unwrap();
        let p1 = registry.spec(registry.lookup("sensor-p1").unwrap());
        assert_eq!(p1.format_readout(0.734), "P1 0.73 bar");
        let t2 = registry.spec(registry.lookup("sensor-t2").unwrap());
        assert_eq!(t2.format_readout(21.06), "T2 21.1℃");
        let flow = registry.spec(registry.lookup("sensor-flow1").unwrap());
        assert_eq!(flow.format_readout(0.5), "0.50 g/s");
        assert_eq!(flow.display_name(), "sensor-flow1");
    }
    #[test]
    fn random_value_stays_in_bounds() {
        let registry = ChannelRegistry::with_defaults().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for (_, spec) in registry.iter() {
            for _ in 0..200 {
                let v = spec.random_value(&mut rng);
                assert!(v >= spec.min() && v <= spec.max());
            }
        }
    }
}
