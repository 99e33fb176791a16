use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::signal::source::{ReadingSource, Readings};
use crate::signal::{ChannelId, ChannelRegistry, ChannelSpec, TelemetryError};
/// Current scalar state of one channel. Always within the channel bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelReading {
    pub value: f32,
}
impl ChannelReading {
    /// First reading of a channel: uniform over `[min, max]`.
    pub fn initial<R: Rng + ?Sized>(spec: &ChannelSpec, rng: &mut R) -> Self {
        Self {
            value: spec.random_value(rng),
        }
    }
}
/// One random-walk step: add a delta drawn from `[-drift, +drift]`, then clamp to the channel bounds.
pub fn advance<R: Rng + ?Sized>(
    reading: ChannelReading,
    spec: &ChannelSpec,
    drift: f32,
    rng: &mut R,
) -> ChannelReading {
    let delta = if drift > 0.0 {
        rng.gen_range(-drift..=drift)
    } else {
        0.0
    };
    ChannelReading {
        value: spec.clamp(reading.value + delta),
    }
}
/// Bounded random-walk simulator covering every channel in the registry.
pub struct ReadingSimulator {
    registry: ChannelRegistry,
    readings: Vec<(ChannelId, ChannelReading)>,
    drift: f32,
    rng: StdRng,
}
impl ReadingSimulator {
    pub fn new(registry: ChannelRegistry, drift: f32, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let readings = registry
            .iter()
            .map(|(id, spec)| (id, ChannelReading::initial(spec, &mut rng)))
            .collect();
        Self {
            registry,
            readings,
            drift,
            rng,
        }
    }
    /// Advances every channel independently by one tick.
    pub fn step(&mut self) {
        for (id, reading) in &mut self.readings {
            let spec = self.registry.spec(*id);
            *reading = advance(*reading, spec, self.drift, &mut self.rng);
        }
    }
    pub fn reading(&self, channel: ChannelId) -> Option<ChannelReading> {
        self.readings
            .iter()
            .find(|(id, _)| *id == channel)
            .map(|(_, reading)| *reading)
    }
    pub fn snapshot(&self) -> Readings {
        self.readings
            .iter()
            .map(|(id, reading)| (*id, reading.value))
            .collect()
    }
}
impl ReadingSource for ReadingSimulator {
    fn next_readings(&mut self) -> Result<Option<Readings>, TelemetryError> {
        self.step();
        Ok(Some(self.snapshot()))
    }
}
