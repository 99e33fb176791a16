use std::collections::HashMap;
#[cfg(test)]
use std::collections::VecDeque;
use crate::signal::{ChannelId, ChannelSpec, TelemetryError};
/// Latest scalar per channel, as handed to the chart pipeline.
pub type Readings = HashMap<ChannelId, f32>;
/// Fetches the current reading for `channel`, failing with `MissingReading` when absent.
pub fn reading_for(
    readings: &Readings,
    channel: ChannelId,
    spec: &ChannelSpec,
) -> Result<f32, TelemetryError> {
    readings
        .get(&channel)
        .copied()
        .ok_or_else(|| TelemetryError::MissingReading(spec.id().to_owned()))
}
/// Trait representing something that can yield reading snapshots on demand.
pub trait ReadingSource {
    fn next_readings(&mut self) -> Result<Option<Readings>, TelemetryError>;
}
/// In-memory source that replays fixed snapshots, for deterministic engine runs.
#[cfg(test)]
pub struct ManualSource {
    queue: VecDeque<Readings>,
}
#[cfg(test)]
impl ManualSource {
    pub fn new(snapshots: impl IntoIterator<Item = Readings>) -> Self {
        Self {
            queue: snapshots.into_iter().collect(),
        }
    }
}
#[cfg(test)]
impl ReadingSource for ManualSource {
    fn next_readings(&mut self) -> Result<Option<Readings>, TelemetryError> {
        Ok(self.queue.pop_front())
    }
}
