use crate::signal::pipeline::RenderFrame;
use crate::signal::source::Readings;
use crate::signal::{ChannelRegistry, TelemetryError};
/// One line of the live numeric readout panel.
#[derive(Clone, Debug, PartialEq)]
pub struct Readout {
    pub id: String,
    pub text: String,
}
/// Formats every channel present in `readings`, in registry order.
pub fn readouts(registry: &ChannelRegistry, readings: &Readings) -> Vec<Readout> {
    registry
        .iter()
        .filter_map(|(id, spec)| {
            readings.get(&id).map(|value| Readout {
                id: spec.id().to_owned(),
                text: spec.format_readout(*value),
            })
        })
        .collect()
}
/// Rendering boundary. Implementations only read what they are given.
pub trait RenderSink {
    fn present(&mut self, frame: &RenderFrame) -> Result<(), TelemetryError>;
    fn readouts(&mut self, _readouts: &[Readout]) -> Result<(), TelemetryError> {
        Ok(())
    }
}
