// src/signal/mod.rs
// Simulated telemetry analysis pipeline: registry -> simulator -> synth -> fft -> buffers.
pub mod buffer;
pub mod error;
pub mod fft;
pub mod pipeline;
pub mod plot;
pub mod registry;
pub mod simulator;
pub mod sink;
pub mod source;
pub mod synth;
pub use error::TelemetryError;
pub use fft::{SpectralMethod, Spectrum};
pub use pipeline::{DashboardState, RenderFrame};
pub use plot::{phase_portrait, PHASE_LAG};
pub use registry::{ChannelConfig, ChannelId, ChannelRegistry, ChannelSpec};
pub use simulator::ReadingSimulator;
pub use sink::{Readout, RenderSink};
#[cfg(test)]
pub use source::ManualSource;
pub use source::{ReadingSource, Readings};
