use log::{debug, info, trace};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use crate::signal::buffer::{columns_to_grid, SpectrogramBuffer, TrendBuffer};
use crate::signal::fft::{SpectralMethod, Spectrum, SpectrumAnalyzer, SPECTRUM_BINS};
use crate::signal::source::{reading_for, Readings};
use crate::signal::synth::{synthesize, SIGNAL_LEN};
use crate::signal::{ChannelId, ChannelRegistry, TelemetryError};
/// Everything a renderer needs to draw the four views for one tick.
///
/// Trend and spectrum values are in `[0, 1]`, signal samples in `[-1, 1]`, and
/// spectrogram columns are oldest first.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderFrame {
    pub channel: String,
    pub trend: Vec<f32>,
    pub signal: Vec<f32>,
    pub spectrum: Vec<f32>,
    pub spectrogram: Vec<Vec<f32>>,
    pub latest_raw: f32,
    pub phase_tick: u64,
}
impl RenderFrame {
    /// Spectrogram as a `rows x columns` grid.
    pub fn spectrogram_grid(&self) -> Array2<f32> {
        let rows = self.spectrogram.first().map(|c| c.len()).unwrap_or(0);
        columns_to_grid(&self.spectrogram, rows)
    }
}
/// Chart session state for the selected channel. Owned by whoever drives ticks.
pub struct DashboardState {
    registry: ChannelRegistry,
    selected: ChannelId,
    trend: TrendBuffer,
    phase_tick: u64,
    signal: Vec<f32>,
    spectrum: Spectrum,
    spectrogram: SpectrogramBuffer,
    analyzer: SpectrumAnalyzer,
    latest_raw: f32,
    rng: StdRng,
}
impl DashboardState {
    pub fn new(
        registry: ChannelRegistry,
        default_channel: &str,
        method: SpectralMethod,
        seed: Option<u64>,
    ) -> Result<Self, TelemetryError> {
        let selected = registry.selectable(default_channel)?;
        let latest_raw = registry.spec(selected).min();
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            registry,
            selected,
            trend: TrendBuffer::default(),
            phase_tick: 0,
            signal: vec![0.0; SIGNAL_LEN],
            spectrum: Spectrum::silent(SPECTRUM_BINS),
            spectrogram: SpectrogramBuffer::default(),
            analyzer: SpectrumAnalyzer::new(SIGNAL_LEN, SPECTRUM_BINS, method),
            latest_raw,
            rng,
        })
    }
    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }
    pub fn phase_tick(&self) -> u64 {
        self.phase_tick
    }
    #[cfg(test)]
    pub fn spectrogram(&self) -> &SpectrogramBuffer {
        &self.spectrogram
    }
    /// Runs one pipeline pass for the selected channel and returns the resulting frame.
    pub fn on_tick(&mut self, readings: &Readings) -> RenderFrame {
        let spec = self.registry.spec(self.selected);
        let raw = match reading_for(readings, self.selected, spec) {
            Ok(raw) => raw,
            Err(err) => {
                let substitute = spec.random_value(&mut self.rng);
                debug!("{err}; substituting {substitute}");
                substitute
            }
        };
        self.trend.push(spec.normalize(raw).clamp(0.0, 1.0));
        self.phase_tick += 1;
        self.signal = synthesize(raw, spec, self.phase_tick);
        self.spectrum = self.analyzer.analyze(&self.signal);
        self.spectrogram.push_column(&self.spectrum);
        self.latest_raw = raw;
        trace!(
            "tick {} on {}: raw {raw}, {} spectrogram columns",
            self.phase_tick,
            spec.id(),
            self.spectrogram.len()
        );
        self.frame()
    }
    /// Switches the charted channel, zeroes the trend and recomputes immediately.
    ///
    /// Unknown ids leave the session untouched.
    pub fn on_select_channel(
        &mut self,
        id: &str,
        readings: &Readings,
    ) -> Result<RenderFrame, TelemetryError> {
        let channel = self.registry.selectable(id)?;
        info!("chart channel -> {id}");
        self.selected = channel;
        self.trend.reset();
        Ok(self.on_tick(readings))
    }
    pub fn frame(&self) -> RenderFrame {
        RenderFrame {
            channel: self.registry.spec(self.selected).id().to_owned(),
            trend: self.trend.to_vec(),
            signal: self.signal.clone(),
            spectrum: self.spectrum.magnitudes.clone(),
            spectrogram: self.spectrogram.to_columns(),
            latest_raw: self.latest_raw,
            phase_tick: self.phase_tick,
        }
    }
}
