use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;
use rustfft::{num_complex::Complex32, Fft, FftPlanner};
use serde::{Deserialize, Serialize};
/// Magnitude bins kept from each transform.
pub const SPECTRUM_BINS: usize = 48;
/// Display gain applied after the 1/N normalization.
const MAGNITUDE_GAIN: f32 = 3.0;
/// Clamped, display-ready magnitude spectrum. Every value lies in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrum {
    pub magnitudes: Vec<f32>,
}
impl Spectrum {
    pub fn silent(bins: usize) -> Self {
        Self {
            magnitudes: vec![0.0; bins],
        }
    }
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }
}
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectralMethod {
    /// Direct O(K·N) summation.
    #[default]
    Direct,
    /// rustfft; identical bins and scaling.
    Fast,
}
/// Computes magnitude spectra for a fixed window length.
pub struct SpectrumAnalyzer {
    window_len: usize,
    bins: usize,
    method: SpectralMethod,
    // Row-major [bin][sample] twiddle tables for the direct transform.
    cos_table: Vec<f32>,
    sin_table: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}
impl fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("window_len", &self.window_len)
            .field("bins", &self.bins)
            .field("method", &self.method)
            .finish()
    }
}
impl SpectrumAnalyzer {
    pub fn new(window_len: usize, bins: usize, method: SpectralMethod) -> Self {
        let mut cos_table = Vec::with_capacity(bins * window_len);
        let mut sin_table = Vec::with_capacity(bins * window_len);
        for k in 0..bins {
            for n in 0..window_len {
                let angle = TAU * (k * n) as f64 / window_len as f64;
                cos_table.push(angle.cos() as f32);
                sin_table.push(angle.sin() as f32);
            }
        }
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(window_len);
        Self {
            window_len,
            bins,
            method,
            cos_table,
            sin_table,
            fft,
        }
    }
    pub fn analyze(&self, signal: &[f32]) -> Spectrum {
        match self.method {
            SpectralMethod::Direct => self.analyze_direct(signal),
            SpectralMethod::Fast => self.analyze_fast(signal),
        }
    }
    fn analyze_direct(&self, signal: &[f32]) -> Spectrum {
        let n = self.window_len;
        let magnitudes = (0..self.bins)
            .map(|k| {
                let cos_row = &self.cos_table[k * n..(k + 1) * n];
                let sin_row = &self.sin_table[k * n..(k + 1) * n];
                let mut real = 0.0f32;
                let mut imag = 0.0f32;
                for ((&s, &c), &si) in signal.iter().take(n).zip(cos_row).zip(sin_row) {
                    real += s * c;
                    imag -= s * si;
                }
                scale_magnitude((real * real + imag * imag).sqrt(), n)
            })
            .collect();
        Spectrum { magnitudes }
    }
    fn analyze_fast(&self, signal: &[f32]) -> Spectrum {
        let mut buffer: Vec<Complex32> = signal
            .iter()
            .copied()
            .take(self.window_len)
            .map(|v| Complex32::new(v, 0.0))
            .collect();
        buffer.resize(self.window_len, Complex32::new(0.0, 0.0));
        self.fft.process(&mut buffer);
        // Bins beyond the window length have no source data and read as zero.
        let magnitudes = (0..self.bins)
            .map(|k| {
                buffer
                    .get(k)
                    .map(|c| scale_magnitude(c.norm(), self.window_len))
                    .unwrap_or(0.0)
            })
            .collect();
        Spectrum { magnitudes }
    }
}
fn scale_magnitude(norm: f32, window_len: usize) -> f32 {
    (norm / window_len as f32 * MAGNITUDE_GAIN).clamp(0.0, 1.0)
}
