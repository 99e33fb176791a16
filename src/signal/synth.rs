//! Synthetic three-harmonic waveform derived from a scalar reading.
//!
//! The waveform is a visual proxy for signal energy: its fundamental frequency and
//! amplitude track where the reading sits inside the channel range, and `phase_tick`
//! makes it drift between ticks.
use std::f64::consts::TAU;
use crate::signal::ChannelSpec;
/// Samples per synthesized waveform.
pub const SIGNAL_LEN: usize = 96;
const BASE_FREQ: f64 = 1.2;
const FREQ_SPAN: f64 = 3.2;
const BASE_AMPLITUDE: f64 = 0.4;
const AMPLITUDE_SPAN: f64 = 0.45;
const PHASE_STEP: f64 = 0.2;
/// (frequency multiple, amplitude, phase multiple) of the two overtones.
const OVERTONES: [(f64, f64, f64); 2] = [(2.1, 0.18, 0.7), (3.3, 0.08, 1.3)];
pub fn synthesize(raw: f32, spec: &ChannelSpec, phase_tick: u64) -> Vec<f32> {
    synthesize_normalized(spec.normalize(raw), phase_tick, SIGNAL_LEN)
}
/// Same as [`synthesize`] for an already normalized reading and arbitrary length.
pub fn synthesize_normalized(normalized: f32, phase_tick: u64, len: usize) -> Vec<f32> {
    let normalized = normalized as f64;
    let freq = BASE_FREQ + normalized * FREQ_SPAN;
    let amplitude = BASE_AMPLITUDE + normalized * AMPLITUDE_SPAN;
    let phase = phase_tick as f64 * PHASE_STEP;
    (0..len)
        .map(|i| {
            let t = i as f64 / len as f64;
            let mut s = amplitude * (TAU * freq * t + phase).sin();
            for (mult, amp, phase_mult) in OVERTONES {
                s += amp * (TAU * mult * freq * t + phase_mult * phase).sin();
            }
            s.clamp(-1.0, 1.0) as f32
        })
        .collect()
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::ChannelRegistry;
    #[test]
    fn waveform_has_fixed_length_and_range() {
        let registry = ChannelRegistry::with_defaults().unwrap();
        for (_, spec) in registry.iter() {
            for tick in [0, 1, 17, 10_000] {
                for raw in [spec.min(), spec.max(), (spec.min() + spec.max()) / 2.0] {
                    let wave = synthesize(raw, spec, tick);
                    assert_eq!(wave.len(), SIGNAL_LEN);
                    assert!(wave.iter().all(|s| (-1.0..=1.0).contains(s)));
                }
            }
        }
    }
    #[test]
    fn first_sample_follows_phase_offsets() {
        // At t = 0 only the phase terms contribute.
        let wave = synthesize_normalized(0.0, 5, SIGNAL_LEN);
        let phase = 5.0 * PHASE_STEP;
        let expected = 0.4 * phase.sin() + 0.18 * (0.7 * phase).sin() + 0.08 * (1.3 * phase).sin();
        assert!((wave[0] as f64 - expected).abs() < 1e-6);
    }
    #[test]
    fn clamps_when_harmonics_stack_up() {
        // Full-scale amplitude plus overtones can exceed 1.0 before clamping.
        let peak = (0..200)
            .flat_map(|tick| synthesize_normalized(1.0, tick, SIGNAL_LEN))
            .fold(0.0f32, |acc, v| acc.max(v.abs()));
        assert!(peak <= 1.0);
    }
    #[test]
    fn phase_tick_changes_the_waveform() {
        let a = synthesize_normalized(0.5, 1, SIGNAL_LEN);
        let b = synthesize_normalized(0.5, 2, SIGNAL_LEN);
        assert_ne!(a, b);
    }
}
