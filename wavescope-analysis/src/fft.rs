//! Windowed FFT pipeline shared by the spectrum renderers
//!
//! A `SpectrumProcessor` owns a Hamming coefficient table and a planned FFT
//! of the same length. Renderers feed it one block of mono samples per tick
//! and get back a half-length array of scaled bin magnitudes.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;
use tracing::trace;

const ONE_OVER_LN_10: f64 = 1.0 / std::f64::consts::LN_10;

/// Numeric semantics applied when merging FFT re/im pairs into magnitudes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MagnitudeScale {
    /// `sqrt(re² + im²)`
    Amplitude,
    /// `(re² + im²) / 100`
    Power,
    /// `10·ln(1 + (re² + im²)/ln 10)`
    ///
    /// Not the textbook dB formula. The renderer gain and slope constants
    /// are tuned against its ~0-96 output range, so it stays as-is.
    #[default]
    Decibel,
}

/// Merge interleaved re/im pairs into `interleaved.len()/2` magnitudes
/// under the selected scale.
pub fn apply_selected_scale(scale: MagnitudeScale, interleaved: &[f32]) -> Vec<f32> {
    let length = interleaved.len() / 2;
    let mut scaled = vec![0.0f32; length];
    for (k, out) in scaled.iter_mut().enumerate() {
        let re = interleaved[2 * k];
        let im = interleaved[2 * k + 1];
        let power = re * re + im * im;
        *out = match scale {
            MagnitudeScale::Amplitude => power.sqrt(),
            MagnitudeScale::Power => power / 100.0,
            MagnitudeScale::Decibel => {
                (10.0 * (1.0 + power as f64 * ONE_OVER_LN_10).ln()) as f32
            }
        };
    }
    scaled
}

/// Rescale so the maximum input value maps to 1.0, clamping to [0, 1].
///
/// An all-zero input divides by zero and propagates non-finite values; the
/// renderers treat that as a one-frame glitch, not an error.
pub fn apply_max_over_line_normalization(bins: &[f32]) -> Vec<f32> {
    let mut max = 0.0f32;
    for &v in bins {
        if v > max {
            max = v;
        }
    }
    if max == 0.0 {
        trace!("normalizing an all-zero line");
    }
    let norm = 1.0 / max;
    bins.iter().map(|&v| (norm * v).clamp(0.0, 1.0)).collect()
}

/// Real FFT of a fixed window length with Hamming windowing and magnitude
/// scaling.
pub struct SpectrumProcessor {
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    fft_buffer: Vec<Complex<f32>>,
    interleaved: Vec<f32>,
    scale: MagnitudeScale,
}

impl SpectrumProcessor {
    pub fn new(window_length: usize) -> Self {
        let mut planner = FftPlanner::new();
        let mut processor = Self {
            window: Vec::new(),
            fft: planner.plan_fft_forward(window_length),
            fft_buffer: vec![Complex::new(0.0, 0.0); window_length],
            interleaved: vec![0.0; window_length],
            scale: MagnitudeScale::default(),
        };
        processor.calculate_window_coefficients(window_length);
        processor
    }

    /// (Re)compute the Hamming coefficient table
    /// `0.54 - 0.46·cos(2π·k/length)` and re-plan the FFT to match.
    ///
    /// No-op when a table of the requested length already exists.
    pub fn calculate_window_coefficients(&mut self, length: usize) {
        if self.window.len() == length {
            return;
        }
        self.window = (0..length)
            .map(|k| 0.54 - 0.46 * (2.0 * PI * k as f32 / length as f32).cos())
            .collect();
        let mut planner = FftPlanner::new();
        self.fft = planner.plan_fft_forward(length);
        self.fft_buffer = vec![Complex::new(0.0, 0.0); length];
        self.interleaved = vec![0.0; length];
    }

    pub fn window_length(&self) -> usize {
        self.window.len()
    }

    pub fn window_coefficients(&self) -> &[f32] {
        &self.window
    }

    pub fn set_scale(&mut self, scale: MagnitudeScale) {
        self.scale = scale;
    }

    /// Multiply the first `length` samples in place by the coefficient
    /// table. The table must already cover `length`.
    pub fn apply_window(&self, length: usize, samples: &mut [f32]) {
        for (sample, coefficient) in samples[..length].iter_mut().zip(&self.window) {
            *sample *= coefficient;
        }
    }

    /// Transform the first `window_length` samples and return the scaled
    /// magnitudes of the lower half of the spectrum
    /// (`window_length/2` values).
    pub fn compute_fft(&mut self, samples: &[f32]) -> Vec<f32> {
        let length = self.window.len();
        for (slot, &sample) in self.fft_buffer.iter_mut().zip(&samples[..length]) {
            *slot = Complex::new(sample, 0.0);
        }
        self.fft.process(&mut self.fft_buffer);

        // Pack the lower half of the spectrum as re/im pairs, then merge
        // the pairs under the selected scale.
        for k in 0..length / 2 {
            self.interleaved[2 * k] = self.fft_buffer[k].re;
            self.interleaved[2 * k + 1] = self.fft_buffer[k].im;
        }
        apply_selected_scale(self.scale, &self.interleaved)
    }
}
