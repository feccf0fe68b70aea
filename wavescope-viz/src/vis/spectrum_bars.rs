//! Banded spectrum analyzer with decaying bars and peak markers

use crate::block::{AudioBlock, SourceFormat};
use crate::surface::{mix, Color, DARK_GREEN, GREEN, RED, YELLOW};
use crate::visualization::{VisualBase, Visualization};
use wavescope_analysis::SpectrumProcessor;

const BAND_COUNT: usize = 32;
const PEAK_DELAY: i32 = 25;
const DECAY: f32 = 0.02;
const GAIN: f32 = 0.001;
const LINEAR_BIN_GAIN: f32 = 2.0;
const MAX_WINDOW_LENGTH: usize = 2048;

/// One displayed band: the FFT bins `[previous top, top_bin)` reduced to
/// their loudest member.
struct Band {
    top_bin: usize,
}

/// Upper frequency edge of each bin, `(bin + 1) · bin_width`.
fn frequency_table(bin_count: usize, sample_rate: f32) -> Vec<f32> {
    let bin_width = sample_rate / 2.0 / bin_count as f32;
    (0..bin_count).map(|bin| (bin + 1) as f32 * bin_width).collect()
}

/// Logarithmic band layout: a subsonic group for the lowest bins, then
/// log-spaced groups across the rest of the spectrum.
fn log_band_distribution(band_count: usize, bin_count: usize) -> Vec<Band> {
    let sso = 2usize; // log scale offset, bins lumped into the subsonic group
    let lso = 20.0f64; // subsonic offset into the log curve

    let hss = bin_count - sso;
    let o = lso.ln();
    let r = (band_count - 1) as f64 / ((hss as f64 + lso).ln() - o);

    let mut bands = vec![Band { top_bin: sso }];
    let mut last_band = 1i64;
    for b in 0..hss {
        let current = ((b as f64 + lso).ln() - o) * r + 1.0;
        if current.round() as i64 != last_band {
            bands.push(Band { top_bin: b + sso });
            last_band = current.round() as i64;
        }
    }
    if bands.len() < band_count {
        bands.push(Band {
            top_bin: hss - 1 + sso,
        });
    }
    bands
}

/// Per-bin gain rising linearly with frequency, compensating the natural
/// high-frequency roll-off of music.
fn linear_bin_gain_table(bin_count: usize, sample_rate: f32) -> Vec<f32> {
    frequency_table(bin_count, sample_rate)
        .iter()
        .map(|freq| ((freq / LINEAR_BIN_GAIN + 512.0) / 512.0) * (LINEAR_BIN_GAIN * 1.5))
        .collect()
}

/// Bar fill color at the given vertical fraction (0 = top of the frame).
fn gradient_color(t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    if t < 0.25 {
        mix(RED, YELLOW, t / 0.25)
    } else if t < 0.75 {
        mix(YELLOW, GREEN, (t - 0.25) / 0.5)
    } else {
        mix(GREEN, DARK_GREEN, (t - 0.75) / 0.25)
    }
}

pub struct SpectrumBars {
    base: VisualBase,
    processor: SpectrumProcessor,
    window_length: usize,
    bands: Vec<Band>,
    bin_gain: Vec<f32>,
    old_band_mags: Vec<f32>,
    peaks: Vec<i32>,
    peaks_delay: Vec<i32>,
}

impl SpectrumBars {
    pub fn new() -> Self {
        Self {
            base: VisualBase::new(),
            processor: SpectrumProcessor::new(MAX_WINDOW_LENGTH),
            window_length: MAX_WINDOW_LENGTH,
            bands: Vec::new(),
            bin_gain: Vec::new(),
            old_band_mags: Vec::new(),
            peaks: Vec::new(),
            peaks_delay: Vec::new(),
        }
    }
}

impl Default for SpectrumBars {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for SpectrumBars {
    fn display_name(&self) -> &'static str {
        "Spectrum Bars"
    }

    fn init(&mut self, block_length: usize, format: &SourceFormat) {
        self.window_length = block_length.min(MAX_WINDOW_LENGTH);
        self.processor.calculate_window_coefficients(self.window_length);

        let bin_count = self.window_length / 2;
        self.bands = log_band_distribution(BAND_COUNT, bin_count);
        self.bin_gain = linear_bin_gain_table(bin_count, format.sample_rate);
        self.old_band_mags = vec![0.0; self.bands.len()];
        self.peaks = vec![0; self.bands.len()];
        self.peaks_delay = vec![0; self.bands.len()];
    }

    fn render(&mut self, block: &AudioBlock, width: u32, height: u32) {
        let mut samples = block.average_channels();
        samples.truncate(self.window_length);
        self.processor.apply_window(self.window_length, &mut samples);
        let bin_values = self.processor.compute_fft(&samples);

        let mut surface = self.base.take_surface(width, height);
        surface.fill(self.base.background());

        let band_width = width as f32 / self.bands.len() as f32;
        let y_base = height as i32 - 18;
        let max_bar = (height as i32 - 20).max(1);

        let mut bottom_bin = 0usize;
        let mut x = 0.0f32;
        for (band_num, band) in self.bands.iter().enumerate() {
            // Loudest bin in the group, boosted by its frequency gain.
            let mut loudest = 0.0f32;
            let mut loudest_bin = 0usize;
            for bin in bottom_bin..band.top_bin.min(bin_values.len()) {
                if bin_values[bin] > loudest {
                    loudest = bin_values[bin];
                    loudest_bin = bin;
                }
            }
            bottom_bin = band.top_bin;

            let mut band_mag = (loudest * self.bin_gain[loudest_bin] * GAIN).min(1.0);

            // Fast attack, fixed-rate decay.
            if band_mag >= self.old_band_mags[band_num] - DECAY {
                self.old_band_mags[band_num] = band_mag;
            } else {
                self.old_band_mags[band_num] = (self.old_band_mags[band_num] - DECAY).max(0.0);
                band_mag = self.old_band_mags[band_num];
            }

            let bar_x = x.round() as i32;
            let bar_w = (band_width.round() as i32 - 1).max(1);
            let bar_h = (band_mag * max_bar as f32).round() as i32;

            for row in 0..bar_h {
                let y = y_base - bar_h + row;
                surface.hline(
                    bar_x,
                    bar_x + bar_w - 1,
                    y,
                    gradient_color(y as f32 / height as f32),
                );
            }

            // Falling peak marker.
            if bar_h > self.peaks[band_num] {
                self.peaks[band_num] = bar_h;
                self.peaks_delay[band_num] = PEAK_DELAY;
            } else {
                self.peaks_delay[band_num] -= 1;
                if self.peaks_delay[band_num] < 0 {
                    self.peaks[band_num] -= 1;
                }
                if self.peaks[band_num] < 0 {
                    self.peaks[band_num] = 0;
                }
            }
            surface.hline(
                bar_x,
                bar_x + bar_w - 1,
                y_base - self.peaks[band_num],
                self.base.foreground(),
            );

            x += band_width;
        }

        self.base.store_surface(surface);
    }

    fn base(&self) -> &VisualBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut VisualBase {
        &mut self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::DEFAULT_BLOCK_LENGTH;

    #[test]
    fn test_log_distribution_covers_all_bins_in_order() {
        let bands = log_band_distribution(BAND_COUNT, 1024);
        assert!(bands.len() >= BAND_COUNT - 1);
        assert_eq!(bands[0].top_bin, 2);
        for pair in bands.windows(2) {
            assert!(pair[0].top_bin < pair[1].top_bin);
        }
        assert_eq!(bands.last().unwrap().top_bin, 1023);
    }

    #[test]
    fn test_linear_bin_gain_rises_with_frequency() {
        let gains = linear_bin_gain_table(1024, 44100.0);
        assert!(gains[0] < gains[512]);
        assert!(gains[512] < gains[1023]);
        // Lowest bin: ((21.53/2 + 512) / 512) * 3 ≈ 3.06
        assert!((gains[0] - 3.063).abs() < 0.01);
    }

    #[test]
    fn test_gradient_stops() {
        assert_eq!(gradient_color(0.0), RED);
        assert_eq!(gradient_color(0.25), YELLOW);
        assert_eq!(gradient_color(0.75), GREEN);
        assert_eq!(gradient_color(1.0), DARK_GREEN);
    }

    #[test]
    fn test_decay_limits_fall_rate() {
        let mut vis = SpectrumBars::new();
        vis.init(DEFAULT_BLOCK_LENGTH, &SourceFormat::default());

        let mut block = AudioBlock::default();
        for i in 0..block.len() {
            block.left[i] = (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin();
            block.right[i] = block.left[i];
        }
        vis.render(&block, 320, 200);
        let after_tone: Vec<f32> = vis.old_band_mags.clone();
        assert!(after_tone.iter().any(|&m| m > 0.0));

        vis.render(&AudioBlock::default(), 320, 200);
        for (new, old) in vis.old_band_mags.iter().zip(&after_tone) {
            assert!(old - new <= DECAY + 1e-6);
        }
    }
}
