//! Scrolling note display
//!
//! Whitened spectrum folded onto a musical scale: eight octaves of
//! twelve notes, nine sub-bands per note, from A1 at 55 Hz. Detected
//! peaks overlay the column in red, so sustained notes leave horizontal
//! streaks at their pitch.

use crate::block::{AudioBlock, SourceFormat, DEFAULT_BLOCK_LENGTH};
use crate::surface::{mix, RED};
use crate::visualization::{VisualBase, Visualization};
use wavescope_analysis::{BinToBandMap, NoteBands, SpectrumProcessor, Whitener};

const GAIN: f32 = 0.0;
const SLOPE: f32 = 0.00005;
const OCTAVE_COUNT: usize = 8;
const NOTES_PER_OCTAVE: usize = 12;
const BANDS_PER_NOTE: usize = 9;
const PEAK_THRESHOLD: f32 = 10.0;

pub struct PianoRoll {
    base: VisualBase,
    processor: SpectrumProcessor,
    whitener: Whitener,
    window_length: usize,
    band_count: usize,
    top_bins: Vec<usize>,
    mean_values: Vec<f32>,
    white_bin_values: Vec<f32>,
    peak_bin_values: Vec<f32>,
}

impl PianoRoll {
    pub fn new() -> Self {
        let window_length = DEFAULT_BLOCK_LENGTH;
        Self {
            base: VisualBase::new(),
            processor: SpectrumProcessor::new(window_length),
            whitener: Whitener::new(window_length / 2),
            window_length,
            band_count: 0,
            top_bins: Vec::new(),
            mean_values: Vec::new(),
            white_bin_values: Vec::new(),
            peak_bin_values: Vec::new(),
        }
    }
}

impl Default for PianoRoll {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for PianoRoll {
    fn display_name(&self) -> &'static str {
        "Piano Roll"
    }

    fn init(&mut self, block_length: usize, format: &SourceFormat) {
        self.window_length = block_length;
        self.processor.calculate_window_coefficients(self.window_length);

        let bin_count = self.window_length / 2;
        self.whitener = Whitener::new(bin_count);
        self.mean_values = vec![0.0; bin_count];
        self.white_bin_values = vec![0.0; bin_count];
        self.peak_bin_values = vec![0.0; bin_count];

        // One extra band per note group keeps the top octave closed.
        self.band_count = OCTAVE_COUNT * NOTES_PER_OCTAVE * BANDS_PER_NOTE + BANDS_PER_NOTE;
        let map = NoteBands::new(NOTES_PER_OCTAVE as u32, BANDS_PER_NOTE as u32);
        self.top_bins =
            map.create_top_bin_num_array(bin_count, format.sample_rate / 2.0, self.band_count);
    }

    fn render(&mut self, block: &AudioBlock, width: u32, height: u32) {
        let mut samples = block.average_channels();
        samples.truncate(self.window_length);
        self.processor.apply_window(self.window_length, &mut samples);
        let bin_values = self.processor.compute_fft(&samples);

        self.whitener
            .whiten(&bin_values, &mut self.mean_values, &mut self.white_bin_values);
        self.whitener
            .pick_peaks(&self.white_bin_values, &mut self.peak_bin_values);

        let mut surface = self.base.take_surface(width, height);
        surface.scroll_left();

        let last = width as i32 - 1;
        let band_height = height as f32 / self.band_count as f32;
        let background = self.base.background();
        let foreground = self.base.foreground();

        let mut bottom_bin = 0usize;
        let mut y = height as f32;
        for (band_num, &top_bin) in self.top_bins.iter().enumerate() {
            let top_bin = top_bin.min(self.white_bin_values.len() - 1);
            let mut loudest = 0.0f32;
            for bin_num in bottom_bin..=top_bin {
                if self.white_bin_values[bin_num] > loudest {
                    loudest = self.white_bin_values[bin_num];
                }
            }
            bottom_bin = top_bin;

            let band_value = (loudest * (GAIN + SLOPE * band_num as f32)).clamp(0.0, 1.0);
            let top = (y - band_height).round() as i32;
            surface.vline(last, y.round() as i32, top, background);
            surface.vline(last, y.round() as i32, top, mix(background, foreground, band_value));

            // A peak just above the band's top bin marks a played note.
            let peak_bin = top_bin + 1;
            if peak_bin < self.peak_bin_values.len()
                && self.peak_bin_values[peak_bin] > PEAK_THRESHOLD
            {
                surface.vline(last, y.round() as i32, top, RED);
            }

            y -= band_height;
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
