//! Line-spectrum renderers, plain and whitened
//!
//! The Full variants analyze a 2048-sample window and show every bin up
//! to Nyquist. The Quarter variants run the FFT over the whole 8192
//! sample block and show only the lowest quarter of the computed bins,
//! trading range for four times the frequency resolution. The White
//! variants draw the spectrum after two-pass split-window whitening, with
//! detected peaks marked along the top of the frame.

use crate::block::{AudioBlock, SourceFormat};
use crate::surface::{Color, Surface, ORANGE, RED, WHITE};
use crate::visualization::{VisualBase, Visualization};
use wavescope_analysis::{SpectrumProcessor, Whitener};

/// Magnitudes arrive on the dB scale, which tops out near 96.
const DB_RANGE: f32 = 96.0;
const FULL_WINDOW_LENGTH: usize = 2048;

/// Connect per-bin values left to right, one segment per bin, with
/// coordinates clamped into the frame.
fn polyline(
    surface: &mut Surface,
    width: u32,
    height: u32,
    bin_count: usize,
    color: Color,
    mut y_of: impl FnMut(usize) -> i32,
) {
    let bin_width = width as f32 / bin_count as f32;
    let (mut x_old, mut y_old) = (0, 0);
    for bin in 0..bin_count {
        let x = ((bin as f32 * bin_width) as i32).clamp(0, width as i32 - 1);
        let y = y_of(bin).clamp(0, height as i32 - 1);
        surface.draw_line(x_old, y_old, x, y, color);
        x_old = x;
        y_old = y;
    }
}

/// Full-range spectrum drawn as a single foreground line.
pub struct FullSpectrum {
    base: VisualBase,
    processor: SpectrumProcessor,
    window_length: usize,
}

impl FullSpectrum {
    pub fn new() -> Self {
        Self {
            base: VisualBase::new(),
            processor: SpectrumProcessor::new(FULL_WINDOW_LENGTH),
            window_length: FULL_WINDOW_LENGTH,
        }
    }
}

impl Default for FullSpectrum {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for FullSpectrum {
    fn display_name(&self) -> &'static str {
        "Full Spectrum"
    }

    fn init(&mut self, block_length: usize, _format: &SourceFormat) {
        self.window_length = block_length.min(FULL_WINDOW_LENGTH);
        self.processor.calculate_window_coefficients(self.window_length);
    }

    fn render(&mut self, block: &AudioBlock, width: u32, height: u32) {
        let mut samples = block.average_channels();
        samples.truncate(self.window_length);
        self.processor.apply_window(self.window_length, &mut samples);
        let bin_values = self.processor.compute_fft(&samples);

        let mut surface = self.base.take_surface(width, height);
        surface.fill(self.base.background());

        let bin_height = height as f32 / DB_RANGE;
        polyline(
            &mut surface,
            width,
            height,
            bin_values.len(),
            self.base.foreground(),
            |bin| height as i32 - (bin_height * bin_values[bin]) as i32,
        );

        self.base.store_surface(surface);
    }

    fn base(&self) -> &VisualBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut VisualBase {
        &mut self.base
    }
}

/// Lowest quarter of the spectrum at full block resolution.
pub struct QuarterSpectrum {
    base: VisualBase,
    processor: SpectrumProcessor,
    window_length: usize,
    bin_count: usize,
}

impl QuarterSpectrum {
    pub fn new() -> Self {
        Self {
            base: VisualBase::new(),
            processor: SpectrumProcessor::new(crate::block::DEFAULT_BLOCK_LENGTH),
            window_length: crate::block::DEFAULT_BLOCK_LENGTH,
            bin_count: crate::block::DEFAULT_BLOCK_LENGTH / 8,
        }
    }
}

impl Default for QuarterSpectrum {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for QuarterSpectrum {
    fn display_name(&self) -> &'static str {
        "Quarter Spectrum"
    }

    fn init(&mut self, block_length: usize, _format: &SourceFormat) {
        self.window_length = block_length;
        self.bin_count = block_length / 8;
        self.processor.calculate_window_coefficients(self.window_length);
    }

    fn render(&mut self, block: &AudioBlock, width: u32, height: u32) {
        let mut samples = block.average_channels();
        self.processor.apply_window(self.window_length, &mut samples);
        let bin_values = self.processor.compute_fft(&samples);

        let mut surface = self.base.take_surface(width, height);
        surface.fill(self.base.background());

        let bin_height = height as f32 / DB_RANGE;
        polyline(
            &mut surface,
            width,
            height,
            self.bin_count.min(bin_values.len()),
            self.base.foreground(),
            |bin| height as i32 - (bin_height * bin_values[bin]) as i32,
        );

        self.base.store_surface(surface);
    }

    fn base(&self) -> &VisualBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut VisualBase {
        &mut self.base
    }
}

/// Whitened full-range spectrum for side-by-side comparison with
/// [`FullSpectrum`]: the whitened line in red, picked peaks in white
/// along the top quarter of the frame.
pub struct WhiteFullSpectrum {
    base: VisualBase,
    processor: SpectrumProcessor,
    window_length: usize,
    whitener: Whitener,
    mean_values: Vec<f32>,
    white_bin_values: Vec<f32>,
    peak_bin_values: Vec<f32>,
    gain: f32,
    slope: f32,
}

impl WhiteFullSpectrum {
    pub fn new() -> Self {
        let bin_count = FULL_WINDOW_LENGTH / 2;
        Self {
            base: VisualBase::new(),
            processor: SpectrumProcessor::new(FULL_WINDOW_LENGTH),
            window_length: FULL_WINDOW_LENGTH,
            whitener: Whitener::new(bin_count),
            mean_values: vec![0.0; bin_count],
            white_bin_values: vec![0.0; bin_count],
            peak_bin_values: vec![0.0; bin_count],
            gain: 6.0,
            slope: 0.01,
        }
    }
}

impl Default for WhiteFullSpectrum {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for WhiteFullSpectrum {
    fn display_name(&self) -> &'static str {
        "White Full Spectrum"
    }

    fn init(&mut self, block_length: usize, _format: &SourceFormat) {
        self.window_length = block_length.min(FULL_WINDOW_LENGTH);
        self.processor.calculate_window_coefficients(self.window_length);
        let bin_count = self.window_length / 2;
        self.whitener = Whitener::new(bin_count);
        self.mean_values = vec![0.0; bin_count];
        self.white_bin_values = vec![0.0; bin_count];
        self.peak_bin_values = vec![0.0; bin_count];
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
        surface.fill(self.base.background());

        let bin_count = bin_values.len();
        let (gain, slope) = (self.gain, self.slope);
        let white = &self.white_bin_values;
        polyline(&mut surface, width, height, bin_count, RED, |bin| {
            height as i32 - ((gain + slope * bin as f32) * white[bin]) as i32
        });

        // Peaks draw downward from the top edge, confined to the top
        // quarter of the frame.
        let bin_height = height as f32 / DB_RANGE;
        let peaks = &self.peak_bin_values;
        polyline(&mut surface, width, height, bin_count, WHITE, |bin| {
            (bin_height / 2.0 * peaks[bin]) as i32
        });

        self.base.store_surface(surface);
    }

    fn base(&self) -> &VisualBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut VisualBase {
        &mut self.base
    }
}

/// Whitened sibling of [`QuarterSpectrum`]: whitened line in orange,
/// picked peaks in white.
pub struct WhiteQuarterSpectrum {
    base: VisualBase,
    processor: SpectrumProcessor,
    window_length: usize,
    bin_count: usize,
    whitener: Whitener,
    mean_values: Vec<f32>,
    white_bin_values: Vec<f32>,
    peak_bin_values: Vec<f32>,
    gain: f32,
    slope: f32,
}

impl WhiteQuarterSpectrum {
    pub fn new() -> Self {
        let block_length = crate::block::DEFAULT_BLOCK_LENGTH;
        let bin_count = block_length / 8;
        Self {
            base: VisualBase::new(),
            processor: SpectrumProcessor::new(block_length),
            window_length: block_length,
            bin_count,
            whitener: Whitener::new(bin_count),
            mean_values: vec![0.0; bin_count],
            white_bin_values: vec![0.0; bin_count],
            peak_bin_values: vec![0.0; bin_count],
            gain: 5.0,
            slope: 0.005,
        }
    }
}

impl Default for WhiteQuarterSpectrum {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for WhiteQuarterSpectrum {
    fn display_name(&self) -> &'static str {
        "White Quarter Spectrum"
    }

    fn init(&mut self, block_length: usize, _format: &SourceFormat) {
        self.window_length = block_length;
        self.bin_count = block_length / 8;
        self.processor.calculate_window_coefficients(self.window_length);
        self.whitener = Whitener::new(self.bin_count);
        self.mean_values = vec![0.0; self.bin_count];
        self.white_bin_values = vec![0.0; self.bin_count];
        self.peak_bin_values = vec![0.0; self.bin_count];
    }

    fn render(&mut self, block: &AudioBlock, width: u32, height: u32) {
        let mut samples = block.average_channels();
        self.processor.apply_window(self.window_length, &mut samples);
        let bin_values = self.processor.compute_fft(&samples);

        // Only the lowest quarter of the computed bins is whitened and
        // displayed.
        let displayed = &bin_values[..self.bin_count.min(bin_values.len())];
        self.whitener
            .whiten(displayed, &mut self.mean_values, &mut self.white_bin_values);
        self.whitener
            .pick_peaks(&self.white_bin_values, &mut self.peak_bin_values);

        let mut surface = self.base.take_surface(width, height);
        surface.fill(self.base.background());

        let bin_count = displayed.len();
        let (gain, slope) = (self.gain, self.slope);
        let white = &self.white_bin_values;
        polyline(&mut surface, width, height, bin_count, ORANGE, |bin| {
            height as i32 - ((gain + slope * bin as f32) * white[bin]) as i32
        });

        let bin_height = height as f32 / DB_RANGE;
        let peaks = &self.peak_bin_values;
        polyline(&mut surface, width, height, bin_count, WHITE, |bin| {
            (bin_height / 2.0 * peaks[bin]) as i32
        });

        self.base.store_surface(surface);
    }

    fn base(&self) -> &VisualBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut VisualBase {
        &mut self.base
    }
}
