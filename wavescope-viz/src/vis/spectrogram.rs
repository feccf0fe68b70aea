//! Sliding spectrogram renderers
//!
//! Each tick draws one column of scaled bin magnitudes at the right edge
//! and shifts the accumulated image one pixel left. The Full variants
//! cover the whole spectrum from a 2048-sample window; the Quarter
//! variants run the FFT over the full block and show the lowest quarter
//! of the bins at four times the resolution.

use crate::block::{AudioBlock, SourceFormat, DEFAULT_BLOCK_LENGTH};
use crate::surface::{hue_color, mix, rgba_f32, Color};
use crate::visualization::{VisualBase, Visualization};
use wavescope_analysis::SpectrumProcessor;

const FULL_WINDOW_LENGTH: usize = 2048;

/// How a window of audio maps to displayed bins.
#[derive(Clone, Copy)]
enum BinRange {
    /// Window capped at 2048 samples, all computed bins shown.
    Full,
    /// Whole block windowed, lowest eighth of the window shown.
    Quarter,
}

/// Magnitude-to-color policy for one column.
#[derive(Clone, Copy)]
enum ColorMap {
    /// Lerp between the theme background and foreground.
    Monochrome,
    /// Background fading into blue (dark theme) or magenta (light),
    /// then around the hue wheel to red.
    Rainbow,
    /// Black-body "hot" map from background through red and yellow to
    /// white, inverted on a light theme. Magnitudes clamp to
    /// [0.01, 0.99] so the endpoints never fully saturate.
    Hot,
}

impl ColorMap {
    fn color(self, mag: f32, dark: bool, background: Color, foreground: Color) -> Color {
        match self {
            ColorMap::Monochrome => mix(background, foreground, mag.clamp(0.0, 1.0)),
            ColorMap::Rainbow => {
                let mag = mag.clamp(0.0, 1.0);
                if mag < 0.2 {
                    let alpha = 5.0 * mag;
                    if dark {
                        rgba_f32(0.0, 0.0, 1.0, alpha)
                    } else {
                        rgba_f32(1.0, 0.0, 1.0, alpha)
                    }
                } else {
                    let mag = (mag - 0.2) * 1.25;
                    let degrees = if dark { 240.0 } else { 300.0 };
                    hue_color((degrees - mag * degrees) / 360.0)
                }
            }
            ColorMap::Hot => {
                let mag = mag.clamp(0.01, 0.99);
                if dark {
                    if mag < 0.333 {
                        rgba_f32(3.0 * mag, 0.0, 0.0, 3.0 * mag)
                    } else if mag < 0.666 {
                        rgba_f32(1.0, 3.0 * (mag - 0.333), 0.0, 1.0)
                    } else {
                        rgba_f32(1.0, 1.0, 3.0 * (mag - 0.666), 1.0)
                    }
                } else if mag < 0.333 {
                    rgba_f32(1.0, 1.0, 1.0 - 3.0 * mag, 3.0 * mag)
                } else if mag < 0.666 {
                    rgba_f32(1.0, 1.0 - 3.0 * (mag - 0.333), 0.0, 1.0)
                } else {
                    rgba_f32(1.0 - 3.0 * (mag - 0.666), 0.0, 0.0, 1.0)
                }
            }
        }
    }
}

pub struct Spectrogram {
    base: VisualBase,
    processor: SpectrumProcessor,
    name: &'static str,
    range: BinRange,
    map: ColorMap,
    gain: f32,
    slope: f32,
    window_length: usize,
    bin_count: usize,
}

impl Spectrogram {
    fn with_config(
        name: &'static str,
        range: BinRange,
        map: ColorMap,
        gain: f32,
        slope: f32,
    ) -> Self {
        let window_length = match range {
            BinRange::Full => FULL_WINDOW_LENGTH,
            BinRange::Quarter => DEFAULT_BLOCK_LENGTH,
        };
        Self {
            base: VisualBase::new(),
            processor: SpectrumProcessor::new(window_length),
            name,
            range,
            map,
            gain,
            slope,
            window_length,
            bin_count: Self::bins_for(range, window_length),
        }
    }

    fn bins_for(range: BinRange, window_length: usize) -> usize {
        match range {
            BinRange::Full => window_length / 2,
            BinRange::Quarter => window_length / 8,
        }
    }

    pub fn full() -> Self {
        Self::with_config("Full Spectrogram", BinRange::Full, ColorMap::Monochrome, 0.01, 0.0001)
    }

    pub fn full_color() -> Self {
        Self::with_config(
            "Full Color Spectrogram",
            BinRange::Full,
            ColorMap::Rainbow,
            0.02,
            0.0001,
        )
    }

    pub fn quarter() -> Self {
        Self::with_config(
            "Quarter Spectrogram",
            BinRange::Quarter,
            ColorMap::Monochrome,
            0.01,
            0.00001,
        )
    }

    pub fn quarter_color() -> Self {
        Self::with_config(
            "Quarter Color Spectrogram",
            BinRange::Quarter,
            ColorMap::Hot,
            0.01,
            0.0,
        )
    }
}

impl Visualization for Spectrogram {
    fn display_name(&self) -> &'static str {
        self.name
    }

    fn init(&mut self, block_length: usize, _format: &SourceFormat) {
        self.window_length = match self.range {
            BinRange::Full => block_length.min(FULL_WINDOW_LENGTH),
            BinRange::Quarter => block_length,
        };
        self.bin_count = Self::bins_for(self.range, self.window_length);
        self.processor.calculate_window_coefficients(self.window_length);
    }

    fn render(&mut self, block: &AudioBlock, width: u32, height: u32) {
        let mut samples = block.average_channels();
        samples.truncate(self.window_length);
        self.processor.apply_window(self.window_length, &mut samples);
        let bin_values = self.processor.compute_fft(&samples);

        let mut surface = self.base.take_surface(width, height);
        surface.scroll_left();

        let last = width as i32 - 1;
        let bin_count = self.bin_count.min(bin_values.len());
        let bin_height = height as f32 / bin_count as f32;
        let dark = self.base.dark_theme();
        let background = self.base.background();
        let foreground = self.base.foreground();

        // Bin 0 at the bottom of the column, rising frequency upward.
        let mut y = height as f32;
        for (bin_num, &value) in bin_values[..bin_count].iter().enumerate() {
            let mag = (self.gain + self.slope * bin_num as f32) * value;
            let top = (y - bin_height).round() as i32;

            surface.vline(last, y.round() as i32, top, background);
            let color = self.map.color(mag, dark, background, foreground);
            surface.vline(last, y.round() as i32, top, color);

            y -= bin_height;
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
    use crate::surface::{BLACK, RED, WHITE};

    fn tone_block(freq: f32) -> AudioBlock {
        let mut block = AudioBlock::default();
        for i in 0..block.len() {
            let v = (2.0 * std::f32::consts::PI * freq * i as f32 / 44100.0).sin();
            block.left[i] = v;
            block.right[i] = v;
        }
        block
    }

    #[test]
    fn test_variant_window_and_bin_policies() {
        let mut full = Spectrogram::full();
        full.init(DEFAULT_BLOCK_LENGTH, &SourceFormat::default());
        assert_eq!(full.window_length, 2048);
        assert_eq!(full.bin_count, 1024);

        let mut quarter = Spectrogram::quarter();
        quarter.init(DEFAULT_BLOCK_LENGTH, &SourceFormat::default());
        assert_eq!(quarter.window_length, 8192);
        assert_eq!(quarter.bin_count, 1024);
    }

    #[test]
    fn test_columns_slide_left_each_tick() {
        let mut vis = Spectrogram::full();
        vis.init(DEFAULT_BLOCK_LENGTH, &SourceFormat::default());

        vis.render(&tone_block(440.0), 8, 64);
        let first_column: Vec<Color> = {
            let surface = vis.base().surface().unwrap();
            (0..64).map(|y| *surface.image().get_pixel(7, y)).collect()
        };

        vis.render(&AudioBlock::default(), 8, 64);
        let surface = vis.base().surface().unwrap();
        let shifted: Vec<Color> = (0..64).map(|y| *surface.image().get_pixel(6, y)).collect();
        assert_eq!(first_column, shifted);
    }

    #[test]
    fn test_monochrome_map_endpoints() {
        let map = ColorMap::Monochrome;
        assert_eq!(map.color(0.0, true, BLACK, WHITE), BLACK);
        assert_eq!(map.color(1.0, true, BLACK, WHITE), WHITE);
    }

    #[test]
    fn test_hot_map_peaks_near_white_on_dark_theme() {
        let color = ColorMap::Hot.color(1.0, true, BLACK, WHITE);
        assert!(color.0[0] == 255 && color.0[1] == 255 && color.0[2] > 200);
    }

    #[test]
    fn test_rainbow_map_ends_at_red() {
        let color = ColorMap::Rainbow.color(1.0, true, BLACK, WHITE);
        assert_eq!(color, RED);
    }
}
