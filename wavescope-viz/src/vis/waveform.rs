//! Sliding time-waveform renderers

use crate::block::{AudioBlock, SourceFormat};
use crate::surface::hue_color;
use crate::visualization::{VisualBase, Visualization};

const COLOR_SIZE: usize = 2000;

/// Scrolling level history with the two channels mirrored around a single
/// center line. One channel extends upward and the other downward, so an
/// amplitude imbalance shows up as visible asymmetry.
pub struct Waveform {
    base: VisualBase,
    samples_per_tick: usize,
    color_index: usize,
    gain: f32,
}

impl Waveform {
    pub fn new() -> Self {
        Self {
            base: VisualBase::new(),
            samples_per_tick: 0,
            color_index: 0,
            gain: 2.0,
        }
    }
}

impl Default for Waveform {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for Waveform {
    fn display_name(&self) -> &'static str {
        "Waveform"
    }

    fn init(&mut self, _block_length: usize, format: &SourceFormat) {
        self.samples_per_tick = format.samples_per_tick();
    }

    fn render(&mut self, block: &AudioBlock, width: u32, height: u32) {
        let count = self.samples_per_tick.min(block.len()).max(1);
        let mut left_level = 0.0f32;
        let mut right_level = 0.0f32;
        for i in 0..count {
            left_level -= block.left[i].abs();
            right_level += block.right[i].abs();
        }
        left_level = (self.gain * left_level / count as f32).max(-1.0);
        right_level = (self.gain * right_level / count as f32).min(1.0);

        self.color_index = if self.color_index == COLOR_SIZE - 1 {
            0
        } else {
            self.color_index + 1
        };
        let hue = self.color_index as f32 / COLOR_SIZE as f32;

        let mut surface = self.base.take_surface(width, height);
        surface.scroll_left();

        let last = width as i32 - 1;
        let half_height = height as i32 / 2;

        surface.vline(last, 0, height as i32 - 1, self.base.background());
        surface.hline(0, last, half_height, self.base.foreground());

        let y_left = (left_level * half_height as f32).round() as i32 + half_height;
        surface.vline(last, half_height, y_left, hue_color(hue));
        let y_right = (right_level * half_height as f32).round() as i32 + half_height;
        surface.vline(last, half_height, y_right, hue_color(1.0 - hue));

        self.base.store_surface(surface);
    }

    fn base(&self) -> &VisualBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut VisualBase {
        &mut self.base
    }
}

/// Scrolling min/max envelope, left channel in the upper half and right
/// channel in the lower half.
pub struct StereoWaveform {
    base: VisualBase,
    samples_per_tick: usize,
    color_index: usize,
}

impl StereoWaveform {
    pub fn new() -> Self {
        Self {
            base: VisualBase::new(),
            samples_per_tick: 0,
            color_index: 0,
        }
    }
}

impl Default for StereoWaveform {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for StereoWaveform {
    fn display_name(&self) -> &'static str {
        "Stereo Waveform"
    }

    fn init(&mut self, _block_length: usize, format: &SourceFormat) {
        self.samples_per_tick = format.samples_per_tick();
    }

    fn render(&mut self, block: &AudioBlock, width: u32, height: u32) {
        let count = self.samples_per_tick.min(block.len());

        let mut left_pos = 0.0f32;
        let mut left_neg = 0.0f32;
        let mut right_pos = 0.0f32;
        let mut right_neg = 0.0f32;
        for i in 0..count {
            left_pos = left_pos.max(block.left[i]);
            left_neg = left_neg.min(block.left[i]);
            right_pos = right_pos.max(block.right[i]);
            right_neg = right_neg.min(block.right[i]);
        }
        left_pos = left_pos.min(1.0);
        left_neg = left_neg.max(-1.0);
        right_pos = right_pos.min(1.0);
        right_neg = right_neg.max(-1.0);

        self.color_index = if self.color_index == COLOR_SIZE - 1 {
            0
        } else {
            self.color_index + 1
        };
        let hue = self.color_index as f32 / COLOR_SIZE as f32;

        let mut surface = self.base.take_surface(width, height);
        surface.scroll_left();

        let last = width as i32 - 1;
        let quarter_height = height as i32 / 4;
        let three_quarter_height = 3 * quarter_height;

        surface.vline(last, 0, height as i32 - 1, self.base.background());
        surface.hline(0, last, quarter_height, self.base.foreground());
        surface.hline(0, last, three_quarter_height, self.base.foreground());

        let scale = quarter_height as f32;
        surface.vline(
            last,
            quarter_height - (left_pos * scale).round() as i32,
            quarter_height - (left_neg * scale).round() as i32,
            hue_color(hue),
        );
        surface.vline(
            last,
            three_quarter_height - (right_pos * scale).round() as i32,
            three_quarter_height - (right_neg * scale).round() as i32,
            hue_color(1.0 - hue),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::DEFAULT_BLOCK_LENGTH;

    #[test]
    fn test_waveform_scrolls_history_left() {
        let mut vis = Waveform::new();
        vis.init(DEFAULT_BLOCK_LENGTH, &SourceFormat::default());

        let mut block = AudioBlock::default();
        block.right.iter_mut().for_each(|s| *s = 1.0);
        vis.render(&block, 8, 16);

        // Loud frame paints a column at the right edge.
        let foreground = vis.base().foreground();
        let background = vis.base().background();
        {
            let surface = vis.base().surface().unwrap();
            let loud = *surface.image().get_pixel(7, 12);
            assert_ne!(loud, background);
            assert_ne!(loud, foreground);
        }

        // A silent frame leaves only the center line at the right edge,
        // while the loud column has moved one pixel left.
        let silent = AudioBlock::default();
        vis.render(&silent, 8, 16);
        let surface = vis.base().surface().unwrap();
        assert_eq!(*surface.image().get_pixel(7, 12), background);
        assert_ne!(*surface.image().get_pixel(6, 12), background);
    }

    #[test]
    fn test_stereo_waveform_draws_center_lines() {
        let mut vis = StereoWaveform::new();
        vis.init(DEFAULT_BLOCK_LENGTH, &SourceFormat::default());
        vis.render(&AudioBlock::default(), 16, 16);

        let surface = vis.base().surface().unwrap();
        let foreground = vis.base().foreground();
        assert_eq!(*surface.image().get_pixel(3, 4), foreground);
        assert_eq!(*surface.image().get_pixel(3, 12), foreground);
    }
}
