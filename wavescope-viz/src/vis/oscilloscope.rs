//! Oscilloscope renderers

use crate::block::{AudioBlock, SourceFormat};
use crate::surface::{hue_color, CYAN, MAGENTA};
use crate::visualization::{VisualBase, Visualization};

const COLOR_SIZE: usize = 360;

/// Mono oscilloscope tracing the summed channels in a slowly cycling hue.
pub struct Oscilloscope {
    base: VisualBase,
    samples_per_tick: usize,
    color_index: usize,
}

impl Oscilloscope {
    pub fn new() -> Self {
        Self {
            base: VisualBase::new(),
            samples_per_tick: 0,
            color_index: 0,
        }
    }
}

impl Default for Oscilloscope {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for Oscilloscope {
    fn display_name(&self) -> &'static str {
        "Oscilloscope"
    }

    fn init(&mut self, _block_length: usize, format: &SourceFormat) {
        self.samples_per_tick = format.samples_per_tick();
    }

    fn render(&mut self, block: &AudioBlock, width: u32, height: u32) {
        let mut surface = self.base.take_surface(width, height);
        surface.fill(self.base.background());

        self.color_index = if self.color_index == COLOR_SIZE - 1 {
            0
        } else {
            self.color_index + 1
        };
        let color = hue_color(self.color_index as f32 / COLOR_SIZE as f32);

        let count = self.samples_per_tick.min(block.len());
        let band_width = width as f32 / count.max(1) as f32;
        let half_height = height as i32 / 2;
        let quarter_height = height as i32 / 4;

        let (mut x_old, mut y_old) = (0, 0);
        for i in 0..count {
            let x = ((i as f32 * band_width) as i32).clamp(0, width as i32 - 1);
            let y = (half_height
                + (quarter_height as f32 * (block.left[i] + block.right[i])) as i32)
                .clamp(0, height as i32 - 1);
            surface.draw_line(x_old, y_old, x, y, color);
            x_old = x;
            y_old = y;
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

/// Two-trace oscilloscope: left channel in cyan, right in magenta.
pub struct StereoOscilloscope {
    base: VisualBase,
    samples_per_tick: usize,
}

impl StereoOscilloscope {
    pub fn new() -> Self {
        Self {
            base: VisualBase::new(),
            samples_per_tick: 0,
        }
    }
}

impl Default for StereoOscilloscope {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for StereoOscilloscope {
    fn display_name(&self) -> &'static str {
        "Stereo Oscilloscope"
    }

    fn init(&mut self, _block_length: usize, format: &SourceFormat) {
        self.samples_per_tick = format.samples_per_tick();
    }

    fn render(&mut self, block: &AudioBlock, width: u32, height: u32) {
        let mut surface = self.base.take_surface(width, height);
        surface.fill(self.base.background());

        let count = self.samples_per_tick.min(block.len());
        let band_width = width as f32 / count.max(1) as f32;
        let half_height = height as i32 / 2;
        let quarter_height = height as i32 / 4;

        let mut x_old = 0;
        let mut y_left_old = 0;
        let mut y_right_old = 0;
        for i in 0..count {
            let x = ((i as f32 * band_width) as i32).clamp(0, width as i32 - 1);

            let y_left = (half_height + (quarter_height as f32 * block.left[i]) as i32)
                .clamp(0, height as i32 - 1);
            surface.draw_line(x_old, y_left_old, x, y_left, CYAN);
            y_left_old = y_left;

            let y_right = (half_height + (quarter_height as f32 * block.right[i]) as i32)
                .clamp(0, height as i32 - 1);
            surface.draw_line(x_old, y_right_old, x, y_right, MAGENTA);
            x_old = x;
            y_right_old = y_right;
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
    fn test_oscilloscope_clears_and_draws_each_frame() {
        let mut vis = Oscilloscope::new();
        vis.init(DEFAULT_BLOCK_LENGTH, &SourceFormat::default());

        let block = AudioBlock::default();
        vis.render(&block, 64, 32);
        // Silence traces a flat line along the vertical center.
        let surface = vis.base().surface().unwrap();
        let background = vis.base().background();
        assert_ne!(*surface.image().get_pixel(10, 16), background);
        assert_eq!(*surface.image().get_pixel(10, 2), background);
    }

    #[test]
    fn test_full_scale_trace_keeps_the_edge_pixel() {
        let mut vis = Oscilloscope::new();
        vis.init(DEFAULT_BLOCK_LENGTH, &SourceFormat::default());

        let mut block = AudioBlock::default();
        block.left.iter_mut().for_each(|s| *s = 1.0);
        block.right.iter_mut().for_each(|s| *s = 1.0);
        vis.render(&block, 64, 32);

        // A clipping signal pins the trace to the bottom row, not past it.
        let surface = vis.base().surface().unwrap();
        let background = vis.base().background();
        assert_ne!(*surface.image().get_pixel(10, 31), background);
    }

    #[test]
    fn test_stereo_oscilloscope_uses_fixed_channel_colors() {
        let mut vis = StereoOscilloscope::new();
        vis.init(DEFAULT_BLOCK_LENGTH, &SourceFormat::default());

        let block = AudioBlock::default();
        vis.render(&block, 64, 32);
        // Right channel drawn last, so the shared center line is magenta.
        let surface = vis.base().surface().unwrap();
        assert_eq!(*surface.image().get_pixel(10, 16), MAGENTA);
    }
}
