//! Lissajous-style stereo phase display

use crate::block::{AudioBlock, SourceFormat};
use crate::visualization::{VisualBase, Visualization};

/// Left channel drives the horizontal deflection, right channel the
/// vertical, like the CRT stereographs on early hi-fi gear. A mono signal
/// collapses to a 45-degree line; stereo content traces Lissajous
/// figures.
pub struct Stereograph {
    base: VisualBase,
    samples_per_tick: usize,
    x_old: i32,
    y_old: i32,
}

impl Stereograph {
    pub fn new() -> Self {
        Self {
            base: VisualBase::new(),
            samples_per_tick: 0,
            x_old: 0,
            y_old: 0,
        }
    }
}

impl Default for Stereograph {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for Stereograph {
    fn display_name(&self) -> &'static str {
        "Stereograph"
    }

    fn init(&mut self, _block_length: usize, format: &SourceFormat) {
        self.samples_per_tick = format.samples_per_tick();
    }

    fn render(&mut self, block: &AudioBlock, width: u32, height: u32) {
        let mut surface = self.base.take_surface(width, height);
        surface.fill(self.base.background());

        let color = self.base.foreground();
        let half_width = width as i32 / 2;
        let half_height = height as i32 / 2;

        // The trace continues from where the previous frame ended.
        let count = self.samples_per_tick.min(block.len());
        for i in 0..count {
            let x = (half_width + (half_width as f32 * block.left[i]) as i32)
                .clamp(0, width as i32 - 1);
            let y = (half_height - (half_height as f32 * block.right[i]) as i32)
                .clamp(0, height as i32 - 1);
            surface.draw_line(self.x_old, self.y_old, x, y, color);
            self.x_old = x;
            self.y_old = y;
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
