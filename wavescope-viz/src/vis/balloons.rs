//! Hanging water balloons bouncing with the music

use crate::block::{AudioBlock, SourceFormat, BLOCK_PERIOD};
use crate::surface::{hsb_color, Surface};
use crate::visualization::{VisualBase, Visualization};

const FREQUENCY: f64 = 2.0; // sway rate, tuned by eye
const COLOR_SIZE: usize = 2000;
const SMOOTHING: f32 = 0.1;
const LEVEL_SCALE: f32 = 5.0;
const TWO_PI: f64 = 2.0 * std::f64::consts::PI;

struct Balloon {
    ref_x: f32,
    ref_y: f32,
    size_x: f32,
    size_y: f32,
    move_x: f64,
    move_y: f64,
    color_increment: usize,
    color_index: usize,
    pos_x: i32,
    pos_y: i32,
}

impl Balloon {
    fn new(
        ref_x: f32,
        ref_y: f32,
        size_x: f32,
        size_y: f32,
        move_x: f64,
        move_y: f64,
        color_increment: usize,
    ) -> Self {
        Self {
            ref_x,
            ref_y,
            size_x,
            size_y,
            move_x,
            move_y,
            color_increment,
            color_index: 0,
            pos_x: 0,
            pos_y: 0,
        }
    }

    fn step(&mut self, left_sum: f32, right_sum: f32, time: f64, width: u32, height: u32) {
        self.pos_x = (self.ref_x as f64 * width as f64
            + 32.0 * right_sum as f64 * (TWO_PI * FREQUENCY * self.move_x * time).sin())
            as i32;
        self.pos_y = (self.ref_y as f64 * height as f64
            + 64.0 * left_sum as f64 * (TWO_PI * FREQUENCY * self.move_y * time).sin())
            as i32;
        self.color_index = if self.color_index >= COLOR_SIZE - 1 {
            0
        } else {
            self.color_index + self.color_increment
        };
    }

    fn paint(&self, surface: &mut Surface, width: u32, height: u32) {
        let color = hsb_color(self.color_index as f32 / COLOR_SIZE as f32, 1.0, 1.0);
        let a = (height as f32 * self.size_x) as i32;
        let b = ((height as f32 * self.size_y) as i32).min(height as i32 - self.pos_y);
        surface.fill_oval(self.pos_x - a, self.pos_y - b, 2 * a, 2 * b, color);

        // String: a triangle from the ceiling anchor to the two tangent
        // points where the lines touch the ellipse.
        let a = a as f64;
        let b = b as f64;
        let xa = self.ref_x as f64 * width as f64 - self.pos_x as f64;
        let ya = -(self.pos_y as f64);
        let denom = b * b * xa * xa + a * a * ya * ya;
        if denom == 0.0 {
            return;
        }
        let root = (b * b * xa * xa + a * a * (ya * ya - b * b)).sqrt();
        let x1 = (a * a * (b * b * xa + ya * root)) / denom;
        let x2 = (a * a * (b * b * xa - ya * root)) / denom;
        let y1 = (b * b * (a * a * ya - xa * root)) / denom;
        let y2 = (b * b * (a * a * ya + xa * root)) / denom;

        surface.fill_triangle(
            [
                (xa as i32 + self.pos_x, 0),
                (x1 as i32 + self.pos_x, y1 as i32 + self.pos_y),
                (x2 as i32 + self.pos_x, y2 as i32 + self.pos_y),
            ],
            color,
        );
    }
}

/// Three balloons whose sway and color respond to the channel levels.
pub struct WaterBalloons {
    base: VisualBase,
    samples_per_tick: usize,
    balloons: [Balloon; 3],
    prev_left_sum: f32,
    prev_right_sum: f32,
    ticks: u64,
}

impl WaterBalloons {
    pub fn new() -> Self {
        Self {
            base: VisualBase::new(),
            samples_per_tick: 0,
            balloons: [
                Balloon::new(3.0 / 16.0, 11.0 / 16.0, 1.0 / 4.0, 1.0 / 3.0, 1.3, 1.0, 1),
                Balloon::new(1.0 / 2.0, 1.0 / 2.0, 1.0 / 6.0, 1.0 / 4.0, 1.7, 1.4, 2),
                Balloon::new(13.0 / 16.0, 5.0 / 16.0, 1.0 / 8.0, 1.0 / 6.0, 2.9, 1.8, 3),
            ],
            prev_left_sum: 0.0,
            prev_right_sum: 0.0,
            ticks: 0,
        }
    }
}

impl Default for WaterBalloons {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for WaterBalloons {
    fn display_name(&self) -> &'static str {
        "Water Balloons"
    }

    fn init(&mut self, _block_length: usize, format: &SourceFormat) {
        self.samples_per_tick = format.samples_per_tick();
    }

    fn render(&mut self, block: &AudioBlock, width: u32, height: u32) {
        let count = self.samples_per_tick.min(block.len()).max(1);
        let mut left_sum = 0.0f32;
        let mut right_sum = 0.0f32;
        for i in 0..count {
            left_sum += block.left[i].abs();
            right_sum += block.right[i].abs();
        }
        left_sum = (left_sum * LEVEL_SCALE / count as f32).min(1.0);
        right_sum = (right_sum * LEVEL_SCALE / count as f32).min(1.0);

        // Low-pass the levels so the balloons wobble instead of jitter.
        left_sum = self.prev_left_sum + SMOOTHING * (left_sum - self.prev_left_sum);
        right_sum = self.prev_right_sum + SMOOTHING * (right_sum - self.prev_right_sum);
        self.prev_left_sum = left_sum;
        self.prev_right_sum = right_sum;

        let time = self.ticks as f64 * BLOCK_PERIOD;
        self.ticks += 1;

        let mut surface = self.base.take_surface(width, height);
        surface.fill(self.base.background());
        for balloon in &mut self.balloons {
            balloon.step(left_sum, right_sum, time, width, height);
            balloon.paint(&mut surface, width, height);
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
    fn test_balloons_render_over_background() {
        let mut vis = WaterBalloons::new();
        vis.init(DEFAULT_BLOCK_LENGTH, &SourceFormat::default());

        let mut block = AudioBlock::default();
        for i in 0..block.len() {
            block.left[i] = (i as f32 / 10.0).sin() * 0.8;
            block.right[i] = (i as f32 / 13.0).sin() * 0.8;
        }
        vis.render(&block, 128, 128);

        // The middle balloon sits near the center of the frame.
        let surface = vis.base().surface().unwrap();
        let background = vis.base().background();
        assert_ne!(*surface.image().get_pixel(64, 64), background);
    }

    #[test]
    fn test_level_smoothing_limits_per_tick_change() {
        let mut vis = WaterBalloons::new();
        vis.init(DEFAULT_BLOCK_LENGTH, &SourceFormat::default());

        let mut loud = AudioBlock::default();
        loud.left.iter_mut().for_each(|s| *s = 1.0);
        loud.right.iter_mut().for_each(|s| *s = 1.0);
        vis.render(&loud, 64, 64);

        // One loud tick from silence moves the smoothed level by at most
        // the smoothing factor.
        assert!(vis.prev_left_sum <= SMOOTHING + 1e-6);
        assert!(vis.prev_left_sum > 0.0);
    }
}
