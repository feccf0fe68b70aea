//! Software rendering surface shared by all renderers
//!
//! Wraps an `RgbaImage` with the small set of primitives the renderers
//! need: lines, filled shapes, alpha blending, and a one-column scroll
//! used by the sliding spectrogram displays.

use image::{Rgba, RgbaImage};

pub type Color = Rgba<u8>;

pub const BLACK: Color = Rgba([0, 0, 0, 255]);
pub const WHITE: Color = Rgba([255, 255, 255, 255]);
pub const RED: Color = Rgba([255, 0, 0, 255]);
pub const ORANGE: Color = Rgba([255, 200, 0, 255]);
pub const YELLOW: Color = Rgba([255, 255, 0, 255]);
pub const GREEN: Color = Rgba([0, 255, 0, 255]);
pub const DARK_GREEN: Color = Rgba([0, 124, 0, 255]);
pub const CYAN: Color = Rgba([0, 255, 255, 255]);
pub const MAGENTA: Color = Rgba([255, 0, 255, 255]);

/// Fully saturated, fully bright color at the given hue (0.0 to 1.0 maps
/// to one trip around the color wheel).
pub fn hue_color(hue: f32) -> Color {
    hsb_color(hue, 1.0, 1.0)
}

/// HSB to RGB conversion. All inputs in [0, 1]; hue wraps.
pub fn hsb_color(hue: f32, saturation: f32, brightness: f32) -> Color {
    let h = (hue.rem_euclid(1.0)) * 6.0;
    let sector = h as u32 % 6;
    let f = h - h.floor();
    let v = brightness;
    let p = brightness * (1.0 - saturation);
    let q = brightness * (1.0 - saturation * f);
    let t = brightness * (1.0 - saturation * (1.0 - f));

    let (r, g, b) = match sector {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    rgba_f32(r, g, b, 1.0)
}

/// Build a color from float components in [0, 1].
pub fn rgba_f32(r: f32, g: f32, b: f32, a: f32) -> Color {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([channel(r), channel(g), channel(b), channel(a)])
}

/// Linear blend between two opaque colors; `t` = 0 gives `from`.
pub fn mix(from: Color, to: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Rgba([
        lerp(from.0[0], to.0[0]),
        lerp(from.0[1], to.0[1]),
        lerp(from.0[2], to.0[2]),
        255,
    ])
}

/// Source-over composite of `src` onto an opaque `dst`.
fn blend(dst: Color, src: Color) -> Color {
    let alpha = src.0[3] as f32 / 255.0;
    if alpha >= 1.0 {
        return src;
    }
    let lerp = |d: u8, s: u8| (d as f32 + (s as f32 - d as f32) * alpha).round() as u8;
    Rgba([
        lerp(dst.0[0], src.0[0]),
        lerp(dst.0[1], src.0[1]),
        lerp(dst.0[2], src.0[2]),
        255,
    ])
}

pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        let mut image = RgbaImage::new(width, height);
        for pixel in image.pixels_mut() {
            *pixel = background;
        }
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn fill(&mut self, color: Color) {
        for pixel in self.image.pixels_mut() {
            *pixel = color;
        }
    }

    /// Alpha-blended pixel write; silently drops out-of-bounds points.
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.width() as i32 || y >= self.height() as i32 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        let dst = *self.image.get_pixel(x, y);
        self.image.put_pixel(x, y, blend(dst, color));
    }

    /// Bresenham line between two points, endpoints included.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);

        loop {
            self.put_pixel(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Vertical line segment; `y0`/`y1` in either order.
    pub fn vline(&mut self, x: i32, y0: i32, y1: i32, color: Color) {
        let (top, bottom) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        for y in top..=bottom {
            self.put_pixel(x, y, color);
        }
    }

    pub fn hline(&mut self, x0: i32, x1: i32, y: i32, color: Color) {
        let (left, right) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        for x in left..=right {
            self.put_pixel(x, y, color);
        }
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        for yy in y..y + h {
            for xx in x..x + w {
                self.put_pixel(xx, yy, color);
            }
        }
    }

    /// Filled ellipse inside the bounding box `(x, y, w, h)`.
    pub fn fill_oval(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        if w <= 0 || h <= 0 {
            return;
        }
        let rx = w as f32 / 2.0;
        let ry = h as f32 / 2.0;
        let cx = x as f32 + rx;
        let cy = y as f32 + ry;
        for yy in y..y + h {
            let dy = (yy as f32 + 0.5 - cy) / ry;
            let span = 1.0 - dy * dy;
            if span < 0.0 {
                continue;
            }
            let half = rx * span.sqrt();
            self.hline(
                (cx - half).floor() as i32,
                (cx + half).ceil() as i32 - 1,
                yy,
                color,
            );
        }
    }

    /// Filled triangle through three points, edge-function rasterized.
    pub fn fill_triangle(&mut self, points: [(i32, i32); 3], color: Color) {
        let [(x0, y0), (x1, y1), (x2, y2)] = points;
        let area = (x1 - x0) * (y2 - y0) - (x2 - x0) * (y1 - y0);
        if area == 0 {
            return;
        }

        let min_x = x0.min(x1).min(x2);
        let max_x = x0.max(x1).max(x2);
        let min_y = y0.min(y1).min(y2);
        let max_y = y0.max(y1).max(y2);

        let edge = |ax: i32, ay: i32, bx: i32, by: i32, px: i32, py: i32| {
            (bx - ax) * (py - ay) - (by - ay) * (px - ax)
        };
        let sign = area.signum();

        for py in min_y..=max_y {
            for px in min_x..=max_x {
                let w0 = edge(x0, y0, x1, y1, px, py) * sign;
                let w1 = edge(x1, y1, x2, y2, px, py) * sign;
                let w2 = edge(x2, y2, x0, y0, px, py) * sign;
                if w0 >= 0 && w1 >= 0 && w2 >= 0 {
                    self.put_pixel(px, py, color);
                }
            }
        }
    }

    /// Shift the whole image one column left. The rightmost column keeps
    /// its previous contents; the sliding renderers overdraw it each tick.
    pub fn scroll_left(&mut self) {
        let width = self.width();
        let height = self.height();
        if width < 2 {
            return;
        }
        for y in 0..height {
            for x in 0..width - 1 {
                let next = *self.image.get_pixel(x + 1, y);
                self.image.put_pixel(x, y, next);
            }
        }
    }
}
