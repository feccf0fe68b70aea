//! Visualization contract and shared per-renderer state

use crate::block::{AudioBlock, SourceFormat};
use crate::surface::{Color, Surface, BLACK, WHITE};

/// State every renderer carries: the theme colors and a lazily created
/// off-screen surface.
///
/// Persistent renderers (the sliding spectrograms and waveforms) rely on
/// the surface keeping its contents between ticks, so it is only
/// recreated when the size or a theme color changes.
pub struct VisualBase {
    background: Color,
    foreground: Color,
    dark_theme: bool,
    surface: Option<Surface>,
}

impl VisualBase {
    pub fn new() -> Self {
        Self {
            background: BLACK,
            foreground: WHITE,
            dark_theme: true,
            surface: None,
        }
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn foreground(&self) -> Color {
        self.foreground
    }

    pub fn dark_theme(&self) -> bool {
        self.dark_theme
    }

    /// A theme change invalidates the surface so accumulated history does
    /// not bleed through in the old colors.
    pub fn set_theme(&mut self, dark: bool, background: Color, foreground: Color) {
        self.dark_theme = dark;
        self.background = background;
        self.foreground = foreground;
        self.free_surface();
    }

    /// Hand the caller a surface of the requested size, either the kept
    /// one or a fresh background-filled replacement. The renderer draws
    /// into it and gives it back through [`store_surface`].
    ///
    /// [`store_surface`]: VisualBase::store_surface
    pub fn take_surface(&mut self, width: u32, height: u32) -> Surface {
        match self.surface.take() {
            Some(surface) if surface.width() == width && surface.height() == height => surface,
            _ => Surface::new(width, height, self.background),
        }
    }

    pub fn store_surface(&mut self, surface: Surface) {
        self.surface = Some(surface);
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn free_surface(&mut self) {
        self.surface = None;
    }
}

impl Default for VisualBase {
    fn default() -> Self {
        Self::new()
    }
}

/// A single visualization renderer.
///
/// `render` must tolerate arbitrary input: silence, clipping, or a
/// degenerate surface size. A bad frame is dropped, never an error.
pub trait Visualization: Send {
    fn display_name(&self) -> &'static str;

    /// Called once before rendering starts and again if the source
    /// format changes.
    fn init(&mut self, block_length: usize, format: &SourceFormat);

    /// Draw one frame into the base surface at the given size.
    fn render(&mut self, block: &AudioBlock, width: u32, height: u32);

    fn base(&self) -> &VisualBase;

    fn base_mut(&mut self) -> &mut VisualBase;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{GREEN, RED};

    #[test]
    fn test_surface_kept_while_size_matches() {
        let mut base = VisualBase::new();
        let mut surface = base.take_surface(8, 8);
        surface.put_pixel(3, 3, RED);
        base.store_surface(surface);

        // Same size: history survives.
        let surface = base.take_surface(8, 8);
        assert_eq!(*surface.image().get_pixel(3, 3), RED);
        base.store_surface(surface);

        // Resize: fresh surface filled with the background.
        let surface = base.take_surface(16, 8);
        assert_eq!(surface.width(), 16);
        assert_eq!(*surface.image().get_pixel(3, 3), BLACK);
    }

    #[test]
    fn test_theme_change_invalidates_surface() {
        let mut base = VisualBase::new();
        let surface = base.take_surface(4, 4);
        base.store_surface(surface);
        assert!(base.surface().is_some());

        base.set_theme(false, WHITE, GREEN);
        assert!(base.surface().is_none());
        assert_eq!(base.take_surface(4, 4).image().get_pixel(0, 0), &WHITE);
    }
}
