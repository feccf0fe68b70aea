//! Visualization panel
//!
//! Holds the renderer registry, tracks the current selection, and plugs
//! into the synchronizer as a [`SignalProcessor`]. Each processed block
//! is rendered once; the finished frame lands in a single-slot latest
//! frame buffer and a coalesced repaint event tells the display side to
//! pick it up. A slow display never backs up the tick thread, it just
//! sees fewer frames.

use crate::block::{AudioBlock, SourceFormat};
use crate::surface::Color;
use crate::dss::SignalProcessor;
use crate::vis::{
    FullSpectrum, Oscilloscope, PianoRoll, QuarterSpectrum, Spectrogram, SpectrumBars,
    StereoOscilloscope, StereoWaveform, Stereograph, WaterBalloons, Waveform, WhiteFullSpectrum,
    WhiteQuarterSpectrum,
};
use crate::visualization::Visualization;
use crossbeam_channel::{bounded, Receiver, Sender};
use image::RgbaImage;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("unknown visualization: {0}")]
    UnknownVisualization(String),
}

/// Persists the selected visualization across runs.
pub trait SelectionStore: Send {
    fn load(&self) -> Option<String>;
    fn store(&mut self, name: &str);
}

/// A page-flipped full screen window.
///
/// Buffers are volatile; `draw` reports whether the buffer still held
/// its contents afterwards, and the panel redraws until it does before
/// flipping, the way a buffer strategy is driven.
pub trait FullScreenWindow: Send {
    fn buffer_count(&self) -> usize {
        2
    }

    /// Draw the frame into the back buffer. False means the buffer
    /// contents were lost and the frame must be drawn again.
    fn draw(&mut self, frame: &RgbaImage) -> bool;

    fn flip(&mut self);
}

pub struct VisualizationPanel {
    visualizations: Vec<Arc<Mutex<dyn Visualization>>>,
    current: usize,
    width: u32,
    height: u32,
    frame: Arc<Mutex<Option<RgbaImage>>>,
    repaint_tx: Sender<()>,
    repaint_rx: Receiver<()>,
    selection: Option<Box<dyn SelectionStore>>,
    full_screen: Option<Box<dyn FullScreenWindow>>,
    change_listeners: Vec<Box<dyn FnMut(&'static str) + Send>>,
}

impl VisualizationPanel {
    pub fn new(width: u32, height: u32) -> Self {
        let visualizations: Vec<Arc<Mutex<dyn Visualization>>> = vec![
            Arc::new(Mutex::new(Oscilloscope::new())),
            Arc::new(Mutex::new(StereoOscilloscope::new())),
            Arc::new(Mutex::new(StereoWaveform::new())),
            Arc::new(Mutex::new(Waveform::new())),
            Arc::new(Mutex::new(WaterBalloons::new())),
            Arc::new(Mutex::new(Stereograph::new())),
            Arc::new(Mutex::new(SpectrumBars::new())),
            Arc::new(Mutex::new(FullSpectrum::new())),
            Arc::new(Mutex::new(WhiteFullSpectrum::new())),
            Arc::new(Mutex::new(QuarterSpectrum::new())),
            Arc::new(Mutex::new(WhiteQuarterSpectrum::new())),
            Arc::new(Mutex::new(Spectrogram::full())),
            Arc::new(Mutex::new(Spectrogram::full_color())),
            Arc::new(Mutex::new(Spectrogram::quarter())),
            Arc::new(Mutex::new(Spectrogram::quarter_color())),
            Arc::new(Mutex::new(PianoRoll::new())),
        ];
        // One slot: a repaint already pending absorbs later ones.
        let (repaint_tx, repaint_rx) = bounded(1);
        Self {
            visualizations,
            current: 0,
            width,
            height,
            frame: Arc::new(Mutex::new(None)),
            repaint_tx,
            repaint_rx,
            selection: None,
            full_screen: None,
            change_listeners: Vec::new(),
        }
    }

    /// Display names in registry order.
    pub fn visualization_set(&self) -> Vec<&'static str> {
        self.visualizations
            .iter()
            .map(|v| v.lock().display_name())
            .collect()
    }

    pub fn current_name(&self) -> &'static str {
        self.visualizations[self.current].lock().display_name()
    }

    /// Switch to the named visualization and persist the choice. With
    /// `fire_event` false the change listeners stay quiet, as when the
    /// persisted selection is restored at startup.
    pub fn show(&mut self, name: &str, fire_event: bool) -> Result<(), PanelError> {
        let index = self
            .visualizations
            .iter()
            .position(|v| v.lock().display_name() == name)
            .ok_or_else(|| PanelError::UnknownVisualization(name.to_string()))?;
        self.select(index, fire_event);
        debug!(name, "visualization selected");
        Ok(())
    }

    /// Called with the new display name after every selection change.
    pub fn add_change_listener(&mut self, listener: Box<dyn FnMut(&'static str) + Send>) {
        self.change_listeners.push(listener);
    }

    pub fn next_visualization(&mut self) {
        let next = (self.current + 1) % self.visualizations.len();
        self.select(next, true);
    }

    pub fn prev_visualization(&mut self) {
        let prev = (self.current + self.visualizations.len() - 1) % self.visualizations.len();
        self.select(prev, true);
    }

    fn select(&mut self, index: usize, fire_event: bool) {
        self.current = index;
        let name = self.visualizations[index].lock().display_name();
        if let Some(store) = self.selection.as_mut() {
            store.store(name);
        }
        if fire_event {
            for listener in &mut self.change_listeners {
                listener(name);
            }
        }
        // Put the new renderer's last frame up right away rather than
        // waiting for the next block; with a paused source none comes.
        if let Some(surface) = self.visualizations[index].lock().base().surface() {
            *self.frame.lock() = Some(surface.image().clone());
        }
        let _ = self.repaint_tx.try_send(());
    }

    /// Attach a selection store and restore the visualization it names.
    /// A stale name is logged and ignored.
    pub fn set_selection_store(&mut self, store: Box<dyn SelectionStore>) {
        let restored = store.load();
        self.selection = Some(store);
        if let Some(name) = restored {
            if self.show(&name, false).is_err() {
                warn!(name, "stored visualization no longer exists");
            }
        }
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Push the new theme colors to every renderer, current or not, so
    /// switching later never shows stale colors.
    pub fn set_theme(&mut self, dark: bool, background: Color, foreground: Color) {
        for visualization in &self.visualizations {
            visualization.lock().base_mut().set_theme(dark, background, foreground);
        }
    }

    /// Enter full screen by handing the panel a window, or leave it with
    /// `None`. While attached, frames are blitted directly instead of
    /// going through repaint events.
    pub fn set_full_screen(&mut self, window: Option<Box<dyn FullScreenWindow>>) {
        self.full_screen = window;
    }

    /// The latest finished frame. The display side takes the slot
    /// contents on each repaint event.
    pub fn frame_slot(&self) -> Arc<Mutex<Option<RgbaImage>>> {
        Arc::clone(&self.frame)
    }

    pub fn repaint_events(&self) -> Receiver<()> {
        self.repaint_rx.clone()
    }
}

impl SignalProcessor for VisualizationPanel {
    fn init(&mut self, block_length: usize, format: &SourceFormat) {
        for visualization in &self.visualizations {
            visualization.lock().init(block_length, format);
        }
        debug!(
            block_length,
            sample_rate = format.sample_rate,
            "visualization panel initialized"
        );
    }

    fn process(&mut self, block: &AudioBlock) {
        if self.width == 0 || self.height == 0 {
            return;
        }

        let mut visualization = self.visualizations[self.current].lock();
        visualization.render(block, self.width, self.height);
        let Some(surface) = visualization.base().surface() else {
            return;
        };

        if let Some(window) = self.full_screen.as_mut() {
            for _ in 0..window.buffer_count() {
                while !window.draw(surface.image()) {}
                window.flip();
            }
            return;
        }

        *self.frame.lock() = Some(surface.image().clone());
        // Full slot means a repaint is already on its way.
        let _ = self.repaint_tx.try_send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::DEFAULT_BLOCK_LENGTH;

    #[test]
    fn test_show_unknown_name_is_an_error() {
        let mut panel = VisualizationPanel::new(64, 64);
        assert!(matches!(
            panel.show("Lava Lamp", true),
            Err(PanelError::UnknownVisualization(_))
        ));
        assert_eq!(panel.current_name(), "Oscilloscope");
    }

    #[test]
    fn test_traversal_wraps_both_ways() {
        let mut panel = VisualizationPanel::new(64, 64);
        let names = panel.visualization_set();
        assert_eq!(names.len(), 16);

        panel.prev_visualization();
        assert_eq!(panel.current_name(), *names.last().unwrap());
        panel.next_visualization();
        assert_eq!(panel.current_name(), names[0]);
        panel.next_visualization();
        assert_eq!(panel.current_name(), names[1]);

        // A full lap lands back where it started.
        for _ in 0..names.len() {
            panel.next_visualization();
        }
        assert_eq!(panel.current_name(), names[1]);
    }

    #[test]
    fn test_change_listeners_hear_every_switch() {
        let heard = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&heard);

        let mut panel = VisualizationPanel::new(64, 64);
        panel.add_change_listener(Box::new(move |name| sink.lock().push(name)));
        panel.next_visualization();
        panel.show("Stereograph", true).unwrap();

        assert_eq!(*heard.lock(), vec!["Stereo Oscilloscope", "Stereograph"]);
    }

    #[test]
    fn test_restore_skips_change_listeners() {
        let heard = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&heard);
        let stored = Arc::new(Mutex::new(Some("Piano Roll".to_string())));

        let mut panel = VisualizationPanel::new(64, 64);
        panel.add_change_listener(Box::new(move |name| sink.lock().push(name)));
        panel.set_selection_store(Box::new(MemoryStore(stored)));

        assert_eq!(panel.current_name(), "Piano Roll");
        assert!(heard.lock().is_empty());
    }

    #[test]
    fn test_switch_publishes_buffered_frame_and_repaint() {
        let mut panel = VisualizationPanel::new(32, 32);
        panel.init(DEFAULT_BLOCK_LENGTH, &SourceFormat::default());
        let slot = panel.frame_slot();
        let events = panel.repaint_events();

        panel.process(&AudioBlock::default());
        slot.lock().take();
        while events.try_recv().is_ok() {}

        // The new renderer has no frame yet; the repaint still goes out
        // so a paused source does not leave the old display up.
        panel.show("Stereograph", true).unwrap();
        assert!(events.try_recv().is_ok());
        assert!(slot.lock().is_none());

        // Switching back republishes the oscilloscope's buffered frame.
        panel.show("Oscilloscope", true).unwrap();
        assert!(slot.lock().is_some());
        assert!(events.try_recv().is_ok());
    }

    struct MemoryStore(Arc<Mutex<Option<String>>>);

    impl SelectionStore for MemoryStore {
        fn load(&self) -> Option<String> {
            self.0.lock().clone()
        }

        fn store(&mut self, name: &str) {
            *self.0.lock() = Some(name.to_string());
        }
    }

    #[test]
    fn test_selection_persists_and_restores() {
        let slot = Arc::new(Mutex::new(None));

        let mut panel = VisualizationPanel::new(64, 64);
        panel.set_selection_store(Box::new(MemoryStore(Arc::clone(&slot))));
        panel.show("Piano Roll", true).unwrap();
        assert_eq!(slot.lock().as_deref(), Some("Piano Roll"));

        let mut restored = VisualizationPanel::new(64, 64);
        restored.set_selection_store(Box::new(MemoryStore(Arc::clone(&slot))));
        assert_eq!(restored.current_name(), "Piano Roll");
    }

    #[test]
    fn test_stale_selection_is_ignored() {
        let slot = Arc::new(Mutex::new(Some("Lava Lamp".to_string())));
        let mut panel = VisualizationPanel::new(64, 64);
        panel.set_selection_store(Box::new(MemoryStore(slot)));
        assert_eq!(panel.current_name(), "Oscilloscope");
    }

    #[test]
    fn test_process_fills_frame_slot_and_coalesces_repaints() {
        let mut panel = VisualizationPanel::new(32, 32);
        panel.init(DEFAULT_BLOCK_LENGTH, &SourceFormat::default());

        let slot = panel.frame_slot();
        let events = panel.repaint_events();
        let block = AudioBlock::default();

        panel.process(&block);
        panel.process(&block);

        let frame = slot.lock().take().unwrap();
        assert_eq!((frame.width(), frame.height()), (32, 32));
        // Two processed blocks, one pending repaint.
        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_err());
    }

    struct CountingWindow {
        draws: Arc<Mutex<usize>>,
        flips: Arc<Mutex<usize>>,
        fail_first: bool,
    }

    impl FullScreenWindow for CountingWindow {
        fn draw(&mut self, _frame: &RgbaImage) -> bool {
            *self.draws.lock() += 1;
            if self.fail_first {
                self.fail_first = false;
                return false;
            }
            true
        }

        fn flip(&mut self) {
            *self.flips.lock() += 1;
        }
    }

    #[test]
    fn test_full_screen_redraws_lost_buffers_and_flips_each() {
        let draws = Arc::new(Mutex::new(0));
        let flips = Arc::new(Mutex::new(0));

        let mut panel = VisualizationPanel::new(32, 32);
        panel.init(DEFAULT_BLOCK_LENGTH, &SourceFormat::default());
        panel.set_full_screen(Some(Box::new(CountingWindow {
            draws: Arc::clone(&draws),
            flips: Arc::clone(&flips),
            fail_first: true,
        })));

        panel.process(&AudioBlock::default());

        // First buffer lost once: three draws for two flips.
        assert_eq!(*draws.lock(), 3);
        assert_eq!(*flips.lock(), 2);
        // Full screen bypasses the frame slot.
        assert!(panel.frame_slot().lock().is_none());
    }
}
