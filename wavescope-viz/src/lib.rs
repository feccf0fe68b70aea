//! Real-time audio visualization pipeline for wavescope
//!
//! The pieces, from capture to screen:
//! - block: fixed-length stereo sample blocks and source format
//! - dss: digital signal synchronizer feeding blocks to processors
//! - surface: software raster surface the renderers draw into
//! - visualization: the renderer contract and shared per-renderer state
//! - vis: the renderer collection
//! - panel: registry, selection, and frame handoff to the display

pub mod block;
pub mod dss;
pub mod panel;
pub mod surface;
pub mod vis;
pub mod visualization;

pub use block::{AudioBlock, SourceFormat, BLOCK_PERIOD, DEFAULT_BLOCK_LENGTH};
pub use dss::{
    capture_pair, CaptureBuffer, CaptureHandle, DigitalSignalSynchronizer, SampleSource,
    SignalProcessor,
};
pub use panel::{FullScreenWindow, PanelError, SelectionStore, VisualizationPanel};
pub use surface::Surface;
pub use visualization::{VisualBase, Visualization};
