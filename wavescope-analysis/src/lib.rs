//! DSP toolbox for wavescope
//!
//! Provides the windowed FFT pipeline, bin-to-band distribution maps,
//! and two-pass split-window spectral whitening used by the renderers.

mod band_map;
mod fft;
mod whitener;

pub use band_map::{BinToBandMap, LinearBands, NoteBands};
pub use fft::{
    apply_max_over_line_normalization, apply_selected_scale, MagnitudeScale, SpectrumProcessor,
};
pub use whitener::Whitener;
