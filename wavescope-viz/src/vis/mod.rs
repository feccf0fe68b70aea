//! The renderer collection
//!
//! Time-domain displays (oscilloscopes, waveforms, stereograph, water
//! balloons), spectrum analyzers, sliding spectrograms, and the piano
//! roll. Every renderer implements [`Visualization`] and keeps its own
//! state; none of them share mutable globals.
//!
//! [`Visualization`]: crate::visualization::Visualization

mod balloons;
mod oscilloscope;
mod piano_roll;
mod spectrogram;
mod spectrum;
mod spectrum_bars;
mod stereograph;
mod waveform;

pub use balloons::WaterBalloons;
pub use oscilloscope::{Oscilloscope, StereoOscilloscope};
pub use piano_roll::PianoRoll;
pub use spectrogram::Spectrogram;
pub use spectrum::{FullSpectrum, QuarterSpectrum, WhiteFullSpectrum, WhiteQuarterSpectrum};
pub use spectrum_bars::SpectrumBars;
pub use stereograph::Stereograph;
pub use waveform::{StereoWaveform, Waveform};
