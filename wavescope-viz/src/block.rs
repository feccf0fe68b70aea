//! Audio block snapshots handed to the renderers

/// Samples per audio block handed to the renderers. The block holds more
/// history than arrives between ticks so FFT-based renderers can use a
/// longer analysis window.
pub const DEFAULT_BLOCK_LENGTH: usize = 8192;

/// Renderer tick rate in blocks per second. Chosen so roughly 1024 new
/// samples arrive per tick at 44100 Hz.
pub const DEFAULT_BLOCK_RATE: f64 = 44100.0 / 1024.0;

/// Seconds between renderer ticks (about 0.023 s).
pub const BLOCK_PERIOD: f64 = 1.0 / DEFAULT_BLOCK_RATE;

/// Format of the audio line feeding the synchronizer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceFormat {
    pub sample_rate: f32,
    pub channels: u16,
}

impl SourceFormat {
    pub fn new(sample_rate: f32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Samples newly arrived per tick: `sample_rate · BLOCK_PERIOD`,
    /// 1024 at 44100 Hz.
    pub fn samples_per_tick(&self) -> usize {
        (self.sample_rate as f64 * BLOCK_PERIOD) as usize
    }
}

impl Default for SourceFormat {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            channels: 2,
        }
    }
}

/// One block of de-interleaved audio history, newest samples at the end.
///
/// Both channels are always the block length; a mono source fills them
/// identically.
#[derive(Clone, Debug)]
pub struct AudioBlock {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl AudioBlock {
    pub fn new(block_length: usize) -> Self {
        Self {
            left: vec![0.0; block_length],
            right: vec![0.0; block_length],
        }
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Average the two channels into a single mono signal. Used by every
    /// renderer that analyzes one channel of data.
    pub fn average_channels(&self) -> Vec<f32> {
        self.left
            .iter()
            .zip(&self.right)
            .map(|(l, r)| (l + r) / 2.0)
            .collect()
    }
}

impl Default for AudioBlock {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_LENGTH)
    }
}
