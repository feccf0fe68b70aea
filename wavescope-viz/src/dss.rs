//! Digital signal synchronizer
//!
//! Decouples audio capture from rendering. The audio callback pushes
//! interleaved samples into a lock-free ring through a [`CaptureHandle`];
//! a dedicated tick thread drains the matching [`CaptureBuffer`] at the
//! block rate, maintains a sliding window of recent history, and hands an
//! [`AudioBlock`] snapshot to every registered processor.

use crate::block::{AudioBlock, SourceFormat, BLOCK_PERIOD};
use parking_lot::{Mutex, RwLock};
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, trace};

/// Consumer of synchronized audio blocks.
pub trait SignalProcessor: Send {
    /// Called before the first block and again whenever the source
    /// format changes.
    fn init(&mut self, block_length: usize, format: &SourceFormat);

    fn process(&mut self, block: &AudioBlock);
}

/// Where the synchronizer pulls audio from.
pub trait SampleSource: Send {
    fn format(&self) -> SourceFormat;

    /// False while the line is paused; the synchronizer skips ticks
    /// entirely rather than feeding processors stale data.
    fn is_playing(&self) -> bool;

    /// Drain newly captured frames, appending one sample per channel.
    /// Returns the number of frames appended.
    fn read_frames(&mut self, left: &mut Vec<f32>, right: &mut Vec<f32>) -> usize;
}

struct CaptureShared {
    format: Mutex<SourceFormat>,
    playing: AtomicBool,
}

/// Producer half of the capture ring, owned by the audio callback.
pub struct CaptureHandle {
    producer: HeapProd<f32>,
    shared: Arc<CaptureShared>,
}

impl CaptureHandle {
    /// Push interleaved samples. When the renderer side falls behind the
    /// ring fills up and the overflow is dropped; the callback must never
    /// block.
    pub fn write(&mut self, interleaved: &[f32]) {
        let pushed = self.producer.push_slice(interleaved);
        if pushed < interleaved.len() {
            trace!(dropped = interleaved.len() - pushed, "capture ring full");
        }
    }

    pub fn set_playing(&self, playing: bool) {
        self.shared.playing.store(playing, Ordering::Release);
    }

    pub fn set_format(&self, format: SourceFormat) {
        *self.shared.format.lock() = format;
    }
}

/// Consumer half of the capture ring, handed to the synchronizer.
pub struct CaptureBuffer {
    consumer: HeapCons<f32>,
    shared: Arc<CaptureShared>,
    scratch: Vec<f32>,
}

/// Build a connected capture pair with room for `capacity_frames` frames
/// of the given format.
pub fn capture_pair(
    format: SourceFormat,
    capacity_frames: usize,
) -> (CaptureHandle, CaptureBuffer) {
    let capacity = capacity_frames * format.channels.max(1) as usize;
    let (producer, consumer) = HeapRb::<f32>::new(capacity).split();
    let shared = Arc::new(CaptureShared {
        format: Mutex::new(format),
        playing: AtomicBool::new(false),
    });
    (
        CaptureHandle {
            producer,
            shared: Arc::clone(&shared),
        },
        CaptureBuffer {
            consumer,
            shared,
            scratch: vec![0.0; capacity],
        },
    )
}

impl SampleSource for CaptureBuffer {
    fn format(&self) -> SourceFormat {
        *self.shared.format.lock()
    }

    fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::Acquire)
    }

    fn read_frames(&mut self, left: &mut Vec<f32>, right: &mut Vec<f32>) -> usize {
        let channels = self.format().channels.max(1) as usize;
        // Only whole frames; a torn frame would swap the channels of
        // everything after it.
        let available = self.consumer.occupied_len() / channels * channels;
        let count = available.min(self.scratch.len());
        let popped = self.consumer.pop_slice(&mut self.scratch[..count]);

        let frames = popped / channels;
        for frame in self.scratch[..frames * channels].chunks_exact(channels) {
            left.push(frame[0]);
            right.push(if channels > 1 { frame[1] } else { frame[0] });
        }
        frames
    }
}

/// Sliding-window state driven once per tick.
struct Pump<S: SampleSource> {
    source: S,
    block_length: usize,
    history_left: Vec<f32>,
    history_right: Vec<f32>,
    block: AudioBlock,
}

impl<S: SampleSource> Pump<S> {
    fn new(source: S, block_length: usize) -> Self {
        Self {
            source,
            block_length,
            history_left: vec![0.0; block_length],
            history_right: vec![0.0; block_length],
            block: AudioBlock::new(block_length),
        }
    }

    /// Pull new frames into the sliding window and snapshot it. Returns
    /// None when the line is paused or idle this tick.
    fn tick(&mut self) -> Option<&AudioBlock> {
        if !self.source.is_playing() {
            return None;
        }
        let frames = self
            .source
            .read_frames(&mut self.history_left, &mut self.history_right);
        if frames == 0 {
            return None;
        }

        let excess = self.history_left.len().saturating_sub(self.block_length);
        if excess > 0 {
            self.history_left.drain(..excess);
            self.history_right.drain(..excess);
        }

        self.block.left.copy_from_slice(&self.history_left);
        self.block.right.copy_from_slice(&self.history_right);
        Some(&self.block)
    }
}

type SharedProcessor = Arc<Mutex<dyn SignalProcessor>>;

struct Worker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Owns the processor registry and the tick thread.
pub struct DigitalSignalSynchronizer {
    block_length: usize,
    format: Mutex<Option<SourceFormat>>,
    processors: Arc<RwLock<Vec<SharedProcessor>>>,
    worker: Option<Worker>,
}

impl DigitalSignalSynchronizer {
    pub fn new(block_length: usize) -> Self {
        Self {
            block_length,
            format: Mutex::new(None),
            processors: Arc::new(RwLock::new(Vec::new())),
            worker: None,
        }
    }

    pub fn add(&self, processor: SharedProcessor) {
        // A processor joining a running synchronizer is initialized here;
        // it must never see a block before init.
        if self.worker.is_some() {
            if let Some(format) = *self.format.lock() {
                processor.lock().init(self.block_length, &format);
            }
        }
        self.processors.write().push(processor);
        debug!("signal processor added");
    }

    pub fn remove(&self, processor: &SharedProcessor) {
        self.processors
            .write()
            .retain(|p| !Arc::ptr_eq(p, processor));
        debug!("signal processor removed");
    }

    /// Initialize all registered processors against the source format and
    /// start ticking. A previous run is stopped first.
    pub fn start<S: SampleSource + 'static>(&mut self, source: S) {
        self.stop();

        let format = source.format();
        *self.format.lock() = Some(format);
        for processor in self.processors.read().iter() {
            processor.lock().init(self.block_length, &format);
        }

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let processors = Arc::clone(&self.processors);
        let block_length = self.block_length;

        let handle = std::thread::spawn(move || {
            let period = Duration::from_secs_f64(BLOCK_PERIOD);
            let mut pump = Pump::new(source, block_length);
            while !stop_flag.load(Ordering::Acquire) {
                std::thread::sleep(period);
                if let Some(block) = pump.tick() {
                    for processor in processors.read().iter() {
                        processor.lock().process(block);
                    }
                }
            }
        });
        self.worker = Some(Worker { stop, handle });
        debug!(block_length, "signal synchronizer started");
    }

    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop.store(true, Ordering::Release);
            let _ = worker.handle.join();
            debug!("signal synchronizer stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl Drop for DigitalSignalSynchronizer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_roundtrip_deinterleaves_stereo() {
        let (mut handle, mut buffer) = capture_pair(SourceFormat::new(44100.0, 2), 16);
        handle.write(&[0.1, 0.2, 0.3, 0.4]);

        let (mut left, mut right) = (Vec::new(), Vec::new());
        let frames = buffer.read_frames(&mut left, &mut right);
        assert_eq!(frames, 2);
        assert_eq!(left, vec![0.1, 0.3]);
        assert_eq!(right, vec![0.2, 0.4]);
    }

    #[test]
    fn test_capture_duplicates_mono_into_both_channels() {
        let (mut handle, mut buffer) = capture_pair(SourceFormat::new(44100.0, 1), 16);
        handle.write(&[0.5, -0.5]);

        let (mut left, mut right) = (Vec::new(), Vec::new());
        buffer.read_frames(&mut left, &mut right);
        assert_eq!(left, right);
        assert_eq!(left, vec![0.5, -0.5]);
    }

    #[test]
    fn test_capture_drops_overflow_without_blocking() {
        let (mut handle, mut buffer) = capture_pair(SourceFormat::new(44100.0, 2), 2);
        handle.write(&[1.0; 16]);

        let (mut left, mut right) = (Vec::new(), Vec::new());
        assert_eq!(buffer.read_frames(&mut left, &mut right), 2);
    }

    #[test]
    fn test_pump_skips_tick_while_paused() {
        let (mut handle, buffer) = capture_pair(SourceFormat::default(), 64);
        handle.write(&[1.0, 1.0]);

        let mut pump = Pump::new(buffer, 8);
        assert!(pump.tick().is_none());

        handle.set_playing(true);
        assert!(pump.tick().is_some());
    }

    #[test]
    fn test_pump_slides_newest_samples_to_block_end() {
        let (mut handle, buffer) = capture_pair(SourceFormat::default(), 64);
        handle.set_playing(true);
        let mut pump = Pump::new(buffer, 4);

        handle.write(&[0.1, 0.1, 0.2, 0.2]);
        let block = pump.tick().unwrap();
        assert_eq!(block.left, vec![0.0, 0.0, 0.1, 0.2]);

        handle.write(&[0.3, 0.3, 0.4, 0.4, 0.5, 0.5]);
        let block = pump.tick().unwrap();
        assert_eq!(block.left, vec![0.2, 0.3, 0.4, 0.5]);
        assert_eq!(block.right, vec![0.2, 0.3, 0.4, 0.5]);
    }

    #[test]
    fn test_pump_reports_idle_tick_with_no_new_frames() {
        let (handle, buffer) = capture_pair(SourceFormat::default(), 64);
        handle.set_playing(true);
        let mut pump = Pump::new(buffer, 4);
        assert!(pump.tick().is_none());
    }

    struct CountingProcessor {
        inits: Arc<std::sync::atomic::AtomicUsize>,
    }

    impl SignalProcessor for CountingProcessor {
        fn init(&mut self, block_length: usize, format: &SourceFormat) {
            assert_eq!(block_length, 8);
            assert_eq!(format.channels, 2);
            self.inits.fetch_add(1, Ordering::SeqCst);
        }

        fn process(&mut self, _block: &AudioBlock) {}
    }

    #[test]
    fn test_start_initializes_registered_processors() {
        let (_handle, buffer) = capture_pair(SourceFormat::default(), 64);
        let inits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let processor: Arc<Mutex<dyn SignalProcessor>> = Arc::new(Mutex::new(CountingProcessor {
            inits: Arc::clone(&inits),
        }));

        let mut dss = DigitalSignalSynchronizer::new(8);
        dss.add(Arc::clone(&processor));
        dss.start(buffer);
        assert!(dss.is_running());
        assert_eq!(inits.load(Ordering::SeqCst), 1);
        dss.stop();
        assert!(!dss.is_running());

        dss.remove(&processor);
    }

    #[test]
    fn test_processor_added_while_running_is_initialized() {
        let (_handle, buffer) = capture_pair(SourceFormat::default(), 64);
        let mut dss = DigitalSignalSynchronizer::new(8);
        dss.start(buffer);

        let inits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let processor: Arc<Mutex<dyn SignalProcessor>> = Arc::new(Mutex::new(CountingProcessor {
            inits: Arc::clone(&inits),
        }));
        dss.add(Arc::clone(&processor));
        assert_eq!(inits.load(Ordering::SeqCst), 1);
        dss.stop();
    }
}
