//! Wavescope - real-time audio visualizer
//!
//! Captures the default input device, runs the block synchronizer, and
//! renders the selected visualization off screen. Finished frames are
//! snapshotted to a PNG about once a second so the pipeline can run
//! headless; a windowed front end would instead consume the repaint
//! events and blit the frame slot.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::RecvTimeoutError;
use parking_lot::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wavescope_viz::{
    capture_pair, DigitalSignalSynchronizer, SelectionStore, SignalProcessor, SourceFormat,
    VisualizationPanel, DEFAULT_BLOCK_LENGTH,
};

/// Off-screen render size
const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

/// Repaint events between PNG snapshots, about one second of frames
const SNAPSHOT_EVERY: u64 = 43;

/// Persists the selected visualization in the user's config directory.
struct FileSelectionStore {
    path: PathBuf,
}

impl FileSelectionStore {
    fn in_config_dir() -> Option<Self> {
        dirs::config_dir().map(|dir| Self {
            path: dir.join("wavescope").join("visualization"),
        })
    }
}

impl SelectionStore for FileSelectionStore {
    fn load(&self) -> Option<String> {
        let name = std::fs::read_to_string(&self.path).ok()?;
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }

    fn store(&mut self, name: &str) {
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(error) = std::fs::write(&self.path, name) {
            warn!(%error, "failed to persist visualization selection");
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Optional arguments: visualization name, run time in seconds.
    let mut args = std::env::args().skip(1);
    let requested = args.next();
    let run_time = Duration::from_secs(
        args.next()
            .map(|s| s.parse().context("run time must be a number of seconds"))
            .transpose()?
            .unwrap_or(30),
    );

    // Audio capture
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .context("no audio input device found")?;
    let config = device
        .default_input_config()
        .context("failed to get audio input config")?;
    anyhow::ensure!(
        config.sample_format() == cpal::SampleFormat::F32,
        "unsupported sample format {}",
        config.sample_format()
    );
    let format = SourceFormat::new(config.sample_rate().0 as f32, config.channels());
    info!(
        device = %device.name().unwrap_or_else(|_| "unknown".into()),
        sample_rate = format.sample_rate,
        channels = format.channels,
        "capturing audio"
    );

    let (mut handle, buffer) = capture_pair(format, 4 * DEFAULT_BLOCK_LENGTH);
    handle.set_format(format);
    handle.set_playing(true);
    let stream = device
        .build_input_stream(
            &config.into(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| handle.write(data),
            |error| warn!(%error, "audio input stream error"),
            None,
        )
        .context("failed to build audio input stream")?;

    // Visualization panel
    let mut panel = VisualizationPanel::new(WIDTH, HEIGHT);
    match FileSelectionStore::in_config_dir() {
        Some(store) => panel.set_selection_store(Box::new(store)),
        None => warn!("no config directory, selection will not persist"),
    }
    if let Some(name) = requested {
        panel.show(&name, true)?;
    }
    info!(
        current = panel.current_name(),
        available = ?panel.visualization_set(),
        "visualization selected"
    );

    let frame_slot = panel.frame_slot();
    let repaint = panel.repaint_events();
    let panel: Arc<Mutex<dyn SignalProcessor>> = Arc::new(Mutex::new(panel));

    let mut dss = DigitalSignalSynchronizer::new(DEFAULT_BLOCK_LENGTH);
    dss.add(Arc::clone(&panel));
    dss.start(buffer);
    stream.play().context("failed to start audio input stream")?;

    let snapshot = std::env::temp_dir().join("wavescope.png");
    info!(path = %snapshot.display(), seconds = run_time.as_secs(), "running");

    let started = Instant::now();
    let mut frames = 0u64;
    while started.elapsed() < run_time {
        match repaint.recv_timeout(Duration::from_millis(250)) {
            Ok(()) => {
                frames += 1;
                if frames % SNAPSHOT_EVERY == 0 {
                    if let Some(frame) = frame_slot.lock().take() {
                        if let Err(error) = frame.save(&snapshot) {
                            warn!(%error, "failed to save frame snapshot");
                        }
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    dss.stop();
    drop(stream);
    info!(frames, "done");
    Ok(())
}
