//! Recording state machine.
//!
//! `Idle --start--> Recording` opens a sink through a [`SinkFactory`];
//! `Recording --stop--> Idle` finalizes it. Starting while recording and
//! stopping while idle are no-ops. While recording, every composited
//! canvas is written before the loop moves on, so the number of frames in
//! the file equals the number of iterations spent recording.

use crate::{config::RecordingConfig, Error, Result};
use chrono::{DateTime, Local};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Recording state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
}

/// Fixed parameters of an output video
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSpec {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub codec: [char; 4],
}

impl RecordingSpec {
    /// Build a spec for a canvas of the given size
    ///
    /// # Errors
    ///
    /// Returns an error if the configured codec is not four characters
    pub fn new(config: &RecordingConfig, width: u32, height: u32) -> Result<Self> {
        let chars: Vec<char> = config.codec.chars().collect();
        let codec: [char; 4] = chars
            .try_into()
            .map_err(|_| Error::ConfigError(format!("Codec '{}' is not a four character code", config.codec)))?;

        Ok(Self {
            width,
            height,
            fps: config.fps,
            codec,
        })
    }
}

/// Destination for composited frames
pub trait VideoSink {
    type Canvas;

    /// Append one frame
    fn write_frame(&mut self, canvas: &Self::Canvas) -> Result<()>;

    /// Flush and close the output
    fn finalize(&mut self) -> Result<()>;
}

/// Opens sinks for new recordings
pub trait SinkFactory {
    type Sink: VideoSink;

    /// Where a recording named `path` actually lands on disk
    fn output_path(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }

    fn open(&mut self, path: &Path, spec: &RecordingSpec) -> Result<Self::Sink>;
}

/// Output path for a recording started at `now`
#[must_use]
pub fn recording_path(config: &RecordingConfig, now: DateTime<Local>) -> PathBuf {
    config.output_dir.join(now.format(&config.filename_pattern).to_string())
}

/// First of `path`, `stem_1.ext`, `stem_2.ext`, ... that does not exist yet
///
/// Two recordings started within the same second share a timestamp, so the
/// second one gets a counter instead of overwriting the first.
#[must_use]
pub fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());
    (1_u32..)
        .map(|n| {
            let name = match &extension {
                Some(ext) => format!("{stem}_{n}.{ext}"),
                None => format!("{stem}_{n}"),
            };
            path.with_file_name(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Owns the active sink and the recording bookkeeping
pub struct Recorder<S: VideoSink> {
    config: RecordingConfig,
    sink: Option<S>,
    path: Option<PathBuf>,
    started_at: Option<Instant>,
    frames_written: u64,
}

impl<S: VideoSink> Recorder<S> {
    #[must_use]
    pub fn new(config: RecordingConfig) -> Self {
        Self {
            config,
            sink: None,
            path: None,
            started_at: None,
            frames_written: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> RecordingState {
        if self.sink.is_some() {
            RecordingState::Recording
        } else {
            RecordingState::Idle
        }
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.sink.is_some()
    }

    /// Start a recording, returning the new file's path
    ///
    /// Returns `Ok(None)` without touching the open sink when already
    /// recording.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot be opened; the state stays idle
    pub fn start<F>(&mut self, factory: &mut F, canvas_size: (u32, u32), now: DateTime<Local>) -> Result<Option<PathBuf>>
    where
        F: SinkFactory<Sink = S>,
    {
        if self.is_recording() {
            return Ok(None);
        }

        let spec = RecordingSpec::new(&self.config, canvas_size.0, canvas_size.1)?;
        let path = unique_path(&factory.output_path(&recording_path(&self.config, now)));
        let sink = factory.open(&path, &spec)?;

        info!(
            "Recording started: {} ({}x{} @ {} fps)",
            path.display(),
            spec.width,
            spec.height,
            spec.fps
        );
        self.sink = Some(sink);
        self.path = Some(path.clone());
        self.started_at = Some(Instant::now());
        self.frames_written = 0;

        Ok(Some(path))
    }

    /// Stop the active recording; returns whether one was stopped
    ///
    /// # Errors
    ///
    /// Returns an error if finalizing the sink fails; the recorder is idle
    /// afterwards either way
    pub fn stop(&mut self) -> Result<bool> {
        let Some(mut sink) = self.sink.take() else {
            return Ok(false);
        };
        let path = self.path.take();
        self.started_at = None;

        let result = sink.finalize();
        info!(
            "Recording stopped: {} ({} frames)",
            path.as_deref().map_or_else(|| "<unknown>".into(), Path::to_string_lossy),
            self.frames_written
        );
        result.map(|()| true)
    }

    /// Append a frame when recording, otherwise do nothing
    ///
    /// # Errors
    ///
    /// Returns an error if the sink rejects the frame
    pub fn write(&mut self, canvas: &S::Canvas) -> Result<()> {
        if let Some(sink) = self.sink.as_mut() {
            sink.write_frame(canvas)?;
            self.frames_written += 1;
        }
        Ok(())
    }

    /// Time since the active recording started
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|start| start.elapsed())
    }

    /// Frames written to the active (or last) recording
    #[must_use]
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl<S: VideoSink> Drop for Recorder<S> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to finalize recording on shutdown: {e}");
        }
    }
}
