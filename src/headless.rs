//! Backend without a display.
//!
//! Frames come from a landmark feed alone, the canvas is a [`DrawList`] and
//! recordings are scene logs: one JSON array of draw commands per frame.
//! This runs anywhere and is what the integration tests drive.

use crate::{
    app::{FrameInput, FrameSource, PreviewPlacement, Presenter},
    canvas::{Canvas, Color, DrawList, Stroke},
    landmarks::PerceptionRequest,
    perception::JsonLinesFeed,
    recording::{RecordingSpec, SinkFactory, VideoSink},
    utils::safe_cast::dim_to_i32,
    Error, Result,
};
use log::{debug, info};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Source frame size assumed when a feed record does not carry one
pub const DEFAULT_SOURCE_SIZE: (u32, u32) = (640, 480);

const PREVIEW_PLACEHOLDER: Color = Color::bgr(20, 20, 20);

/// Frame source backed only by a landmark feed
pub struct FeedSource<R> {
    feed: JsonLinesFeed<R>,
    source_size: (u32, u32),
}

impl<R: BufRead> FeedSource<R> {
    pub fn new(feed: JsonLinesFeed<R>) -> Self {
        Self {
            feed,
            source_size: DEFAULT_SOURCE_SIZE,
        }
    }

    #[must_use]
    pub fn with_source_size(mut self, width: u32, height: u32) -> Self {
        self.source_size = (width, height);
        self
    }
}

impl<R: BufRead> FrameSource for FeedSource<R> {
    type Frame = ();

    fn acquire(&mut self, request: &PerceptionRequest) -> Result<Option<FrameInput<()>>> {
        let (width, height) = self.source_size;
        Ok(self.feed.next_frame()?.map(|landmarks| FrameInput {
            frame: (),
            landmarks: landmarks.with_default_dimensions(width, height).restricted_to(*request),
        }))
    }
}

/// Presenter that keeps the last canvas and replays scripted key presses
#[derive(Debug, Default)]
pub struct HeadlessPresenter {
    keys: VecDeque<Option<char>>,
    last: Option<DrawList>,
    shown: u64,
}

impl HeadlessPresenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One entry per frame: the key "pressed" after that frame, if any
    #[must_use]
    pub fn with_script<I: IntoIterator<Item = Option<char>>>(keys: I) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            ..Self::default()
        }
    }

    /// The most recently shown canvas
    #[must_use]
    pub fn last_canvas(&self) -> Option<&DrawList> {
        self.last.as_ref()
    }

    #[must_use]
    pub fn frames_shown(&self) -> u64 {
        self.shown
    }
}

impl Presenter for HeadlessPresenter {
    type Frame = ();
    type Canvas = DrawList;

    fn new_canvas(&mut self, width: u32, height: u32) -> Result<DrawList> {
        Ok(DrawList::new(width, height))
    }

    fn place_preview(&mut self, canvas: &mut DrawList, _frame: &mut (), placement: &PreviewPlacement<'_>) -> Result<()> {
        let color = placement.background.map_or(PREVIEW_PLACEHOLDER, |fill| fill.color);
        let bottom_right = placement
            .origin
            .offset(dim_to_i32(placement.width), dim_to_i32(placement.height));
        canvas.rectangle(placement.origin, bottom_right, color, Stroke::Filled)
    }

    fn show(&mut self, canvas: &DrawList) -> Result<()> {
        self.shown += 1;
        debug!("Frame {}: {} draw calls", self.shown, canvas.commands().len());
        self.last = Some(canvas.clone());
        Ok(())
    }

    fn poll_key(&mut self) -> Result<Option<char>> {
        Ok(self.keys.pop_front().flatten())
    }
}

/// Opens scene logs next to where a video would have gone
#[derive(Debug, Default)]
pub struct SceneLogFactory;

impl SinkFactory for SceneLogFactory {
    type Sink = SceneLogSink;

    fn output_path(&self, path: &Path) -> PathBuf {
        path.with_extension("jsonl")
    }

    fn open(&mut self, path: &Path, spec: &RecordingSpec) -> Result<SceneLogSink> {
        let path = self.output_path(path);
        let file = File::options()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| Error::RecordingError(format!("Cannot create {}: {e}", path.display())))?;
        info!("Writing scene log {} ({}x{})", path.display(), spec.width, spec.height);

        Ok(SceneLogSink {
            writer: BufWriter::new(file),
            path,
        })
    }
}

/// Writes each frame's draw commands as one JSON line
pub struct SceneLogSink {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl SceneLogSink {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VideoSink for SceneLogSink {
    type Canvas = DrawList;

    fn write_frame(&mut self, canvas: &DrawList) -> Result<()> {
        serde_json::to_writer(&mut self.writer, canvas.commands())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{canvas::DrawCommand, config::RecordingConfig, recording::Recorder};
    use chrono::Local;
    use std::io::Cursor;

    #[test]
    fn test_feed_source_fills_dimensions_and_filters() {
        let input = "{\"hands\":{}}\n";
        let mut source = FeedSource::new(JsonLinesFeed::new(Cursor::new(input))).with_source_size(320, 240);
        let request = PerceptionRequest {
            hands: false,
            segmentation: false,
        };

        let first = source.acquire(&request).unwrap().unwrap();
        assert_eq!(first.landmarks.image_width, 320);
        assert!(source.acquire(&request).unwrap().is_none());
    }

    #[test]
    fn test_scripted_keys() {
        let mut presenter = HeadlessPresenter::with_script([None, Some('s')]);
        assert_eq!(presenter.poll_key().unwrap(), None);
        assert_eq!(presenter.poll_key().unwrap(), Some('s'));
        assert_eq!(presenter.poll_key().unwrap(), None);
    }

    #[test]
    fn test_scene_log_round_trip() {
        let dir = std::env::temp_dir().join(format!("vtuber_scene_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let spec = RecordingSpec {
            width: 4,
            height: 4,
            fps: 20.0,
            codec: ['m', 'p', '4', 'v'],
        };

        let mut sink = SceneLogFactory.open(&dir.join("take.mp4"), &spec).unwrap();
        let mut canvas = DrawList::new(4, 4);
        canvas.fill(Color::WHITE).unwrap();
        sink.write_frame(&canvas).unwrap();
        sink.write_frame(&canvas).unwrap();
        sink.finalize().unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let commands: Vec<DrawCommand> = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(commands, vec![DrawCommand::Fill { color: Color::WHITE }]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_restart_within_one_second_keeps_both_logs() {
        let dir = std::env::temp_dir().join(format!("vtuber_scene_restart_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let config = RecordingConfig {
            output_dir: dir.clone(),
            ..RecordingConfig::default()
        };
        let now = Local::now();
        let mut canvas = DrawList::new(4, 4);
        canvas.fill(Color::WHITE).unwrap();

        let mut recorder = Recorder::new(config);
        let first = recorder.start(&mut SceneLogFactory, (4, 4), now).unwrap().unwrap();
        recorder.write(&canvas).unwrap();
        recorder.stop().unwrap();
        let second = recorder.start(&mut SceneLogFactory, (4, 4), now).unwrap().unwrap();
        recorder.stop().unwrap();

        assert_eq!(first.extension().and_then(|e| e.to_str()), Some("jsonl"));
        assert_ne!(first, second);
        assert_eq!(std::fs::read_to_string(&first).unwrap().lines().count(), 1);
        assert!(second.exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
