//! End-to-end tests of the avatar loop on the headless backend

mod test_helpers;

use std::io::Cursor;
use std::path::{Path, PathBuf};
use test_helpers::{feed_lines, hand, scratch_dir, FaceFixture};
use vtuber_avatar::{
    app::AvatarApp,
    canvas::DrawCommand,
    config::Config,
    headless::{FeedSource, HeadlessPresenter, SceneLogFactory},
    landmarks::{HandSide, LandmarkFrame, SegmentationMask},
    perception::JsonLinesFeed,
    session::Command,
    style::AvatarStyle,
};

type HeadlessApp = AvatarApp<FeedSource<Cursor<String>>, HeadlessPresenter, SceneLogFactory>;

fn app(frames: &[LandmarkFrame], keys: Vec<Option<char>>, output_dir: &Path) -> HeadlessApp {
    let mut config = Config::default();
    config.recording.output_dir = output_dir.to_path_buf();

    let feed = JsonLinesFeed::new(Cursor::new(feed_lines(frames)));
    AvatarApp::new(
        config,
        AvatarStyle::Cute,
        FeedSource::new(feed),
        HeadlessPresenter::with_script(keys),
        SceneLogFactory,
    )
}

fn scene_logs(dir: &Path) -> Vec<PathBuf> {
    let mut logs: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "jsonl"))
        .collect();
    logs.sort();
    logs
}

fn line_count(path: &Path) -> usize {
    std::fs::read_to_string(path).unwrap().lines().count()
}

#[test]
fn test_runs_until_feed_ends() {
    let dir = scratch_dir("feed_end");
    let frames = vec![FaceFixture::default().frame(); 4];
    let mut app = app(&frames, Vec::new(), &dir);

    assert_eq!(app.run().unwrap(), 4);
    assert_eq!(app.presenter().frames_shown(), 4);
    assert!(!app.session().is_running());
    assert!(scene_logs(&dir).is_empty());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_quit_key_stops_loop() {
    let dir = scratch_dir("quit");
    let frames = vec![LandmarkFrame::default(); 5];
    let mut app = app(&frames, vec![None, Some('Q')], &dir);

    assert_eq!(app.run().unwrap(), 2);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_recorded_frames_match_recording_iterations() {
    let dir = scratch_dir("record_count");
    let frames = vec![FaceFixture::default().frame(); 6];
    // Started after frame 1, stopped after frame 4 has been written
    let keys = vec![Some('r'), None, None, Some('r'), None, None];
    let mut app = app(&frames, keys, &dir);

    assert_eq!(app.run().unwrap(), 6);

    let logs = scene_logs(&dir);
    assert_eq!(logs.len(), 1);
    assert_eq!(line_count(&logs[0]), 3);
    assert_eq!(app.session().recorder().frames_written(), 3);

    // Each line is one full composited frame
    let content = std::fs::read_to_string(&logs[0]).unwrap();
    let first: Vec<DrawCommand> = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert!(matches!(first.first(), Some(DrawCommand::Fill { .. })));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_recording_finalized_when_feed_ends() {
    let dir = scratch_dir("record_exit");
    let frames = vec![LandmarkFrame::default(); 3];
    let mut app = app(&frames, Vec::new(), &dir);

    app.apply(Command::ToggleRecording).unwrap();
    assert!(app.session().recorder().is_recording());

    assert_eq!(app.run().unwrap(), 3);
    assert!(!app.session().recorder().is_recording());

    let logs = scene_logs(&dir);
    assert_eq!(logs.len(), 1);
    assert_eq!(line_count(&logs[0]), 3);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_recording_indicator_while_recording() {
    let dir = scratch_dir("record_indicator");
    let frames = vec![LandmarkFrame::default(); 2];
    let mut app = app(&frames, vec![Some('r')], &dir);

    app.run().unwrap();
    let canvas = app.presenter().last_canvas().unwrap();
    assert!(canvas.texts().any(|text| text.starts_with("REC ")));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_style_key_switches_palette() {
    let dir = scratch_dir("style");
    let frames = vec![FaceFixture::default().frame(); 2];
    let mut app = app(&frames, vec![Some('3')], &dir);

    app.run().unwrap();
    assert_eq!(app.session().state().style, AvatarStyle::Cool);

    let canvas = app.presenter().last_canvas().unwrap();
    assert!(canvas.contains_text("Style: Cool"));
    let skin = AvatarStyle::Cool.palette().skin;
    assert!(canvas
        .commands()
        .iter()
        .any(|command| matches!(command, DrawCommand::Circle { color, .. } if *color == skin)));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_hand_toggle_ignores_reported_hands() {
    let dir = scratch_dir("hands_off");
    let with_hand =
        LandmarkFrame::empty(640, 480).with_hand(HandSide::Right, hand((0.5, 0.5), [true, true, false, false]));
    let frames = vec![with_hand; 3];
    let mut app = app(&frames, vec![None, Some('h')], &dir);

    app.run().unwrap();
    assert!(!app.session().toggles().hand_tracking);
    assert!(!app.session().state().any_hand_visible());
    assert!(!app.presenter().last_canvas().unwrap().contains_text("Hands: ON"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_background_removal_uses_fill_color() {
    let dir = scratch_dir("background");
    let mask = SegmentationMask::new(2, 2, vec![1.0, 0.0, 0.0, 1.0]).unwrap();
    let frames = vec![LandmarkFrame::empty(640, 480).with_segmentation(mask); 2];
    let mut app = app(&frames, vec![Some('b')], &dir);

    app.run().unwrap();
    let background = Config::default().background.color;
    let canvas = app.presenter().last_canvas().unwrap();
    assert!(canvas.contains_text("BG Remove: ON"));
    assert!(canvas
        .commands()
        .iter()
        .any(|command| matches!(command, DrawCommand::Rectangle { color, .. } if *color == background)));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_malformed_feed_line_is_an_empty_frame() {
    let dir = scratch_dir("malformed");
    let mut config = Config::default();
    config.recording.output_dir = dir.clone();

    let input = format!(
        "{}not json\n{}",
        feed_lines(&[FaceFixture::default().frame()]),
        feed_lines(&[LandmarkFrame::default()])
    );
    let mut app = AvatarApp::new(
        config,
        AvatarStyle::Anime,
        FeedSource::new(JsonLinesFeed::new(Cursor::new(input))),
        HeadlessPresenter::new(),
        SceneLogFactory,
    );

    assert_eq!(app.run().unwrap(), 3);
    assert!(!app.session().face_detected());
    assert!(app.presenter().last_canvas().unwrap().contains_text("No Face"));

    std::fs::remove_dir_all(&dir).unwrap();
}
