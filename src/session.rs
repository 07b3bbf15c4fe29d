//! Session controller: per-frame state update and user commands.
//!
//! A [`Session`] owns everything that outlives a single frame: the avatar
//! state, the feature toggles, the rolling frame rate and the recorder.
//! The run loop feeds it one [`LandmarkFrame`] and at most one command per
//! iteration.

use crate::{
    compositor::StatusView,
    config::{Config, EmotionConfig, FeatureConfig, KeyConfig, UiConfig},
    constants::WRIST,
    emotion::{classify_emotion, EmotionInputs},
    features::extract_face_features,
    fps::FpsWindow,
    gesture::classify_gesture,
    landmarks::{FaceLandmarks, HandLandmarks, HandSide, LandmarkFrame, PerceptionRequest},
    recording::{Recorder, SinkFactory, VideoSink},
    state::{AvatarState, FaceObservation, HandReading},
    style::{AvatarStyle, Palette},
    utils::safe_cast::trunc_px,
    Result,
};
use chrono::Local;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::time::Duration;

/// A single user command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    ToggleMesh,
    ToggleHands,
    ToggleBackground,
    ToggleRecording,
    SelectStyle(AvatarStyle),
}

impl Command {
    /// Look up the command bound to a key, ignoring case
    #[must_use]
    pub fn from_key(key: char, keys: &KeyConfig) -> Option<Self> {
        let key = key.to_ascii_lowercase();
        let is = |bound: char| bound.to_ascii_lowercase() == key;

        if is(keys.quit) {
            Some(Command::Quit)
        } else if is(keys.toggle_mesh) {
            Some(Command::ToggleMesh)
        } else if is(keys.toggle_hands) {
            Some(Command::ToggleHands)
        } else if is(keys.toggle_background) {
            Some(Command::ToggleBackground)
        } else if is(keys.toggle_record) {
            Some(Command::ToggleRecording)
        } else {
            keys.styles
                .iter()
                .zip(AvatarStyle::ALL)
                .find(|(bound, _)| is(**bound))
                .map(|(_, style)| Command::SelectStyle(style))
        }
    }
}

/// Feature switches flipped by user commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggles {
    pub show_mesh: bool,
    pub hand_tracking: bool,
    pub background_removal: bool,
    pub show_debug: bool,
}

impl Toggles {
    #[must_use]
    pub fn from_ui(ui: &UiConfig) -> Self {
        Self {
            show_mesh: ui.show_mesh,
            hand_tracking: ui.hand_tracking,
            background_removal: ui.background_removal,
            show_debug: ui.show_debug,
        }
    }

    /// Upstream detectors needed for the current toggles
    #[must_use]
    pub fn perception_request(&self) -> PerceptionRequest {
        PerceptionRequest {
            hands: self.hand_tracking,
            segmentation: self.background_removal,
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "ON"
    } else {
        "OFF"
    }
}

/// Infer pose, openness and emotion from one face
///
/// Emotion is classified from this frame's scaled openness values, so a
/// face observation is always self-consistent.
///
/// # Errors
///
/// Returns an error if the mesh lacks a landmark the extractor needs
pub fn observe_face(
    face: &FaceLandmarks,
    image_width: u32,
    image_height: u32,
    features: &FeatureConfig,
    emotion: &EmotionConfig,
) -> Result<FaceObservation> {
    let measured = extract_face_features(face, image_width, image_height)?;
    let eye_open = measured.eye_openness(features);
    let mouth_open = measured.mouth_openness(features);

    let inputs = EmotionInputs {
        smile_ratio: measured.smile_ratio,
        mouth_open,
        brow_height: measured.brow_height,
        eye_open,
    };

    Ok(FaceObservation {
        pose: measured.pose,
        eye_open,
        mouth_open,
        emotion: classify_emotion(&inputs, emotion),
    })
}

/// Wrist position in source pixels and the hand's gesture
#[must_use]
pub fn observe_hand(hand: &HandLandmarks, image_width: u32, image_height: u32) -> HandReading {
    let (x, y) = hand.point(WRIST).to_pixels(image_width, image_height);
    HandReading {
        position: (trunc_px(x), trunc_px(y)),
        gesture: classify_gesture(hand),
    }
}

/// Owns the avatar state and all frame-to-frame bookkeeping
pub struct Session<S: VideoSink> {
    config: Config,
    state: AvatarState,
    toggles: Toggles,
    fps: FpsWindow,
    recorder: Recorder<S>,
    face_detected: bool,
    running: bool,
}

impl<S: VideoSink> Session<S> {
    #[must_use]
    pub fn new(config: Config, style: AvatarStyle) -> Self {
        info!("Session started with {} style", style.title());
        Self {
            state: AvatarState::new(style),
            toggles: Toggles::from_ui(&config.ui),
            fps: FpsWindow::new(config.performance.fps_history),
            recorder: Recorder::new(config.recording.clone()),
            face_detected: false,
            running: true,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &AvatarState {
        &self.state
    }

    #[must_use]
    pub fn toggles(&self) -> Toggles {
        self.toggles
    }

    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps.fps()
    }

    #[must_use]
    pub fn recorder(&self) -> &Recorder<S> {
        &self.recorder
    }

    /// Whether the last frame contained a usable face
    #[must_use]
    pub fn face_detected(&self) -> bool {
        self.face_detected
    }

    /// False once a quit command has been handled
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn perception_request(&self) -> PerceptionRequest {
        self.toggles.perception_request()
    }

    /// Palette of the active style
    #[must_use]
    pub fn palette(&self) -> Palette {
        self.config.palette(self.state.style)
    }

    /// Merge one frame's detections into the avatar state
    ///
    /// Returns whether a face was detected. A face whose mesh is missing
    /// required points is logged and treated as absent.
    pub fn update(&mut self, frame: &LandmarkFrame) -> bool {
        let face = frame.face.as_ref().and_then(|face| {
            observe_face(
                face,
                frame.image_width,
                frame.image_height,
                &self.config.features,
                &self.config.emotion,
            )
            .map_err(|e| warn!("Ignoring face: {e}"))
            .ok()
        });
        self.face_detected = face.is_some();
        if let Some(observation) = &face {
            debug!(
                "Face: pitch {:.1} yaw {:.1} roll {:.1}, eyes {:.2}/{:.2}, mouth {:.2}, {}",
                observation.pose.pitch,
                observation.pose.yaw,
                observation.pose.roll,
                observation.eye_open[0],
                observation.eye_open[1],
                observation.mouth_open,
                observation.emotion
            );
        }
        self.state.apply_face(face);

        let readings: BTreeMap<HandSide, HandReading> = if self.toggles.hand_tracking {
            frame
                .hands
                .iter()
                .map(|(side, hand)| (*side, observe_hand(hand, frame.image_width, frame.image_height)))
                .collect()
        } else {
            BTreeMap::new()
        };
        self.state.apply_hands(&readings);

        self.face_detected
    }

    /// Apply a user command
    ///
    /// `canvas_size` and `factory` are only used when a recording starts.
    ///
    /// # Errors
    ///
    /// Returns an error if a recording cannot be started or finalized; the
    /// session stays usable and idle in that case
    pub fn handle_command<F>(&mut self, command: Command, factory: &mut F, canvas_size: (u32, u32)) -> Result<()>
    where
        F: SinkFactory<Sink = S>,
    {
        match command {
            Command::Quit => {
                info!("Quit requested");
                self.running = false;
            }
            Command::ToggleMesh => {
                self.toggles.show_mesh = !self.toggles.show_mesh;
                info!("Face mesh: {}", on_off(self.toggles.show_mesh));
            }
            Command::ToggleHands => {
                self.toggles.hand_tracking = !self.toggles.hand_tracking;
                if !self.toggles.hand_tracking {
                    self.state.apply_hands(&BTreeMap::new());
                }
                info!("Hand tracking: {}", on_off(self.toggles.hand_tracking));
            }
            Command::ToggleBackground => {
                self.toggles.background_removal = !self.toggles.background_removal;
                info!("Background removal: {}", on_off(self.toggles.background_removal));
            }
            Command::ToggleRecording => {
                if self.recorder.is_recording() {
                    self.recorder.stop()?;
                } else {
                    self.recorder.start(factory, canvas_size, Local::now())?;
                }
            }
            Command::SelectStyle(style) => {
                self.state.style = style;
                info!("Avatar style: {}", style.title());
            }
        }
        Ok(())
    }

    /// Append the composited canvas to the active recording, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the sink rejects the frame
    pub fn record_frame(&mut self, canvas: &S::Canvas) -> Result<()> {
        self.recorder.write(canvas)
    }

    /// Account one loop iteration's wall-clock time
    pub fn finish_frame(&mut self, frame_time: Duration) {
        self.fps.record(frame_time);
    }

    /// Facts for the status panel
    #[must_use]
    pub fn status(&self) -> StatusView {
        StatusView {
            face_detected: self.face_detected,
            hand_tracking: self.toggles.hand_tracking,
            hands_visible: self.state.any_hand_visible(),
            background_removal: self.toggles.background_removal,
            recording_elapsed: self.recorder.elapsed(),
            style: self.state.style,
        }
    }

    /// Finalize any active recording
    ///
    /// # Errors
    ///
    /// Returns an error if the sink fails to finalize
    pub fn shutdown(&mut self) -> Result<()> {
        self.running = false;
        self.recorder.stop().map(|_| ())
    }
}
