//! Procedural avatar rendering.
//!
//! The compositor holds no per-frame state: everything it draws comes from
//! the [`AvatarState`], a [`Palette`] and a [`StatusView`] passed in by the
//! caller. Shapes are laid out relative to the avatar anchor, which itself
//! is shifted by the head pose so the whole face drifts with the head.
//!
//! Drawing order is fixed: background, head, blush, eyes, brows, mouth,
//! nose, hand indicators. The preview, status panel and debug overlay are
//! separate passes that the caller runs afterwards, so they always end up
//! on top of the avatar.

use crate::{
    canvas::{Canvas, Color, EllipseArc, Point, Stroke},
    config::{AvatarConfig, CanvasConfig, Config, PreviewConfig, RenderConfig, UiConfig},
    constants::HAND_CONNECTIONS,
    emotion::Emotion,
    gesture::Gesture,
    landmarks::{HandSide, LandmarkFrame},
    state::AvatarState,
    style::{AvatarStyle, Palette},
    utils::safe_cast::{dim_to_i32, trunc_px},
    Result,
};
use std::time::Duration;

// Face layout, in pixels relative to the shifted anchor
const HEAD_OUTLINE: i32 = 3;
const BLUSH_OFFSET: (i32, i32) = (70, 10);
const BLUSH_RADIUS: i32 = 15;
const EYE_SPACING: i32 = 40;
const EYE_RAISE: i32 = 20;
const EYE_HALF_WIDTH: i32 = 22;
const EYE_OUTLINE: i32 = 2;
const IRIS_RADIUS: i32 = 14;
const PUPIL_RADIUS: i32 = 8;
const HIGHLIGHT_RADIUS: i32 = 4;
const HIGHLIGHT_OFFSET: (i32, i32) = (3, -3);
const CLOSED_EYE_HALF_LENGTH: i32 = 20;
const CLOSED_EYE_THICKNESS: i32 = 3;
const BROW_AXES: (i32, i32) = (25, 8);
const BROW_RAISE: i32 = 35;
const BROW_THICKNESS: i32 = 4;
const ANGRY_BROW_LIFT: i32 = 5;
const ANGRY_BROW_TILT: f64 = -15.0;
const SURPRISED_BROW_LIFT: i32 = 10;
const MOUTH_DROP: i32 = 40;
const MOUTH_HALF_WIDTH: i32 = 50;
const CLOSED_MOUTH_HEIGHT: i32 = 5;
const HAPPY_MOUTH: (i32, i32) = (20, -10);
const CLOSED_MOUTH: (i32, i32) = (15, -5);
const HAPPY_MOUTH_THICKNESS: i32 = 4;
const CLOSED_MOUTH_THICKNESS: i32 = 3;
const MOUTH_OUTLINE: i32 = 2;
const NOSE_DROP: i32 = 5;
const NOSE_HEIGHT: i32 = 15;
const NOSE_HALF_WIDTH: i32 = 5;
const NOSE_THICKNESS: i32 = 2;

// Hand indicators
const HAND_RADIUS: i32 = 30;
const HAND_RING: i32 = 2;
const FIST_RADIUS: i32 = 15;
const LEFT_HAND_COLOR: Color = Color::bgr(100, 200, 255);
const RIGHT_HAND_COLOR: Color = Color::bgr(255, 200, 100);
const GLYPH_SCALE: f64 = 1.0;
const GLYPH_THICKNESS: i32 = 2;

// Overlays
const PREVIEW_BORDER: i32 = 2;
const MESH_POINT_RADIUS: i32 = 1;
const FACE_MESH_COLOR: Color = Color::bgr(192, 192, 192);
const HAND_MESH_COLOR: Color = Color::bgr(0, 0, 255);
const HAND_MESH_JOINT_COLOR: Color = Color::bgr(255, 255, 255);
const STATUS_X: i32 = 350;
const STATUS_Y: i32 = 30;
const STATUS_ROW: i32 = 30;
const STATUS_DOT_RADIUS: i32 = 10;
const STATUS_TEXT_OFFSET: (i32, i32) = (20, 5);
const LABEL_SCALE: f64 = 0.6;
const LABEL_THICKNESS: i32 = 2;
const RECORDING_DOT_COLOR: Color = Color::bgr(0, 0, 255);
const RECORDING_TEXT_COLOR: Color = Color::bgr(255, 0, 0);
const HELP_ORIGIN: Point = Point::new(10, 700);
const HELP_SCALE: f64 = 0.5;
const HELP_COLOR: Color = Color::bgr(200, 200, 200);
const HELP_THICKNESS: i32 = 1;
const HELP_TEXT: &str = "Q:Quit | S:Mesh | H:Hands | B:BG | R:Record | 1-4:Style";

/// Session facts shown in the status panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusView {
    pub face_detected: bool,
    pub hand_tracking: bool,
    pub hands_visible: bool,
    pub background_removal: bool,
    /// Time since recording started, `None` when idle
    pub recording_elapsed: Option<Duration>,
    pub style: AvatarStyle,
}

/// Draws the avatar and its overlays onto any [`Canvas`]
#[derive(Debug, Clone)]
pub struct Compositor {
    avatar: AvatarConfig,
    canvas: CanvasConfig,
    preview: PreviewConfig,
    render: RenderConfig,
    ui: UiConfig,
}

impl Compositor {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            avatar: config.avatar.clone(),
            canvas: config.canvas.clone(),
            preview: config.preview.clone(),
            render: config.render.clone(),
            ui: config.ui.clone(),
        }
    }

    /// Draw the full avatar: background, face and hand indicators
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas rejects a drawing call
    pub fn draw_avatar<C: Canvas>(&self, canvas: &mut C, state: &AvatarState, palette: &Palette) -> Result<()> {
        canvas.fill(self.canvas.background)?;

        let pose = *state.head_rotation;
        let emotion = *state.emotion;
        let head = self.head_center(pose.pitch, pose.yaw);

        canvas.circle(head, self.avatar.head_radius, palette.skin, Stroke::Filled)?;
        canvas.circle(head, self.avatar.head_radius, palette.skin_outline, Stroke::Outline(HEAD_OUTLINE))?;

        if emotion.shows_blush() {
            for dx in [-BLUSH_OFFSET.0, BLUSH_OFFSET.0] {
                canvas.circle(head.offset(dx, BLUSH_OFFSET.1), BLUSH_RADIUS, palette.blush, Stroke::Filled)?;
            }
        }

        let eyes = self.eye_centers(head, pose.yaw);
        let gaze = Point::new(trunc_px(pose.yaw / 2.0), trunc_px(pose.pitch / 2.0));
        for (center, openness) in eyes.into_iter().zip(*state.eye_open) {
            self.draw_eye(canvas, center, openness, emotion, gaze, palette)?;
        }

        self.draw_brows(canvas, eyes, emotion, palette)?;
        self.draw_mouth(canvas, head, *state.mouth_open, emotion, palette)?;
        self.draw_nose(canvas, head, pose.yaw, palette)?;
        self.draw_hand_indicators(canvas, state)
    }

    /// Center of the head disc, offset from the anchor by twice the pose angles
    #[must_use]
    pub fn head_center(&self, pitch: f64, yaw: f64) -> Point {
        let (x, y) = self.avatar.center;
        Point::new(x + trunc_px(yaw * 2.0), y + trunc_px(pitch * 2.0))
    }

    /// Left and right eye centers; yaw moves both eyes sideways a second time
    fn eye_centers(&self, head: Point, yaw: f64) -> [Point; 2] {
        let shift = trunc_px(yaw);
        [
            head.offset(-EYE_SPACING + shift, -EYE_RAISE),
            head.offset(EYE_SPACING + shift, -EYE_RAISE),
        ]
    }

    /// Eye half-height in pixels for an openness value
    #[must_use]
    pub fn eye_half_height(&self, openness: f64, emotion: Emotion) -> i32 {
        let multiplier = if emotion == Emotion::Surprised {
            self.render.surprised_eye_multiplier
        } else {
            1.0
        };
        trunc_px(self.render.eye_height * openness * multiplier)
    }

    fn draw_eye<C: Canvas>(
        &self,
        canvas: &mut C,
        center: Point,
        openness: f64,
        emotion: Emotion,
        gaze: Point,
        palette: &Palette,
    ) -> Result<()> {
        let half_height = self.eye_half_height(openness, emotion);

        if half_height <= self.render.closed_eye_threshold {
            return canvas.line(
                center.offset(-CLOSED_EYE_HALF_LENGTH, 0),
                center.offset(CLOSED_EYE_HALF_LENGTH, 0),
                palette.eye_outline,
                CLOSED_EYE_THICKNESS,
            );
        }

        let white = EllipseArc::full(center, (EYE_HALF_WIDTH, half_height));
        canvas.ellipse(white, palette.eye_white, Stroke::Filled)?;
        canvas.ellipse(white, palette.eye_outline, Stroke::Outline(EYE_OUTLINE))?;

        let iris = center.offset(gaze.x, gaze.y);
        canvas.circle(iris, IRIS_RADIUS, palette.iris, Stroke::Filled)?;
        canvas.circle(iris, PUPIL_RADIUS, palette.pupil, Stroke::Filled)?;
        canvas.circle(
            iris.offset(HIGHLIGHT_OFFSET.0, HIGHLIGHT_OFFSET.1),
            HIGHLIGHT_RADIUS,
            palette.highlight,
            Stroke::Filled,
        )
    }

    fn draw_brows<C: Canvas>(&self, canvas: &mut C, eyes: [Point; 2], emotion: Emotion, palette: &Palette) -> Result<()> {
        let (lift, tilt) = match emotion {
            Emotion::Angry => (ANGRY_BROW_LIFT, ANGRY_BROW_TILT),
            Emotion::Surprised => (SURPRISED_BROW_LIFT, 0.0),
            _ => (0, 0.0),
        };

        // The right brow mirrors the left one's tilt
        for (eye, rotation) in eyes.into_iter().zip([tilt, -tilt]) {
            let arc = EllipseArc::lower_half(eye.offset(0, -BROW_RAISE - lift), BROW_AXES, rotation);
            canvas.ellipse(arc, palette.brow, Stroke::Outline(BROW_THICKNESS))?;
        }
        Ok(())
    }

    /// Mouth half-height in pixels; small openings collapse to a fixed closed height
    #[must_use]
    pub fn mouth_half_height(&self, openness: f64) -> i32 {
        if openness > self.render.open_mouth_ratio {
            trunc_px(self.render.mouth_height * openness)
        } else {
            CLOSED_MOUTH_HEIGHT
        }
    }

    fn draw_mouth<C: Canvas>(
        &self,
        canvas: &mut C,
        head: Point,
        openness: f64,
        emotion: Emotion,
        palette: &Palette,
    ) -> Result<()> {
        let center = head.offset(0, MOUTH_DROP);

        if emotion == Emotion::Happy {
            let (height, dy) = HAPPY_MOUTH;
            let smile = EllipseArc::lower_half(center.offset(0, dy), (MOUTH_HALF_WIDTH, height), 0.0);
            return canvas.ellipse(smile, palette.mouth, Stroke::Outline(HAPPY_MOUTH_THICKNESS));
        }

        let half_height = self.mouth_half_height(openness);
        if half_height > self.render.open_mouth_min_height {
            let open = EllipseArc::full(center, (MOUTH_HALF_WIDTH, half_height));
            canvas.ellipse(open, palette.mouth, Stroke::Filled)?;
            canvas.ellipse(open, palette.mouth_outline, Stroke::Outline(MOUTH_OUTLINE))
        } else {
            let (height, dy) = CLOSED_MOUTH;
            let closed = EllipseArc::lower_half(center.offset(0, dy), (MOUTH_HALF_WIDTH, height), 0.0);
            canvas.ellipse(closed, palette.mouth, Stroke::Outline(CLOSED_MOUTH_THICKNESS))
        }
    }

    fn draw_nose<C: Canvas>(&self, canvas: &mut C, head: Point, yaw: f64, palette: &Palette) -> Result<()> {
        let tip = head.offset(trunc_px(yaw / 2.0), NOSE_DROP);
        let outline = [
            tip,
            tip.offset(-NOSE_HALF_WIDTH, NOSE_HEIGHT),
            tip.offset(NOSE_HALF_WIDTH, NOSE_HEIGHT),
        ];
        canvas.polyline(&outline, true, palette.nose, NOSE_THICKNESS)
    }

    /// Map a hand position from source-frame pixels onto the avatar canvas
    ///
    /// The configured source center lands on the avatar anchor and offsets
    /// from it are scaled by `hand_scale`.
    #[must_use]
    pub fn hand_to_canvas(&self, position: (i32, i32)) -> Point {
        let (anchor_x, anchor_y) = self.avatar.center;
        let (source_x, source_y) = self.preview.hand_source_center;
        let scale = self.preview.hand_scale;
        Point::new(
            anchor_x + trunc_px((f64::from(position.0) - source_x) * scale),
            anchor_y + trunc_px((f64::from(position.1) - source_y) * scale),
        )
    }

    /// Draw a disc with a gesture glyph for every hand that has a position
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas rejects a drawing call
    pub fn draw_hand_indicators<C: Canvas>(&self, canvas: &mut C, state: &AvatarState) -> Result<()> {
        for side in HandSide::ALL {
            let Some(hand) = state.hand(side) else {
                continue;
            };
            let center = self.hand_to_canvas(hand.position);
            let color = match side {
                HandSide::Left => LEFT_HAND_COLOR,
                HandSide::Right => RIGHT_HAND_COLOR,
            };

            canvas.circle(center, HAND_RADIUS, color, Stroke::Filled)?;
            canvas.circle(center, HAND_RADIUS, Color::WHITE, Stroke::Outline(HAND_RING))?;

            match hand.gesture {
                Gesture::Peace => canvas.text("V", center.offset(-10, 10), GLYPH_SCALE, Color::WHITE, GLYPH_THICKNESS)?,
                Gesture::Open => canvas.text("*", center.offset(-10, 10), GLYPH_SCALE, Color::WHITE, GLYPH_THICKNESS)?,
                Gesture::Fist => canvas.circle(center, FIST_RADIUS, Color::WHITE, Stroke::Filled)?,
                Gesture::Point => canvas.text("!", center.offset(-8, 12), GLYPH_SCALE, Color::WHITE, GLYPH_THICKNESS)?,
                Gesture::None => {}
            }
        }
        Ok(())
    }

    /// Top-left and bottom-right corners of the webcam preview
    #[must_use]
    pub fn preview_rect(&self) -> (Point, Point) {
        let (x, y) = self.preview.position;
        let top_left = Point::new(x, y);
        let bottom_right = top_left.offset(dim_to_i32(self.preview.width), dim_to_i32(self.preview.height));
        (top_left, bottom_right)
    }

    /// White frame around the webcam preview
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas rejects a drawing call
    pub fn draw_preview_border<C: Canvas>(&self, canvas: &mut C) -> Result<()> {
        let (top_left, bottom_right) = self.preview_rect();
        canvas.rectangle(top_left, bottom_right, Color::WHITE, Stroke::Outline(PREVIEW_BORDER))
    }

    /// Draw detected face and hand landmarks over the webcam preview
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas rejects a drawing call
    pub fn draw_landmark_overlay<C: Canvas>(&self, canvas: &mut C, frame: &LandmarkFrame) -> Result<()> {
        let (top_left, _) = self.preview_rect();
        let width = f64::from(self.preview.width);
        let height = f64::from(self.preview.height);
        let to_preview = |x: f64, y: f64| top_left.offset(trunc_px(x * width), trunc_px(y * height));

        if let Some(face) = &frame.face {
            for point in face.points() {
                canvas.circle(to_preview(point.x, point.y), MESH_POINT_RADIUS, FACE_MESH_COLOR, Stroke::Filled)?;
            }
        }

        for hand in frame.hands.values() {
            let joints: Vec<Point> = hand.points().iter().map(|p| to_preview(p.x, p.y)).collect();
            for &(from, to) in &HAND_CONNECTIONS {
                canvas.line(joints[from], joints[to], HAND_MESH_COLOR, 1)?;
            }
            for &joint in &joints {
                canvas.circle(joint, MESH_POINT_RADIUS + 1, HAND_MESH_JOINT_COLOR, Stroke::Filled)?;
            }
        }
        Ok(())
    }

    /// Status rows at the top of the canvas and the key help line at the bottom
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas rejects a drawing call
    pub fn draw_status<C: Canvas>(&self, canvas: &mut C, status: &StatusView) -> Result<()> {
        let ui = &self.ui;

        let (face_color, face_text) = if status.face_detected {
            (ui.active_color, "Face Detected")
        } else {
            (ui.inactive_color, "No Face")
        };
        self.status_row(canvas, 0, face_color, face_text, ui.text_color)?;

        if status.hand_tracking {
            let color = if status.hands_visible {
                ui.active_color
            } else {
                ui.disabled_color
            };
            self.status_row(canvas, 1, color, "Hands: ON", ui.text_color)?;
        }

        let (bg_color, bg_text) = if status.background_removal {
            (ui.active_color, "BG Remove: ON")
        } else {
            (ui.disabled_color, "BG Remove: OFF")
        };
        self.status_row(canvas, 2, bg_color, bg_text, ui.text_color)?;

        if let Some(elapsed) = status.recording_elapsed {
            let text = format!("REC {}s", elapsed.as_secs());
            self.status_row(canvas, 3, RECORDING_DOT_COLOR, &text, RECORDING_TEXT_COLOR)?;
        }

        canvas.text(
            &format!("Style: {}", status.style.title()),
            Point::new(STATUS_X, STATUS_Y + 4 * STATUS_ROW),
            LABEL_SCALE,
            ui.text_color,
            LABEL_THICKNESS,
        )?;

        canvas.text(HELP_TEXT, HELP_ORIGIN, HELP_SCALE, HELP_COLOR, HELP_THICKNESS)
    }

    fn status_row<C: Canvas>(&self, canvas: &mut C, row: i32, dot: Color, text: &str, text_color: Color) -> Result<()> {
        let center = Point::new(STATUS_X, STATUS_Y + row * STATUS_ROW);
        canvas.circle(center, STATUS_DOT_RADIUS, dot, Stroke::Filled)?;
        canvas.text(
            text,
            center.offset(STATUS_TEXT_OFFSET.0, STATUS_TEXT_OFFSET.1),
            LABEL_SCALE,
            text_color,
            LABEL_THICKNESS,
        )
    }

    /// Pose angles, mouth openness, emotion and frame rate as text lines
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas rejects a drawing call
    pub fn draw_debug<C: Canvas>(&self, canvas: &mut C, state: &AvatarState, fps: f64) -> Result<()> {
        let pose = *state.head_rotation;
        let lines = [
            format!("Pitch: {:.1}", pose.pitch),
            format!("Yaw: {:.1}", pose.yaw),
            format!("Roll: {:.1}", pose.roll),
            format!("Mouth: {:.2}", *state.mouth_open),
            format!("Emotion: {}", *state.emotion),
            format!("FPS: {fps:.1}"),
        ];

        let origin = Point::new(self.render.debug_origin.0, self.render.debug_origin.1);
        for (row, line) in (0..).zip(lines.iter()) {
            canvas.text(
                line,
                origin.offset(0, row * STATUS_ROW),
                LABEL_SCALE,
                self.ui.text_color,
                LABEL_THICKNESS,
            )?;
        }
        Ok(())
    }
}
