//! Helper functions and fixtures for tests
#![allow(dead_code)]

use vtuber_avatar::{
    constants::{
        LEFT_BROW, LEFT_EYE_INDICES, LEFT_MOUTH_CORNER, LOWER_INNER_LIP, NOSE_BRIDGE, NUM_HAND_LANDMARKS,
        RIGHT_BROW, RIGHT_EYE_INDICES, RIGHT_MOUTH_CORNER, UPPER_INNER_LIP, WRIST,
    },
    landmarks::{FaceLandmarks, HandLandmarks, Landmark, LandmarkFrame},
};

/// Points in a full face mesh with iris refinement
pub const FACE_MESH_POINTS: usize = 478;

const EYE_WIDTH: f64 = 0.1;
const EYE_LINE_Y: f64 = 0.4;
const MOUTH_WIDTH: f64 = 0.1;
const MOUTH_LINE_Y: f64 = 0.7;

/// Shape parameters of a synthetic face
#[derive(Debug, Clone, Copy)]
pub struct FaceFixture {
    /// Eye aspect ratio of both eyes
    pub eye_ratio: f64,
    /// Inner lip gap as a fraction of the mouth width
    pub mouth_ratio: f64,
    /// Mean brow y minus nose bridge y
    pub brow_height: f64,
    /// Horizontal shift of both eyes in normalized units
    pub eye_shift: f64,
}

impl Default for FaceFixture {
    /// Open eyes, closed mouth, brows level with the nose bridge, facing forward
    fn default() -> Self {
        Self {
            eye_ratio: 0.25,
            mouth_ratio: 0.0,
            brow_height: 0.0,
            eye_shift: 0.0,
        }
    }
}

impl FaceFixture {
    /// Build the 478 point mesh
    pub fn mesh(&self) -> FaceLandmarks {
        let mut points = vec![Landmark::new(0.5, 0.5); FACE_MESH_POINTS];

        let gap = self.eye_ratio * EYE_WIDTH;
        place_eye(&mut points, LEFT_EYE_INDICES, 0.35 + self.eye_shift, gap);
        place_eye(&mut points, RIGHT_EYE_INDICES, 0.55 + self.eye_shift, gap);

        let lip_gap = self.mouth_ratio * MOUTH_WIDTH;
        points[UPPER_INNER_LIP] = Landmark::new(0.5, MOUTH_LINE_Y - lip_gap / 2.0);
        points[LOWER_INNER_LIP] = Landmark::new(0.5, MOUTH_LINE_Y + lip_gap / 2.0);
        points[LEFT_MOUTH_CORNER] = Landmark::new(0.5 - MOUTH_WIDTH / 2.0, MOUTH_LINE_Y);
        points[RIGHT_MOUTH_CORNER] = Landmark::new(0.5 + MOUTH_WIDTH / 2.0, MOUTH_LINE_Y);

        points[NOSE_BRIDGE] = Landmark::new(0.5, EYE_LINE_Y);
        points[LEFT_BROW] = Landmark::new(0.4, EYE_LINE_Y + self.brow_height);
        points[RIGHT_BROW] = Landmark::new(0.6, EYE_LINE_Y + self.brow_height);

        FaceLandmarks::new(points)
    }

    /// A 640x480 frame containing only this face
    pub fn frame(&self) -> LandmarkFrame {
        LandmarkFrame::empty(640, 480).with_face(self.mesh())
    }
}

/// Six point eye contour starting at `left`, ordered outer, upper, upper, inner, lower, lower
fn place_eye(points: &mut [Landmark], indices: [usize; 6], left: f64, gap: f64) {
    let third = EYE_WIDTH / 3.0;
    let contour = [
        Landmark::new(left, EYE_LINE_Y),
        Landmark::new(left + third, EYE_LINE_Y - gap / 2.0),
        Landmark::new(left + 2.0 * third, EYE_LINE_Y - gap / 2.0),
        Landmark::new(left + EYE_WIDTH, EYE_LINE_Y),
        Landmark::new(left + 2.0 * third, EYE_LINE_Y + gap / 2.0),
        Landmark::new(left + third, EYE_LINE_Y + gap / 2.0),
    ];
    for (index, point) in indices.into_iter().zip(contour) {
        points[index] = point;
    }
}

/// A hand with its wrist at `wrist` and the given fingers extended
///
/// Fingers are listed index, middle, ring, pinky.
pub fn hand(wrist: (f64, f64), extended: [bool; 4]) -> HandLandmarks {
    let (x, y) = wrist;
    let mut points = [Landmark::new(x, y - 0.1); NUM_HAND_LANDMARKS];
    points[WRIST] = Landmark::new(x, y);

    // (tip, base) per finger, tips sit above their base when extended
    for ((tip, base), up) in [(8, 5), (12, 9), (16, 13), (20, 17)].into_iter().zip(extended) {
        points[base] = Landmark::new(x, y - 0.1);
        points[tip] = Landmark::new(x, if up { y - 0.2 } else { y - 0.05 });
    }

    HandLandmarks::new(points)
}

/// One feed line per frame
pub fn feed_lines(frames: &[LandmarkFrame]) -> String {
    frames
        .iter()
        .map(|frame| serde_json::to_string(frame).expect("Frame should serialize") + "\n")
        .collect()
}

/// Fresh scratch directory unique to one test
pub fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("vtuber_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("Scratch directory should be creatable");
    dir
}
