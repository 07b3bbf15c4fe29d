//! Constants used throughout the application

/// Number of points reported for one hand
pub const NUM_HAND_LANDMARKS: usize = 21;

/// Face mesh indices of the first eye contour, ordered
/// outer corner, upper lid x2, inner corner, lower lid x2
pub const LEFT_EYE_INDICES: [usize; 6] = [33, 160, 158, 133, 153, 144];

/// Face mesh indices of the second eye contour, same ordering convention
pub const RIGHT_EYE_INDICES: [usize; 6] = [362, 385, 387, 263, 373, 380];

/// Inner lip points used for the vertical mouth gap
pub const UPPER_INNER_LIP: usize = 13;
pub const LOWER_INNER_LIP: usize = 14;

/// Mouth corners used for the horizontal mouth width
pub const LEFT_MOUTH_CORNER: usize = 61;
pub const RIGHT_MOUTH_CORNER: usize = 291;

/// Head pose reference points
pub const NOSE_TIP: usize = 4;
pub const CHIN: usize = 152;
pub const LEFT_EYE_OUTER: usize = 33;
pub const RIGHT_EYE_OUTER: usize = 263;

/// Eyebrow and nose bridge points for the brow height feature
pub const LEFT_BROW: usize = 70;
pub const RIGHT_BROW: usize = 300;
pub const NOSE_BRIDGE: usize = 6;

/// Hand landmark indices
pub const WRIST: usize = 0;
pub const INDEX_TIP: usize = 8;
pub const INDEX_BASE: usize = 5;
pub const MIDDLE_TIP: usize = 12;
pub const MIDDLE_BASE: usize = 9;
pub const RING_TIP: usize = 16;
pub const RING_BASE: usize = 13;
pub const PINKY_TIP: usize = 20;
pub const PINKY_BASE: usize = 17;

/// Bone segments of the 21 point hand skeleton
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (5, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (9, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (13, 17),
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
];

/// Head pose scaling
pub const YAW_RANGE_DEGREES: f64 = 45.0;
pub const PITCH_RANGE_DEGREES: f64 = 90.0;

/// Default output canvas
pub const CANVAS_WIDTH: u32 = 1280;
pub const CANVAS_HEIGHT: u32 = 720;

/// Default rolling FPS window capacity
pub const DEFAULT_FPS_HISTORY: usize = 30;

/// Default recording parameters
pub const DEFAULT_RECORDING_FPS: f64 = 20.0;
pub const DEFAULT_RECORDING_CODEC: &str = "mp4v";
pub const DEFAULT_RECORDING_PATTERN: &str = "vtuber_recording_%Y%m%d_%H%M%S.mp4";

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
