//! Persistent avatar state and its per-frame update rules.
//!
//! Face-driven fields are [`Latched`]: a frame without a face leaves them
//! untouched so detector dropouts do not make the avatar snap. Hand-driven
//! fields are [`Transient`]: they reflect the current frame only, so a hand
//! that leaves the picture disappears immediately.

use crate::{emotion::Emotion, features::HeadPose, gesture::Gesture, landmarks::HandSide, style::AvatarStyle};
use std::collections::BTreeMap;
use std::ops::Deref;

/// Keeps the last observed value when no new observation arrives
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Latched<T>(T);

impl<T> Latched<T> {
    pub const fn new(initial: T) -> Self {
        Self(initial)
    }

    /// Replace the value only when something was observed
    pub fn observe(&mut self, value: Option<T>) {
        if let Some(value) = value {
            self.0 = value;
        }
    }
}

impl<T> Deref for Latched<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// Holds only the current frame's observation
///
/// Absence is part of `T` (usually an `Option`), so a frame that saw
/// nothing overwrites the previous value with that absence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transient<T>(T);

impl<T> Transient<T> {
    /// Replace the value unconditionally
    pub fn observe(&mut self, value: T) {
        self.0 = value;
    }
}

impl<T> Deref for Transient<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// Where one hand is and what it is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandReading {
    /// Wrist position in source-frame pixels
    pub position: (i32, i32),
    pub gesture: Gesture,
}

/// Everything inferred from one face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceObservation {
    pub pose: HeadPose,
    pub eye_open: [f64; 2],
    pub mouth_open: f64,
    pub emotion: Emotion,
}

/// Avatar parameters carried across frames
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarState {
    pub head_rotation: Latched<HeadPose>,
    pub eye_open: Latched<[f64; 2]>,
    pub mouth_open: Latched<f64>,
    pub emotion: Latched<Emotion>,
    pub left_hand: Transient<Option<HandReading>>,
    pub right_hand: Transient<Option<HandReading>>,
    /// Changed only by explicit style commands
    pub style: AvatarStyle,
}

impl AvatarState {
    #[must_use]
    pub fn new(style: AvatarStyle) -> Self {
        Self {
            head_rotation: Latched::new(HeadPose::default()),
            eye_open: Latched::new([1.0, 1.0]),
            mouth_open: Latched::new(0.0),
            emotion: Latched::new(Emotion::Neutral),
            left_hand: Transient::default(),
            right_hand: Transient::default(),
            style,
        }
    }

    /// Merge a face observation; `None` keeps every face field as it was
    pub fn apply_face(&mut self, face: Option<FaceObservation>) {
        self.head_rotation.observe(face.map(|f| f.pose));
        self.eye_open.observe(face.map(|f| f.eye_open));
        self.mouth_open.observe(face.map(|f| f.mouth_open));
        self.emotion.observe(face.map(|f| f.emotion));
    }

    /// Merge this frame's hand readings; a side without a reading is cleared
    pub fn apply_hands(&mut self, readings: &BTreeMap<HandSide, HandReading>) {
        self.left_hand.observe(readings.get(&HandSide::Left).copied());
        self.right_hand.observe(readings.get(&HandSide::Right).copied());
    }

    #[must_use]
    pub fn hand(&self, side: HandSide) -> Option<HandReading> {
        match side {
            HandSide::Left => *self.left_hand,
            HandSide::Right => *self.right_hand,
        }
    }

    #[must_use]
    pub fn hand_position(&self, side: HandSide) -> Option<(i32, i32)> {
        self.hand(side).map(|hand| hand.position)
    }

    /// Gesture of a hand, `Gesture::None` when the hand is absent
    #[must_use]
    pub fn hand_gesture(&self, side: HandSide) -> Gesture {
        self.hand(side).map_or(Gesture::None, |hand| hand.gesture)
    }

    #[must_use]
    pub fn any_hand_visible(&self) -> bool {
        self.left_hand.is_some() || self.right_hand.is_some()
    }
}

impl Default for AvatarState {
    fn default() -> Self {
        Self::new(AvatarStyle::default())
    }
}
