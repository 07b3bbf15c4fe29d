//! Rule-based hand gesture classification.
//!
//! A finger counts as extended when its tip sits strictly above its base
//! joint in image space, which holds for an upright hand with the fingers
//! pointing up. The thumb is not used.

use crate::{
    constants::{INDEX_BASE, INDEX_TIP, MIDDLE_BASE, MIDDLE_TIP, PINKY_BASE, PINKY_TIP, RING_BASE, RING_TIP},
    landmarks::HandLandmarks,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete hand shape label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gesture {
    #[default]
    None,
    Peace,
    Open,
    Fist,
    Point,
}

impl Gesture {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Gesture::None => "none",
            Gesture::Peace => "peace",
            Gesture::Open => "open",
            Gesture::Fist => "fist",
            Gesture::Point => "point",
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extension state of the four non-thumb fingers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerExtension {
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerExtension {
    /// Read finger extension from a hand's landmarks
    #[must_use]
    pub fn from_hand(hand: &HandLandmarks) -> Self {
        let extended = |tip: usize, base: usize| hand.point(tip).y < hand.point(base).y;

        Self {
            index: extended(INDEX_TIP, INDEX_BASE),
            middle: extended(MIDDLE_TIP, MIDDLE_BASE),
            ring: extended(RING_TIP, RING_BASE),
            pinky: extended(PINKY_TIP, PINKY_BASE),
        }
    }
}

/// One classification rule: a label and the predicate selecting it
#[derive(Clone, Copy)]
pub struct GestureRule {
    pub label: Gesture,
    pub matches: fn(&FingerExtension) -> bool,
}

impl fmt::Debug for GestureRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureRule").field("label", &self.label).finish_non_exhaustive()
    }
}

/// Ordered rule table; `Peace` and `Open` come before the looser `Point`
pub const GESTURE_RULES: [GestureRule; 4] = [
    GestureRule {
        label: Gesture::Peace,
        matches: |f| f.index && f.middle && !f.ring && !f.pinky,
    },
    GestureRule {
        label: Gesture::Open,
        matches: |f| f.index && f.middle && f.ring && f.pinky,
    },
    GestureRule {
        label: Gesture::Fist,
        matches: |f| !f.index && !f.middle && !f.ring && !f.pinky,
    },
    GestureRule {
        label: Gesture::Point,
        matches: |f| f.index && !f.middle,
    },
];

/// Classify a finger extension pattern, first match wins
#[must_use]
pub fn classify_fingers(fingers: &FingerExtension) -> Gesture {
    GESTURE_RULES
        .iter()
        .find(|rule| (rule.matches)(fingers))
        .map_or(Gesture::None, |rule| rule.label)
}

/// Classify one hand
#[must_use]
pub fn classify_gesture(hand: &HandLandmarks) -> Gesture {
    classify_fingers(&FingerExtension::from_hand(hand))
}
