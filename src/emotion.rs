//! Rule-based emotion classification.
//!
//! Rules are evaluated top to bottom and the first match wins, so the order
//! of [`EMOTION_RULES`] is part of the behavior: a wide open smile is
//! `Happy` before it can be `Surprised`, and an open mouth with raised
//! brows is `Surprised` before it can be `Angry`.

use crate::config::EmotionConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete emotion label shown by the avatar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    #[default]
    Neutral,
    Happy,
    Surprised,
    Angry,
    Sleepy,
}

impl Emotion {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Surprised => "surprised",
            Emotion::Angry => "angry",
            Emotion::Sleepy => "sleepy",
        }
    }

    /// Emotions that get blush marks on the cheeks
    #[must_use]
    pub fn shows_blush(self) -> bool {
        matches!(self, Emotion::Happy | Emotion::Surprised)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the emotion rules look at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionInputs {
    pub smile_ratio: f64,
    /// Scaled mouth openness of the current frame
    pub mouth_open: f64,
    pub brow_height: f64,
    /// Scaled eye openness of the current frame
    pub eye_open: [f64; 2],
}

/// One classification rule: a label and the predicate selecting it
#[derive(Clone, Copy)]
pub struct EmotionRule {
    pub label: Emotion,
    pub matches: fn(&EmotionInputs, &EmotionConfig) -> bool,
}

impl fmt::Debug for EmotionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmotionRule").field("label", &self.label).finish_non_exhaustive()
    }
}

/// Ordered rule table; anything unmatched is neutral
pub const EMOTION_RULES: [EmotionRule; 4] = [
    EmotionRule {
        label: Emotion::Happy,
        matches: |inputs, config| inputs.smile_ratio > config.smile_threshold,
    },
    EmotionRule {
        label: Emotion::Surprised,
        matches: |inputs, config| inputs.mouth_open > config.surprised_threshold,
    },
    EmotionRule {
        label: Emotion::Angry,
        matches: |inputs, config| inputs.brow_height < config.angry_threshold,
    },
    EmotionRule {
        label: Emotion::Sleepy,
        matches: |inputs, config| inputs.eye_open.iter().all(|&eye| eye < config.sleepy_threshold),
    },
];

/// Classify with the default rule table
#[must_use]
pub fn classify_emotion(inputs: &EmotionInputs, config: &EmotionConfig) -> Emotion {
    classify_with(&EMOTION_RULES, inputs, config)
}

/// Classify with an explicit rule table, first match wins
#[must_use]
pub fn classify_with(rules: &[EmotionRule], inputs: &EmotionInputs, config: &EmotionConfig) -> Emotion {
    rules
        .iter()
        .find(|rule| (rule.matches)(inputs, config))
        .map_or(Emotion::Neutral, |rule| rule.label)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neutral_inputs() -> EmotionInputs {
        EmotionInputs {
            smile_ratio: 3.0,
            mouth_open: 0.1,
            brow_height: 0.01,
            eye_open: [0.9, 0.9],
        }
    }

    #[test]
    fn test_neutral_when_nothing_matches() {
        assert_eq!(classify_emotion(&neutral_inputs(), &EmotionConfig::default()), Emotion::Neutral);
    }

    #[test]
    fn test_each_rule_alone() {
        let config = EmotionConfig::default();

        let happy = EmotionInputs {
            smile_ratio: 7.0,
            ..neutral_inputs()
        };
        assert_eq!(classify_emotion(&happy, &config), Emotion::Happy);

        let surprised = EmotionInputs {
            mouth_open: 0.7,
            ..neutral_inputs()
        };
        assert_eq!(classify_emotion(&surprised, &config), Emotion::Surprised);

        let angry = EmotionInputs {
            brow_height: -0.05,
            ..neutral_inputs()
        };
        assert_eq!(classify_emotion(&angry, &config), Emotion::Angry);

        let sleepy = EmotionInputs {
            eye_open: [0.2, 0.1],
            ..neutral_inputs()
        };
        assert_eq!(classify_emotion(&sleepy, &config), Emotion::Sleepy);
    }

    #[test]
    fn test_happy_precedes_surprised() {
        let inputs = EmotionInputs {
            smile_ratio: 7.0,
            mouth_open: 0.9,
            ..neutral_inputs()
        };
        assert_eq!(classify_emotion(&inputs, &EmotionConfig::default()), Emotion::Happy);
    }

    #[test]
    fn test_surprised_precedes_angry() {
        let inputs = EmotionInputs {
            mouth_open: 0.9,
            brow_height: -0.1,
            ..neutral_inputs()
        };
        assert_eq!(classify_emotion(&inputs, &EmotionConfig::default()), Emotion::Surprised);
    }

    #[test]
    fn test_sleepy_needs_both_eyes() {
        let inputs = EmotionInputs {
            eye_open: [0.1, 0.8],
            ..neutral_inputs()
        };
        assert_eq!(classify_emotion(&inputs, &EmotionConfig::default()), Emotion::Neutral);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let config = EmotionConfig::default();
        let at_threshold = EmotionInputs {
            smile_ratio: config.smile_threshold,
            mouth_open: config.surprised_threshold,
            ..neutral_inputs()
        };
        assert_eq!(classify_emotion(&at_threshold, &config), Emotion::Neutral);
    }

    #[test]
    fn test_thresholds_come_from_config() {
        let config = EmotionConfig {
            smile_threshold: 2.0,
            ..EmotionConfig::default()
        };
        assert_eq!(classify_emotion(&neutral_inputs(), &config), Emotion::Happy);
    }

    #[test]
    fn test_custom_rule_order() {
        let reversed: Vec<EmotionRule> = EMOTION_RULES.iter().rev().copied().collect();
        let inputs = EmotionInputs {
            smile_ratio: 7.0,
            eye_open: [0.1, 0.1],
            ..neutral_inputs()
        };
        let config = EmotionConfig::default();
        assert_eq!(classify_emotion(&inputs, &config), Emotion::Happy);
        assert_eq!(classify_with(&reversed, &inputs, &config), Emotion::Sleepy);
    }
}
