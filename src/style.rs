//! Avatar styles and their color palettes.

use crate::{canvas::Color, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four built-in avatar looks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarStyle {
    #[default]
    Cute,
    Anime,
    Cool,
    Warm,
}

impl AvatarStyle {
    /// Styles in menu order (choice 1 to 4)
    pub const ALL: [AvatarStyle; 4] = [AvatarStyle::Cute, AvatarStyle::Anime, AvatarStyle::Cool, AvatarStyle::Warm];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AvatarStyle::Cute => "cute",
            AvatarStyle::Anime => "anime",
            AvatarStyle::Cool => "cool",
            AvatarStyle::Warm => "warm",
        }
    }

    /// Capitalized name for the status panel
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            AvatarStyle::Cute => "Cute",
            AvatarStyle::Anime => "Anime",
            AvatarStyle::Cool => "Cool",
            AvatarStyle::Warm => "Warm",
        }
    }

    /// Short description shown in the startup menu
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            AvatarStyle::Cute => "Pink & Warm",
            AvatarStyle::Anime => "Blue & Vibrant",
            AvatarStyle::Cool => "Blue & Cold tones",
            AvatarStyle::Warm => "Orange & Earth tones",
        }
    }

    /// Interpret a startup menu answer, falling back to `default`
    #[must_use]
    pub fn from_menu_choice(choice: &str, default: AvatarStyle) -> AvatarStyle {
        match choice.trim() {
            "1" => AvatarStyle::Cute,
            "2" => AvatarStyle::Anime,
            "3" => AvatarStyle::Cool,
            "4" => AvatarStyle::Warm,
            _ => default,
        }
    }

    /// Built-in palette of this style
    #[must_use]
    pub fn palette(self) -> Palette {
        match self {
            AvatarStyle::Cute => Palette {
                skin: Color::bgr(255, 220, 180),
                skin_outline: Color::bgr(200, 170, 140),
                eye_white: Color::WHITE,
                eye_outline: Color::bgr(100, 100, 100),
                iris: Color::bgr(100, 150, 200),
                pupil: Color::bgr(50, 50, 50),
                mouth: Color::bgr(255, 150, 150),
                blush: Color::bgr(255, 180, 200),
                ..Palette::shared()
            },
            AvatarStyle::Anime => Palette {
                skin: Color::bgr(255, 230, 200),
                skin_outline: Color::bgr(220, 180, 150),
                eye_white: Color::WHITE,
                eye_outline: Color::bgr(50, 50, 50),
                iris: Color::bgr(50, 100, 255),
                pupil: Color::bgr(20, 20, 20),
                mouth: Color::bgr(255, 100, 100),
                blush: Color::bgr(255, 150, 180),
                ..Palette::shared()
            },
            AvatarStyle::Cool => Palette {
                skin: Color::bgr(200, 220, 255),
                skin_outline: Color::bgr(150, 170, 200),
                eye_white: Color::bgr(240, 250, 255),
                eye_outline: Color::bgr(80, 100, 120),
                iris: Color::bgr(100, 200, 255),
                pupil: Color::bgr(30, 50, 80),
                mouth: Color::bgr(180, 200, 255),
                blush: Color::bgr(200, 220, 255),
                ..Palette::shared()
            },
            AvatarStyle::Warm => Palette {
                skin: Color::bgr(255, 200, 150),
                skin_outline: Color::bgr(200, 150, 100),
                eye_white: Color::bgr(255, 250, 240),
                eye_outline: Color::bgr(120, 100, 80),
                iris: Color::bgr(150, 100, 50),
                pupil: Color::bgr(80, 50, 30),
                mouth: Color::bgr(255, 150, 100),
                blush: Color::bgr(255, 180, 150),
                ..Palette::shared()
            },
        }
    }
}

impl fmt::Display for AvatarStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AvatarStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cute" => Ok(AvatarStyle::Cute),
            "anime" => Ok(AvatarStyle::Anime),
            "cool" => Ok(AvatarStyle::Cool),
            "warm" => Ok(AvatarStyle::Warm),
            other => Err(Error::InvalidInput(format!("Unknown avatar style: {other}"))),
        }
    }
}

/// Colors used to draw one avatar style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub skin: Color,
    pub skin_outline: Color,
    pub eye_white: Color,
    pub eye_outline: Color,
    pub iris: Color,
    pub pupil: Color,
    pub mouth: Color,
    pub blush: Color,
    /// Shared by every style unless overridden
    pub highlight: Color,
    pub brow: Color,
    pub nose: Color,
    pub mouth_outline: Color,
}

impl Palette {
    /// Cute colors plus the features every style has in common
    fn shared() -> Self {
        Self {
            skin: Color::bgr(255, 220, 180),
            skin_outline: Color::bgr(200, 170, 140),
            eye_white: Color::WHITE,
            eye_outline: Color::bgr(100, 100, 100),
            iris: Color::bgr(100, 150, 200),
            pupil: Color::bgr(50, 50, 50),
            mouth: Color::bgr(255, 150, 150),
            blush: Color::bgr(255, 180, 200),
            highlight: Color::WHITE,
            brow: Color::bgr(80, 60, 40),
            nose: Color::bgr(180, 140, 110),
            mouth_outline: Color::bgr(100, 50, 50),
        }
    }
}

/// Per-style color overrides from the configuration file
///
/// Only the listed colors change; the rest come from the style's own
/// built-in palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaletteOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin_outline: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eye_white: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eye_outline: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iris: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pupil: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mouth: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blush: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brow: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nose: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mouth_outline: Option<Color>,
}

impl PaletteOverride {
    /// Apply the listed colors on top of `base`
    #[must_use]
    pub fn apply(&self, base: Palette) -> Palette {
        Palette {
            skin: self.skin.unwrap_or(base.skin),
            skin_outline: self.skin_outline.unwrap_or(base.skin_outline),
            eye_white: self.eye_white.unwrap_or(base.eye_white),
            eye_outline: self.eye_outline.unwrap_or(base.eye_outline),
            iris: self.iris.unwrap_or(base.iris),
            pupil: self.pupil.unwrap_or(base.pupil),
            mouth: self.mouth.unwrap_or(base.mouth),
            blush: self.blush.unwrap_or(base.blush),
            highlight: self.highlight.unwrap_or(base.highlight),
            brow: self.brow.unwrap_or(base.brow),
            nose: self.nose.unwrap_or(base.nose),
            mouth_outline: self.mouth_outline.unwrap_or(base.mouth_outline),
        }
    }
}
