//! Configuration management for the avatar application
//!
//! Every threshold and layout constant lives here so that it can be tuned
//! from a YAML file. The file is read once at startup. Thresholds are not
//! range checked; `validate` only rejects values that would make the
//! pipeline unable to run at all.

use crate::{
    canvas::Color,
    constants::{
        CANVAS_HEIGHT, CANVAS_WIDTH, DEFAULT_FPS_HISTORY, DEFAULT_RECORDING_CODEC, DEFAULT_RECORDING_FPS,
        DEFAULT_RECORDING_PATTERN,
    },
    style::{AvatarStyle, Palette, PaletteOverride},
    Error, Result,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Avatar placement and default style
    pub avatar: AvatarConfig,

    /// Output canvas
    pub canvas: CanvasConfig,

    /// Webcam preview placement and hand coordinate mapping
    pub preview: PreviewConfig,

    /// Feature sensitivity multipliers
    pub features: FeatureConfig,

    /// Emotion rule thresholds
    pub emotion: EmotionConfig,

    /// Avatar drawing thresholds
    pub render: RenderConfig,

    /// Video recording
    pub recording: RecordingConfig,

    /// Background removal
    pub background: BackgroundConfig,

    /// Frame rate accounting
    pub performance: PerformanceConfig,

    /// Overlay defaults and colors
    pub ui: UiConfig,

    /// Single character command bindings
    pub keys: KeyConfig,

    /// Palette overrides keyed by style name, merged over the style's own colors
    #[serde(deserialize_with = "style_keyed")]
    pub custom_colors: BTreeMap<AvatarStyle, PaletteOverride>,
}

/// Style names are parsed like the `--style` flag, so `Cool` and `cool` match
fn style_keyed<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<AvatarStyle, PaletteOverride>, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, PaletteOverride>::deserialize(deserializer)?
        .into_iter()
        .map(|(name, colors)| {
            let style = name
                .parse::<AvatarStyle>()
                .map_err(|_| serde::de::Error::custom(format!("custom colors given for unknown style '{name}'")))?;
            Ok((style, colors))
        })
        .collect()
}

/// Avatar placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Avatar anchor point on the canvas
    pub center: (i32, i32),

    /// Head disc radius in pixels
    pub head_radius: i32,

    /// Style used when the startup prompt gets no valid answer
    pub default_style: AvatarStyle,
}

/// Output canvas configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub background: Color,
}

/// Webcam preview configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Top-left corner of the preview on the canvas
    pub position: (i32, i32),

    /// Preview size on the canvas
    pub width: u32,
    pub height: u32,

    /// Mirror the captured frame horizontally
    pub mirror: bool,

    /// Source-frame point that maps onto the avatar anchor
    pub hand_source_center: (f64, f64),

    /// Scale from source-frame pixels to canvas pixels for hand indicators
    pub hand_scale: f64,
}

/// Feature sensitivity configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Eye aspect ratio multiplier (higher keeps eyes open longer)
    pub eye_multiplier: f64,

    /// Mouth aspect ratio multiplier (higher opens the mouth sooner)
    pub mouth_multiplier: f64,
}

/// Emotion rule thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionConfig {
    /// Smile ratio above which the face is happy
    pub smile_threshold: f64,

    /// Mouth openness above which the face is surprised
    pub surprised_threshold: f64,

    /// Brow height below which the face is angry
    pub angry_threshold: f64,

    /// Eye openness below which (both eyes) the face is sleepy
    pub sleepy_threshold: f64,
}

/// Avatar drawing thresholds
///
/// These started life as hand-tuned constants. Treat them as tunable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Full eye half-height in pixels at openness 1.0
    pub eye_height: f64,

    /// Eye half-height at or below which the eye is drawn closed
    pub closed_eye_threshold: i32,

    /// Eye size multiplier for the surprised emotion
    pub surprised_eye_multiplier: f64,

    /// Mouth openness above which the open-mouth height is used
    pub open_mouth_ratio: f64,

    /// Full mouth half-height in pixels at openness 1.0
    pub mouth_height: f64,

    /// Mouth half-height above which the mouth is drawn open
    pub open_mouth_min_height: i32,

    /// First line of the debug overlay
    pub debug_origin: (i32, i32),
}

/// Recording configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Four character codec identifier
    pub codec: String,

    /// Target frame rate of the written file
    pub fps: f64,

    /// `strftime` pattern for the output file name
    pub filename_pattern: String,

    /// Directory the recordings are written to
    pub output_dir: PathBuf,
}

/// Background removal configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Replacement color for background pixels
    pub color: Color,

    /// Foreground probability at or below which a pixel is background
    pub mask_threshold: f32,
}

/// Frame rate accounting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Rolling FPS window capacity
    pub fps_history: usize,
}

/// Overlay defaults and colors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_debug: bool,
    pub hand_tracking: bool,
    pub background_removal: bool,
    pub show_mesh: bool,
    pub text_color: Color,
    pub active_color: Color,
    pub inactive_color: Color,
    pub disabled_color: Color,
}

/// Key bindings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    pub quit: char,
    pub toggle_mesh: char,
    pub toggle_hands: char,
    pub toggle_background: char,
    pub toggle_record: char,
    /// Keys selecting cute, anime, cool and warm
    pub styles: [char; 4],
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            center: (1000, 360),
            head_radius: 120,
            default_style: AvatarStyle::Cute,
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            background: Color::bgr(40, 40, 60),
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            position: (10, 10),
            width: 320,
            height: 240,
            mirror: true,
            hand_source_center: (320.0, 240.0),
            hand_scale: 0.5,
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            eye_multiplier: 3.5,
            mouth_multiplier: 5.0,
        }
    }
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            smile_threshold: 6.5,
            surprised_threshold: 0.6,
            angry_threshold: -0.02,
            sleepy_threshold: 0.3,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            eye_height: 25.0,
            closed_eye_threshold: 5,
            surprised_eye_multiplier: 1.2,
            open_mouth_ratio: 0.3,
            mouth_height: 20.0,
            open_mouth_min_height: 10,
            debug_origin: (10, 290),
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_RECORDING_CODEC.to_string(),
            fps: DEFAULT_RECORDING_FPS,
            filename_pattern: DEFAULT_RECORDING_PATTERN.to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            color: Color::bgr(50, 150, 50),
            mask_threshold: 0.5,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            fps_history: DEFAULT_FPS_HISTORY,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_debug: true,
            hand_tracking: true,
            background_removal: false,
            show_mesh: true,
            text_color: Color::WHITE,
            active_color: Color::bgr(0, 255, 0),
            inactive_color: Color::bgr(0, 0, 255),
            disabled_color: Color::bgr(100, 100, 100),
        }
    }
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            quit: 'q',
            toggle_mesh: 's',
            toggle_hands: 'h',
            toggle_background: 'b',
            toggle_record: 'r',
            styles: ['1', '2', '3', '4'],
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Palette for a style, honoring `custom_colors` overrides
    #[must_use]
    pub fn palette(&self, style: AvatarStyle) -> Palette {
        let base = style.palette();
        match self.custom_colors.get(&style) {
            Some(colors) => colors.apply(base),
            None => base,
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error for values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(Error::ConfigError("Canvas size must be non-zero".to_string()));
        }
        if self.preview.width == 0 || self.preview.height == 0 {
            return Err(Error::ConfigError("Preview size must be non-zero".to_string()));
        }
        if self.performance.fps_history == 0 {
            return Err(Error::ConfigError("FPS history length must be greater than 0".to_string()));
        }
        if !(self.recording.fps > 0.0) {
            return Err(Error::ConfigError("Recording FPS must be greater than 0".to_string()));
        }
        if self.recording.codec.chars().count() != 4 {
            return Err(Error::ConfigError(format!(
                "Recording codec must be four characters, got '{}'",
                self.recording.codec
            )));
        }
        if self.recording.filename_pattern.trim().is_empty() {
            return Err(Error::ConfigError("Recording filename pattern is empty".to_string()));
        }

        let keys = &self.keys;
        let mut seen = HashSet::new();
        let all_keys = [
            keys.quit,
            keys.toggle_mesh,
            keys.toggle_hands,
            keys.toggle_background,
            keys.toggle_record,
        ]
        .into_iter()
        .chain(keys.styles);
        for key in all_keys {
            if !seen.insert(key.to_ascii_lowercase()) {
                return Err(Error::ConfigError(format!("Key '{key}' is bound more than once")));
            }
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# VTuber Avatar Configuration

# Avatar placement
avatar:
  center: [1000, 360]
  head_radius: 120
  default_style: cute

# Output canvas (colors are B, G, R)
canvas:
  width: 1280
  height: 720
  background: [40, 40, 60]

# Webcam preview
preview:
  position: [10, 10]
  width: 320
  height: 240
  mirror: true
  hand_source_center: [320.0, 240.0]
  hand_scale: 0.5

# Higher eye multiplier keeps eyes open, higher mouth multiplier opens sooner
features:
  eye_multiplier: 3.5
  mouth_multiplier: 5.0

# Emotion rules, evaluated in this order
emotion:
  smile_threshold: 6.5
  surprised_threshold: 0.6
  angry_threshold: -0.02
  sleepy_threshold: 0.3

# Avatar drawing
render:
  eye_height: 25.0
  closed_eye_threshold: 5
  surprised_eye_multiplier: 1.2
  open_mouth_ratio: 0.3
  mouth_height: 20.0
  open_mouth_min_height: 10
  debug_origin: [10, 290]

# Recording
recording:
  codec: "mp4v"
  fps: 20.0
  filename_pattern: "vtuber_recording_%Y%m%d_%H%M%S.mp4"
  output_dir: "."

# Background removal
background:
  color: [50, 150, 50]
  mask_threshold: 0.5

# FPS counter smoothing
performance:
  fps_history: 30

# Overlay defaults
ui:
  show_debug: true
  hand_tracking: true
  background_removal: false
  show_mesh: true
  text_color: [255, 255, 255]
  active_color: [0, 255, 0]
  inactive_color: [0, 0, 255]
  disabled_color: [100, 100, 100]

# Keyboard shortcuts
keys:
  quit: "q"
  toggle_mesh: "s"
  toggle_hands: "h"
  toggle_background: "b"
  toggle_record: "r"
  styles: ["1", "2", "3", "4"]

# Palette overrides per style; unlisted colors keep the style's own
# e.g. warm: { skin: [230, 200, 170] }
custom_colors: {}
"#;
