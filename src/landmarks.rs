//! Per-frame landmark snapshot handed over by the upstream perception process.
//!
//! All coordinates are normalized to the source frame: `x` and `y` lie in
//! `[0, 1]` with the origin at the top-left corner and `y` growing downward.
//! Absence of a face or hand is an `Option::None`, never an all-zero set.

use crate::{constants::NUM_HAND_LANDMARKS, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single normalized landmark point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Euclidean distance on the 2D normalized coordinates
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Convert to pixel coordinates of a `width` x `height` frame
    #[must_use]
    pub fn to_pixels(&self, width: u32, height: u32) -> (f64, f64) {
        (self.x * f64::from(width), self.y * f64::from(height))
    }
}

/// Face mesh landmarks of one detected face
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceLandmarks {
    points: Vec<Landmark>,
}

impl FaceLandmarks {
    #[must_use]
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// Look up one landmark by mesh index
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh has fewer points than `index + 1`
    pub fn point(&self, index: usize) -> Result<Landmark> {
        self.points.get(index).copied().ok_or_else(|| {
            Error::InvalidInput(format!(
                "Face landmark {index} requested but only {} points present",
                self.points.len()
            ))
        })
    }

    /// Gather a fixed set of landmarks by mesh index
    ///
    /// # Errors
    ///
    /// Returns an error if any index is out of range
    pub fn select<const N: usize>(&self, indices: [usize; N]) -> Result<[Landmark; N]> {
        let mut out = [Landmark::default(); N];
        for (slot, index) in out.iter_mut().zip(indices) {
            *slot = self.point(index)?;
        }
        Ok(out)
    }

    #[must_use]
    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// The 21 landmarks of one detected hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct HandLandmarks {
    points: [Landmark; NUM_HAND_LANDMARKS],
}

impl HandLandmarks {
    #[must_use]
    pub fn new(points: [Landmark; NUM_HAND_LANDMARKS]) -> Self {
        Self { points }
    }

    /// # Panics
    ///
    /// Panics if `index` is not below [`NUM_HAND_LANDMARKS`]
    #[must_use]
    pub fn point(&self, index: usize) -> Landmark {
        self.points[index]
    }

    #[must_use]
    pub fn points(&self) -> &[Landmark] {
        &self.points
    }
}

impl TryFrom<Vec<Landmark>> for HandLandmarks {
    type Error = Error;

    fn try_from(points: Vec<Landmark>) -> Result<Self> {
        let len = points.len();
        let points: [Landmark; NUM_HAND_LANDMARKS] = points.try_into().map_err(|_| {
            Error::InvalidInput(format!("Expected {NUM_HAND_LANDMARKS} hand landmarks, got {len}"))
        })?;
        Ok(Self { points })
    }
}

impl From<HandLandmarks> for Vec<Landmark> {
    fn from(hand: HandLandmarks) -> Self {
        hand.points.to_vec()
    }
}

/// Which hand a detection belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandSide {
    Left,
    Right,
}

impl HandSide {
    pub const ALL: [HandSide; 2] = [HandSide::Left, HandSide::Right];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HandSide::Left => "left",
            HandSide::Right => "right",
        }
    }
}

impl fmt::Display for HandSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-pixel foreground probability at source-frame resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MaskRecord", into = "MaskRecord")]
pub struct SegmentationMask {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

/// Unchecked wire form of a [`SegmentationMask`]
#[derive(Serialize, Deserialize)]
struct MaskRecord {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl TryFrom<MaskRecord> for SegmentationMask {
    type Error = Error;

    fn try_from(record: MaskRecord) -> Result<Self> {
        Self::new(record.width, record.height, record.data)
    }
}

impl From<SegmentationMask> for MaskRecord {
    fn from(mask: SegmentationMask) -> Self {
        Self {
            width: mask.width,
            height: mask.height,
            data: mask.data,
        }
    }
}

impl SegmentationMask {
    /// Build a mask from row-major probabilities
    ///
    /// # Errors
    ///
    /// Returns an error if `data` does not hold exactly `width * height` values
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::InvalidInput(format!(
                "Segmentation mask {width}x{height} needs {expected} values, got {}",
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Foreground probability at a pixel, 0 outside the mask
    #[must_use]
    pub fn probability(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
            .unwrap_or(0.0)
    }

    #[must_use]
    pub fn is_foreground(&self, x: u32, y: u32, threshold: f32) -> bool {
        self.probability(x, y) > threshold
    }
}

/// What the session wants upstream perception to run for the next frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerceptionRequest {
    pub hands: bool,
    pub segmentation: bool,
}

/// Everything upstream detectors reported for one processed frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkFrame {
    #[serde(default)]
    pub face: Option<FaceLandmarks>,
    #[serde(default)]
    pub hands: BTreeMap<HandSide, HandLandmarks>,
    #[serde(default)]
    pub segmentation: Option<SegmentationMask>,
    #[serde(default)]
    pub image_width: u32,
    #[serde(default)]
    pub image_height: u32,
}

impl LandmarkFrame {
    /// A frame in which nothing was detected
    #[must_use]
    pub fn empty(image_width: u32, image_height: u32) -> Self {
        Self {
            image_width,
            image_height,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_face(mut self, face: FaceLandmarks) -> Self {
        self.face = Some(face);
        self
    }

    #[must_use]
    pub fn with_hand(mut self, side: HandSide, hand: HandLandmarks) -> Self {
        self.hands.insert(side, hand);
        self
    }

    #[must_use]
    pub fn with_segmentation(mut self, mask: SegmentationMask) -> Self {
        self.segmentation = Some(mask);
        self
    }

    /// Fill in the source frame size when the producer left it out
    #[must_use]
    pub fn with_default_dimensions(mut self, image_width: u32, image_height: u32) -> Self {
        if self.image_width == 0 || self.image_height == 0 {
            self.image_width = image_width;
            self.image_height = image_height;
        }
        self
    }

    /// Drop the parts of the frame that were not requested
    #[must_use]
    pub fn restricted_to(mut self, request: PerceptionRequest) -> Self {
        if !request.hands {
            self.hands.clear();
        }
        if !request.segmentation {
            self.segmentation = None;
        }
        self
    }
}
