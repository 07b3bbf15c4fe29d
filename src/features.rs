//! Geometric feature extraction from face mesh landmarks.
//!
//! The ratios here are proxies for openness, not calibrated measurements,
//! and the pose angles only promise to be monotonic and continuous in the
//! underlying landmark motion.

use crate::{
    config::FeatureConfig,
    constants::{
        CHIN, LEFT_BROW, LEFT_EYE_INDICES, LEFT_EYE_OUTER, LEFT_MOUTH_CORNER, LOWER_INNER_LIP,
        NOSE_BRIDGE, NOSE_TIP, PITCH_RANGE_DEGREES, RIGHT_BROW, RIGHT_EYE_INDICES,
        RIGHT_EYE_OUTER, RIGHT_MOUTH_CORNER, UPPER_INNER_LIP, YAW_RANGE_DEGREES,
    },
    landmarks::{FaceLandmarks, Landmark},
    Result,
};

/// Head orientation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadPose {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

/// Eye aspect ratio of a six point eye contour
///
/// Points are ordered outer corner, two upper lid points, inner corner,
/// two lower lid points. Returns 0 when the corners coincide.
#[must_use]
pub fn eye_aspect_ratio(eye: &[Landmark; 6]) -> f64 {
    let vertical_1 = eye[1].distance(&eye[5]);
    let vertical_2 = eye[2].distance(&eye[4]);
    let horizontal = eye[0].distance(&eye[3]);

    if horizontal > 0.0 {
        (vertical_1 + vertical_2) / (2.0 * horizontal)
    } else {
        0.0
    }
}

/// Vertical inner-lip gap over mouth width, 0 for a zero-width mouth
#[must_use]
pub fn mouth_aspect_ratio(upper_lip: Landmark, lower_lip: Landmark, left: Landmark, right: Landmark) -> f64 {
    let vertical = upper_lip.distance(&lower_lip);
    let horizontal = left.distance(&right);

    if horizontal > 0.0 {
        vertical / horizontal
    } else {
        0.0
    }
}

/// Mouth width over mouth height, 0 for a closed mouth
#[must_use]
pub fn smile_ratio(upper_lip: Landmark, lower_lip: Landmark, left: Landmark, right: Landmark) -> f64 {
    let width = left.distance(&right);
    let height = upper_lip.distance(&lower_lip);

    if height > 0.0 {
        width / height
    } else {
        0.0
    }
}

/// Heuristic head pose from nose, chin and outer eye corners
///
/// Yaw is the eye-center offset from the image center scaled to ±45° by
/// the half width, pitch the nose-to-chin pixel gap scaled to ±90° by the
/// height, and roll the slope of the eye line in degrees.
#[must_use]
pub fn head_pose(
    nose_tip: Landmark,
    chin: Landmark,
    left_eye: Landmark,
    right_eye: Landmark,
    image_width: u32,
    image_height: u32,
) -> HeadPose {
    let width = f64::from(image_width);
    let height = f64::from(image_height);

    let (_, nose_y) = nose_tip.to_pixels(image_width, image_height);
    let (_, chin_y) = chin.to_pixels(image_width, image_height);
    let (left_x, left_y) = left_eye.to_pixels(image_width, image_height);
    let (right_x, right_y) = right_eye.to_pixels(image_width, image_height);

    let half_width = width / 2.0;
    let eye_center_x = (left_x + right_x) / 2.0;
    let yaw = if half_width > 0.0 {
        (eye_center_x - half_width) / half_width * YAW_RANGE_DEGREES
    } else {
        0.0
    };

    let pitch = if height > 0.0 {
        (nose_y - chin_y) / height * PITCH_RANGE_DEGREES
    } else {
        0.0
    };

    let roll = (right_y - left_y).atan2(right_x - left_x).to_degrees();

    HeadPose { pitch, yaw, roll }
}

/// Scale a raw ratio by a sensitivity multiplier and clamp to `[0, 1]`
#[must_use]
pub fn scaled_openness(ratio: f64, multiplier: f64) -> f64 {
    let scaled = ratio * multiplier;
    if scaled.is_nan() {
        return 0.0;
    }
    scaled.clamp(0.0, 1.0)
}

/// Raw geometric measurements of one face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceFeatures {
    pub pose: HeadPose,
    /// Eye aspect ratios, first and second eye
    pub eye_ratios: [f64; 2],
    pub mouth_ratio: f64,
    pub smile_ratio: f64,
    /// Mean brow y minus nose bridge y, negative when brows sit higher
    pub brow_height: f64,
}

impl FaceFeatures {
    /// Eye openness after sensitivity scaling
    #[must_use]
    pub fn eye_openness(&self, config: &FeatureConfig) -> [f64; 2] {
        self.eye_ratios.map(|ratio| scaled_openness(ratio, config.eye_multiplier))
    }

    /// Mouth openness after sensitivity scaling
    #[must_use]
    pub fn mouth_openness(&self, config: &FeatureConfig) -> f64 {
        scaled_openness(self.mouth_ratio, config.mouth_multiplier)
    }
}

/// Compute every face feature the classifiers and avatar need
///
/// # Errors
///
/// Returns an error if the mesh lacks any of the referenced landmarks
pub fn extract_face_features(face: &FaceLandmarks, image_width: u32, image_height: u32) -> Result<FaceFeatures> {
    let left_eye = face.select(LEFT_EYE_INDICES)?;
    let right_eye = face.select(RIGHT_EYE_INDICES)?;
    let [upper_lip, lower_lip, mouth_left, mouth_right] =
        face.select([UPPER_INNER_LIP, LOWER_INNER_LIP, LEFT_MOUTH_CORNER, RIGHT_MOUTH_CORNER])?;
    let [nose_tip, chin, eye_left, eye_right] = face.select([NOSE_TIP, CHIN, LEFT_EYE_OUTER, RIGHT_EYE_OUTER])?;
    let [brow_left, brow_right, nose_bridge] = face.select([LEFT_BROW, RIGHT_BROW, NOSE_BRIDGE])?;

    Ok(FaceFeatures {
        pose: head_pose(nose_tip, chin, eye_left, eye_right, image_width, image_height),
        eye_ratios: [eye_aspect_ratio(&left_eye), eye_aspect_ratio(&right_eye)],
        mouth_ratio: mouth_aspect_ratio(upper_lip, lower_lip, mouth_left, mouth_right),
        smile_ratio: smile_ratio(upper_lip, lower_lip, mouth_left, mouth_right),
        brow_height: (brow_left.y + brow_right.y) / 2.0 - nose_bridge.y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EPSILON;
    use proptest::prelude::*;

    fn eye(width: f64, gap: f64) -> [Landmark; 6] {
        [
            Landmark::new(0.0, 0.5),
            Landmark::new(width / 3.0, 0.5 - gap / 2.0),
            Landmark::new(2.0 * width / 3.0, 0.5 - gap / 2.0),
            Landmark::new(width, 0.5),
            Landmark::new(2.0 * width / 3.0, 0.5 + gap / 2.0),
            Landmark::new(width / 3.0, 0.5 + gap / 2.0),
        ]
    }

    #[test]
    fn test_eye_aspect_ratio() {
        let ear = eye_aspect_ratio(&eye(0.1, 0.025));
        assert!((ear - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_eye_aspect_ratio_degenerate_corners() {
        assert_eq!(eye_aspect_ratio(&[Landmark::new(0.3, 0.3); 6]), 0.0);
    }

    #[test]
    fn test_mouth_aspect_ratio_zero_width() {
        let p = Landmark::new(0.5, 0.5);
        let ratio = mouth_aspect_ratio(Landmark::new(0.5, 0.4), Landmark::new(0.5, 0.6), p, p);
        assert_eq!(ratio, 0.0);
    }

    #[test]
    fn test_mouth_aspect_ratio() {
        let ratio = mouth_aspect_ratio(
            Landmark::new(0.5, 0.50),
            Landmark::new(0.5, 0.52),
            Landmark::new(0.4, 0.51),
            Landmark::new(0.6, 0.51),
        );
        assert!((ratio - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_smile_ratio_closed_mouth() {
        let lip = Landmark::new(0.5, 0.5);
        assert_eq!(smile_ratio(lip, lip, Landmark::new(0.4, 0.5), Landmark::new(0.6, 0.5)), 0.0);
    }

    #[test]
    fn test_head_pose_centered_face() {
        let pose = head_pose(
            Landmark::new(0.5, 0.5),
            Landmark::new(0.5, 0.7),
            Landmark::new(0.4, 0.4),
            Landmark::new(0.6, 0.4),
            640,
            480,
        );
        assert!(pose.yaw.abs() < 1e-9);
        assert!((pose.pitch + 18.0).abs() < 1e-9);
        assert!(pose.roll.abs() < 1e-9);
    }

    #[test]
    fn test_head_pose_yaw_extremes() {
        let right = head_pose(
            Landmark::new(1.0, 0.5),
            Landmark::new(1.0, 0.5),
            Landmark::new(1.0, 0.4),
            Landmark::new(1.0, 0.4),
            640,
            480,
        );
        assert!((right.yaw - 45.0).abs() < 1e-9);

        let left = head_pose(
            Landmark::new(0.0, 0.5),
            Landmark::new(0.0, 0.5),
            Landmark::new(0.0, 0.4),
            Landmark::new(0.0, 0.4),
            640,
            480,
        );
        assert!((left.yaw + 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_head_pose_roll_follows_eye_line() {
        let pose = head_pose(
            Landmark::new(0.5, 0.5),
            Landmark::new(0.5, 0.7),
            Landmark::new(0.4, 0.4),
            Landmark::new(0.5, 0.5),
            100,
            100,
        );
        assert!((pose.roll - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_extract_requires_full_mesh() {
        let face = FaceLandmarks::new(vec![Landmark::new(0.5, 0.5); 100]);
        assert!(extract_face_features(&face, 640, 480).is_err());
    }

    proptest! {
        #[test]
        fn prop_eye_ratio_non_negative_and_finite(
            coords in proptest::collection::vec((0.0f64..=1.0, 0.0f64..=1.0), 6)
        ) {
            let points: Vec<Landmark> = coords.iter().map(|&(x, y)| Landmark::new(x, y)).collect();
            let eye: [Landmark; 6] = points.try_into().unwrap();
            let ear = eye_aspect_ratio(&eye);
            prop_assert!(ear >= 0.0);
            prop_assert!(ear.is_finite());
        }

        #[test]
        fn prop_scaled_openness_in_unit_range(ratio in -10.0f64..10.0, multiplier in 0.0f64..10.0) {
            let value = scaled_openness(ratio, multiplier);
            prop_assert!((0.0..=1.0).contains(&value));
        }
    }
}
