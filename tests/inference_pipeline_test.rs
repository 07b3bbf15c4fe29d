//! Tests for landmark to avatar state inference

mod test_helpers;

use test_helpers::{hand, FaceFixture};
use vtuber_avatar::{
    config::Config,
    emotion::{classify_emotion, Emotion, EmotionInputs},
    features::extract_face_features,
    gesture::{classify_fingers, classify_gesture, FingerExtension, Gesture},
    headless::SceneLogSink,
    landmarks::{FaceLandmarks, HandSide, Landmark, LandmarkFrame},
    session::{observe_face, Session},
    style::AvatarStyle,
};

fn session() -> Session<SceneLogSink> {
    Session::new(Config::default(), AvatarStyle::Cute)
}

#[test]
fn test_neutral_face_end_to_end() {
    let config = Config::default();
    let observation = observe_face(
        &FaceFixture::default().mesh(),
        640,
        480,
        &config.features,
        &config.emotion,
    )
    .unwrap();

    // EAR 0.25 at sensitivity 3.5
    assert!((observation.eye_open[0] - 0.875).abs() < 1e-9);
    assert!((observation.eye_open[1] - 0.875).abs() < 1e-9);
    assert_eq!(observation.mouth_open, 0.0);
    assert_eq!(observation.emotion, Emotion::Neutral);
    assert!(observation.pose.yaw.abs() < 1e-9);
    assert!(observation.pose.roll.abs() < 1e-9);
}

#[test]
fn test_raw_features_of_fixture() {
    let fixture = FaceFixture {
        mouth_ratio: 0.02,
        brow_height: -0.05,
        ..FaceFixture::default()
    };
    let features = extract_face_features(&fixture.mesh(), 640, 480).unwrap();

    assert!((features.eye_ratios[0] - 0.25).abs() < 1e-9);
    assert!((features.mouth_ratio - 0.02).abs() < 1e-9);
    assert!((features.smile_ratio - 50.0).abs() < 1e-6);
    assert!((features.brow_height + 0.05).abs() < 1e-9);

    let scaled = features.mouth_openness(&Config::default().features);
    assert!((scaled - 0.1).abs() < 1e-9);
}

#[test]
fn test_happy_precedes_surprised() {
    let inputs = EmotionInputs {
        smile_ratio: 7.0,
        mouth_open: 0.9,
        brow_height: 0.0,
        eye_open: [1.0, 1.0],
    };
    assert_eq!(classify_emotion(&inputs, &Config::default().emotion), Emotion::Happy);
}

#[test]
fn test_fixture_emotions() {
    let config = Config::default();
    let classify = |fixture: FaceFixture| {
        observe_face(&fixture.mesh(), 640, 480, &config.features, &config.emotion)
            .unwrap()
            .emotion
    };

    // Narrow lip gap on a wide mouth reads as a smile
    let smiling = FaceFixture {
        mouth_ratio: 0.1,
        ..FaceFixture::default()
    };
    assert_eq!(classify(smiling), Emotion::Happy);

    // Wide open mouth: smile ratio 4, openness clamped to 1
    let gaping = FaceFixture {
        mouth_ratio: 0.25,
        ..FaceFixture::default()
    };
    assert_eq!(classify(gaping), Emotion::Surprised);

    let frowning = FaceFixture {
        brow_height: -0.05,
        ..FaceFixture::default()
    };
    assert_eq!(classify(frowning), Emotion::Angry);

    let drowsy = FaceFixture {
        eye_ratio: 0.05,
        ..FaceFixture::default()
    };
    assert_eq!(classify(drowsy), Emotion::Sleepy);
}

#[test]
fn test_head_yaw_follows_eye_center() {
    let config = Config::default();
    let turned = FaceFixture {
        eye_shift: 0.1,
        ..FaceFixture::default()
    };
    let observation = observe_face(&turned.mesh(), 640, 480, &config.features, &config.emotion).unwrap();

    // Eye center 64 px right of a 320 px half width
    assert!((observation.pose.yaw - 9.0).abs() < 1e-9);
}

#[test]
fn test_gesture_truth_table() {
    let cases = [
        ([true, true, false, false], Gesture::Peace),
        ([true, true, true, true], Gesture::Open),
        ([false, false, false, false], Gesture::Fist),
        ([true, false, false, false], Gesture::Point),
        ([true, false, false, true], Gesture::Point),
        ([true, false, true, false], Gesture::Point),
        ([false, true, false, false], Gesture::None),
        ([true, true, true, false], Gesture::None),
        ([false, false, false, true], Gesture::None),
    ];

    for (extended, expected) in cases {
        let [index, middle, ring, pinky] = extended;
        let fingers = FingerExtension {
            index,
            middle,
            ring,
            pinky,
        };
        assert_eq!(classify_fingers(&fingers), expected, "fingers {extended:?}");
        assert_eq!(classify_gesture(&hand((0.5, 0.8), extended)), expected, "hand {extended:?}");
    }
}

#[test]
fn test_face_fields_latch_without_face() {
    let mut session = session();
    let smiling = FaceFixture {
        mouth_ratio: 0.1,
        eye_shift: 0.1,
        ..FaceFixture::default()
    };

    assert!(session.update(&smiling.frame()));
    let before = session.state().clone();
    assert_eq!(*before.emotion, Emotion::Happy);

    for _ in 0..3 {
        assert!(!session.update(&LandmarkFrame::empty(640, 480)));
    }

    let after = session.state();
    assert_eq!(*after.emotion, Emotion::Happy);
    assert_eq!(*after.head_rotation, *before.head_rotation);
    assert_eq!(*after.eye_open, *before.eye_open);
    assert_eq!(*after.mouth_open, *before.mouth_open);
    assert!(!session.status().face_detected);
}

#[test]
fn test_hands_reset_per_side() {
    let mut session = session();
    let both = LandmarkFrame::empty(640, 480)
        .with_hand(HandSide::Left, hand((0.25, 0.5), [true, true, false, false]))
        .with_hand(HandSide::Right, hand((0.75, 0.5), [false, false, false, false]));

    session.update(&both);
    assert_eq!(session.state().hand_position(HandSide::Left), Some((160, 240)));
    assert_eq!(session.state().hand_gesture(HandSide::Left), Gesture::Peace);
    assert_eq!(session.state().hand_gesture(HandSide::Right), Gesture::Fist);

    let left_only =
        LandmarkFrame::empty(640, 480).with_hand(HandSide::Left, hand((0.25, 0.5), [true, false, false, false]));
    session.update(&left_only);
    assert_eq!(session.state().hand_gesture(HandSide::Left), Gesture::Point);
    assert_eq!(session.state().hand(HandSide::Right), None);
    assert_eq!(session.state().hand_gesture(HandSide::Right), Gesture::None);

    session.update(&LandmarkFrame::empty(640, 480));
    assert!(!session.state().any_hand_visible());
}

#[test]
fn test_short_mesh_counts_as_no_face() {
    let mut session = session();
    session.update(&FaceFixture::default().frame());

    let truncated = LandmarkFrame::empty(640, 480).with_face(FaceLandmarks::new(vec![Landmark::new(0.5, 0.5); 68]));
    assert!(!session.update(&truncated));
    assert_eq!(*session.state().emotion, Emotion::Neutral);
    assert!((session.state().eye_open[0] - 0.875).abs() < 1e-9);
}
