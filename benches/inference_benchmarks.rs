//! Benchmarks for feature extraction and classification

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use vtuber_avatar::{
    config::Config,
    features::extract_face_features,
    gesture::classify_gesture,
    headless::SceneLogSink,
    landmarks::{FaceLandmarks, HandLandmarks, HandSide, Landmark, LandmarkFrame},
    session::{observe_face, Session},
    style::AvatarStyle,
};

/// Noisy 478 point mesh; values only need to be plausible, not anatomical
fn random_face(rng: &mut StdRng) -> FaceLandmarks {
    let points = (0..478)
        .map(|_| Landmark::new(rng.gen_range(0.2..0.8), rng.gen_range(0.2..0.8)))
        .collect();
    FaceLandmarks::new(points)
}

fn random_hand(rng: &mut StdRng) -> HandLandmarks {
    let points = std::array::from_fn(|_| Landmark::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)));
    HandLandmarks::new(points)
}

fn bench_face(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let faces: Vec<FaceLandmarks> = (0..100).map(|_| random_face(&mut rng)).collect();
    let config = Config::default();

    let mut group = c.benchmark_group("face");
    group.bench_function("extract_features", |b| {
        b.iter(|| {
            for face in &faces {
                let _ = black_box(extract_face_features(face, 640, 480));
            }
        });
    });
    group.bench_function("observe", |b| {
        b.iter(|| {
            for face in &faces {
                let _ = black_box(observe_face(face, 640, 480, &config.features, &config.emotion));
            }
        });
    });
    group.finish();
}

fn bench_gesture(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(11);
    let hands: Vec<HandLandmarks> = (0..100).map(|_| random_hand(&mut rng)).collect();

    c.bench_function("classify_gesture", |b| {
        b.iter(|| {
            for hand in &hands {
                black_box(classify_gesture(hand));
            }
        });
    });
}

fn bench_session_update(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(13);
    let mut group = c.benchmark_group("session_update");

    for hands in [0_usize, 1, 2] {
        let mut frame = LandmarkFrame::empty(640, 480).with_face(random_face(&mut rng));
        for side in HandSide::ALL.into_iter().take(hands) {
            frame = frame.with_hand(side, random_hand(&mut rng));
        }

        group.bench_with_input(BenchmarkId::new("hands", hands), &frame, |b, frame| {
            let mut session: Session<SceneLogSink> = Session::new(Config::default(), AvatarStyle::Cute);
            b.iter(|| black_box(session.update(frame)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_face, bench_gesture, bench_session_update);
criterion_main!(benches);
