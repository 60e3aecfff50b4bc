mod common;

use std::path::Path;

use common::{StubLoader, centered_square_pattern, interleaved_voxel_pattern};
use ndarray::{Array, IxDyn};
use probaspot::{
    CalibratedImage, ClassifierLoader, ClassifierRunner, DetectError, Interval, ProcessingMode,
    SpotDetector,
};

fn blank_2d(height: usize, width: usize) -> CalibratedImage {
    let data = Array::zeros(IxDyn(&[height, width]));
    CalibratedImage::new(data, vec![1.0, 1.0]).unwrap()
}

fn blank_3d(depth: usize, height: usize, width: usize) -> CalibratedImage {
    let data = Array::zeros(IxDyn(&[depth, height, width]));
    CalibratedImage::new(data, vec![1.0, 1.0, 1.0]).unwrap()
}

fn runner_2d(num_classes: usize, pattern: common::PatternFn) -> ClassifierRunner<common::StubBackend> {
    let loader = StubLoader::new(num_classes, pattern);
    let backend = loader.load(Path::new("stub"), ProcessingMode::TwoD).unwrap();
    ClassifierRunner::new(backend, ProcessingMode::TwoD)
}

#[test]
fn recomputing_the_same_request_is_deterministic() {
    let mut runner = runner_2d(2, centered_square_pattern());
    let image = blank_2d(8, 8);
    let interval = image.full_interval();

    runner.compute_probabilities(&image, &interval, 0).unwrap();
    let first = runner.last_probabilities().unwrap().clone();
    runner.compute_probabilities(&image, &interval, 0).unwrap();
    let second = runner.last_probabilities().unwrap();

    assert_eq!(&first, second);
}

#[test]
fn requested_interval_round_trips_onto_the_volume() {
    let mut runner = runner_2d(1, centered_square_pattern());
    let image = blank_2d(8, 8);
    let interval = Interval::new(vec![2, 1], vec![7, 6]).unwrap();

    runner.compute_probabilities(&image, &interval, 0).unwrap();
    let volume = runner.last_probabilities().unwrap();
    assert_eq!(volume.interval(), &interval);
    assert_eq!(volume.data().shape(), &[6, 6]);
}

#[test]
fn spots_before_any_computation_fail() {
    let runner = runner_2d(1, centered_square_pattern());
    let err = runner.spots_from_last_probabilities(0.5, true).unwrap_err();
    assert!(matches!(err, DetectError::NotComputedYet));
}

#[test]
fn class_selection_picks_the_right_interleaved_planes() {
    let loader = StubLoader::new(3, interleaved_voxel_pattern());
    let backend = loader
        .load(Path::new("stub"), ProcessingMode::ThreeD)
        .unwrap();
    let mut runner = ClassifierRunner::new(backend, ProcessingMode::ThreeD);
    let image = blank_3d(4, 4, 4);
    let interval = image.full_interval();

    // Class 2's planes are uniformly 0.2; the class-1 voxel must not leak in.
    runner.compute_probabilities(&image, &interval, 2).unwrap();
    let volume = runner.last_probabilities().unwrap();
    assert_eq!(volume.data().shape(), &[4, 4, 4]);
    for value in volume.data().iter() {
        assert!((value - 0.2).abs() < 1e-6);
    }

    runner.compute_probabilities(&image, &interval, 1).unwrap();
    let volume = runner.last_probabilities().unwrap();
    assert_eq!(volume.value_at(&[1, 1, 1]), Some(1.0));
    assert!((volume.value_at(&[0, 0, 0]).unwrap() - 0.1).abs() < 1e-6);
}

#[test]
fn one_shot_detector_records_spots_and_timing() {
    let mut runner = runner_2d(1, centered_square_pattern());
    let image = blank_2d(8, 8);
    let interval = image.full_interval();

    let mut detector = SpotDetector::new(&mut runner, &image, interval, 0, 0.5, true);
    detector.process().unwrap();

    assert_eq!(detector.spots().len(), 1);
    assert!((detector.spots()[0].x - 4.0).abs() < 1e-12);
    assert!(detector.processing_time().is_some());
}
