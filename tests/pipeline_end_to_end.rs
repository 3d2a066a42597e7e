use detpost::{
    retain_confident, BoundingBox, DetPostError, DetPostResult, Detector, DetectorConfig,
    InferenceEngine, InputTensor, LabelTable, PostprocessParams, RawOutputTensors,
};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct Expected {
    id: String,
    class_index: usize,
    label: String,
    bbox: [f32; 4],
}

#[derive(Debug, Deserialize)]
struct Scenario {
    image_width: usize,
    image_height: usize,
    confidence_threshold: f32,
    nms_threshold: f32,
    boxes: Vec<[f32; 4]>,
    scores: Vec<Vec<f32>>,
    expected: Vec<Expected>,
}

fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn load_scenario() -> Scenario {
    let text = fs::read_to_string(data_path("scenario.json")).expect("Failed to read scenario");
    serde_json::from_str(&text).expect("Failed to parse scenario")
}

/// Engine stub that records the thread count it was configured with.
struct ThreadedEngine {
    threads: Option<usize>,
}

impl InferenceEngine for ThreadedEngine {
    fn infer(&mut self, _input: &InputTensor) -> DetPostResult<RawOutputTensors> {
        Err(DetPostError::Engine {
            reason: "not loaded".to_string(),
        })
    }

    fn set_num_threads(&mut self, num_threads: usize) -> DetPostResult<()> {
        self.threads = Some(num_threads);
        Ok(())
    }
}

/// Engine stub that replays fixed tensors and counts invocations.
struct ReplayEngine {
    tensors: RawOutputTensors,
    calls: usize,
}

impl InferenceEngine for ReplayEngine {
    fn infer(&mut self, input: &InputTensor) -> DetPostResult<RawOutputTensors> {
        assert_eq!(input.as_slice().len(), input.size() * input.size() * 3);
        self.calls += 1;
        Ok(self.tensors.clone())
    }
}

fn scenario_detector(scenario: &Scenario) -> Detector {
    let cfg = DetectorConfig {
        input_size: scenario.image_width,
        cells: scenario.boxes.len(),
        params: PostprocessParams {
            confidence_threshold: scenario.confidence_threshold,
            nms_threshold: scenario.nms_threshold,
            parallel: false,
        },
        ..DetectorConfig::default()
    };
    Detector::from_label_file(data_path("labels.txt"), cfg).unwrap()
}

fn blank_input(size: usize) -> InputTensor {
    InputTensor::from_rgb8(&vec![0u8; size * size * 3], size, size, size).unwrap()
}

#[test]
fn scenario_fixture_matches_expected_detections() {
    let scenario = load_scenario();
    let detector = scenario_detector(&scenario);
    let tensors = RawOutputTensors::from_rows(&scenario.boxes, &scenario.scores).unwrap();

    let out = detector
        .detect(&tensors, scenario.image_width, scenario.image_height)
        .unwrap();
    assert_eq!(out.len(), scenario.expected.len());
    for (det, exp) in out.iter().zip(scenario.expected.iter()) {
        assert_eq!(det.id(), exp.id);
        assert_eq!(det.class_index(), exp.class_index);
        assert_eq!(det.class_label(), exp.label);
        let [l, t, r, b] = exp.bbox;
        assert_eq!(det.bbox(), BoundingBox::new(l, t, r, b));
    }
}

#[test]
fn recognize_runs_engine_once_and_post_processes() {
    let scenario = load_scenario();
    let detector = scenario_detector(&scenario);
    let mut engine = ReplayEngine {
        tensors: RawOutputTensors::from_rows(&scenario.boxes, &scenario.scores).unwrap(),
        calls: 0,
    };

    let input = blank_input(scenario.image_width);
    let out = detector.recognize(&mut engine, &input).unwrap();
    assert_eq!(engine.calls, 1);
    let ids: Vec<&str> = out.iter().map(|d| d.id()).collect();
    assert_eq!(ids, ["0", "2", "5"]);
}

#[test]
fn recognize_frame_maps_boxes_to_source_frame() {
    let scenario = load_scenario();
    let detector = scenario_detector(&scenario);
    let mut engine = ReplayEngine {
        tensors: RawOutputTensors::from_rows(&scenario.boxes, &scenario.scores).unwrap(),
        calls: 0,
    };

    let input = blank_input(scenario.image_width);
    let out = detector
        .recognize_frame(&mut engine, &input, 832, 208)
        .unwrap();
    let first = out[0].bbox();
    assert!((first.right - 200.0).abs() < 1e-4);
    assert!((first.bottom - 50.0).abs() < 1e-4);
}

#[test]
fn per_call_thresholds_do_not_change_detector_defaults() {
    let scenario = load_scenario();
    let detector = scenario_detector(&scenario);
    let tensors = RawOutputTensors::from_rows(&scenario.boxes, &scenario.scores).unwrap();

    let strict = PostprocessParams {
        confidence_threshold: 0.85,
        ..detector.config().params
    };
    let out = detector.detect_with(&tensors, 416, 416, &strict).unwrap();
    let ids: Vec<&str> = out.iter().map(|d| d.id()).collect();
    assert_eq!(ids, ["0", "5"]);

    assert_eq!(detector.detect(&tensors, 416, 416).unwrap().len(), 3);
}

#[test]
fn display_filter_keeps_boundary_confidence() {
    let scenario = load_scenario();
    let detector = scenario_detector(&scenario);
    let tensors = RawOutputTensors::from_rows(&scenario.boxes, &scenario.scores).unwrap();
    let out = detector.detect(&tensors, 416, 416).unwrap();
    let shown = retain_confident(out, 0.9);
    assert_eq!(shown.len(), 2);
}

#[test]
fn below_threshold_scores_produce_no_detections() {
    let labels = LabelTable::new(["a", "b"]).unwrap();
    let cfg = DetectorConfig {
        input_size: 8,
        cells: 2,
        ..DetectorConfig::default()
    };
    let detector = Detector::new(labels, cfg).unwrap();
    let tensors =
        RawOutputTensors::from_rows(&[[4.0; 4], [2.0; 4]], &[vec![0.4, 0.1], vec![0.0, 0.3]])
            .unwrap();
    assert!(detector.detect(&tensors, 8, 8).unwrap().is_empty());
}

#[test]
fn engine_errors_propagate_unchanged() {
    let labels = LabelTable::new(["a"]).unwrap();
    let cfg = DetectorConfig {
        input_size: 2,
        cells: 1,
        ..DetectorConfig::default()
    };
    let detector = Detector::new(labels, cfg).unwrap();
    let mut failing = |_: &InputTensor| -> DetPostResult<RawOutputTensors> {
        Err(DetPostError::Engine {
            reason: "interpreter not initialized".to_string(),
        })
    };
    let err = detector.recognize(&mut failing, &blank_input(2)).err().unwrap();
    assert_eq!(
        err,
        DetPostError::Engine {
            reason: "interpreter not initialized".to_string(),
        }
    );
}

#[test]
fn recognize_rejects_input_of_wrong_size() {
    let scenario = load_scenario();
    let detector = scenario_detector(&scenario);
    let mut engine = ReplayEngine {
        tensors: RawOutputTensors::from_rows(&scenario.boxes, &scenario.scores).unwrap(),
        calls: 0,
    };
    let err = detector
        .recognize(&mut engine, &blank_input(4))
        .err()
        .unwrap();
    assert_eq!(
        err,
        DetPostError::InvalidDimensions {
            width: 4,
            height: 4,
        }
    );
    assert_eq!(engine.calls, 0);
}

#[test]
fn nan_geometry_does_not_suppress_a_real_box() {
    let labels = LabelTable::new(["a"]).unwrap();
    let cfg = DetectorConfig {
        cells: 2,
        ..DetectorConfig::default()
    };
    let detector = Detector::new(labels, cfg).unwrap();
    let tensors = RawOutputTensors::from_rows(
        &[[f32::NAN; 4], [200.0, 200.0, 400.0, 400.0]],
        &[vec![0.95], vec![0.9]],
    )
    .unwrap();

    let out = detector.detect(&tensors, 416, 416).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id(), "1");
    assert_eq!(out[0].bbox(), BoundingBox::new(0.0, 0.0, 400.0, 400.0));
}

#[test]
fn empty_output_tensors_yield_no_detections() {
    let labels = LabelTable::new(["a", "b"]).unwrap();
    let cfg = DetectorConfig {
        cells: 0,
        ..DetectorConfig::default()
    };
    let detector = Detector::new(labels, cfg).unwrap();
    let tensors = RawOutputTensors::from_rows_with_classes(&[], &[], 2).unwrap();
    assert!(detector.detect(&tensors, 416, 416).unwrap().is_empty());
}

#[test]
fn prepare_engine_applies_configured_thread_count() {
    let labels = LabelTable::new(["a"]).unwrap();
    let cfg = DetectorConfig {
        num_threads: 2,
        ..DetectorConfig::default()
    };
    let detector = Detector::new(labels, cfg).unwrap();
    let mut engine = ThreadedEngine { threads: None };
    detector.prepare_engine(&mut engine).unwrap();
    assert_eq!(engine.threads, Some(2));

    // Closures take the no-op default.
    let mut closure_engine =
        |_: &InputTensor| RawOutputTensors::from_rows_with_classes(&[], &[], 1);
    detector.prepare_engine(&mut closure_engine).unwrap();
}
