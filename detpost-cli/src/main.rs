use clap::Parser;
use detpost::{
    retain_confident, Detection, Detector, DetectorConfig, FrameTransform, LabelTable,
    PostprocessParams, RawOutputTensors,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Decode and suppress detection head output (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for the decode and suppression stages.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    labels_path: String,
    tensors_path: String,
    image_width: usize,
    image_height: usize,
    confidence_threshold: f32,
    nms_threshold: f32,
    parallel: bool,
    frame_width: Option<usize>,
    frame_height: Option<usize>,
    min_display_confidence: f32,
    output_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let cfg = DetectorConfig::default();
        Self {
            labels_path: String::new(),
            tensors_path: String::new(),
            image_width: cfg.input_size,
            image_height: cfg.input_size,
            confidence_threshold: cfg.params.confidence_threshold,
            nms_threshold: cfg.params.nms_threshold,
            parallel: cfg.params.parallel,
            frame_width: None,
            frame_height: None,
            min_display_confidence: 0.0,
            output_path: None,
        }
    }
}

/// Raw head output dumped by an inference run.
#[derive(Debug, Deserialize)]
struct TensorDump {
    boxes: Vec<[f32; 4]>,
    scores: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    id: String,
    label: String,
    class_index: usize,
    confidence: f32,
    bbox: [f32; 4],
}

impl From<&Detection> for DetectionRecord {
    fn from(value: &Detection) -> Self {
        let b = value.bbox();
        Self {
            id: value.id().to_owned(),
            label: value.class_label().to_owned(),
            class_index: value.class_index(),
            confidence: value.confidence(),
            bbox: [b.left, b.top, b.right, b.bottom],
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    count: usize,
    detections: Vec<DetectionRecord>,
}

fn frame_transform(config: &Config) -> Result<Option<FrameTransform>, Box<dyn std::error::Error>> {
    match (config.frame_width, config.frame_height) {
        (Some(width), Some(height)) => {
            if config.image_width != config.image_height {
                return Err("frame mapping requires a square model input".into());
            }
            Ok(Some(FrameTransform::crop_to_frame(
                config.image_width,
                width,
                height,
            )?))
        }
        (None, None) => Ok(None),
        _ => Err("frame_width and frame_height must be set together".into()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("detpost=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.labels_path.is_empty() || config.tensors_path.is_empty() {
        return Err("labels_path and tensors_path must be set in the config".into());
    }
    let transform = frame_transform(&config)?;

    let labels = LabelTable::load(&config.labels_path)?;
    let dump: TensorDump = serde_json::from_str(&fs::read_to_string(&config.tensors_path)?)?;
    // An empty dump carries no class dimension; take it from the labels.
    let tensors = if dump.scores.is_empty() {
        RawOutputTensors::from_rows_with_classes(&dump.boxes, &dump.scores, labels.len())?
    } else {
        RawOutputTensors::from_rows(&dump.boxes, &dump.scores)?
    };
    tracing::info!(
        cells = tensors.layout().cells,
        classes = tensors.layout().classes,
        "loaded tensors"
    );

    let detector = Detector::new(
        labels,
        DetectorConfig {
            input_size: config.image_width,
            cells: tensors.layout().cells,
            classes: Some(tensors.layout().classes),
            params: PostprocessParams {
                confidence_threshold: config.confidence_threshold,
                nms_threshold: config.nms_threshold,
                parallel: config.parallel,
            },
            ..DetectorConfig::default()
        },
    )?;

    let mut detections = detector.detect(&tensors, config.image_width, config.image_height)?;
    if let Some(transform) = transform {
        detections = detections.iter().map(|d| d.mapped(&transform)).collect();
    }
    let detections = retain_confident(detections, config.min_display_confidence);

    let output = Output {
        count: detections.len(),
        detections: detections.iter().map(DetectionRecord::from).collect(),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
