//! Tampering Analysis CLI
//!
//! Runs error level analysis and the tampering classifier over one or more
//! document images, writes one ELA artifact per image and prints each result as a
//! JSON line on stdout.
//!
//! # Usage
//!
//! ```bash
//! ela-analyze [OPTIONS] --model <MODEL> <IMAGES>...
//! ```
//!
//! # Example
//!
//! ```bash
//! RUST_LOG=info ela-analyze --casia \
//!     -m models/model_casia_run1.onnx \
//!     -o static/ela \
//!     scan1.jpg scan2.png
//! ```

use clap::Parser;
use ela_forensics::codec::is_supported_extension;
use ela_forensics::core::config::OrtExecutionProvider;
use ela_forensics::core::init_tracing;
use ela_forensics::prelude::*;
use ela_forensics::processors::Amplification;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Command-line arguments for the analysis tool
#[derive(Parser)]
#[command(name = "ela-analyze")]
#[command(about = "Detects tampering in document images with error level analysis")]
struct Args {
    /// Path to the ONNX classifier weights (overrides the config file)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for ELA artifacts (overrides the config file)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Paths to input document images
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Device to use for inference (e.g., 'cpu', 'cuda', 'cuda:0'); replaces any
    /// execution providers set in the config file
    #[arg(long)]
    device: Option<String>,

    /// Use the max-normalized ELA stretch the CASIA weights were trained on
    #[arg(long)]
    casia: bool,

    /// Session pool size for concurrent inference
    #[arg(long)]
    session_pool_size: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// One line of output.
#[derive(Serialize)]
struct OutputLine<'a> {
    image: &'a Path,
    #[serde(flatten)]
    result: OutputResult,
}

#[derive(Serialize)]
#[serde(untagged)]
enum OutputResult {
    Report(AnalysisReport),
    Failure { error_kind: String, error: String },
}

fn parse_device(device: &str) -> Result<Vec<OrtExecutionProvider>, Box<dyn std::error::Error>> {
    let device = device.to_lowercase();

    if device == "cpu" {
        return Ok(vec![OrtExecutionProvider::CPU]);
    }

    let device_id = if device == "cuda" {
        0
    } else if let Some(id) = device.strip_prefix("cuda:") {
        id.parse::<i32>()
            .map_err(|_| format!("Invalid CUDA device ID: {id}"))?
    } else {
        return Err(
            format!("Unsupported device: {device}. Supported devices: cpu, cuda, cuda:N").into(),
        );
    };

    if cfg!(feature = "cuda") {
        Ok(vec![
            OrtExecutionProvider::CUDA {
                device_id: Some(device_id),
            },
            OrtExecutionProvider::CPU,
        ])
    } else {
        warn!("CUDA requested but cuda feature not enabled. Falling back to CPU.");
        Ok(vec![OrtExecutionProvider::CPU])
    }
}

fn build_config(args: &Args) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };

    if let Some(model) = &args.model {
        config = config.with_weights_path(model);
    }
    if let Some(dir) = &args.output_dir {
        config = config.with_artifact_dir(dir);
    }
    if args.casia {
        config.ela.amplification = Amplification::MaxNormalized;
    }
    if let Some(size) = args.session_pool_size {
        config.model.inference = config.model.inference.clone().session_pool_size(size);
    }

    if let Some(device) = &args.device {
        let session = config
            .model
            .inference
            .ort_session
            .clone()
            .unwrap_or_default()
            .with_execution_providers(parse_device(device)?);
        config.model.inference.ort_session = Some(session);
    }

    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = Args::parse();
    let config = build_config(&args)?;

    if !config.model.weights_path.is_file() {
        error!("Model file not found: {}", config.model.weights_path.display());
        return Err("Model file not found".into());
    }

    if args.verbose {
        info!("Analysis configuration:");
        info!("  Weights: {}", config.model.weights_path.display());
        info!("  JPEG quality: {}", config.ela.quality);
        info!("  Amplification: {:?}", config.ela.amplification);
        info!(
            "  Input shape: ({}, {})",
            config.model.input_shape.0, config.model.input_shape.1
        );
        info!("  Artifacts: {}", config.artifacts.dir.display());
    }

    let store = Arc::new(InMemoryDocumentStore::new());
    let owner = OwnerId::new(0);
    let mut documents = Vec::new();
    for path in &args.images {
        if !is_supported_extension(path) {
            warn!("Skipping {}: unsupported file extension", path.display());
            continue;
        }
        let document = store.insert(path.clone(), owner);
        documents.push((document.id, path.as_path()));
    }

    if documents.is_empty() {
        error!("No images with a supported extension (png, jpg, jpeg, tiff)");
        return Err("No valid image files found".into());
    }

    let orchestrator = AnalysisOrchestrator::from_config(store, &config)?;

    info!("Analyzing {} images...", documents.len());
    let start = Instant::now();
    let ids: Vec<DocumentId> = documents.iter().map(|(id, _)| *id).collect();
    let results = orchestrator.analyze_batch(&ids);
    info!(
        "Analysis completed in {:.2}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    let mut failures = 0usize;
    let mut tampered = 0usize;
    for (&(_, image), result) in documents.iter().zip(results) {
        let result = match result {
            Ok(report) => {
                if report.verdict.is_tampered() {
                    tampered += 1;
                }
                if args.verbose {
                    info!(
                        "{}: {} ({:.2}%)",
                        image.display(),
                        report.verdict.label,
                        report.verdict.confidence_percent()
                    );
                }
                OutputResult::Report(report)
            }
            Err(e) => {
                failures += 1;
                error!("{}: {}", image.display(), e);
                OutputResult::Failure {
                    error_kind: e.kind().to_string(),
                    error: e.to_string(),
                }
            }
        };
        println!("{}", serde_json::to_string(&OutputLine { image, result })?);
    }

    info!("{tampered} of {} documents flagged as tampered", documents.len());
    if failures > 0 {
        warn!("{failures} of {} analyses failed", documents.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["ela-analyze"];
        argv.extend_from_slice(extra);
        argv.push("scan.jpg");
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_device_replaces_configured_providers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "model": {{ "inference": {{ "ort_session": {{
                "execution_providers": ["CPU"]
            }} }} }} }}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let config = build_config(&args(&["--config", path, "--device", "cpu"])).unwrap();
        let session = config.model.inference.ort_session.unwrap();
        assert_eq!(
            session.get_execution_providers(),
            vec![OrtExecutionProvider::CPU]
        );
    }

    #[test]
    fn test_configured_providers_kept_without_device() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "model": {{ "inference": {{ "ort_session": {{
                "execution_providers": ["CPU"]
            }} }} }} }}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let config = build_config(&args(&["--config", path])).unwrap();
        let session = config.model.inference.ort_session.unwrap();
        assert_eq!(session.execution_providers, Some(vec![OrtExecutionProvider::CPU]));
    }

    #[test]
    fn test_casia_flag_pins_max_normalized_stretch() {
        let config = build_config(&args(&["--casia"])).unwrap();
        assert_eq!(config.ela.amplification, Amplification::MaxNormalized);

        let config = build_config(&args(&[])).unwrap();
        assert!(matches!(config.ela.amplification, Amplification::Fixed { .. }));
    }
}
