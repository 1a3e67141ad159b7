use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use facekeeper_core::detection::infrastructure::replay_face_encoder::ReplayFaceEncoder;
use facekeeper_core::pipeline::frame_annotator::{FaceAnnotation, FrameAnnotator};
use facekeeper_core::pipeline::recognize_faces_use_case::RecognizeFacesUseCase;
use facekeeper_core::registry::domain::identity_registry::IdentityRegistry;
use facekeeper_core::registry::domain::matcher::MatchPolicy;
use facekeeper_core::registry::domain::registry_config::RegistryConfig;
use facekeeper_core::registry::infrastructure::json_file_store::JsonFileStore;
use facekeeper_core::registry::infrastructure::shared_identity_registry::SharedIdentityRegistry;
use facekeeper_core::shared::frame::Frame;

/// Persistent face identities from detector output.
#[derive(Parser)]
#[command(name = "facekeeper")]
struct Cli {
    /// Config file (JSON). Defaults to the platform config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Registry file, overrides the config file.
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    /// Maximum descriptor distance for a match (lower = stricter).
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Tie-break among matches: first or nearest.
    #[arg(long, global = true)]
    match_policy: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve faces from a JSON-lines detections file and print annotations.
    Resolve {
        /// Detections file, one `{"frame": N, "faces": [...]}` object per line.
        detections: PathBuf,
    },
    /// List every known identity.
    List,
    /// Change the display name of an identity.
    Rename { id: u64, name: String },
}

/// Prints one JSON line per frame.
struct JsonLinesAnnotator<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> FrameAnnotator for JsonLinesAnnotator<W> {
    fn annotate(
        &mut self,
        frame: &Frame,
        faces: &[FaceAnnotation],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let line = serde_json::json!({ "frame": frame.index(), "faces": faces });
        writeln!(self.out, "{line}")?;
        Ok(())
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;
    log::info!(
        "Using registry {} (threshold {}, policy {})",
        config.storage_path.display(),
        config.threshold,
        config.match_policy
    );

    let store = JsonFileStore::new(&config.storage_path);
    let mut registry = IdentityRegistry::open(Box::new(store), &config)?;

    match cli.command {
        Command::Resolve { detections } => run_resolve(&detections, registry),
        Command::List => run_list(&registry),
        Command::Rename { id, name } => {
            registry.rename(id, &name)?;
            println!("{id}\t{}", name.trim());
            Ok(())
        }
    }
}

fn run_resolve(
    detections: &Path,
    registry: IdentityRegistry,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(detections)
        .map_err(|e| format!("Cannot open detections {}: {e}", detections.display()))?;
    let encoder = ReplayFaceEncoder::from_json_lines(BufReader::new(file))?;
    let indices = encoder.frame_indices();
    let total = indices.len();

    let mut use_case = RecognizeFacesUseCase::new(
        Box::new(encoder),
        SharedIdentityRegistry::new(registry),
        Box::new(JsonLinesAnnotator { out: io::stdout() }),
        None,
    );
    let summary = use_case.run(indices.into_iter().map(Frame::empty), total)?;

    log::info!(
        "Processed {} frames: {} faces, {} matched, {} new, {} skipped",
        summary.frames,
        summary.faces,
        summary.matched,
        summary.registered,
        summary.skipped
    );
    if summary.frames_failed > 0 {
        return Err(format!("{} frames could not be processed", summary.frames_failed).into());
    }
    Ok(())
}

fn run_list(registry: &IdentityRegistry) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = io::stdout().lock();
    for identity in registry.identities() {
        writeln!(
            out,
            "{}\t{}\t{} dims",
            identity.id,
            identity.display_name,
            identity.encoding.len()
        )?;
    }
    Ok(())
}

/// Defaults < config file < command-line flags.
fn build_config(cli: &Cli) -> Result<RegistryConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => RegistryConfig::load(path)?,
        None => RegistryConfig::load_or_default()?,
    };
    if let Some(storage) = &cli.storage {
        config.storage_path = storage.clone();
    }
    if let Some(threshold) = cli.threshold {
        config.threshold = threshold;
    }
    if let Some(policy) = &cli.match_policy {
        config.match_policy = policy.parse::<MatchPolicy>()?;
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use facekeeper_core::registry::domain::registry_state::IdentityId;
    use facekeeper_core::shared::region::FaceRegion;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli::parse_from([
            "facekeeper",
            "--config",
            "/nonexistent/config.json",
            "list",
        ]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.json");
        fs::write(
            &config_path,
            r#"{"threshold": 0.5, "storage_path": "/srv/faces.json", "match_policy": "first"}"#,
        )
        .unwrap();
        let config_arg = config_path.to_str().unwrap();

        let cli = Cli::parse_from(["facekeeper", "--config", config_arg, "list"]);
        let from_file = build_config(&cli).unwrap();
        assert_eq!(from_file.storage_path, PathBuf::from("/srv/faces.json"));
        assert_eq!(from_file.threshold, 0.5);
        assert_eq!(from_file.match_policy, MatchPolicy::First);

        let cli = Cli::parse_from([
            "facekeeper",
            "--config",
            config_arg,
            "--storage",
            "/tmp/faces.json",
            "--threshold",
            "0.4",
            "--match-policy",
            "nearest",
            "list",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.storage_path, PathBuf::from("/tmp/faces.json"));
        assert_eq!(config.threshold, 0.4);
        assert_eq!(config.match_policy, MatchPolicy::Nearest);
    }

    #[test]
    fn test_invalid_flag_values_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.json");
        fs::write(&config_path, "{}").unwrap();
        let config_arg = config_path.to_str().unwrap();

        let cli = Cli::parse_from(["facekeeper", "--config", config_arg, "list"]);
        assert!(build_config(&cli).is_ok());

        let cli = Cli::parse_from(["facekeeper", "--config", config_arg, "--threshold=-1", "list"]);
        assert!(build_config(&cli).is_err());

        let cli = Cli::parse_from([
            "facekeeper",
            "--config",
            config_arg,
            "--match-policy",
            "best",
            "list",
        ]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_annotator_writes_one_line_per_frame() {
        let mut annotator = JsonLinesAnnotator { out: Vec::new() };
        let id: IdentityId = 3;
        let faces = vec![FaceAnnotation {
            region: FaceRegion::new(1, 4, 3, 2),
            id,
            display_name: "Person 3".to_string(),
            is_new: true,
        }];

        annotator.annotate(&Frame::empty(7), &faces).unwrap();
        annotator.annotate(&Frame::empty(8), &[]).unwrap();

        let text = String::from_utf8(annotator.out).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["frame"], 7);
        assert_eq!(lines[0]["faces"][0]["display_name"], "Person 3");
        assert_eq!(lines[0]["faces"][0]["region"]["left"], 2);
        assert_eq!(lines[1]["faces"], serde_json::json!([]));
    }
}
