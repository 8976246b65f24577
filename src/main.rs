use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use flowdraft::config::{ConfigError, EditorConfig};
use flowdraft::diagram::{Diagram, validate_diagram};
use flowdraft::export::{self, ExportError, ExportFormat, ExportOptions, Quality};
use flowdraft::services::ErrorCode;
use flowdraft::services::generation::{DiagramGenerator, GenerationError, HeuristicGenerator};
use flowdraft::services::session::EditorSession;
use flowdraft::steps;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{} ({})", .0, .0.error_code())]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("diagram has {0} violation(s)")]
    InvalidDiagram(usize),
}

#[derive(Parser, Debug)]
#[command(name = "flowdraft", about = "Turn a process description into a flowchart")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the steps extracted from a prompt as JSON.
    Steps { prompt: String },
    /// Generate a laid-out diagram and print or export it.
    Generate {
        prompt: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        #[arg(long, default_value = "high")]
        quality: Quality,
        /// Directory to write the export into. SVG and JSON print to stdout
        /// when absent; PNG and PDF default to the current directory.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Leave the background transparent.
        #[arg(long)]
        no_background: bool,
        /// Draw the snap grid.
        #[arg(long)]
        grid: bool,
    },
    /// Check a diagram JSON file and print every violation.
    Validate { file: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Svg,
    Png,
    Pdf,
}

impl OutputFormat {
    fn export_format(self) -> Option<ExportFormat> {
        match self {
            Self::Json => None,
            Self::Svg => Some(ExportFormat::Svg),
            Self::Png => Some(ExportFormat::Png),
            Self::Pdf => Some(ExportFormat::Pdf),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Steps { prompt } => run_steps(&prompt),
        Command::Generate { prompt, format, quality, out, no_background, grid } => {
            run_generate(&prompt, format, quality, out, !no_background, grid).await
        }
        Command::Validate { file } => run_validate(file).await,
    }
}

fn run_steps(prompt: &str) -> Result<(), CliError> {
    let steps = steps::extract_steps(prompt);
    println!("{}", serde_json::to_string_pretty(&steps)?);
    Ok(())
}

async fn run_generate(
    prompt: &str,
    format: OutputFormat,
    quality: Quality,
    out: Option<PathBuf>,
    include_background: bool,
    include_grid: bool,
) -> Result<(), CliError> {
    let config = EditorConfig::from_env()?;
    let generator: Arc<dyn DiagramGenerator> = Arc::new(HeuristicGenerator::from_config(&config));
    let session = EditorSession::from_config(&config, generator);
    let diagram = session.generate(prompt).await?;

    let Some(export_format) = format.export_format() else {
        let json = serde_json::to_string_pretty(diagram.as_ref())?;
        match out {
            Some(dir) => {
                let file = export::ExportedFile {
                    filename: format!("{}.json", diagram.id),
                    mime: "application/json",
                    bytes: json.into_bytes(),
                };
                let path = export::save_export(&file, &dir).await?;
                eprintln!("wrote {}", path.display());
            }
            None => println!("{json}"),
        }
        return Ok(());
    };

    let options = ExportOptions { quality, include_background, include_grid, ..ExportOptions::new(export_format) };
    let file = export::export_diagram(&diagram, &options)?;
    match (out, export_format) {
        (None, ExportFormat::Svg) => println!("{}", String::from_utf8_lossy(&file.bytes)),
        (out, _) => {
            let dir = out.unwrap_or_else(|| PathBuf::from("."));
            let path = export::save_export(&file, &dir).await?;
            eprintln!("wrote {}", path.display());
        }
    }
    Ok(())
}

async fn run_validate(path: PathBuf) -> Result<(), CliError> {
    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| CliError::Read { path: path.clone(), source })?;
    let diagram = Diagram::from_json(&raw)?;

    let violations = validate_diagram(&diagram);
    if violations.is_empty() {
        println!("ok: {} nodes, {} connections", diagram.nodes.len(), diagram.connections.len());
        return Ok(());
    }
    for violation in &violations {
        println!("{violation}");
    }
    Err(CliError::InvalidDiagram(violations.len()))
}
