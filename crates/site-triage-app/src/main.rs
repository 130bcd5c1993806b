#![warn(missing_docs)]
//! # site-triage binary
//!
//! Command-line entry point: analyse a photo, classify a saved model
//! response, or list the analysis history.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use site_triage_app::{
    AnalysisResponse, Analyzer, AppConfig, AppError, app_version, classify_raw,
    content_type_for_path, init_logging,
};
use site_triage_history::HistoryStore;
use tracing::error;

#[derive(Parser)]
#[command(name = "site-triage")]
#[command(version = site_triage_app::APP_VERSION)]
#[command(about = "Catheter-site photo triage", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse one image and record it in the history
    Analyze {
        /// Image file (jpeg, png or webp)
        path: PathBuf,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Normalize and classify a saved model response
    Classify {
        /// JSON file holding the model output
        path: PathBuf,

        /// Image id to use when the response carries none
        #[arg(long, default_value = "offline")]
        image_id: String,
    },
    /// List recent analyses, newest first
    History {
        /// Maximum number of entries
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Print the version
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("site-triage: {error}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.logging);

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("site-triage: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, config: &AppConfig) -> Result<(), AppError> {
    match command {
        Commands::Analyze { path, json } => {
            let analyzer = Analyzer::from_env_config(config)?;
            let response = analyze_file(&analyzer, &path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_summary(&response);
            }
        }
        Commands::Classify { path, image_id } => {
            let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path)?)?;
            let (record, classification) = classify_raw(&raw, &image_id);
            let output = serde_json::json!({
                "analysis": record,
                "classification": classification,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::History { limit } => {
            let store = HistoryStore::open(&config.storage_dir, config.history_limit)?;
            let mut entries = store.load()?;
            entries.truncate(limit);
            for entry in entries {
                println!(
                    "{}  {:<9} {:>3}  {}",
                    entry.timestamp,
                    entry.classification.label,
                    entry.classification.risk_score,
                    entry.original_filename
                );
            }
        }
        Commands::Version => println!("site-triage {}", app_version()),
    }
    Ok(())
}

fn analyze_file(analyzer: &Analyzer, path: &Path) -> Result<AnalysisResponse, AppError> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content_type = content_type_for_path(path).unwrap_or("application/octet-stream");
    analyzer.analyze(&filename, content_type, &bytes)
}

fn print_summary(response: &AnalysisResponse) {
    let classification = &response.classification;
    println!("request:     {}", response.request_id);
    println!("source:      {:?}", response.source);
    println!("label:       {}", classification.label);
    println!("risk score:  {}", classification.risk_score);
    println!("explanation: {}", classification.explanation);
    println!("stored as:   {}", response.history_entry.image_url);
}
