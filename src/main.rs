mod config;
mod data;
mod error;
mod model;
mod types;
mod web;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use config::ServiceConfig;
use data::SensorFrame;
use model::RulPredictor;
use web::{start_server, AppState};

#[derive(Parser)]
#[command(name = "rul-service")]
#[command(version = "0.1.0")]
#[command(about = "RUL prediction service for equipment sensor data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the prediction HTTP server
    Serve {
        /// Listen port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Predict RUL for a sensor CSV on disk
    Predict {
        /// Path to the CSV file
        file: String,
    },
    /// Show metadata of the loaded model
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ServiceConfig::load(&cli.config)?;
    if let Err(errors) = config.validate() {
        for e in &errors {
            error!("Config: {}", e);
        }
        return Err(anyhow!("Invalid configuration"));
    }

    // Model artifacts are loaded once; every command needs them.
    let predictor = RulPredictor::load(&config.model.weights_path, &config.model.stats_path)?;

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            let state = AppState::new(predictor);
            start_server(state, &config.server.host, port).await?;
        }
        Commands::Predict { file } => {
            predict_file(&predictor, &file)?;
        }
        Commands::Info => {
            print_model_info(&predictor);
        }
    }

    Ok(())
}

fn predict_file(predictor: &RulPredictor, path: &str) -> Result<()> {
    let bytes = std::fs::read(path)?;
    let frame = SensorFrame::from_csv_bytes(&bytes)?;
    let prediction = predictor.predict(&frame)?;

    println!("\n=== RUL Prediction ===");
    println!("File: {}", path);
    println!(
        "Rows: {} (last {} cycles analyzed)",
        frame.n_rows(),
        prediction.cycles_analyzed
    );
    if let Some(cycle) = frame.last_cycle() {
        println!("Last cycle: {}", cycle);
    }
    println!("Predicted RUL: {:.2} cycles", prediction.rul);
    println!("Status: {} ({})", prediction.status, prediction.status.color());

    Ok(())
}

fn print_model_info(predictor: &RulPredictor) {
    println!("\n=== Model Info ===");
    println!(
        "Features ({}): {}",
        predictor.feature_cols().len(),
        predictor.feature_cols().join(", ")
    );
    println!("Window: {} cycles", predictor.seq_len());
    println!("Hidden size: {}", predictor.hidden_size());
    println!("Thresholds: healthy > 100, monitor > 50, critical otherwise");
}
