// CLI tool for local expression classification
// Uses the same pipeline as the Lambda handler

use clap::{Parser, Subcommand};
use serverless_fer::{
    init_logging, Emotion, InferenceService, LabeledPrediction, OnnxClassifier, ServiceConfig,
};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "fer-cli")]
#[command(version = "0.1.0")]
#[command(about = "Facial expression classification CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify an image file, base64 text, or base64 read from stdin
    Predict {
        #[arg(short, long, conflicts_with = "base64")]
        image: Option<PathBuf>,
        #[arg(short, long)]
        base64: Option<String>,
        /// Model file or directory (defaults to MODEL_PATH or /opt/ml/model)
        #[arg(short, long, env = "MODEL_PATH")]
        model: Option<PathBuf>,
        /// Also print the per-class scores
        #[arg(long)]
        scores: bool,
        #[arg(long)]
        pretty: bool,
    },

    /// List the expression labels in model output order
    Labels,

    /// Print the effective configuration
    Config {
        #[arg(long)]
        pretty: bool,
    },
}

fn load_service(config: &ServiceConfig) -> Result<InferenceService, Box<dyn std::error::Error>> {
    let classifier = OnnxClassifier::load(&config.model_path, config.input_shape)?;
    Ok(InferenceService::new(Arc::new(classifier)).with_pixel_scale(config.pixel_scale))
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Predict { image, base64, model, scores, pretty } => {
            let mut config = ServiceConfig::from_env();
            if let Some(path) = model {
                config = config.with_model_path(path);
            }
            let service = load_service(&config)?;

            let prediction = if let Some(path) = image {
                let bytes = fs::read(&path)?;
                service.classify_bytes(&bytes)?
            } else if let Some(text) = base64 {
                service.classify_base64(&text)?
            } else {
                let mut buffer = String::new();
                io::stdin().read_to_string(&mut buffer)?;
                service.classify_base64(&buffer)?
            };

            if scores {
                for (i, score) in prediction.scores.iter().enumerate() {
                    let name = Emotion::from_index(i).map(|e| e.name()).unwrap_or("?");
                    eprintln!("  {:>2} {:10} {:.6}", i, name, score);
                }
            }

            let out = LabeledPrediction {
                predicted_label: prediction.label,
                label: Emotion::from_index(prediction.label).map(|e| e.name().to_string()),
            };
            println!("{}", to_json(&out, pretty)?);
        }

        Commands::Labels => {
            println!("Expression Labels");
            println!("=================\n");
            for emotion in Emotion::all() {
                println!("  {:>2}  {}", emotion.index(), emotion);
            }
        }

        Commands::Config { pretty } => {
            let config = ServiceConfig::from_env();
            println!("{}", to_json(&config, pretty)?);
        }
    }

    Ok(())
}
