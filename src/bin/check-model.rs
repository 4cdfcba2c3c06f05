// Load the packaged model and run one all-zero input through it.
// Meant for image builds: fails fast if the artifact is missing or broken.

use serverless_fer::{init_logging, Emotion, InferenceService, OnnxClassifier, ServiceConfig};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    init_logging();

    let mut config = ServiceConfig::from_env();
    if let Some(path) = env::args().nth(1) {
        config = config.with_model_path(path);
    }

    println!("======================================");
    println!("Checking model: {}", config.model_path.display());

    let classifier = match OnnxClassifier::load(&config.model_path, config.input_shape) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("Loaded model from {}", classifier.source().display());
    let service = InferenceService::new(Arc::new(classifier)).with_pixel_scale(config.pixel_scale);

    match service.classify_zeros() {
        Ok(prediction) => {
            let name = Emotion::from_index(prediction.label)
                .map(|e| e.name())
                .unwrap_or("unknown");
            println!("Output classes = {}", prediction.scores.len());
            println!("All-zero input -> {} ({})", prediction.label, name);
            if prediction.scores.len() != Emotion::COUNT {
                eprintln!(
                    "Warning: model has {} outputs, label set has {}",
                    prediction.scores.len(),
                    Emotion::COUNT
                );
            }
            println!("Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
