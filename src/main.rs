// src/main.rs
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use serverless_fer::{handler, init_logging, InferenceService, OnnxClassifier, ServiceConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let config = ServiceConfig::from_env();
    tracing::info!(?config, "starting");

    // Loaded once per cold start; a load failure aborts before serving
    let classifier = OnnxClassifier::load(&config.model_path, config.input_shape).map_err(|e| {
        tracing::error!(error = %e, "model load failed");
        e
    })?;
    let service = Arc::new(
        InferenceService::new(Arc::new(classifier)).with_pixel_scale(config.pixel_scale),
    );

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let service = Arc::clone(&service);
        async move { handler(&service, event).await }
    }))
    .await
}
