// Lambda-specific handler and event plumbing

use crate::core::service::InferenceService;
use crate::core::types::{Request, Response};
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;

fn parse_request(payload: Value) -> Result<Request, String> {
    serde_json::from_value(payload).map_err(|e| format!("Invalid event: {}", e))
}

/// Classify the image in one invocation event.
///
/// Per-request failures become 4xx/5xx responses; only response
/// serialization can make the invocation itself fail.
pub fn process_event(service: &InferenceService, payload: Value) -> Result<Response, Error> {
    tracing::debug!(legacy_body = ?payload.get("Body"), "event received");

    let request = match parse_request(payload) {
        Ok(req) => req,
        Err(e) => return Ok(Response::error(400, format!("Bad Request: {}", e))?),
    };

    let Some(body) = request.body else {
        tracing::warn!("event has no body");
        return Ok(Response::error(400, "Bad Request: missing 'body' field")?);
    };

    match service.classify_base64(&body) {
        Ok(prediction) => {
            tracing::info!(
                predicted_label = prediction.label,
                confidence = prediction.confidence(),
                "classified image"
            );
            Ok(Response::ok(prediction.label)?)
        }
        Err(e) => {
            let status = e.status_code();
            if status >= 500 {
                tracing::error!(error = %e, status, "classification failed");
            } else {
                tracing::warn!(error = %e, status, "rejected request");
            }
            Ok(Response::error(status, e.to_string())?)
        }
    }
}

/// Main Lambda handler
pub async fn handler(service: &InferenceService, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let span = tracing::info_span!("invocation", request_id = %event.context.request_id);
    let response = span.in_scope(|| process_event(service, event.payload))?;
    Ok(serde_json::to_value(response)?)
}
