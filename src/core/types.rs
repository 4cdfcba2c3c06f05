// Request and response types shared by the Lambda handler and CLI

use serde::{Deserialize, Serialize};

/// Invocation event; API Gateway proxy fields beyond `body` are ignored
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Request {
    /// Base64 text of the image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Request {
    pub fn new(body: impl Into<String>) -> Self {
        Request {
            body: Some(body.into()),
        }
    }
}

/// Successful response body; serialized as the only content of `body`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictionBody {
    pub predicted_label: usize,
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// API Gateway style response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl Response {
    pub fn ok(label: usize) -> Result<Self, serde_json::Error> {
        Ok(Response {
            status_code: 200,
            body: serde_json::to_string(&PredictionBody {
                predicted_label: label,
            })?,
        })
    }

    pub fn error(status_code: u16, message: impl Into<String>) -> Result<Self, serde_json::Error> {
        Ok(Response {
            status_code,
            body: serde_json::to_string(&ErrorBody {
                error: message.into(),
            })?,
        })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// CLI prediction output: the label index plus its expression name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledPrediction {
    pub predicted_label: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_ok_response_body_is_exact() {
        let response = Response::ok(4).unwrap();
        assert_eq!(response.status_code, 200);

        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body, json!({ "predicted_label": 4 }));
    }

    #[test]
    fn test_response_uses_status_code_key() {
        let value = serde_json::to_value(Response::error(400, "bad").unwrap()).unwrap();
        assert_eq!(value["statusCode"], 400);
        assert!(value.get("status_code").is_none());

        let body: ErrorBody = serde_json::from_str(value["body"].as_str().unwrap()).unwrap();
        assert_eq!(body.error, "bad");
    }

    #[test]
    fn test_request_ignores_gateway_fields() {
        let request: Request = serde_json::from_value(json!({
            "body": "aGVsbG8=",
            "isBase64Encoded": true,
            "headers": { "content-type": "text/plain" },
            "requestContext": {}
        }))
        .unwrap();
        assert_eq!(request.body.as_deref(), Some("aGVsbG8="));

        let empty: Request = serde_json::from_value(json!({ "Body": "x" })).unwrap();
        assert!(empty.body.is_none());
    }
}
