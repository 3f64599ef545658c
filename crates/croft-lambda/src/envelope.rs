//! Proxy request/response envelope
//!
//! The gateway forwards requests with proxy-style integration: the
//! handler receives method, path parameters, headers and body, and
//! returns a status code, headers and body.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyRequest {
    pub http_method: String,
    pub path: String,
    pub path_parameters: Option<HashMap<String, String>>,
    pub headers: Option<HashMap<String, String>>,
    pub body: Option<String>,
}

impl ProxyRequest {
    pub fn path_parameter(&self, name: &str) -> Option<&str> {
        self.path_parameters
            .as_ref()
            .and_then(|p| p.get(name))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl ProxyResponse {
    /// JSON response with the given status.
    pub fn json(status_code: u16, body: &serde_json::Value) -> Self {
        Self {
            status_code,
            headers: HashMap::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]),
            body: body.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_a_gateway_event() {
        let event = serde_json::json!({
            "httpMethod": "GET",
            "path": "/item/apple",
            "pathParameters": { "itemId": "apple" },
            "headers": { "Authorization": "Bearer token" },
            "body": null,
        });
        let request: ProxyRequest = serde_json::from_value(event).unwrap();
        assert_eq!(request.http_method, "GET");
        assert_eq!(request.path_parameter("itemId"), Some("apple"));
        assert!(request.body.is_none());
    }

    #[test]
    fn tolerates_null_path_parameters() {
        let event = serde_json::json!({
            "httpMethod": "GET",
            "path": "/",
            "pathParameters": null,
        });
        let request: ProxyRequest = serde_json::from_value(event).unwrap();
        assert_eq!(request.path_parameter("itemId"), None);
    }

    #[test]
    fn responses_serialize_with_camel_case_keys() {
        let response = ProxyResponse::json(200, &serde_json::json!({"status": "ok"}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["headers"]["Content-Type"], "application/json");
    }
}
