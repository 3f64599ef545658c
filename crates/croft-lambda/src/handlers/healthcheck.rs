//! Health-check handler, bound to the unauthenticated default route

use serde_json::json;

use crate::envelope::{ProxyRequest, ProxyResponse};

pub fn handle(request: &ProxyRequest) -> ProxyResponse {
    tracing::debug!(method = %request.http_method, path = %request.path, "health check");
    ProxyResponse::json(200, &json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_reports_ok() {
        let response = handle(&ProxyRequest::default());
        assert_eq!(response.status_code, 200);
        assert!(response.body.contains("ok"));
    }
}
