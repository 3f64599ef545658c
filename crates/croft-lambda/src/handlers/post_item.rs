//! Write handler for `POST /item/{itemId}`

use serde::Deserialize;
use serde_json::json;

use crate::envelope::{ProxyRequest, ProxyResponse};
use crate::store::{Item, ItemStore};

#[derive(Debug, Deserialize)]
struct PostItemBody {
    item: String,
}

pub async fn handle(store: &impl ItemStore, request: &ProxyRequest) -> ProxyResponse {
    let Some(item_id) = request.path_parameter("itemId") else {
        return ProxyResponse::json(400, &json!({ "error": "missing itemId path parameter" }));
    };

    let body: PostItemBody = match request
        .body
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
    {
        Ok(Some(body)) => body,
        Ok(None) | Err(_) => {
            return ProxyResponse::json(
                400,
                &json!({ "error": "request body must be JSON with an \"item\" field" }),
            );
        }
    };

    let item = Item {
        id: item_id.to_string(),
        item: body.item,
    };
    match store.put(item).await {
        Ok(()) => ProxyResponse::json(200, &json!({ "message": "Operation Successful" })),
        Err(e) => {
            tracing::error!(item_id, error = %e, "write failed");
            ProxyResponse::json(500, &json!({ "message": "Operation Failed" }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{FailingStore, MemoryStore};

    fn request_for(item_id: &str, body: Option<&str>) -> ProxyRequest {
        serde_json::from_value(serde_json::json!({
            "httpMethod": "POST",
            "path": format!("/item/{item_id}"),
            "pathParameters": { "itemId": item_id },
            "body": body,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn writes_the_item_and_reports_success() {
        let store = MemoryStore::new();
        let request = request_for("greek", Some(r#"{"item": "feta, olives, cucumber"}"#));

        let response = handle(&store, &request).await;
        assert_eq!(response.status_code, 200);
        assert!(response.body.contains("Operation Successful"));

        let stored = store.get("greek").await.unwrap().unwrap();
        assert_eq!(stored.item, "feta, olives, cucumber");
    }

    #[tokio::test]
    async fn rejects_a_missing_body() {
        let store = MemoryStore::new();
        let response = handle(&store, &request_for("greek", None)).await;
        assert_eq!(response.status_code, 400);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn rejects_a_malformed_body() {
        let store = MemoryStore::new();
        let response = handle(&store, &request_for("greek", Some("not json"))).await;
        assert_eq!(response.status_code, 400);
    }

    #[tokio::test]
    async fn reports_failure_when_storage_fails() {
        let request = request_for("greek", Some(r#"{"item": "feta"}"#));
        let response = handle(&FailingStore, &request).await;
        assert_eq!(response.status_code, 500);
        assert!(response.body.contains("Operation Failed"));
    }
}
