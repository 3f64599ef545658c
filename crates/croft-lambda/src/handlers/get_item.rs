//! Read handler for `GET /item/{itemId}`

use serde_json::json;

use crate::envelope::{ProxyRequest, ProxyResponse};
use crate::store::ItemStore;

pub async fn handle(store: &impl ItemStore, request: &ProxyRequest) -> ProxyResponse {
    let Some(item_id) = request.path_parameter("itemId") else {
        return ProxyResponse::json(400, &json!({ "error": "missing itemId path parameter" }));
    };

    match store.get(item_id).await {
        Ok(Some(item)) => ProxyResponse::json(200, &json!(item)),
        Ok(None) => {
            tracing::info!(item_id, "item not found");
            ProxyResponse::json(
                404,
                &json!({ "error": format!("No item found with itemId {item_id}") }),
            )
        }
        Err(e) => {
            tracing::error!(item_id, error = %e, "read failed");
            ProxyResponse::json(500, &json!({ "error": e.to_string() }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{FailingStore, MemoryStore};

    fn request_for(item_id: &str) -> ProxyRequest {
        serde_json::from_value(serde_json::json!({
            "httpMethod": "GET",
            "path": format!("/item/{item_id}"),
            "pathParameters": { "itemId": item_id },
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn returns_the_item_when_present() {
        let store = MemoryStore::new();
        store.seed("caesar", "romaine, parmesan, croutons");

        let response = handle(&store, &request_for("caesar")).await;
        assert_eq!(response.status_code, 200);
        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["id"], "caesar");
        assert_eq!(body["item"], "romaine, parmesan, croutons");
    }

    #[tokio::test]
    async fn returns_404_for_an_unknown_id() {
        let store = MemoryStore::new();
        let response = handle(&store, &request_for("nope")).await;
        assert_eq!(response.status_code, 404);
        assert!(response.body.contains("No item found with itemId nope"));
    }

    #[tokio::test]
    async fn returns_400_without_an_item_id() {
        let store = MemoryStore::new();
        let request = ProxyRequest::default();
        let response = handle(&store, &request).await;
        assert_eq!(response.status_code, 400);
    }

    #[tokio::test]
    async fn returns_500_when_storage_fails() {
        let response = handle(&FailingStore, &request_for("caesar")).await;
        assert_eq!(response.status_code, 500);
    }
}
