use croft_lambda::ITEM_TABLE_ENV;
use croft_lambda::handlers::populate;
use croft_lambda::store::DynamoItemStore;
use lambda_runtime::{Error, LambdaEvent, service_fn};

async fn handle_request(
    _event: LambdaEvent<serde_json::Value>,
) -> Result<serde_json::Value, Error> {
    let table = std::env::var(ITEM_TABLE_ENV)
        .map_err(|_| Error::from(format!("{ITEM_TABLE_ENV} must be configured")))?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = DynamoItemStore::new(aws_sdk_dynamodb::Client::new(&aws_config), table);

    let inserted = populate::handle(&store)
        .await
        .map_err(|e| Error::from(e.to_string()))?;
    Ok(serde_json::json!({ "inserted": inserted }))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::tracing::init_default_subscriber();
    lambda_runtime::run(service_fn(handle_request)).await
}
