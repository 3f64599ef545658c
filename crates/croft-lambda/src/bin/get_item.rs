use croft_lambda::ITEM_TABLE_ENV;
use croft_lambda::envelope::{ProxyRequest, ProxyResponse};
use croft_lambda::handlers::get_item;
use croft_lambda::store::DynamoItemStore;
use lambda_runtime::{Error, LambdaEvent, service_fn};

async fn handle_request(event: LambdaEvent<ProxyRequest>) -> Result<ProxyResponse, Error> {
    let table = std::env::var(ITEM_TABLE_ENV)
        .map_err(|_| Error::from(format!("{ITEM_TABLE_ENV} must be configured")))?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = DynamoItemStore::new(aws_sdk_dynamodb::Client::new(&aws_config), table);

    Ok(get_item::handle(&store, &event.payload).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::tracing::init_default_subscriber();
    lambda_runtime::run(service_fn(handle_request)).await
}
