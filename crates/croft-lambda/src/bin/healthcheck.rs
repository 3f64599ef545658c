use croft_lambda::envelope::{ProxyRequest, ProxyResponse};
use croft_lambda::handlers::healthcheck;
use lambda_runtime::{Error, LambdaEvent, service_fn};

async fn handle_request(event: LambdaEvent<ProxyRequest>) -> Result<ProxyResponse, Error> {
    Ok(healthcheck::handle(&event.payload))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::tracing::init_default_subscriber();
    lambda_runtime::run(service_fn(handle_request)).await
}
