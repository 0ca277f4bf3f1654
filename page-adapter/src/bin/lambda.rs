//! Pages Lambda - drives the page handler from raw API Gateway proxy events.

use std::sync::Arc;

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use page_adapter::{Adapter, ProfilePages, ProxyEvent, ProxyResponse};
use shared::Config;
use tracing_subscriber::EnvFilter;

async fn handler(
    adapter: Arc<Adapter<ProfilePages>>,
    event: LambdaEvent<ProxyEvent>,
) -> Result<ProxyResponse, Error> {
    Ok(adapter.invoke(&event.payload).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = Config::from_env()?;
    let adapter = Arc::new(Adapter::new(ProfilePages::new(config)));

    run(service_fn(move |event| {
        let adapter = Arc::clone(&adapter);
        async move { handler(adapter, event).await }
    }))
    .await
}
