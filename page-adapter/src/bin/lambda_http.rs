//! Pages Lambda (lambda_http variant) - the runtime decodes the API Gateway
//! event into an `http::Request`; the page handler still runs against the
//! synthetic request/recorder pair.

use std::sync::Arc;

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use page_adapter::{Adapter, ProfilePages};
use shared::http::error_response;
use shared::Config;
use tracing::error;
use tracing_subscriber::EnvFilter;

async fn handler(adapter: Arc<Adapter<ProfilePages>>, event: Request) -> Result<Response<Body>, Error> {
    match adapter.invoke_http(&event).await.into_http() {
        Ok(response) => Ok(response),
        Err(e) => {
            error!(error = %e, "Handler produced an invalid response");
            error_response(500, "Internal Server Error")
        }
    }
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
