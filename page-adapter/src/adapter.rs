//! Invocation protocol: prepare once, build the synthetic pair, run the
//! handler, package the recorder.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures_util::FutureExt;
use lambda_http::Request;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::event::{ProxyEvent, ProxyResponse};
use crate::recorder::ResponseRecorder;
use crate::request::{ParsedUrl, SyntheticRequest};

/// Boxed error type handlers report, same shape as the Lambda runtime's.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum AdapterError {
    /// Handler failed its one-time preparation
    #[error("Handler preparation failed: {0}")]
    Prepare(HandlerError),

    /// Event could not be turned into a request
    #[error("Invalid request: {0}")]
    Request(String),

    /// Handler failed while processing the request
    #[error("Handler failed: {0}")]
    Handler(HandlerError),

    /// Handler panicked during preparation or handling
    #[error("Handler panicked: {0}")]
    Panicked(String),
}

/// A request handler written for a long-lived HTTP server.
#[async_trait]
pub trait PageHandler: Send + Sync {
    /// One-time setup, run on the first invocation of a process.
    async fn prepare(&self) -> Result<(), HandlerError>;

    async fn handle(
        &self,
        req: &SyntheticRequest,
        res: &mut ResponseRecorder,
        url: &ParsedUrl,
    ) -> Result<(), HandlerError>;
}

/// Owns the handler and its process-wide "prepared" state.
pub struct Adapter<H> {
    handler: H,
    prepared: OnceCell<()>,
}

impl<H: PageHandler> Adapter<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            prepared: OnceCell::new(),
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared.initialized()
    }

    /// Prepare the handler unless a previous invocation already did.
    ///
    /// Concurrent callers wait on the same preparation. A failure or panic
    /// leaves the cell empty, so the next invocation tries again.
    pub async fn ensure_ready(&self) -> Result<(), AdapterError> {
        self.prepared
            .get_or_try_init(|| async {
                info!("Preparing page handler");
                match AssertUnwindSafe(self.handler.prepare()).catch_unwind().await {
                    Ok(result) => result.map_err(AdapterError::Prepare),
                    Err(panic) => Err(AdapterError::Panicked(panic_message(panic))),
                }
            })
            .await?;
        Ok(())
    }

    /// Handle one raw proxy event. Never fails: every error becomes a 500.
    pub async fn invoke(&self, event: &ProxyEvent) -> ProxyResponse {
        info!(method = %event.http_method, path = %event.path, "Handling invocation");
        package(self.try_invoke(event).await)
    }

    /// Handle one event already decoded by `lambda_http`. Same failure
    /// semantics as [`Adapter::invoke`].
    pub async fn invoke_http(&self, event: &Request) -> ProxyResponse {
        info!(method = %event.method(), path = event.uri().path(), "Handling invocation");
        package(self.try_invoke_http(event).await)
    }

    async fn try_invoke(&self, event: &ProxyEvent) -> Result<ResponseRecorder, AdapterError> {
        self.ensure_ready().await?;
        let request = SyntheticRequest::from_event(event)?;
        self.serve(&request).await
    }

    async fn try_invoke_http(&self, event: &Request) -> Result<ResponseRecorder, AdapterError> {
        self.ensure_ready().await?;
        let request = SyntheticRequest::from_http(event)?;
        self.serve(&request).await
    }

    /// Run the prepared handler for one request and return what it recorded.
    async fn serve(&self, request: &SyntheticRequest) -> Result<ResponseRecorder, AdapterError> {
        let url = ParsedUrl::parse(request.url());
        let mut response = ResponseRecorder::new();

        let outcome = AssertUnwindSafe(self.handler.handle(request, &mut response, &url))
            .catch_unwind()
            .await;
        match outcome {
            Ok(result) => result.map_err(AdapterError::Handler)?,
            Err(panic) => return Err(AdapterError::Panicked(panic_message(panic))),
        }

        Ok(response)
    }
}

fn package(outcome: Result<ResponseRecorder, AdapterError>) -> ProxyResponse {
    match outcome {
        Ok(recorder) => ProxyResponse::from(recorder),
        Err(e) => {
            error!(error = %e, "Invocation failed");
            ProxyResponse::internal_error()
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
