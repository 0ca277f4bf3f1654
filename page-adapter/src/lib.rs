//! Request adapter that drives a page handler written for a long-lived HTTP
//! server from single Lambda invocations.
//!
//! An invocation event becomes a [`SyntheticRequest`] plus a
//! [`ResponseRecorder`]; the handler writes into the recorder and the adapter
//! packages the result as a [`ProxyResponse`].

pub mod adapter;
pub mod event;
pub mod pages;
pub mod recorder;
pub mod request;

pub use adapter::{Adapter, AdapterError, HandlerError, PageHandler};
pub use event::{ProxyEvent, ProxyResponse, QueryParams};
pub use pages::ProfilePages;
pub use recorder::{ExpressResponse, NodeResponse, ResponseRecorder, SendPayload};
pub use request::{ParsedUrl, StreamLifecycle, SyntheticRequest};
