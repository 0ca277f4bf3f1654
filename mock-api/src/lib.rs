//! Mock REST API standing in for the calendar backend during development.
//!
//! Every top-level array in the JSON document becomes a CRUD collection under
//! `/api/{collection}`; users additionally resolve by handle.

pub mod config;
pub mod error;
pub mod routes;
pub mod store;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::router;
pub use store::JsonStore;
