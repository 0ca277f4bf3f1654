//! Shared library for the calendar booking services.
//!
//! This crate provides the domain models, configuration, error type and the
//! backing API client used by the Lambda adapters and the mock API.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod models;

pub use api::ApiClient;
pub use config::Config;
pub use error::{Error, Result};
pub use http::ErrorBody;
pub use models::{Booking, BookingStatus, Calendar, CalendarProvider, IconType, LocationType, MeetingType, SyncStatus, User};
