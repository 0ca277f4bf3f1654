//! Client for the backing calendar API.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::http::ErrorBody;
use crate::models::{MeetingType, User};
use crate::{Config, Error, Result};

/// Thin typed wrapper over the REST endpoints the booking pages read.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.api_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.api_base_url.clone(),
        })
    }

    /// Liveness probe against `GET /api/hello`.
    pub async fn hello(&self) -> Result<()> {
        let _: serde_json::Value = self.get_json("/api/hello").await?;
        Ok(())
    }

    /// Look a user up by their public handle.
    pub async fn get_user(&self, handle: &str) -> Result<User> {
        self.get_json(&format!("/api/users/{}", urlencoding::encode(handle)))
            .await
    }

    /// All meeting types owned by the user with this handle.
    /// Meeting types owned by `handle`. Rows that do not decode are logged
    /// and skipped.
    pub async fn get_meeting_types(&self, handle: &str) -> Result<Vec<MeetingType>> {
        let rows: Vec<Value> = self
            .get_json(&format!(
                "/api/users/{}/meeting-types",
                urlencoding::encode(handle)
            ))
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<MeetingType>(row) {
                Ok(meeting_type) => Some(meeting_type),
                Err(e) => {
                    warn!(handle = %handle, error = %e, "Skipping malformed meeting type");
                    None
                }
            })
            .collect())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Fetching from backing API");

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or(text);

            return Err(if status == reqwest::StatusCode::NOT_FOUND {
                Error::NotFound(message)
            } else {
                Error::Upstream {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        Ok(response.json().await?)
    }
}
