//! Profile and booking pages served through the adapter.
//!
//! Page data is read from the backing API and returned as JSON documents:
//! - `/` landing payload
//! - `/{handle}` profile with the user's active meeting types
//! - `/{handle}/{meetingTypeId}` booking page for one meeting type

use std::sync::OnceLock;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use shared::http::{ErrorBody, APPLICATION_JSON, CONTENT_TYPE};
use shared::{ApiClient, Config, MeetingType, User};
use tracing::{debug, info};

use crate::adapter::{HandlerError, PageHandler};
use crate::recorder::{ExpressResponse, NodeResponse, ResponseRecorder};
use crate::request::{ParsedUrl, SyntheticRequest};

const AVATAR_PALETTE: [&str; 8] = [
    "#F87171", // red-400
    "#FB923C", // orange-400
    "#FBBF24", // amber-400
    "#34D399", // emerald-400
    "#60A5FA", // blue-400
    "#818CF8", // indigo-400
    "#A78BFA", // violet-400
    "#F472B6", // pink-400
];

/// Stable palette color for a piece of text (sum of UTF-16 code units).
pub fn avatar_color(text: &str) -> &'static str {
    let sum: u32 = text.encode_utf16().map(u32::from).sum();
    AVATAR_PALETTE[sum as usize % AVATAR_PALETTE.len()]
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MeetingTypeCard {
    #[serde(flatten)]
    meeting_type: MeetingType,
    display_color: String,
}

impl From<MeetingType> for MeetingTypeCard {
    fn from(meeting_type: MeetingType) -> Self {
        let display_color = meeting_type
            .color
            .clone()
            .unwrap_or_else(|| avatar_color(&meeting_type.name).to_string());
        Self {
            meeting_type,
            display_color,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfilePage {
    user: User,
    initials: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar_color: Option<&'static str>,
    meeting_types: Vec<MeetingTypeCard>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookingPage {
    user: User,
    meeting_type: MeetingTypeCard,
}

/// Page handler backed by the calendar API.
pub struct ProfilePages {
    config: Config,
    client: OnceLock<ApiClient>,
}

impl ProfilePages {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            client: OnceLock::new(),
        }
    }

    fn client(&self) -> Result<&ApiClient, HandlerError> {
        self.client
            .get()
            .ok_or_else(|| "page handler used before prepare".into())
    }

    async fn profile(&self, handle: &str, res: &mut ResponseRecorder) -> Result<(), HandlerError> {
        let client = self.client()?;

        let user = match client.get_user(handle).await {
            Ok(user) => user,
            Err(shared::Error::NotFound(_)) => return not_found(res, "User"),
            Err(e) => return Err(e.into()),
        };
        let meeting_types = client.get_meeting_types(handle).await?;

        let avatar_color = user
            .avatar_url
            .is_none()
            .then(|| avatar_color(&user.name));

        let page = ProfilePage {
            initials: user.initials(),
            avatar_color,
            meeting_types: meeting_types
                .into_iter()
                .filter(|mt| mt.active)
                .map(MeetingTypeCard::from)
                .collect(),
            user,
        };

        debug!(handle, meeting_types = page.meeting_types.len(), "Rendered profile page");

        res.set_header(CONTENT_TYPE, APPLICATION_JSON);
        res.write(&serde_json::to_string(&page)?);
        res.end(None);
        Ok(())
    }

    async fn booking(
        &self,
        handle: &str,
        meeting_type_id: &str,
        res: &mut ResponseRecorder,
    ) -> Result<(), HandlerError> {
        let client = self.client()?;

        let user = match client.get_user(handle).await {
            Ok(user) => user,
            Err(shared::Error::NotFound(_)) => return not_found(res, "User"),
            Err(e) => return Err(e.into()),
        };

        let meeting_type = client
            .get_meeting_types(handle)
            .await?
            .into_iter()
            .find(|mt| mt.active && mt.id == meeting_type_id);

        match meeting_type {
            Some(meeting_type) => Ok(res.json(&BookingPage {
                user,
                meeting_type: meeting_type.into(),
            })?),
            None => not_found(res, "Meeting type"),
        }
    }
}

fn not_found(res: &mut ResponseRecorder, entity: &str) -> Result<(), HandlerError> {
    res.status(404).json(&ErrorBody::not_found(entity))?;
    Ok(())
}

#[async_trait]
impl PageHandler for ProfilePages {
    async fn prepare(&self) -> Result<(), HandlerError> {
        let client = ApiClient::new(&self.config)?;
        client.hello().await?;
        info!(api = %self.config.api_base_url, "Backing API reachable");

        // A concurrent preparation may have won; either client is fine.
        let _ = self.client.set(client);
        Ok(())
    }

    async fn handle(
        &self,
        req: &SyntheticRequest,
        res: &mut ResponseRecorder,
        url: &ParsedUrl,
    ) -> Result<(), HandlerError> {
        if !matches!(req.method(), "GET" | "HEAD") {
            return not_found(res, "Page");
        }

        match url.segments().as_slice() {
            [] => Ok(res.json(&json!({ "message": "Book time with the people you work with." }))?),
            [handle] => self.profile(handle, res).await,
            [handle, meeting_type_id] => self.booking(handle, meeting_type_id, res).await,
            _ => not_found(res, "Page"),
        }
    }
}
