//! Shared data models.
//!
//! Field names follow the camelCase JSON documents served by the backing API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A person who owns a booking page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub handle: String,
    pub name: String,
    pub email: String,
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl User {
    /// Up to two upper-cased initials taken from the display name.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IconType {
    #[serde(rename = "chat")]
    Chat,
    #[serde(rename = "video")]
    Video,
    #[serde(rename = "meeting")]
    Meeting,
    #[serde(rename = "Clock")]
    Clock,
    #[serde(rename = "Users")]
    Users,
    #[serde(rename = "Video")]
    VideoCamera,
    /// Any icon name this build does not know
    #[default]
    #[serde(rename = "unknown", other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationType {
    Virtual,
    Phone,
    InPerson,
    #[default]
    #[serde(other)]
    Other,
}

fn default_true() -> bool {
    true
}

/// A bookable kind of meeting offered by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingType {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    pub name: String,
    /// Minutes
    pub duration: u32,
    pub price: f64,
    pub description: String,
    #[serde(default)]
    pub icon_type: IconType,
    #[serde(rename = "type", default)]
    pub location_type: LocationType,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarProvider {
    Google,
    Outlook,
    Apple,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Syncing,
    Synced,
    Error,
    Disconnected,
}

/// An external calendar kept in sync with the booking page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub provider: CalendarProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
    pub sync_status: SyncStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Pending,
}

/// A client's reservation of a meeting type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub meeting_type_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    pub client_name: String,
    pub client_email: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
}

impl Booking {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

/// Ids in the JSON store are sometimes numbers, sometimes strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_numeric_id_and_optional_fields() {
        let user: User = serde_json::from_value(json!({
            "id": 1,
            "handle": "alice",
            "name": "Alice van Dyke",
            "email": "alice@example.com",
            "timezone": "America/New_York"
        }))
        .unwrap();

        assert_eq!(user.id, "1");
        assert_eq!(user.avatar_url, None);
        assert_eq!(user.initials(), "AV");

        let out = serde_json::to_value(&user).unwrap();
        assert!(out.get("avatarUrl").is_none());
    }

    #[test]
    fn test_initials_single_word() {
        let user = User {
            id: "2".into(),
            handle: "bob".into(),
            name: "bob".into(),
            email: "bob@example.com".into(),
            timezone: "UTC".into(),
            avatar_url: None,
            bio: None,
        };
        assert_eq!(user.initials(), "B");
    }

    #[test]
    fn test_meeting_type_defaults() {
        let mt: MeetingType = serde_json::from_value(json!({
            "id": "10",
            "userId": "1",
            "name": "Intro call",
            "duration": 30,
            "price": 0,
            "description": "Quick chat",
            "iconType": "Video"
        }))
        .unwrap();

        assert_eq!(mt.icon_type, IconType::VideoCamera);
        assert_eq!(mt.location_type, LocationType::Other);
        assert!(mt.active);
    }

    #[test]
    fn test_unrecognized_tags_fall_back() {
        let mt: MeetingType = serde_json::from_value(json!({
            "id": "12",
            "userId": "1",
            "name": "Call me",
            "duration": 15,
            "price": 0,
            "description": "Ring ring",
            "iconType": "phone",
            "type": "carrier-pigeon"
        }))
        .unwrap();

        assert_eq!(mt.icon_type, IconType::Unknown);
        assert_eq!(mt.location_type, LocationType::Other);
        assert_eq!(serde_json::to_value(mt.icon_type).unwrap(), "unknown");
    }

    #[test]
    fn test_meeting_type_location_kebab_case() {
        let mt: MeetingType = serde_json::from_value(json!({
            "id": 11,
            "userId": 1,
            "name": "Coffee",
            "duration": 60,
            "price": 25.5,
            "description": "In person",
            "iconType": "meeting",
            "type": "in-person",
            "location": "Main St",
            "active": false
        }))
        .unwrap();

        assert_eq!(mt.user_id, "1");
        assert_eq!(mt.location_type, LocationType::InPerson);
        assert!(!mt.active);
    }

    #[test]
    fn test_calendar_provider_tag() {
        let calendar: Calendar = serde_json::from_value(json!({
            "id": "c1",
            "name": "Work",
            "type": "google",
            "isActive": true,
            "lastSync": "2024-03-01T10:00:00Z",
            "syncStatus": "synced"
        }))
        .unwrap();

        assert_eq!(calendar.provider, CalendarProvider::Google);
        assert_eq!(calendar.sync_status, SyncStatus::Synced);
        assert!(calendar.last_sync.is_some());
    }

    #[test]
    fn test_booking_duration() {
        let booking: Booking = serde_json::from_value(json!({
            "id": "b1",
            "meetingTypeId": "10",
            "userId": "1",
            "clientName": "Carol",
            "clientEmail": "carol@example.com",
            "startTime": "2024-03-01T10:00:00Z",
            "endTime": "2024-03-01T10:45:00Z",
            "status": "pending"
        }))
        .unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.duration_minutes(), 45);
    }
}
