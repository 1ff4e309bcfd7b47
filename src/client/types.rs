use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FieldError;

/// Standard `{success, data}` envelope wrapping every non-auth response body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: T,
}

/// Best-effort shape of a non-success response body. Either field may be
/// absent; raw text is kept as a fallback by the classifier.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<FieldError>>,
}

// --- Auth ---

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of a successful login/register call. `refreshToken` is optional so
/// deployments without rotation still parse.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: User,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshResponse {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

pub struct LoginPayload {
    pub email: String,
    pub password: SecretString,
}

/// Internal mirror that exposes the secret for the wire only.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SerializableLoginPayload<'a> {
    email: &'a str,
    password: &'a str,
}

impl<'a> From<&'a LoginPayload> for SerializableLoginPayload<'a> {
    fn from(payload: &'a LoginPayload) -> Self {
        Self {
            email: &payload.email,
            password: payload.password.expose_secret(),
        }
    }
}

pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    pub password: SecretString,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SerializableRegisterPayload<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

impl<'a> From<&'a RegisterPayload> for SerializableRegisterPayload<'a> {
    fn from(payload: &'a RegisterPayload) -> Self {
        Self {
            username: &payload.username,
            email: &payload.email,
            password: payload.password.expose_secret(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

// --- Clubs ---

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Club {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub member_count: Option<u32>,
    pub is_member: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClubPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Update payload for `PUT /clubs`; the target club id travels in the body,
/// not the path.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClubPayload {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ClubQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ClubMember {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub role: Option<String>,
    pub joined_at: Option<DateTime<Utc>>,
}

// --- Events ---

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub club_id: Option<Uuid>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub rsvp_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventPayload {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub club_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub category: Option<String>,
    pub date_range: Option<String>,
    pub search: Option<String>,
}

// --- RSVP ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Going,
    Interested,
    NotGoing,
}

impl RsvpStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RsvpStatus::Going => "going",
            RsvpStatus::Interested => "interested",
            RsvpStatus::NotGoing => "not_going",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rsvp {
    pub id: Uuid,
    pub event_id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub status: RsvpStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Populated on `my-rsvps` listings.
    #[serde(default)]
    pub event: Option<Event>,
}

#[derive(Debug, Clone, Default)]
pub struct RsvpQuery {
    pub status: Option<RsvpStatus>,
    pub upcoming: Option<bool>,
}

// --- Discover / trending ---

#[derive(Debug, Clone, Default)]
pub struct DiscoverQuery {
    pub query: Option<String>,
    /// Result kind filter, serialized as the `type` parameter.
    pub kind: Option<String>,
    pub category: Option<String>,
    pub date_range: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscoverResults {
    pub events: Vec<Event>,
    pub clubs: Vec<Club>,
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Trending {
    pub events: Vec<Event>,
    pub clubs: Vec<Club>,
}

// --- Notifications ---

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub total: Option<u64>,
    pub page: Option<u32>,
    pub total_pages: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// --- Messages ---

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Conversation {
    pub id: Uuid,
    pub participants: Vec<User>,
    pub last_message: Option<Message>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub conversation_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationPayload {
    pub participant_ids: Vec<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_message: Option<String>,
}

// --- Settings ---

/// Account settings. All fields optional so the same struct serves both the
/// GET response and partial PUT updates.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

pub struct ChangePasswordPayload {
    pub current_password: SecretString,
    pub new_password: SecretString,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SerializableChangePasswordPayload<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

impl<'a> From<&'a ChangePasswordPayload> for SerializableChangePasswordPayload<'a> {
    fn from(payload: &'a ChangePasswordPayload) -> Self {
        Self {
            current_password: payload.current_password.expose_secret(),
            new_password: payload.new_password.expose_secret(),
        }
    }
}
