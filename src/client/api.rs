use uuid::Uuid;

use super::pipeline::{ApiClient, RequestSpec};
use super::types::{
    AuthResponse, ChangePasswordPayload, Club, ClubMember, ClubQuery, Conversation,
    CreateClubPayload, CreateConversationPayload, CreateEventPayload, DiscoverQuery,
    DiscoverResults, Event, EventQuery, LoginPayload, Message, NotificationPage, PageQuery,
    RegisterPayload, Rsvp, RsvpQuery, RsvpStatus, SendMessagePayload, SerializableChangePasswordPayload,
    SerializableLoginPayload, SerializableRegisterPayload, Trending, UpdateClubPayload,
    UpdateEventPayload, UpdateProfilePayload, User, UserSettings,
};
use crate::error::ApiError;

const TARGET: &str = "uninexus_cli::client::api";

impl ApiClient {
    // --- Auth ---

    /// Authenticates and persists the returned token pair in the credential
    /// store.
    pub async fn login(&self, credentials: &LoginPayload) -> Result<User, ApiError> {
        tracing::info!(target: TARGET, email = %credentials.email, "logging in");
        let spec = RequestSpec::post("/api/auth/login")
            .json(&SerializableLoginPayload::from(credentials))?;
        let auth: AuthResponse = self.send_json(spec).await?;
        self.store_session(&auth)?;
        Ok(auth.user)
    }

    /// Registers a new account and persists the returned token pair.
    pub async fn register(&self, payload: &RegisterPayload) -> Result<User, ApiError> {
        tracing::info!(target: TARGET, username = %payload.username, "registering account");
        let spec = RequestSpec::post("/api/auth/register")
            .json(&SerializableRegisterPayload::from(payload))?;
        let auth: AuthResponse = self.send_json(spec).await?;
        self.store_session(&auth)?;
        Ok(auth.user)
    }

    /// Ends the server-side session. The local token pair is cleared even
    /// when the server call fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        tracing::info!(target: TARGET, "logging out");
        let result = self.send_unit(RequestSpec::post("/api/auth/logout")).await;
        self.credential_store().clear()?;
        result
    }

    pub async fn get_profile(&self) -> Result<User, ApiError> {
        self.send_data(RequestSpec::get("/api/users/profile")).await
    }

    pub async fn update_profile(&self, payload: &UpdateProfilePayload) -> Result<User, ApiError> {
        self.send_data(RequestSpec::put("/api/users/profile").json(payload)?)
            .await
    }

    fn store_session(&self, auth: &AuthResponse) -> Result<(), ApiError> {
        self.credential_store().set_access_token(&auth.token)?;
        if let Some(refresh) = &auth.refresh_token {
            self.credential_store().set_refresh_token(refresh)?;
        }
        Ok(())
    }

    // --- Clubs ---

    pub async fn get_clubs(&self, query: &ClubQuery) -> Result<Vec<Club>, ApiError> {
        let spec = RequestSpec::get("/api/clubs")
            .query_opt("category", query.category.clone())
            .query_opt("search", query.search.clone());
        self.send_data(spec).await
    }

    pub async fn get_club(&self, id: Uuid) -> Result<Club, ApiError> {
        self.send_data(RequestSpec::get(format!("/api/clubs/{id}")))
            .await
    }

    pub async fn create_club(&self, payload: &CreateClubPayload) -> Result<Club, ApiError> {
        self.send_data(RequestSpec::post("/api/clubs").json(payload)?)
            .await
    }

    /// Updates a club. The backend takes the id in the body, not the path.
    pub async fn update_club(&self, payload: &UpdateClubPayload) -> Result<Club, ApiError> {
        self.send_data(RequestSpec::put("/api/clubs").json(payload)?)
            .await
    }

    /// Deletes a club, identified through the request body.
    pub async fn delete_club(&self, id: Uuid) -> Result<(), ApiError> {
        let spec = RequestSpec::delete("/api/clubs").json(&serde_json::json!({ "id": id }))?;
        self.send_unit(spec).await
    }

    pub async fn join_club(&self, id: Uuid) -> Result<(), ApiError> {
        tracing::info!(target: TARGET, club_id = %id, "joining club");
        self.send_unit(RequestSpec::post(format!("/api/clubs/{id}/join")))
            .await
    }

    pub async fn leave_club(&self, id: Uuid) -> Result<(), ApiError> {
        tracing::info!(target: TARGET, club_id = %id, "leaving club");
        self.send_unit(RequestSpec::delete(format!("/api/clubs/{id}/leave")))
            .await
    }

    pub async fn get_club_members(&self, id: Uuid) -> Result<Vec<ClubMember>, ApiError> {
        self.send_data(RequestSpec::get(format!("/api/clubs/{id}/members")))
            .await
    }

    pub async fn get_club_events(&self, id: Uuid) -> Result<Vec<Event>, ApiError> {
        self.send_data(RequestSpec::get(format!("/api/clubs/{id}/events")))
            .await
    }

    // --- Events ---

    pub async fn get_events(&self, query: &EventQuery) -> Result<Vec<Event>, ApiError> {
        let spec = RequestSpec::get("/api/events")
            .query_opt("category", query.category.clone())
            .query_opt("dateRange", query.date_range.clone())
            .query_opt("search", query.search.clone());
        self.send_data(spec).await
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Event, ApiError> {
        self.send_data(RequestSpec::get(format!("/api/events/{id}")))
            .await
    }

    pub async fn create_event(&self, payload: &CreateEventPayload) -> Result<Event, ApiError> {
        self.send_data(RequestSpec::post("/api/events").json(payload)?)
            .await
    }

    pub async fn update_event(
        &self,
        id: Uuid,
        payload: &UpdateEventPayload,
    ) -> Result<Event, ApiError> {
        self.send_data(RequestSpec::put(format!("/api/events/{id}")).json(payload)?)
            .await
    }

    pub async fn delete_event(&self, id: Uuid) -> Result<(), ApiError> {
        self.send_unit(RequestSpec::delete(format!("/api/events/{id}")))
            .await
    }

    // --- RSVP ---

    /// Creates or replaces the caller's RSVP for an event.
    pub async fn create_rsvp(&self, event_id: Uuid, status: RsvpStatus) -> Result<Rsvp, ApiError> {
        tracing::info!(target: TARGET, %event_id, status = status.as_str(), "submitting rsvp");
        let spec = RequestSpec::post(format!("/api/rsvp/events/{event_id}"))
            .json(&serde_json::json!({ "status": status }))?;
        self.send_data(spec).await
    }

    pub async fn get_my_rsvps(&self, query: &RsvpQuery) -> Result<Vec<Rsvp>, ApiError> {
        let spec = RequestSpec::get("/api/rsvp/my-rsvps")
            .query_opt("status", query.status.map(RsvpStatus::as_str))
            .query_opt("upcoming", query.upcoming.map(|v| v.to_string()));
        self.send_data(spec).await
    }

    pub async fn get_event_rsvps(
        &self,
        event_id: Uuid,
        page: &PageQuery,
    ) -> Result<Vec<Rsvp>, ApiError> {
        let spec = RequestSpec::get(format!("/api/rsvp/events/{event_id}"))
            .query_opt("page", page.page.map(|v| v.to_string()))
            .query_opt("limit", page.limit.map(|v| v.to_string()));
        self.send_data(spec).await
    }

    pub async fn delete_rsvp(&self, event_id: Uuid) -> Result<(), ApiError> {
        self.send_unit(RequestSpec::delete(format!("/api/rsvp/events/{event_id}")))
            .await
    }

    // --- Discover / trending ---

    pub async fn discover(&self, query: &DiscoverQuery) -> Result<DiscoverResults, ApiError> {
        let spec = RequestSpec::get("/api/discover")
            .query_opt("query", query.query.clone())
            .query_opt("type", query.kind.clone())
            .query_opt("category", query.category.clone())
            .query_opt("dateRange", query.date_range.clone());
        self.send_data(spec).await
    }

    pub async fn get_trending(&self) -> Result<Trending, ApiError> {
        self.send_data(RequestSpec::get("/api/trending")).await
    }

    // --- Notifications ---

    pub async fn get_notifications(&self, page: &PageQuery) -> Result<NotificationPage, ApiError> {
        let spec = RequestSpec::get("/api/notifications")
            .query_opt("page", page.page.map(|v| v.to_string()))
            .query_opt("limit", page.limit.map(|v| v.to_string()));
        self.send_data(spec).await
    }

    pub async fn mark_notification_read(&self, id: Uuid) -> Result<(), ApiError> {
        self.send_unit(RequestSpec::put(format!("/api/notifications/{id}/read")))
            .await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<(), ApiError> {
        self.send_unit(RequestSpec::put("/api/notifications/read-all"))
            .await
    }

    // --- Messages ---

    pub async fn get_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.send_data(RequestSpec::get("/api/messages/conversations"))
            .await
    }

    pub async fn get_conversation_messages(&self, id: Uuid) -> Result<Vec<Message>, ApiError> {
        self.send_data(RequestSpec::get(format!("/api/messages/conversations/{id}")))
            .await
    }

    pub async fn send_message(&self, payload: &SendMessagePayload) -> Result<Message, ApiError> {
        self.send_data(RequestSpec::post("/api/messages").json(payload)?)
            .await
    }

    pub async fn create_conversation(
        &self,
        payload: &CreateConversationPayload,
    ) -> Result<Conversation, ApiError> {
        self.send_data(RequestSpec::post("/api/messages/conversations").json(payload)?)
            .await
    }

    // --- Settings ---

    pub async fn get_settings(&self) -> Result<UserSettings, ApiError> {
        self.send_data(RequestSpec::get("/api/settings")).await
    }

    pub async fn update_settings(&self, settings: &UserSettings) -> Result<UserSettings, ApiError> {
        self.send_data(RequestSpec::put("/api/settings").json(settings)?)
            .await
    }

    pub async fn change_password(&self, payload: &ChangePasswordPayload) -> Result<(), ApiError> {
        tracing::info!(target: TARGET, "changing password");
        let spec = RequestSpec::put("/api/settings/password")
            .json(&SerializableChangePasswordPayload::from(payload))?;
        self.send_unit(spec).await
    }
}
