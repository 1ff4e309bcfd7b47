// Declare modules
pub mod api;
pub mod pipeline;
pub mod store;
pub mod types;
mod util;

#[cfg(test)]
mod client_tests;

// Re-export the public API of the client module.
pub use self::pipeline::{
    ApiClient, ApiClientBuilder, AuthEvents, NoopAuthEvents, RetryPolicy, SessionExpiredFlag,
};
pub use self::store::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StoreError};
pub use self::types::{
    AuthResponse, ChangePasswordPayload, Club, ClubMember, ClubQuery, Conversation,
    CreateClubPayload, CreateConversationPayload, CreateEventPayload, DiscoverQuery,
    DiscoverResults, Event, EventQuery, LoginPayload, Message, Notification, NotificationPage,
    PageQuery, RegisterPayload, Rsvp, RsvpQuery, RsvpStatus, SendMessagePayload, Trending,
    UpdateClubPayload, UpdateEventPayload, UpdateProfilePayload, User, UserSettings,
};
