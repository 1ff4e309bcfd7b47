// Declare modules
pub mod client;
pub mod error;
pub mod handlers;
pub mod io;

// Re-export items needed by main.rs and tests
pub use client::{
    ApiClient, AuthEvents, CredentialStore, FileCredentialStore, MemoryCredentialStore,
    NoopAuthEvents, RetryPolicy, SessionExpiredFlag,
};
pub use error::ApiError;

/// State of the interactive menu loop in main.rs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    MainMenu,
    Events,
    Clubs,
    Messaging,
    Account,
}

/// Navigation result returned by menu handlers in main.rs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuNavigation {
    GoTo(MenuState),
    ReturnToMainMenu,
    Logout,
    Quit,
}

pub type MenuResult = Result<MenuNavigation, ApiError>;
