pub mod auth;
pub mod clubs;
pub mod discover;
pub mod events;
pub mod messages;
pub mod notifications;
pub mod settings;

pub use auth::*;
pub use clubs::*;
pub use discover::*;
pub use events::*;
pub use messages::*;
pub use notifications::*;
pub use settings::*;

use crate::error::ApiError;
use uuid::Uuid;

/// Preferred rendering for a failed action: the pipeline's user-facing
/// annotation when one exists, the raw error otherwise.
pub fn describe_error(err: &ApiError) -> String {
    err.user_message()
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string())
}

pub(crate) fn parse_uuid(input: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(input.trim())
        .map_err(|_| ApiError::InputError(format!("'{}' is not a valid id", input.trim())))
}
