use reqwest::{Response, Url};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

// Helper to join path to base URL
pub(super) fn build_url(base: &Url, path: &str) -> Result<Url, ApiError> {
    base.join(path).map_err(ApiError::UrlParse)
}

/// Deserializes a successful response body, logging a truncated copy of the
/// raw text when parsing fails.
pub(super) async fn decode_body<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.text().await.map_err(ApiError::Transport)?;
    match serde_json::from_str::<T>(&body) {
        Ok(data) => {
            tracing::trace!(
                target: "uninexus_cli::client::util",
                type_name = std::any::type_name::<T>(),
                "deserialized response body"
            );
            Ok(data)
        }
        Err(err) => {
            let truncated = if body.len() > 200 {
                format!(
                    "{}... (truncated, {} total bytes)",
                    body.chars().take(200).collect::<String>(),
                    body.len()
                )
            } else {
                body.clone()
            };
            tracing::error!(
                target: "uninexus_cli::client::util",
                type_name = std::any::type_name::<T>(),
                body = %truncated,
                error = %err,
                "failed to deserialize response body"
            );
            Err(ApiError::Json(err))
        }
    }
}
