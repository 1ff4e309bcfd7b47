use secrecy::SecretString;

use crate::client::types::{ChangePasswordPayload, UserSettings};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::io::IoHandler;

fn render_toggle(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "on",
        Some(false) => "off",
        None => "default",
    }
}

pub async fn handle_view_settings_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let settings = client.get_settings().await?;
    io.write_line("\nCurrent settings:")?;
    io.write_line(&format!(
        "  Email notifications: {}",
        render_toggle(settings.email_notifications)
    ))?;
    io.write_line(&format!(
        "  Push notifications:  {}",
        render_toggle(settings.push_notifications)
    ))?;
    io.write_line(&format!(
        "  Profile visibility:  {}",
        settings.profile_visibility.as_deref().unwrap_or("default")
    ))?;
    Ok(())
}

fn parse_toggle(input: &str) -> Result<Option<bool>, ApiError> {
    match input.to_lowercase().as_str() {
        "" => Ok(None),
        "on" | "yes" | "true" => Ok(Some(true)),
        "off" | "no" | "false" => Ok(Some(false)),
        other => Err(ApiError::InputError(format!(
            "'{}' is not on/off",
            other
        ))),
    }
}

/// Prompts for each setting; blank input leaves the setting unchanged.
pub async fn handle_update_settings_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    io.write_line("\nUpdate settings (blank to keep current value).")?;
    let email = parse_toggle(&io.read_line("Email notifications (on/off):")?)?;
    let push = parse_toggle(&io.read_line("Push notifications (on/off):")?)?;
    let visibility = io.read_line("Profile visibility (public/campus/private):")?;

    let payload = UserSettings {
        email_notifications: email,
        push_notifications: push,
        profile_visibility: (!visibility.is_empty()).then_some(visibility),
        theme: None,
    };
    client.update_settings(&payload).await?;
    io.write_line("Settings saved.")?;
    Ok(())
}

pub async fn handle_change_password_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let current = io.read_line("Current password:")?;
    let new = io.read_line("New password:")?;
    let confirm = io.read_line("Confirm new password:")?;

    if new.len() < 8 {
        return Err(ApiError::InputError(
            "Password must be at least 8 characters long.".into(),
        ));
    }
    if new != confirm {
        return Err(ApiError::InputError("Passwords do not match.".into()));
    }

    client
        .change_password(&ChangePasswordPayload {
            current_password: SecretString::new(current.into_boxed_str()),
            new_password: SecretString::new(new.into_boxed_str()),
        })
        .await?;
    io.write_line("Password changed.")?;
    Ok(())
}
