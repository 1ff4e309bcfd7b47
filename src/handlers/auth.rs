use secrecy::SecretString;

use crate::client::types::{LoginPayload, RegisterPayload, UpdateProfilePayload, User};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::io::IoHandler;

/// Handler function for the login action
pub async fn handle_login_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<User, ApiError> {
    io.write_line("\nPlease log in.")?;
    let email = io.read_line("Email:")?;
    let password = io.read_line("Password:")?;
    let credentials = LoginPayload {
        email,
        password: SecretString::new(password.into_boxed_str()),
    };
    client.login(&credentials).await
}

/// Handler function for the registration action
pub async fn handle_registration_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<User, ApiError> {
    io.write_line("\nCreate a new account.")?;
    let username = io.read_line("Choose Username:")?;
    let email = io.read_line("Enter Email:")?;
    let password = io.read_line("Choose Password:")?;

    if username.len() < 3 {
        return Err(ApiError::InputError(
            "Username must be at least 3 characters long.".into(),
        ));
    }
    if password.len() < 8 {
        return Err(ApiError::InputError(
            "Password must be at least 8 characters long.".into(),
        ));
    }

    let payload = RegisterPayload {
        username,
        email,
        password: SecretString::new(password.into_boxed_str()),
    };
    client.register(&payload).await
}

pub async fn handle_view_profile_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let user = client.get_profile().await?;
    io.write_line(&format!("\nUsername: {}", user.username))?;
    io.write_line(&format!("Email:    {}", user.email))?;
    if let Some(display_name) = &user.display_name {
        io.write_line(&format!("Name:     {}", display_name))?;
    }
    if let Some(bio) = &user.bio {
        io.write_line(&format!("Bio:      {}", bio))?;
    }
    Ok(())
}

/// Prompts for profile fields, leaving blank entries unchanged.
pub async fn handle_update_profile_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    io.write_line("\nUpdate profile (leave blank to keep current value).")?;
    let display_name = io.read_line("Display name:")?;
    let bio = io.read_line("Bio:")?;

    let payload = UpdateProfilePayload {
        display_name: (!display_name.is_empty()).then_some(display_name),
        bio: (!bio.is_empty()).then_some(bio),
        avatar_url: None,
    };
    let user = client.update_profile(&payload).await?;
    io.write_line(&format!("Profile updated for '{}'.", user.username))?;
    Ok(())
}
