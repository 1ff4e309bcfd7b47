use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

use uninexus_cli::client::types::User;
use uninexus_cli::handlers::*;
use uninexus_cli::io::{IoHandler, StdIoHandler};
use uninexus_cli::{
    ApiClient, ApiError, CredentialStore, FileCredentialStore, MemoryCredentialStore,
    MenuNavigation, MenuResult, MenuState, SessionExpiredFlag,
};

/// Interactive CLI client for the UniNexus campus events platform.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the UniNexus backend server
    #[arg(
        short,
        long,
        env = "UNINEXUS_BASE_URL",
        default_value = "http://127.0.0.1:8080"
    )]
    base_url: Url,

    /// Persist the login session to this file instead of keeping it in memory
    #[arg(long, env = "UNINEXUS_TOKEN_FILE")]
    token_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "uninexus_cli=info".into());
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let args = Args::parse();
    let mut io = StdIoHandler;

    tracing::info!(base_url = %args.base_url, "starting UniNexus CLI");

    let credentials: Arc<dyn CredentialStore> = match &args.token_file {
        Some(path) => Arc::new(
            FileCredentialStore::open(path)
                .with_context(|| format!("failed to open token file {}", path.display()))?,
        ),
        None => Arc::new(MemoryCredentialStore::new()),
    };
    let session = Arc::new(SessionExpiredFlag::new());

    let client = ApiClient::builder(args.base_url.clone())
        .credentials(credentials.clone())
        .auth_events(session.clone())
        .build();

    io.write_line("Welcome to UniNexus!")?;
    io.write_line(&format!("Connecting to: {}", args.base_url))?;

    let mut logged_in_user: Option<User> = None;
    // A persisted token pair counts as a session until the backend says
    // otherwise.
    if credentials.access_token()?.is_some() {
        match client.get_profile().await {
            Ok(user) => {
                io.write_line(&format!("Resumed session as '{}'.", user.username))?;
                logged_in_user = Some(user);
            }
            Err(err) => {
                tracing::debug!(error = %err, "stored session is stale");
                session.reset();
            }
        }
    }

    loop {
        if logged_in_user.is_none() {
            io.write_line("\n--- UniNexus ---")?;
            io.write_line("[1] Login")?;
            io.write_line("[2] Register")?;
            io.write_line("[3] Browse events")?;
            io.write_line("[4] Trending")?;
            io.write_line("[q] Quit")?;

            match io.read_line("Enter choice:")?.as_str() {
                "1" => match handle_login_action(&client, &mut io).await {
                    Ok(user) => {
                        io.write_line(&format!("Login successful as '{}'.", user.username))?;
                        logged_in_user = Some(user);
                        session.reset();
                    }
                    Err(err) => io.write_line(&format!("Login failed: {}", describe_error(&err)))?,
                },
                "2" => match handle_registration_action(&client, &mut io).await {
                    Ok(user) => {
                        io.write_line(&format!("Registered and logged in as '{}'.", user.username))?;
                        logged_in_user = Some(user);
                        session.reset();
                    }
                    Err(err) => {
                        io.write_line(&format!("Registration failed: {}", describe_error(&err)))?
                    }
                },
                "3" => {
                    let result = handle_browse_events_action(&client, &mut io).await;
                    report(&mut io, result)?;
                }
                "4" => {
                    let result = handle_trending_action(&client, &mut io).await;
                    report(&mut io, result)?;
                }
                "q" => break,
                _ => io.write_line("Unknown choice.")?,
            }
            continue;
        }

        match main_menu(&client, &mut io, &session).await? {
            MenuNavigation::Logout => {
                if let Err(err) = client.logout().await {
                    tracing::warn!(error = %err, "logout call failed");
                }
                io.write_line("Logged out.")?;
                logged_in_user = None;
                session.reset();
            }
            MenuNavigation::Quit => break,
            _ => {}
        }
    }

    io.write_line("Goodbye!")?;
    Ok(())
}

fn report<H: IoHandler>(io: &mut H, result: Result<(), ApiError>) -> Result<(), ApiError> {
    if let Err(err) = result {
        io.write_line(&format!("Error: {}", describe_error(&err)))?;
    }
    Ok(())
}

/// Bounces back to the login menu when the pipeline reported an expired
/// session during the last action.
fn check_session<H: IoHandler>(
    io: &mut H,
    session: &SessionExpiredFlag,
) -> Result<bool, ApiError> {
    if session.is_expired() {
        io.write_line("Your session has expired. Please log in again.")?;
        return Ok(true);
    }
    Ok(false)
}

async fn main_menu<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
    session: &SessionExpiredFlag,
) -> MenuResult {
    io.write_line("\n--- Main Menu ---")?;
    io.write_line("[1] Events")?;
    io.write_line("[2] Clubs")?;
    io.write_line("[3] Discover")?;
    io.write_line("[4] Notifications")?;
    io.write_line("[5] Messages")?;
    io.write_line("[6] Account")?;
    io.write_line("[l] Logout")?;
    io.write_line("[q] Quit")?;

    let state = match io.read_line("Enter choice:")?.as_str() {
        "1" => MenuState::Events,
        "2" => MenuState::Clubs,
        "3" => {
            let result = handle_discover_action(client, io).await;
            report(io, result)?;
            MenuState::MainMenu
        }
        "4" => {
            notifications_menu(client, io).await?;
            MenuState::MainMenu
        }
        "5" => MenuState::Messaging,
        "6" => MenuState::Account,
        "l" => return Ok(MenuNavigation::Logout),
        "q" => return Ok(MenuNavigation::Quit),
        _ => {
            io.write_line("Unknown choice.")?;
            MenuState::MainMenu
        }
    };

    let navigation = match state {
        MenuState::Events => events_menu(client, io).await?,
        MenuState::Clubs => clubs_menu(client, io).await?,
        MenuState::Messaging => messages_menu(client, io).await?,
        MenuState::Account => account_menu(client, io).await?,
        MenuState::MainMenu => MenuNavigation::ReturnToMainMenu,
    };

    if check_session(io, session)? {
        return Ok(MenuNavigation::Logout);
    }
    Ok(navigation)
}

async fn events_menu<H: IoHandler>(client: &ApiClient, io: &mut H) -> MenuResult {
    io.write_line("\n--- Events ---")?;
    io.write_line("[1] Browse")?;
    io.write_line("[2] Details")?;
    io.write_line("[3] RSVP")?;
    io.write_line("[4] My RSVPs")?;
    io.write_line("[5] Cancel RSVP")?;
    io.write_line("[b] Back")?;

    let result = match io.read_line("Enter choice:")?.as_str() {
        "1" => handle_browse_events_action(client, io).await,
        "2" => handle_event_details_action(client, io).await,
        "3" => handle_rsvp_action(client, io).await,
        "4" => handle_my_rsvps_action(client, io).await,
        "5" => handle_cancel_rsvp_action(client, io).await,
        _ => Ok(()),
    };
    report(io, result)?;
    Ok(MenuNavigation::ReturnToMainMenu)
}

async fn clubs_menu<H: IoHandler>(client: &ApiClient, io: &mut H) -> MenuResult {
    io.write_line("\n--- Clubs ---")?;
    io.write_line("[1] Browse")?;
    io.write_line("[2] Details")?;
    io.write_line("[3] Join")?;
    io.write_line("[4] Leave")?;
    io.write_line("[b] Back")?;

    let result = match io.read_line("Enter choice:")?.as_str() {
        "1" => handle_browse_clubs_action(client, io).await,
        "2" => handle_club_details_action(client, io).await,
        "3" => handle_join_club_action(client, io).await,
        "4" => handle_leave_club_action(client, io).await,
        _ => Ok(()),
    };
    report(io, result)?;
    Ok(MenuNavigation::ReturnToMainMenu)
}

async fn notifications_menu<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    io.write_line("\n--- Notifications ---")?;
    io.write_line("[1] List")?;
    io.write_line("[2] Mark one read")?;
    io.write_line("[3] Mark all read")?;
    io.write_line("[b] Back")?;

    let result = match io.read_line("Enter choice:")?.as_str() {
        "1" => handle_notifications_action(client, io).await,
        "2" => handle_mark_read_action(client, io).await,
        "3" => handle_mark_all_read_action(client, io).await,
        _ => Ok(()),
    };
    report(io, result)
}

async fn messages_menu<H: IoHandler>(client: &ApiClient, io: &mut H) -> MenuResult {
    io.write_line("\n--- Messages ---")?;
    io.write_line("[1] Conversations")?;
    io.write_line("[2] Open conversation")?;
    io.write_line("[3] Send message")?;
    io.write_line("[4] New conversation")?;
    io.write_line("[b] Back")?;

    let result = match io.read_line("Enter choice:")?.as_str() {
        "1" => handle_conversations_action(client, io).await,
        "2" => handle_open_conversation_action(client, io).await,
        "3" => handle_send_message_action(client, io).await,
        "4" => handle_new_conversation_action(client, io).await,
        _ => Ok(()),
    };
    report(io, result)?;
    Ok(MenuNavigation::ReturnToMainMenu)
}

async fn account_menu<H: IoHandler>(client: &ApiClient, io: &mut H) -> MenuResult {
    io.write_line("\n--- Account ---")?;
    io.write_line("[1] View profile")?;
    io.write_line("[2] Update profile")?;
    io.write_line("[3] View settings")?;
    io.write_line("[4] Update settings")?;
    io.write_line("[5] Change password")?;
    io.write_line("[b] Back")?;

    let result = match io.read_line("Enter choice:")?.as_str() {
        "1" => handle_view_profile_action(client, io).await,
        "2" => handle_update_profile_action(client, io).await,
        "3" => handle_view_settings_action(client, io).await,
        "4" => handle_update_settings_action(client, io).await,
        "5" => handle_change_password_action(client, io).await,
        _ => Ok(()),
    };
    report(io, result)?;
    Ok(MenuNavigation::ReturnToMainMenu)
}
