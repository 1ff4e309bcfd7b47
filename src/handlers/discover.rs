use crate::client::types::DiscoverQuery;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::io::IoHandler;

/// Free-text search across events, clubs and people.
pub async fn handle_discover_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let query = io.read_line("Search for:")?;
    if query.is_empty() {
        return Err(ApiError::InputError("Search query cannot be empty.".into()));
    }
    let kind = io.read_line("Type (events/clubs/users, blank for all):")?;

    let results = client
        .discover(&DiscoverQuery {
            query: Some(query),
            kind: (!kind.is_empty()).then_some(kind),
            ..DiscoverQuery::default()
        })
        .await?;

    io.write_line(&format!(
        "\nFound {} event(s), {} club(s), {} user(s).",
        results.events.len(),
        results.clubs.len(),
        results.users.len()
    ))?;
    for event in results.events.iter().take(5) {
        io.write_line(&format!("  [event] {}", event.title))?;
    }
    for club in results.clubs.iter().take(5) {
        io.write_line(&format!("  [club]  {}", club.name))?;
    }
    for user in results.users.iter().take(5) {
        io.write_line(&format!("  [user]  {}", user.username))?;
    }
    Ok(())
}

pub async fn handle_trending_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let trending = client.get_trending().await?;
    io.write_line("\nTrending events:")?;
    for event in trending.events.iter().take(5) {
        io.write_line(&format!("  {}", event.title))?;
    }
    io.write_line("Trending clubs:")?;
    for club in trending.clubs.iter().take(5) {
        io.write_line(&format!("  {}", club.name))?;
    }
    Ok(())
}
