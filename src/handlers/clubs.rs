use super::parse_uuid;
use crate::client::types::ClubQuery;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::io::IoHandler;

pub async fn handle_browse_clubs_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let category = io.read_line("Category filter (blank for all):")?;
    let query = ClubQuery {
        category: (!category.is_empty()).then_some(category),
        search: None,
    };
    let clubs = client.get_clubs(&query).await?;
    if clubs.is_empty() {
        io.write_line("No clubs found.")?;
        return Ok(());
    }
    io.write_line(&format!("\n{} club(s):", clubs.len()))?;
    for club in &clubs {
        let members = club
            .member_count
            .map(|n| format!("{} members", n))
            .unwrap_or_default();
        io.write_line(&format!("  {} | {} {}", club.id, club.name, members))?;
    }
    Ok(())
}

pub async fn handle_club_details_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let id = parse_uuid(&io.read_line("Club id:")?)?;
    let club = client.get_club(id).await?;
    io.write_line(&format!("\n{}", club.name))?;
    if let Some(description) = &club.description {
        io.write_line(description)?;
    }

    let members = client.get_club_members(id).await?;
    io.write_line(&format!("Members ({}):", members.len()))?;
    for member in members.iter().take(10) {
        io.write_line(&format!("  {}", member.username))?;
    }

    let events = client.get_club_events(id).await?;
    io.write_line(&format!("Upcoming events: {}", events.len()))?;
    Ok(())
}

pub async fn handle_join_club_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let id = parse_uuid(&io.read_line("Club id to join:")?)?;
    client.join_club(id).await?;
    io.write_line("Joined club.")?;
    Ok(())
}

pub async fn handle_leave_club_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let id = parse_uuid(&io.read_line("Club id to leave:")?)?;
    client.leave_club(id).await?;
    io.write_line("Left club.")?;
    Ok(())
}
