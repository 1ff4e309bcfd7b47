use super::parse_uuid;
use crate::client::types::{Event, EventQuery, RsvpQuery, RsvpStatus};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::io::IoHandler;

fn format_event_line(event: &Event) -> String {
    let when = event
        .start_time
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "TBA".to_string());
    let location = event.location.as_deref().unwrap_or("TBA");
    format!("  {} | {} | {} ({})", event.id, when, event.title, location)
}

/// Lists upcoming events, optionally filtered by category.
pub async fn handle_browse_events_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let category = io.read_line("Category filter (blank for all):")?;
    let query = EventQuery {
        category: (!category.is_empty()).then_some(category),
        ..EventQuery::default()
    };
    let events = client.get_events(&query).await?;
    if events.is_empty() {
        io.write_line("No events found.")?;
        return Ok(());
    }
    io.write_line(&format!("\n{} event(s):", events.len()))?;
    for event in &events {
        io.write_line(&format_event_line(event))?;
    }
    Ok(())
}

pub async fn handle_event_details_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let id = parse_uuid(&io.read_line("Event id:")?)?;
    let event = client.get_event(id).await?;
    io.write_line(&format!("\n{}", event.title))?;
    if let Some(description) = &event.description {
        io.write_line(description)?;
    }
    io.write_line(&format_event_line(&event))?;
    if let Some(count) = event.rsvp_count {
        io.write_line(&format!("RSVPs: {}", count))?;
    }
    Ok(())
}

/// Prompts for an event and an RSVP status and submits it.
pub async fn handle_rsvp_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let id = parse_uuid(&io.read_line("Event id:")?)?;
    let choice = io.read_line("Status ([g]oing / [i]nterested / [n]ot going):")?;
    let status = match choice.to_lowercase().as_str() {
        "g" | "going" => RsvpStatus::Going,
        "i" | "interested" => RsvpStatus::Interested,
        "n" | "not going" | "not_going" => RsvpStatus::NotGoing,
        other => {
            return Err(ApiError::InputError(format!(
                "'{}' is not a valid RSVP status",
                other
            )))
        }
    };
    let rsvp = client.create_rsvp(id, status).await?;
    io.write_line(&format!("RSVP recorded: {}.", rsvp.status.as_str()))?;
    Ok(())
}

pub async fn handle_my_rsvps_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let rsvps = client.get_my_rsvps(&RsvpQuery::default()).await?;
    if rsvps.is_empty() {
        io.write_line("You have no RSVPs.")?;
        return Ok(());
    }
    for rsvp in &rsvps {
        let title = rsvp
            .event
            .as_ref()
            .map(|e| e.title.as_str())
            .unwrap_or("(unknown event)");
        io.write_line(&format!(
            "  {} | {} | {}",
            rsvp.event_id,
            rsvp.status.as_str(),
            title
        ))?;
    }
    Ok(())
}

pub async fn handle_cancel_rsvp_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let id = parse_uuid(&io.read_line("Event id:")?)?;
    client.delete_rsvp(id).await?;
    io.write_line("RSVP cancelled.")?;
    Ok(())
}
