use super::parse_uuid;
use crate::client::types::{CreateConversationPayload, SendMessagePayload};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::io::IoHandler;

pub async fn handle_conversations_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let conversations = client.get_conversations().await?;
    if conversations.is_empty() {
        io.write_line("No conversations yet.")?;
        return Ok(());
    }
    for conversation in &conversations {
        let with = conversation
            .participants
            .iter()
            .map(|p| p.username.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let preview = conversation
            .last_message
            .as_ref()
            .map(|m| m.content.as_str())
            .unwrap_or("");
        io.write_line(&format!("  {} | {} | {}", conversation.id, with, preview))?;
    }
    Ok(())
}

pub async fn handle_open_conversation_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let id = parse_uuid(&io.read_line("Conversation id:")?)?;
    let messages = client.get_conversation_messages(id).await?;
    for message in &messages {
        io.write_line(&format!("  [{}] {}", message.sender_id, message.content))?;
    }
    Ok(())
}

pub async fn handle_send_message_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let conversation_id = parse_uuid(&io.read_line("Conversation id:")?)?;
    let content = io.read_line("Message:")?;
    if content.is_empty() {
        return Err(ApiError::InputError("Message cannot be empty.".into()));
    }
    client
        .send_message(&SendMessagePayload {
            conversation_id,
            content,
        })
        .await?;
    io.write_line("Sent.")?;
    Ok(())
}

/// Starts a conversation with one or more users, with an optional opening
/// message.
pub async fn handle_new_conversation_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let raw_ids = io.read_line("Participant user ids (comma separated):")?;
    let participant_ids = raw_ids
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(parse_uuid)
        .collect::<Result<Vec<_>, _>>()?;
    if participant_ids.is_empty() {
        return Err(ApiError::InputError(
            "At least one participant is required.".into(),
        ));
    }
    let initial_message = io.read_line("First message (blank for none):")?;

    let conversation = client
        .create_conversation(&CreateConversationPayload {
            participant_ids,
            initial_message: (!initial_message.is_empty()).then_some(initial_message),
        })
        .await?;
    io.write_line(&format!("Conversation created: {}", conversation.id))?;
    Ok(())
}
