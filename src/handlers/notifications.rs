use super::parse_uuid;
use crate::client::types::PageQuery;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::io::IoHandler;

pub async fn handle_notifications_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let page = client
        .get_notifications(&PageQuery {
            page: Some(1),
            limit: Some(20),
        })
        .await?;
    if page.notifications.is_empty() {
        io.write_line("No notifications.")?;
        return Ok(());
    }
    for notification in &page.notifications {
        let marker = if notification.read { " " } else { "*" };
        io.write_line(&format!(
            "{} {} | [{}] {}",
            marker, notification.id, notification.kind, notification.message
        ))?;
    }
    if let Some(total) = page.total {
        io.write_line(&format!("({} total)", total))?;
    }
    Ok(())
}

pub async fn handle_mark_read_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    let id = parse_uuid(&io.read_line("Notification id:")?)?;
    client.mark_notification_read(id).await?;
    io.write_line("Marked as read.")?;
    Ok(())
}

pub async fn handle_mark_all_read_action<H: IoHandler>(
    client: &ApiClient,
    io: &mut H,
) -> Result<(), ApiError> {
    client.mark_all_notifications_read().await?;
    io.write_line("All notifications marked as read.")?;
    Ok(())
}
