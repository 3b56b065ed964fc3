//! Send messages and mark them read.

use anyhow::Result;
use ember_engine::SyncEngine;
use ember_types::{MessageKind, UserId};

use super::parse_match_id;

/// Run the message command.
pub async fn send(
    engine: &SyncEngine,
    match_id: &str,
    content: String,
    media_url: Option<String>,
) -> Result<()> {
    let match_id = parse_match_id(match_id)?;
    let kind = if media_url.is_some() {
        MessageKind::Image
    } else {
        MessageKind::Text
    };

    let id = engine.create_message(match_id, content, kind, media_url).await?;
    println!("Sent message {id}");
    Ok(())
}

/// Run the read command.
pub async fn mark_read(engine: &SyncEngine, match_id: &str, sender_id: &str) -> Result<()> {
    let match_id = parse_match_id(match_id)?;
    let updated = engine
        .mark_messages_read(&match_id, &UserId::new(sender_id))
        .await?;
    println!("Marked {updated} message(s) as read");
    Ok(())
}
