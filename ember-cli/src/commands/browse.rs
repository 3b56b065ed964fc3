//! Browse the local store.

use anyhow::{Context, Result};
use ember_engine::SyncEngine;
use ember_types::Timestamp;

use super::parse_match_id;

/// List browsable profiles, excluding the signed-in user.
pub async fn profiles(engine: &SyncEngine, limit: u32) -> Result<()> {
    let exclude = engine.active_user().into_iter().collect::<Vec<_>>();
    let profiles = engine.get_profiles(&exclude, limit).await?;

    if profiles.is_empty() {
        println!("No profiles cached. Run 'ember sync' first.");
        return Ok(());
    }
    for p in profiles {
        println!("{}  {} ({}, {})", p.user_id, p.display_name, p.age, p.gender);
    }
    Ok(())
}

/// List the signed-in user's matches.
pub async fn matches(engine: &SyncEngine) -> Result<()> {
    let user = engine.active_user().context("Not signed in")?;
    let matches = engine.get_user_matches(&user).await?;

    if matches.is_empty() {
        println!("No matches yet.");
        return Ok(());
    }
    for m in matches {
        let other = if m.user_a == user { &m.user_b } else { &m.user_a };
        let state = if m.is_active { "active" } else { "unmatched" };
        println!("{}  with {} ({}, {})", m.id, other, state, format_age(m.created_at));
    }
    Ok(())
}

/// List the messages in a match.
pub async fn messages(engine: &SyncEngine, match_id: &str) -> Result<()> {
    let match_id = parse_match_id(match_id)?;
    let messages = engine.get_match_messages(&match_id).await?;

    if messages.is_empty() {
        println!("No messages in this match.");
        return Ok(());
    }
    for m in messages {
        let pending = if m.dirty { " (sending)" } else { "" };
        println!("[{}] {}: {}{}", format_age(m.created_at), m.sender_id, m.content, pending);
    }
    Ok(())
}

/// Format a timestamp as a rough age.
fn format_age(ts: Timestamp) -> String {
    let diff_secs = (Timestamp::now().millis().saturating_sub(ts.millis())) / 1000;

    if diff_secs < 60 {
        "just now".to_string()
    } else if diff_secs < 3600 {
        format!("{} minutes ago", diff_secs / 60)
    } else if diff_secs < 86400 {
        format!("{} hours ago", diff_secs / 3600)
    } else {
        format!("{} days ago", diff_secs / 86400)
    }
}
