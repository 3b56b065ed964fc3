//! Record a swipe.

use anyhow::Result;
use ember_engine::SyncEngine;
use ember_types::UserId;

/// Run the swipe command.
pub async fn run(
    engine: &SyncEngine,
    swiped_id: &str,
    is_like: bool,
    is_super_like: bool,
) -> Result<()> {
    let swiped = UserId::new(swiped_id);
    let id = engine.create_swipe(swiped.clone(), is_like, is_super_like).await?;

    let verb = match (is_like, is_super_like) {
        (_, true) => "super liked",
        (true, _) => "liked",
        (false, _) => "passed on",
    };
    println!("You {verb} {swiped} (swipe {id})");

    // The reciprocity check may have materialized a match just now.
    if let Some(user) = engine.active_user() {
        let matches = engine.get_user_matches(&user).await?;
        if let Some(hit) = matches.iter().find(|m| m.involves(&swiped) && m.dirty) {
            println!("It's a match! ({})", hit.id);
        }
    }
    Ok(())
}
