//! Show offline store statistics.

use anyhow::Result;
use ember_engine::SyncEngine;

/// Run the stats command.
pub async fn run(engine: &SyncEngine) -> Result<()> {
    let stats = engine.offline_stats().await?;

    println!("=== ember offline stats ===");
    println!();
    match engine.active_user() {
        Some(user) => println!("User: {user}"),
        None => println!("User: NOT SIGNED IN"),
    }
    println!();
    println!("Local store:");
    println!("  profiles: {}", stats.tables.profiles);
    println!("  swipes:   {}", stats.tables.swipes);
    println!("  matches:  {}", stats.tables.matches);
    println!("  messages: {}", stats.tables.messages);
    println!();
    let checkpoints = engine.sync_checkpoints().await?;
    if checkpoints.is_empty() {
        println!("Checkpoints: none (never synced)");
    } else {
        println!("Checkpoints:");
        for c in checkpoints {
            println!("  {}: {}", c.entity, c.last_sync);
        }
    }
    println!();
    println!("Pending uploads: {}", stats.pending_uploads);
    println!(
        "Network: {}",
        if engine.network().is_online() {
            "online"
        } else {
            "offline"
        }
    );
    Ok(())
}
