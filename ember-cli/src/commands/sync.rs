//! Trigger sync passes.

use anyhow::Result;
use ember_engine::{SyncEngine, SyncReport};

/// Run one sync pass.
pub async fn run(engine: &SyncEngine) -> Result<()> {
    let report = engine.trigger_sync().await?;
    print_report(&report);
    Ok(())
}

/// Clear checkpoints and cached profiles, then resync from the epoch.
pub async fn run_full(engine: &SyncEngine) -> Result<()> {
    let report = engine.force_full_sync().await?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &SyncReport) {
    if report.success {
        println!("Sync complete.");
    } else {
        println!(
            "Sync failed: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!("  Records: {}", report.total_records);
    let tables: Vec<String> = report
        .synced_tables
        .iter()
        .map(|t| t.to_string())
        .collect();
    println!("  Tables:  {}", tables.join(", "));
}
