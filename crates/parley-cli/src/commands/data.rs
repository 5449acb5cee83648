use std::path::Path;

use anyhow::{Result, bail};
use colored::Colorize;
use parley_core::storage::{AdminStore, ImportResult, SessionScopedStore};

use crate::context::AppContext;

pub fn usage(ctx: &AppContext) -> Result<()> {
    let Some(usage) = ctx.store.storage_usage() else {
        bail!("Storage could not be read");
    };

    println!(
        "{} in {} items (session {})",
        usage.total_formatted.bold(),
        usage.item_count,
        ctx.store.session_id()
    );
    for item in &usage.items {
        println!("  {:<20} {}", item.key, item.size_formatted);
    }
    Ok(())
}

pub fn export(ctx: &AppContext, out: Option<&Path>) -> Result<()> {
    let service = ctx.data_management(false);
    match out {
        Some(path) => service.export_to_file(path)?,
        None => {
            let cwd = std::env::current_dir()?;
            let path = service.export_to_dir(&cwd)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

pub fn import(ctx: &AppContext, path: &Path) -> Result<()> {
    match ctx.data_management(false).import_from_file(path) {
        ImportResult::Imported(summary) => {
            tracing::debug!(
                "[CLI] Imported bundle version {} from {:?}",
                summary.version,
                summary.timestamp
            );
            Ok(())
        }
        ImportResult::Failed { error } => bail!("Import failed: {}", error),
    }
}

pub async fn clear(ctx: &AppContext, yes: bool) -> Result<()> {
    ctx.data_management(yes).clear_all().await;
    Ok(())
}

pub fn validate(ctx: &AppContext) -> Result<()> {
    let report = ctx.store.validate_data();
    if report.valid {
        println!("{}", "Stored data is valid".green());
    } else {
        println!("{}", "Problems found:".yellow());
        for issue in &report.issues {
            println!("  - {}", issue);
        }
    }
    if let Some(usage) = &report.usage {
        println!("Usage: {}", usage.total_formatted);
    }
    Ok(())
}

pub fn repair(ctx: &AppContext) -> Result<()> {
    if !ctx.store.repair_data() {
        bail!("Repair failed");
    }
    println!("{}", "Repair finished".green());
    validate(ctx)
}

pub fn compress(ctx: &AppContext) -> Result<()> {
    if !ctx.store.compress_data() {
        bail!("Compression failed");
    }
    println!("{}", "Compression finished".green());
    usage(ctx)
}

pub fn sessions(ctx: &AppContext) -> Result<()> {
    let current = ctx.store.session_id();
    let sessions = ctx.store.list_sessions();
    if sessions.is_empty() {
        println!("{}", "No stored sessions".dimmed());
    }
    for session in sessions {
        if session == current {
            println!("* {}", session.green());
        } else {
            println!("  {}", session);
        }
    }
    Ok(())
}

pub fn session(ctx: &AppContext, end: bool) -> Result<()> {
    if end {
        let ended = ctx.store.session_id();
        ctx.end_session()?;
        println!("Ended session {}", ended);
    } else {
        println!("{}", ctx.store.session_id());
    }
    Ok(())
}
