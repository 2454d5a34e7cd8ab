//! `notula pending`: inspect and retry parked uploads.

use anyhow::Result;
use tracing::warn;

use super::args::{PendingCliArgs, PendingCommand};
use crate::backend::BackendClient;
use crate::config::Config;
use crate::db::{self, pending::PendingUploadRepository};

pub async fn handle_pending_command(args: PendingCliArgs) -> Result<()> {
    match args.command {
        PendingCommand::List { limit } => list_pending(limit),
        PendingCommand::Flush => flush_pending().await,
    }
}

fn list_pending(limit: usize) -> Result<()> {
    let conn = db::init_db()?;
    let entries = PendingUploadRepository::list(&conn, limit)?;

    if entries.is_empty() {
        println!("No pending uploads.");
        return Ok(());
    }

    for entry in entries {
        println!(
            "#{}  meeting {}  session {}  parked {}",
            entry.id, entry.meeting_id, entry.session_id, entry.created_at
        );
    }

    Ok(())
}

async fn flush_pending() -> Result<()> {
    let config = Config::load()?;
    let backend = BackendClient::new(&config.backend.base_url);

    let conn = db::init_db()?;
    let entries = PendingUploadRepository::list(&conn, 1000)?;

    if entries.is_empty() {
        println!("No pending uploads.");
        return Ok(());
    }

    let mut uploaded = 0;
    let mut failed = 0;

    for entry in entries {
        match backend
            .finish_meeting_raw(entry.meeting_id, &entry.payload)
            .await
        {
            Ok(()) => {
                PendingUploadRepository::delete(&conn, entry.id)?;
                println!("#{}  meeting {}  uploaded", entry.id, entry.meeting_id);
                uploaded += 1;
            }
            Err(e) => {
                warn!("Pending upload #{} still failing: {}", entry.id, e);
                println!("#{}  meeting {}  failed: {}", entry.id, entry.meeting_id, e);
                failed += 1;
            }
        }
    }

    println!("{} uploaded, {} still pending.", uploaded, failed);
    Ok(())
}
