// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `opsdesk seed`: provision a default client and project so a fresh
//! deployment has a working invite code without manual data entry.

use opsdesk_config::OpsdeskConfig;
use opsdesk_core::SupportError;
use opsdesk_storage::Database;
use opsdesk_storage::queries::{clients, projects};
use tracing::info;

const DEFAULT_CLIENT: &str = "Default";
const DEFAULT_PROJECT: &str = "Support";
const DEFAULT_INVITE_CODE: &str = "welcome";

/// Create the default client/project pair if no projects exist yet.
pub async fn ensure_default(db: &Database) -> Result<(), SupportError> {
    if projects::count(db).await? > 0 {
        return Ok(());
    }
    let client = clients::create(db, DEFAULT_CLIENT).await?;
    projects::create(db, client.id, DEFAULT_PROJECT, Some(DEFAULT_INVITE_CODE)).await?;
    info!(
        client = DEFAULT_CLIENT,
        project = DEFAULT_PROJECT,
        invite_code = DEFAULT_INVITE_CODE,
        "seeded default client and project"
    );
    Ok(())
}

pub async fn run(config: &OpsdeskConfig) -> Result<(), SupportError> {
    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    ensure_default(&db).await?;
    db.close().await
}
