// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Project CRUD operations.

use opsdesk_core::SupportError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::{Client, Project};

fn project_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        client_id: row.get(1)?,
        name: row.get(2)?,
        invite_code: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
    })
}

const COLS: &str = "id, client_id, name, invite_code, is_active, created_at";

/// Create a new project under a client.
pub async fn create(
    db: &Database,
    client_id: i64,
    name: &str,
    invite_code: Option<&str>,
) -> Result<Project, SupportError> {
    let name = name.to_string();
    let invite_code = invite_code.map(str::to_string);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO projects (client_id, name, invite_code) VALUES (?1, ?2, ?3)",
                params![client_id, name, invite_code],
            )?;
            let id = conn.last_insert_rowid();
            let project = conn.query_row(
                &format!("SELECT {COLS} FROM projects WHERE id = ?1"),
                params![id],
                project_from_row,
            )?;
            Ok(project)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a project by id.
pub async fn get(db: &Database, id: i64) -> Result<Option<Project>, SupportError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {COLS} FROM projects WHERE id = ?1"),
                params![id],
                project_from_row,
            );
            match result {
                Ok(project) => Ok(Some(project)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Get an active project by invite code.
///
/// Comparison is case-insensitive and trims whitespace from the input;
/// blank input never matches.
pub async fn get_by_invite_code(
    db: &Database,
    invite_code: &str,
) -> Result<Option<Project>, SupportError> {
    let code = invite_code.trim().to_string();
    if code.is_empty() {
        return Ok(None);
    }
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!(
                    "SELECT {COLS} FROM projects
                     WHERE invite_code IS NOT NULL
                       AND lower(invite_code) = lower(?1)
                       AND is_active = 1"
                ),
                params![code],
                project_from_row,
            );
            match result {
                Ok(project) => Ok(Some(project)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Get a project together with its owning client.
pub async fn get_with_client(
    db: &Database,
    project_id: i64,
) -> Result<Option<(Project, Client)>, SupportError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT p.id, p.client_id, p.name, p.invite_code, p.is_active, p.created_at,
                        c.id, c.name, c.thread_id, c.channel_id, c.created_at
                 FROM projects p JOIN clients c ON c.id = p.client_id
                 WHERE p.id = ?1",
                params![project_id],
                |row| {
                    let project = project_from_row(row)?;
                    let client = Client {
                        id: row.get(6)?,
                        name: row.get(7)?,
                        thread_id: row.get(8)?,
                        channel_id: row.get(9)?,
                        created_at: row.get(10)?,
                    };
                    Ok((project, client))
                },
            );
            match result {
                Ok(pair) => Ok(Some(pair)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Total number of projects (used by the seed command to detect an empty
/// deployment).
pub async fn count(db: &Database) -> Result<i64, SupportError> {
    db.connection()
        .call(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?;
            Ok(count)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::clients;
    use tempfile::tempdir;

    async fn setup() -> (Database, i64, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        let client = clients::create(&db, "Acme").await.unwrap();
        (db, client.id, dir)
    }

    #[tokio::test]
    async fn invite_code_match_is_case_insensitive_and_trimmed() {
        let (db, client_id, _dir) = setup().await;
        create(&db, client_id, "Support", Some("ACME")).await.unwrap();

        assert!(get_by_invite_code(&db, "acme").await.unwrap().is_some());
        assert!(get_by_invite_code(&db, "  Acme  ").await.unwrap().is_some());
        assert!(get_by_invite_code(&db, "other").await.unwrap().is_none());
        assert!(get_by_invite_code(&db, "   ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invite_codes_are_unique_case_insensitively() {
        let (db, client_id, _dir) = setup().await;
        create(&db, client_id, "A", Some("code1")).await.unwrap();
        assert!(create(&db, client_id, "B", Some("CODE1")).await.is_err());
        // Multiple projects without codes are fine.
        create(&db, client_id, "C", None).await.unwrap();
        create(&db, client_id, "D", None).await.unwrap();
    }

    #[tokio::test]
    async fn inactive_projects_do_not_match_codes() {
        let (db, client_id, _dir) = setup().await;
        let project = create(&db, client_id, "Old", Some("old")).await.unwrap();
        db.connection()
            .call(move |conn| {
                conn.execute(
                    "UPDATE projects SET is_active = 0 WHERE id = ?1",
                    params![project.id],
                )?;
                Ok::<_, rusqlite::Error>(())
            })
            .await
            .unwrap();
        assert!(get_by_invite_code(&db, "old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn with_client_joins_owner() {
        let (db, client_id, _dir) = setup().await;
        let project = create(&db, client_id, "Support", None).await.unwrap();
        let (p, c) = get_with_client(&db, project.id).await.unwrap().unwrap();
        assert_eq!(p.id, project.id);
        assert_eq!(c.name, "Acme");
    }

    #[tokio::test]
    async fn count_tracks_inserts() {
        let (db, client_id, _dir) = setup().await;
        assert_eq!(count(&db).await.unwrap(), 0);
        create(&db, client_id, "One", None).await.unwrap();
        assert_eq!(count(&db).await.unwrap(), 1);
    }
}
