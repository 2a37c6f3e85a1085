// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-binding operations.
//!
//! A user may hold one binding per project; the binding with the most
//! recent `updated_at` is the user's current project. Switching projects
//! only touches `updated_at` -- there is no separate active flag.

use opsdesk_core::SupportError;
use rusqlite::params;

use crate::database::{Database, NOW, map_tr_err};
use crate::models::{Project, UserBinding};

fn binding_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserBinding> {
    Ok(UserBinding {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        display_name: row.get(3)?,
        project_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const COLS: &str = "id, user_id, username, display_name, project_id, created_at, updated_at";

/// Get the user's current (most recently used) binding.
pub async fn current(db: &Database, user_id: i64) -> Result<Option<UserBinding>, SupportError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!(
                    "SELECT {COLS} FROM user_bindings
                     WHERE user_id = ?1
                     ORDER BY updated_at DESC, id DESC LIMIT 1"
                ),
                params![user_id],
                binding_from_row,
            );
            match result {
                Ok(binding) => Ok(Some(binding)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// All of the user's bindings with their projects, most recent first.
pub async fn list_with_projects(
    db: &Database,
    user_id: i64,
) -> Result<Vec<(UserBinding, Project)>, SupportError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT b.id, b.user_id, b.username, b.display_name, b.project_id,
                        b.created_at, b.updated_at,
                        p.id, p.client_id, p.name, p.invite_code, p.is_active, p.created_at
                 FROM user_bindings b JOIN projects p ON p.id = b.project_id
                 WHERE b.user_id = ?1
                 ORDER BY b.updated_at DESC, b.id DESC",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                let binding = binding_from_row(row)?;
                let project = Project {
                    id: row.get(7)?,
                    client_id: row.get(8)?,
                    name: row.get(9)?,
                    invite_code: row.get(10)?,
                    is_active: row.get(11)?,
                    created_at: row.get(12)?,
                };
                Ok((binding, project))
            })?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .await
        .map_err(map_tr_err)
}

/// Create a binding or refresh an existing one for this (user, project).
///
/// Refreshing updates the identity fields and `updated_at`, which also
/// makes the project the user's current one.
pub async fn upsert(
    db: &Database,
    user_id: i64,
    project_id: i64,
    username: Option<&str>,
    display_name: Option<&str>,
) -> Result<UserBinding, SupportError> {
    let username = username.map(str::to_string);
    let display_name = display_name.map(str::to_string);
    db.connection()
        .call(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO user_bindings (user_id, project_id, username, display_name)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(user_id, project_id) DO UPDATE SET
                         username = excluded.username,
                         display_name = excluded.display_name,
                         updated_at = {NOW}"
                ),
                params![user_id, project_id, username, display_name],
            )?;
            let binding = conn.query_row(
                &format!(
                    "SELECT {COLS} FROM user_bindings
                     WHERE user_id = ?1 AND project_id = ?2"
                ),
                params![user_id, project_id],
                binding_from_row,
            )?;
            Ok(binding)
        })
        .await
        .map_err(map_tr_err)
}

/// Make an existing binding the user's current one by refreshing its
/// `updated_at`. Returns `None` when the user has no binding for that
/// project.
pub async fn touch(
    db: &Database,
    user_id: i64,
    project_id: i64,
) -> Result<Option<UserBinding>, SupportError> {
    db.connection()
        .call(move |conn| {
            let rows = conn.execute(
                &format!(
                    "UPDATE user_bindings SET updated_at = {NOW}
                     WHERE user_id = ?1 AND project_id = ?2"
                ),
                params![user_id, project_id],
            )?;
            if rows == 0 {
                return Ok(None);
            }
            let binding = conn.query_row(
                &format!(
                    "SELECT {COLS} FROM user_bindings
                     WHERE user_id = ?1 AND project_id = ?2"
                ),
                params![user_id, project_id],
                binding_from_row,
            )?;
            Ok(Some(binding))
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{clients, projects};
    use tempfile::tempdir;

    async fn setup() -> (Database, i64, i64, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        let client = clients::create(&db, "Acme").await.unwrap();
        let p1 = projects::create(&db, client.id, "One", None).await.unwrap();
        let p2 = projects::create(&db, client.id, "Two", None).await.unwrap();
        (db, p1.id, p2.id, dir)
    }

    #[tokio::test]
    async fn upsert_creates_then_updates_in_place() {
        let (db, p1, _p2, _dir) = setup().await;

        let first = upsert(&db, 42, p1, Some("alice"), Some("Alice")).await.unwrap();
        let second = upsert(&db, 42, p1, Some("alice_new"), None).await.unwrap();

        assert_eq!(first.id, second.id, "same (user, project) row reused");
        assert_eq!(second.username.as_deref(), Some("alice_new"));
        assert!(second.display_name.is_none());

        let all = list_with_projects(&db, 42).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn current_is_most_recently_updated() {
        let (db, p1, p2, _dir) = setup().await;

        // Millisecond timestamp resolution: space the writes out so
        // recency ordering is unambiguous.
        let tick = std::time::Duration::from_millis(5);

        upsert(&db, 42, p1, None, None).await.unwrap();
        tokio::time::sleep(tick).await;
        upsert(&db, 42, p2, None, None).await.unwrap();
        // p2 was touched last.
        assert_eq!(current(&db, 42).await.unwrap().unwrap().project_id, p2);

        // Switching back via touch flips recency.
        tokio::time::sleep(tick).await;
        touch(&db, 42, p1).await.unwrap().unwrap();
        assert_eq!(current(&db, 42).await.unwrap().unwrap().project_id, p1);
    }

    #[tokio::test]
    async fn touch_unknown_binding_is_none() {
        let (db, p1, _p2, _dir) = setup().await;
        assert!(touch(&db, 42, p1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn current_for_unknown_user_is_none() {
        let (db, _p1, _p2, _dir) = setup().await;
        assert!(current(&db, 7).await.unwrap().is_none());
    }
}
