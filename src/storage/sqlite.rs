//! SQLite storage implementation.
//!
//! Single-writer, last-write-wins. The upsert call is keyed by project id:
//! `UNASSIGNED_ID` inserts and lets SQLite assign the id, anything else
//! inserts-or-overwrites that exact id (used by replace-mode backup import).

use crate::error::{Error, Result};
use crate::model::{Project, ProjectKind, UNASSIGNED_ID};
use crate::storage::schema::apply_schema;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::time::Duration;

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        if let Some(timeout) = timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        } else {
            // Default 5 second timeout
            conn.busy_timeout(Duration::from_secs(5))?;
        }

        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Read a point-in-time snapshot of all projects, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is malformed.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, title, stitch_count, stitch_step, row_count, row_step,
                    total_rows, image_paths
             FROM projects ORDER BY id",
        )?;
        let rows = stmt.query_map([], row_to_project)?;

        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?);
        }
        Ok(projects)
    }

    /// Fetch a single project by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_project(&self, id: i64) -> Result<Option<Project>> {
        self.conn
            .query_row(
                "SELECT id, kind, title, stitch_count, stitch_step, row_count, row_step,
                        total_rows, image_paths
                 FROM projects WHERE id = ?1",
                params![id],
                row_to_project,
            )
            .optional()
            .map_err(Error::from)
    }

    /// Insert or overwrite a project, returning the effective id.
    ///
    /// A project carrying `UNASSIGNED_ID` is inserted and receives a fresh
    /// store-assigned id. Any other id is written verbatim, overwriting an
    /// existing row with that id if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn upsert_project(&mut self, project: &Project) -> Result<i64> {
        let image_paths = serde_json::to_string(&project.image_paths)?;

        if project.id == UNASSIGNED_ID {
            self.conn.execute(
                "INSERT INTO projects (kind, title, stitch_count, stitch_step, row_count,
                                       row_step, total_rows, image_paths)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    project.kind.token(),
                    project.title,
                    project.stitch_count,
                    project.stitch_step,
                    project.row_count,
                    project.row_step,
                    project.total_rows,
                    image_paths,
                ],
            )?;
            Ok(self.conn.last_insert_rowid())
        } else {
            self.conn.execute(
                "INSERT INTO projects (id, kind, title, stitch_count, stitch_step, row_count,
                                       row_step, total_rows, image_paths)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                   kind = excluded.kind,
                   title = excluded.title,
                   stitch_count = excluded.stitch_count,
                   stitch_step = excluded.stitch_step,
                   row_count = excluded.row_count,
                   row_step = excluded.row_step,
                   total_rows = excluded.total_rows,
                   image_paths = excluded.image_paths",
                params![
                    project.id,
                    project.kind.token(),
                    project.title,
                    project.stitch_count,
                    project.stitch_step,
                    project.row_count,
                    project.row_step,
                    project.total_rows,
                    image_paths,
                ],
            )?;
            Ok(project.id)
        }
    }

    /// Delete a project. Returns true if a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_project(&mut self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Update the two counter values of a project.
    ///
    /// # Errors
    ///
    /// Returns `ProjectNotFound` if the id does not exist.
    pub fn set_counts(&mut self, id: i64, stitch_count: i32, row_count: i32) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE projects SET stitch_count = ?2, row_count = ?3 WHERE id = ?1",
            params![id, stitch_count, row_count],
        )?;
        if changed == 0 {
            return Err(Error::ProjectNotFound { id });
        }
        Ok(())
    }
}

fn row_to_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    let kind: String = row.get(1)?;
    let image_paths: String = row.get(8)?;
    let image_paths: Vec<String> = serde_json::from_str(&image_paths).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Project {
        id: row.get(0)?,
        kind: ProjectKind::from_token(&kind),
        title: row.get(2)?,
        stitch_count: row.get(3)?,
        stitch_step: row.get(4)?,
        row_count: row.get(5)?,
        row_step: row.get(6)?,
        total_rows: row.get(7)?,
        image_paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(title: &str) -> Project {
        let mut project = Project::new(title.to_string(), ProjectKind::Double);
        project.stitch_count = 42;
        project.stitch_step = 2;
        project.row_count = 7;
        project.total_rows = 120;
        project.image_paths = vec!["/img/a.jpg".to_string(), "/img/b.jpg".to_string()];
        project
    }

    #[test]
    fn test_insert_assigns_id() {
        let mut storage = SqliteStorage::open_memory().unwrap();

        let id = storage.upsert_project(&sample("Socks")).unwrap();
        assert!(id > 0);

        let loaded = storage.get_project(id).unwrap().unwrap();
        assert_eq!(loaded.title, "Socks");
        assert_eq!(loaded.stitch_count, 42);
        assert_eq!(loaded.image_paths.len(), 2);
    }

    #[test]
    fn test_upsert_overwrites_existing_id() {
        let mut storage = SqliteStorage::open_memory().unwrap();

        let id = storage.upsert_project(&sample("Hat")).unwrap();

        let mut replacement = sample("Hat v2");
        replacement.id = id;
        replacement.row_count = 99;
        let returned = storage.upsert_project(&replacement).unwrap();
        assert_eq!(returned, id);

        let loaded = storage.get_project(id).unwrap().unwrap();
        assert_eq!(loaded.title, "Hat v2");
        assert_eq!(loaded.row_count, 99);
        assert_eq!(storage.list_projects().unwrap().len(), 1);
    }

    #[test]
    fn test_upsert_explicit_new_id() {
        let mut storage = SqliteStorage::open_memory().unwrap();

        let mut project = sample("Blanket");
        project.id = 17;
        let id = storage.upsert_project(&project).unwrap();
        assert_eq!(id, 17);
        assert!(storage.get_project(17).unwrap().is_some());
    }

    #[test]
    fn test_list_is_ordered_by_id() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage.upsert_project(&sample("A")).unwrap();
        storage.upsert_project(&sample("B")).unwrap();
        storage.upsert_project(&sample("C")).unwrap();

        let titles: Vec<_> = storage
            .list_projects()
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_set_counts_and_missing_project() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let id = storage.upsert_project(&sample("Mittens")).unwrap();

        storage.set_counts(id, 10, 3).unwrap();
        let loaded = storage.get_project(id).unwrap().unwrap();
        assert_eq!((loaded.stitch_count, loaded.row_count), (10, 3));

        let err = storage.set_counts(9999, 1, 1).unwrap_err();
        assert!(matches!(err, Error::ProjectNotFound { id: 9999 }));
    }

    #[test]
    fn test_delete_project() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let id = storage.upsert_project(&sample("Swatch")).unwrap();

        assert!(storage.delete_project(id).unwrap());
        assert!(!storage.delete_project(id).unwrap());
        assert!(storage.get_project(id).unwrap().is_none());
    }
}
