//! libSQL backend: async `ProfileStore` implementation.
//!
//! Supports local file, in-memory, and remote (`libsql://`) databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{CatcherRecord, ProfileStore};

/// libSQL catcher store. One connection serves every query.
pub struct LibSqlBackend {
    // Held so the database outlives the connection.
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Connect to a remote libSQL server and run migrations.
    pub async fn new_remote(url: &str, auth_token: &str) -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to connect to {url}: {e}")))?;

        let backend = Self::from_database(db).await?;
        info!(url, "Remote database connected");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        Ok(backend)
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

const CATCHER_COLUMNS: &str = "license_plate_number, user_id, user_name, self_intro, haunted_places, cover_url, group_id, group_name";

/// Map a libsql Row to a CatcherRecord. Column order matches CATCHER_COLUMNS.
fn row_to_catcher(row: &libsql::Row) -> Result<CatcherRecord, libsql::Error> {
    Ok(CatcherRecord {
        plate_number: row.get(0)?,
        user_id: row.get(1)?,
        user_name: row.get(2)?,
        self_intro: row.get(3)?,
        haunted_places: row.get(4)?,
        cover_url: row.get(5)?,
        group_id: row.get(6)?,
        group_name: row.get(7)?,
    })
}

/// Drain rows into catcher records, skipping rows that fail to parse.
async fn collect_catchers(mut rows: libsql::Rows) -> Vec<CatcherRecord> {
    let mut catchers = Vec::new();
    while let Ok(Some(row)) = rows.next().await {
        match row_to_catcher(&row) {
            Ok(catcher) => catchers.push(catcher),
            Err(e) => {
                tracing::warn!("Skipping catcher row: {e}");
            }
        }
    }
    catchers
}

/// Escape `%`, `_` and the escape char itself for a `LIKE ... ESCAPE '\'`.
fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl ProfileStore for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    async fn upsert_catcher(&self, record: &CatcherRecord) -> Result<i64, DatabaseError> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let mut rows = conn
            .query(
                &format!(
                    "INSERT INTO catchers ({CATCHER_COLUMNS}, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                     ON CONFLICT (group_id, user_id) DO UPDATE SET
                        license_plate_number = excluded.license_plate_number,
                        user_name = excluded.user_name,
                        self_intro = excluded.self_intro,
                        haunted_places = excluded.haunted_places,
                        cover_url = excluded.cover_url,
                        group_name = excluded.group_name,
                        updated_at = excluded.updated_at
                     RETURNING id"
                ),
                params![
                    record.plate_number.as_str(),
                    record.user_id.as_str(),
                    record.user_name.as_str(),
                    record.self_intro.as_str(),
                    record.haunted_places.as_str(),
                    record.cover_url.as_str(),
                    record.group_id.as_str(),
                    record.group_name.as_str(),
                    now,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_catcher: {e}")))?;

        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_catcher: {e}")))?
            .ok_or_else(|| DatabaseError::Query("upsert_catcher: no id returned".into()))?;
        let id: i64 = row
            .get(0)
            .map_err(|e| DatabaseError::Query(format!("upsert_catcher row parse: {e}")))?;

        debug!(
            id,
            plate = %record.plate_number,
            user_id = %record.user_id,
            group_id = %record.group_id,
            "Catcher upserted"
        );
        Ok(id)
    }

    async fn search_catchers_by_plate(
        &self,
        scope_group_id: &str,
        fragment: &str,
    ) -> Result<Vec<CatcherRecord>, DatabaseError> {
        let conn = self.conn();
        let pattern = format!("%{}%", escape_like(fragment));
        let rows = conn
            .query(
                &format!(
                    "SELECT {CATCHER_COLUMNS} FROM catchers
                     WHERE license_plate_number LIKE ?1 ESCAPE '\\'
                     ORDER BY id ASC"
                ),
                params![pattern],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("search_catchers_by_plate: {e}")))?;

        let catchers = collect_catchers(rows).await;
        debug!(
            scope_group_id,
            fragment,
            matches = catchers.len(),
            "Plate search"
        );
        Ok(catchers)
    }

    async fn list_catchers_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<CatcherRecord>, DatabaseError> {
        let conn = self.conn();
        let rows = conn
            .query(
                &format!("SELECT {CATCHER_COLUMNS} FROM catchers WHERE user_id = ?1 ORDER BY id ASC"),
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_catchers_for_user: {e}")))?;

        Ok(collect_catchers(rows).await)
    }

    async fn increment_wild_catcher(&self, plate_number: &str) -> Result<i64, DatabaseError> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let mut rows = conn
            .query(
                "INSERT INTO wild_catchers (license_plate_number, count, updated_at)
                 VALUES (?1, 1, ?2)
                 ON CONFLICT (license_plate_number) DO UPDATE SET
                    count = wild_catchers.count + 1,
                    updated_at = excluded.updated_at
                 RETURNING count",
                params![plate_number, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("increment_wild_catcher: {e}")))?;

        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("increment_wild_catcher: {e}")))?
            .ok_or_else(|| DatabaseError::Query("increment_wild_catcher: no count returned".into()))?;
        let count: i64 = row
            .get(0)
            .map_err(|e| DatabaseError::Query(format!("increment_wild_catcher row parse: {e}")))?;

        debug!(plate = plate_number, count, "Wild catcher sighted");
        Ok(count)
    }
}
