//! Schema migrations, recorded by version in `_migrations`.

use libsql::Connection;

use crate::error::DatabaseError;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Append only; versions must increase.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "catchers",
        sql: r#"
            CREATE TABLE IF NOT EXISTS catchers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                license_plate_number TEXT NOT NULL,
                user_id TEXT NOT NULL,
                user_name TEXT NOT NULL DEFAULT '',
                self_intro TEXT NOT NULL DEFAULT '',
                haunted_places TEXT NOT NULL DEFAULT '',
                cover_url TEXT NOT NULL DEFAULT '',
                group_id TEXT NOT NULL,
                group_name TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE (group_id, user_id)
            );
            CREATE INDEX IF NOT EXISTS idx_catchers_plate ON catchers(license_plate_number);
            CREATE INDEX IF NOT EXISTS idx_catchers_user ON catchers(user_id);
        "#,
    },
    Migration {
        version: 2,
        name: "wild_catchers",
        sql: r#"
            CREATE TABLE IF NOT EXISTS wild_catchers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                license_plate_number TEXT NOT NULL UNIQUE,
                count INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
        "#,
    },
];

const CREATE_LEDGER: &str = "CREATE TABLE IF NOT EXISTS _migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
)";

/// Bring the schema up to the latest version.
///
/// Each pending migration and its `_migrations` row commit together.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(CREATE_LEDGER, ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("create _migrations: {e}")))?;

    let applied = applied_version(conn).await?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        apply(conn, migration).await?;
        tracing::info!(version = migration.version, name = migration.name, "Applied migration");
    }

    tracing::debug!(previous = applied, "Schema up to date");
    Ok(())
}

async fn apply(conn: &Connection, migration: &Migration) -> Result<(), DatabaseError> {
    let fail = |e: libsql::Error| {
        DatabaseError::Migration(format!("V{} {}: {e}", migration.version, migration.name))
    };

    let tx = conn.transaction().await.map_err(fail)?;
    tx.execute_batch(migration.sql).await.map_err(fail)?;
    tx.execute(
        "INSERT INTO _migrations (version, name) VALUES (?1, ?2)",
        libsql::params![migration.version, migration.name],
    )
    .await
    .map_err(fail)?;
    tx.commit().await.map_err(fail)
}

/// Highest recorded version; 0 on a fresh database.
async fn applied_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let fail = |e: libsql::Error| DatabaseError::Migration(format!("read schema version: {e}"));

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(fail)?;
    match rows.next().await.map_err(fail)? {
        Some(row) => row.get::<i64>(0).map_err(fail),
        None => Ok(0),
    }
}
