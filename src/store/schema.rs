// Database schema and migrations for the itinerary store.
// Called once at startup by Store::open() after WAL is enabled.
// Adding a new table or column: append an idempotent CREATE TABLE IF NOT
// EXISTS or ALTER TABLE … ADD COLUMN at the end of run_migrations() — never
// modify existing SQL, to keep upgrade paths clean.

use log::info;
use rusqlite::Connection;

use crate::atoms::error::EngineResult;

pub(crate) fn run_migrations(conn: &Connection) -> EngineResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS itineraries (
            id TEXT PRIMARY KEY,
            version INTEGER NOT NULL,
            doc TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS revisions (
            itinerary_id TEXT NOT NULL,
            version INTEGER NOT NULL,
            timestamp TEXT NOT NULL DEFAULT (datetime('now')),
            description TEXT NOT NULL DEFAULT '',
            author TEXT NOT NULL DEFAULT 'system',
            diff TEXT NOT NULL,
            snapshot TEXT NOT NULL,
            PRIMARY KEY (itinerary_id, version),
            FOREIGN KEY (itinerary_id) REFERENCES itineraries(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_revisions_itinerary
            ON revisions(itinerary_id, version);
        ",
    )?;

    info!("[store] Schema ready");
    Ok(())
}
