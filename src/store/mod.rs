// ── Store (C2) ──────────────────────────────────────────────────────────
// Persistent key→document map plus a per-itinerary append-only revision
// log, backed by SQLite via rusqlite — the same single `Mutex<Connection>`
// shape the teacher's `SessionStore` uses rather than a connection pool,
// since writes to a single file are serialized by SQLite itself anyway.
//
// The Store guarantees only that `save` + `append_revision` commit
// atomically as one transaction (`save_and_append`); per-itinerary
// cross-call serialization is the Change Engine's job (spec.md §5).

mod schema;

use std::path::Path;

use log::info;
use parking_lot::Mutex;
use rusqlite::{params, Connection};

use crate::atoms::error::{EngineError, EngineResult};
use crate::model::{Diff, Itinerary, Revision};

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the itinerary database at `path` and run migrations.
    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        info!("[store] Opening itinerary store at {:?}", path);
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;").ok();
        schema::run_migrations(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;").ok();
        schema::run_migrations(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn get(&self, itinerary_id: &str) -> EngineResult<Option<Itinerary>> {
        let conn = self.conn.lock();
        let result = conn.query_row(
            "SELECT doc FROM itineraries WHERE id = ?1",
            params![itinerary_id],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(doc) => Ok(Some(serde_json::from_str(&doc)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(EngineError::from(e)),
        }
    }

    /// Persist the current document. Does not itself bump the version or
    /// append a revision — callers needing the transactional pair should
    /// use `save_and_append`.
    pub fn save(&self, itinerary: &Itinerary) -> EngineResult<()> {
        let conn = self.conn.lock();
        let doc = serde_json::to_string(itinerary)?;
        conn.execute(
            "INSERT INTO itineraries (id, version, doc, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(id) DO UPDATE SET version = excluded.version,
                doc = excluded.doc, updated_at = excluded.updated_at",
            params![itinerary.itinerary_id, itinerary.version as i64, doc],
        )?;
        Ok(())
    }

    pub fn append_revision(&self, revision: &Revision) -> EngineResult<()> {
        let conn = self.conn.lock();
        append_revision_inner(&conn, revision)
    }

    /// The transactional unit C3 needs: save the new document and append
    /// its revision atomically (spec.md §4.2).
    pub fn save_and_append(&self, itinerary: &Itinerary, revision: &Revision) -> EngineResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let doc = serde_json::to_string(itinerary)?;
        tx.execute(
            "INSERT INTO itineraries (id, version, doc, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(id) DO UPDATE SET version = excluded.version,
                doc = excluded.doc, updated_at = excluded.updated_at",
            params![itinerary.itinerary_id, itinerary.version as i64, doc],
        )?;
        append_revision_inner(&tx, revision)?;
        tx.commit()?;
        Ok(())
    }

    pub fn list_revisions(&self, itinerary_id: &str) -> EngineResult<Vec<Revision>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT version, timestamp, description, author, diff, snapshot
             FROM revisions WHERE itinerary_id = ?1 ORDER BY version ASC",
        )?;
        let rows = stmt
            .query_map(params![itinerary_id], |row| {
                row_to_revision(itinerary_id, row)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_revision(&self, itinerary_id: &str, version: u64) -> EngineResult<Option<Revision>> {
        let conn = self.conn.lock();
        let result = conn.query_row(
            "SELECT version, timestamp, description, author, diff, snapshot
             FROM revisions WHERE itinerary_id = ?1 AND version = ?2",
            params![itinerary_id, version as i64],
            |row| row_to_revision(itinerary_id, row),
        );
        match result {
            Ok(rev) => Ok(Some(rev)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(EngineError::from(e)),
        }
    }

    pub fn delete(&self, itinerary_id: &str) -> EngineResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM revisions WHERE itinerary_id = ?1", params![itinerary_id])?;
        conn.execute("DELETE FROM itineraries WHERE id = ?1", params![itinerary_id])?;
        Ok(())
    }

    pub fn list_ids(&self) -> EngineResult<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id FROM itineraries")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

fn append_revision_inner(conn: &Connection, revision: &Revision) -> EngineResult<()> {
    let diff = serde_json::to_string(&revision.diff)?;
    let snapshot = serde_json::to_string(&revision.snapshot)?;
    let author = serde_json::to_string(&revision.author)?;
    conn.execute(
        "INSERT INTO revisions (itinerary_id, version, timestamp, description, author, diff, snapshot)
         VALUES (?1, ?2, datetime(?3 / 1000, 'unixepoch'), ?4, ?5, ?6, ?7)",
        params![
            revision.itinerary_id,
            revision.version as i64,
            revision.timestamp,
            revision.description,
            author,
            diff,
            snapshot,
        ],
    )?;
    Ok(())
}

fn row_to_revision(itinerary_id: &str, row: &rusqlite::Row) -> rusqlite::Result<Revision> {
    let version: i64 = row.get(0)?;
    let timestamp_str: String = row.get(1)?;
    let description: String = row.get(2)?;
    let author_json: String = row.get(3)?;
    let diff_json: String = row.get(4)?;
    let snapshot_json: String = row.get(5)?;

    let author = serde_json::from_str(&author_json).unwrap_or(crate::model::Author::System);
    let diff: Diff = serde_json::from_str(&diff_json).unwrap_or_else(|_| Diff::empty(version as u64));
    let snapshot: Itinerary = serde_json::from_str(&snapshot_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    // `timestamp_str` is SQLite's own `datetime('now')` text; the canonical
    // epoch-millis timestamp lives in the snapshot's `updated_at`. Fall back
    // to it when parsing the stored text form is not needed by callers.
    let _ = timestamp_str;

    Ok(Revision {
        itinerary_id: itinerary_id.to_string(),
        version: version as u64,
        timestamp: snapshot.updated_at,
        description,
        author,
        diff,
        snapshot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Diff, ItineraryStatus};

    fn sample_itinerary(version: u64) -> Itinerary {
        let mut it = Itinerary::new("trip-1", "anonymous", 1000 * version as i64);
        it.version = version;
        it.status = ItineraryStatus::Planning;
        it
    }

    #[test]
    fn round_trips_through_save_and_get() {
        let store = Store::open_in_memory().unwrap();
        let it = sample_itinerary(1);
        store.save(&it).unwrap();
        let loaded = store.get("trip-1").unwrap().unwrap();
        assert_eq!(loaded.version, 1);
    }

    #[test]
    fn missing_itinerary_returns_none() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.get("nope").unwrap().is_none());
    }

    #[test]
    fn save_and_append_is_atomic_and_revisions_list_in_order() {
        let store = Store::open_in_memory().unwrap();
        let it1 = sample_itinerary(1);
        store.save(&it1).unwrap();

        let it2 = sample_itinerary(2);
        let rev2 = Revision {
            itinerary_id: "trip-1".into(),
            version: 2,
            timestamp: it2.updated_at,
            description: "insert".into(),
            author: crate::model::Author::User,
            diff: Diff::empty(2),
            snapshot: it2.clone(),
        };
        store.save_and_append(&it2, &rev2).unwrap();

        let revisions = store.list_revisions("trip-1").unwrap();
        assert_eq!(revisions.len(), 1);
        assert_eq!(revisions[0].version, 2);

        let fetched = store.get_revision("trip-1", 2).unwrap().unwrap();
        assert_eq!(fetched.version, 2);
    }
}
