use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rusqlite::{types::Type, Connection, OptionalExtension};
use tracing::info;
use uuid::Uuid;

use crate::db::init_db;
use crate::error::{Result, ScheduleError};
use crate::types::{EntryFilter, EntryStatus, NewEntry, PublishResults, ScheduleEntry};

const ENTRY_COLUMNS: &str = "id, brand, variant, video_url, thumbnail_url, caption,
        scheduled_time, platforms, status, publish_results, last_error,
        created_at, published_at, updated_at";

/// Thread-safe durable store for schedule entries.
///
/// Wraps a single SQLite connection in a `Mutex`; every caller (worker,
/// dispatcher, orchestrator) goes through the same store, and every status
/// mutation goes through [`ScheduleStore::transition`]'s status
/// precondition, so racing claimers serialize and exactly one wins.
pub struct ScheduleStore {
    db: Mutex<Connection>,
}

impl ScheduleStore {
    /// Wrap a connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Validate and persist a new entry in status `scheduled`.
    ///
    /// Rejects an exact brand+variant+scheduled_time duplicate with
    /// [`ScheduleError::SlotTaken`]; the calendar never hands out an occupied
    /// slot, so this guard only fires for explicit-timestamp scheduling.
    pub fn create(&self, new: NewEntry) -> Result<ScheduleEntry> {
        if new.brand.is_empty() {
            return Err(ScheduleError::Validation("brand must not be empty".into()));
        }
        if new.platforms.is_empty() {
            return Err(ScheduleError::Validation(
                "platform set must not be empty".into(),
            ));
        }
        let mut platforms = new.platforms;
        platforms.sort();
        platforms.dedup();

        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let scheduled = new.scheduled_time.to_rfc3339();
        let platforms_json = serde_json::to_string(&platforms)?;

        let db = self.db.lock().unwrap();
        let taken: bool = db.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM entries
                WHERE brand = ?1 AND variant = ?2 AND scheduled_time = ?3)",
            rusqlite::params![new.brand.as_str(), new.variant.to_string(), scheduled],
            |row| row.get(0),
        )?;
        if taken {
            return Err(ScheduleError::SlotTaken {
                brand: new.brand.to_string(),
                variant: new.variant.to_string(),
                time: scheduled,
            });
        }

        db.execute(
            "INSERT INTO entries
             (id, brand, variant, video_url, thumbnail_url, caption,
              scheduled_time, platforms, status, publish_results, last_error,
              created_at, published_at, updated_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,'scheduled','{}',NULL,?9,NULL,?9)",
            rusqlite::params![
                id,
                new.brand.as_str(),
                new.variant.to_string(),
                new.reel.video_url,
                new.reel.thumbnail_url,
                new.reel.caption,
                scheduled,
                platforms_json,
                now.to_rfc3339(),
            ],
        )?;
        info!(entry_id = %id, brand = %new.brand, variant = %new.variant,
              scheduled_time = %scheduled, "schedule entry created");

        Ok(ScheduleEntry {
            id,
            brand: new.brand,
            variant: new.variant,
            reel: new.reel,
            scheduled_time: new.scheduled_time,
            platforms,
            status: EntryStatus::Scheduled,
            publish_results: PublishResults::new(),
            last_error: None,
            created_at: now,
            published_at: None,
            updated_at: now,
        })
    }

    /// Fetch a single entry by id.
    pub fn get(&self, id: &str) -> Result<ScheduleEntry> {
        let db = self.db.lock().unwrap();
        get_entry(&db, id)
    }

    /// List entries matching the filter, most recently scheduled first.
    pub fn list(&self, filter: &EntryFilter) -> Result<Vec<ScheduleEntry>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        if let Some(brand) = &filter.brand {
            clauses.push("brand = ?");
            values.push(brand.to_string());
        }
        if let Some(variant) = filter.variant {
            clauses.push("variant = ?");
            values.push(variant.to_string());
        }
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(status.to_string());
        }

        let mut sql = format!("SELECT {ENTRY_COLUMNS} FROM entries");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY scheduled_time DESC");

        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(values.iter()), row_to_entry)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// All booked times for a brand+variant — the calendar's occupancy input.
    pub fn booked_times(&self, brand: &reelcast_core::Brand, variant: reelcast_core::Variant) -> Result<Vec<DateTime<Utc>>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT scheduled_time FROM entries
             WHERE brand = ?1 AND variant = ?2
             ORDER BY scheduled_time",
        )?;
        let rows = stmt.query_map(
            rusqlite::params![brand.as_str(), variant.to_string()],
            |row| row.get::<_, String>(0),
        )?;
        Ok(rows
            .filter_map(|r| r.ok())
            .filter_map(|s| parse_utc(&s).ok())
            .collect())
    }

    /// Entries due for dispatch: `scheduled` with a scheduled_time at or
    /// before `now`, oldest first.
    pub fn due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduleEntry>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare_cached(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries
             WHERE status = 'scheduled' AND scheduled_time <= ?1
             ORDER BY scheduled_time"
        ))?;
        let rows = stmt.query_map([now.to_rfc3339()], row_to_entry)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Compare-and-set status transition.
    ///
    /// Moves the entry to `new_status` only if its current status is one of
    /// `expected`; otherwise returns [`ScheduleError::Conflict`] (or
    /// [`ScheduleError::NotFound`] if the entry was deleted). The update and
    /// precondition are a single SQL statement, so two overlapping claimers
    /// cannot both win.
    pub fn transition(
        &self,
        id: &str,
        expected: &[EntryStatus],
        new_status: EntryStatus,
    ) -> Result<ScheduleEntry> {
        // Status values come from a closed enum, safe to inline.
        let expected_list = expected
            .iter()
            .map(|s| format!("'{s}'"))
            .collect::<Vec<_>>()
            .join(",");
        let now = Utc::now().to_rfc3339();

        let db = self.db.lock().unwrap();
        let n = db.execute(
            &format!(
                "UPDATE entries SET status = ?1, updated_at = ?2
                 WHERE id = ?3 AND status IN ({expected_list})"
            ),
            rusqlite::params![new_status.to_string(), now, id],
        )?;
        if n == 0 {
            let current: Option<String> = db
                .query_row("SELECT status FROM entries WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            return match current {
                None => Err(ScheduleError::NotFound { id: id.to_string() }),
                Some(status) => Err(ScheduleError::Conflict {
                    id: id.to_string(),
                    status,
                }),
            };
        }
        get_entry(&db, id)
    }

    /// Persist the aggregate outcome of one publish attempt.
    ///
    /// `published_at` is only ever set once — the COALESCE keeps the first
    /// publish time across retries.
    pub fn record_outcome(
        &self,
        id: &str,
        status: EntryStatus,
        results: &PublishResults,
        published_at: Option<DateTime<Utc>>,
        last_error: Option<&str>,
    ) -> Result<()> {
        let results_json = serde_json::to_string(results)?;
        let now = Utc::now().to_rfc3339();

        let db = self.db.lock().unwrap();
        let n = db.execute(
            "UPDATE entries
             SET status = ?1, publish_results = ?2, last_error = ?3,
                 published_at = COALESCE(published_at, ?4), updated_at = ?5
             WHERE id = ?6",
            rusqlite::params![
                status.to_string(),
                results_json,
                last_error,
                published_at.map(|t| t.to_rfc3339()),
                now,
                id
            ],
        )?;
        if n == 0 {
            return Err(ScheduleError::NotFound { id: id.to_string() });
        }
        Ok(())
    }

    /// Release entries stuck in `publishing` back to `scheduled`.
    ///
    /// An entry whose last update is older than `stale_after` was claimed by
    /// a process that died mid-dispatch; the next due-scan re-attempts it.
    pub fn release_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> Result<usize> {
        let cutoff = (now - stale_after).to_rfc3339();
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "UPDATE entries SET status = 'scheduled', updated_at = ?1
             WHERE status = 'publishing' AND updated_at <= ?2",
            rusqlite::params![now.to_rfc3339(), cutoff],
        )?;
        Ok(n)
    }

    /// Permanently delete an entry (explicit unschedule). Allowed in any
    /// status — a dispatcher racing with this tolerates the disappearance.
    pub fn delete(&self, id: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        let n = db.execute("DELETE FROM entries WHERE id = ?1", [id])?;
        if n == 0 {
            return Err(ScheduleError::NotFound { id: id.to_string() });
        }
        info!(entry_id = %id, "schedule entry deleted");
        Ok(())
    }
}

fn get_entry(conn: &Connection, id: &str) -> Result<ScheduleEntry> {
    match conn.query_row(
        &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1"),
        [id],
        row_to_entry,
    ) {
        Ok(entry) => Ok(entry),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(ScheduleError::NotFound {
            id: id.to_string(),
        }),
        Err(e) => Err(ScheduleError::Database(e)),
    }
}

fn parse_utc(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|t| t.with_timezone(&Utc))
}

/// Map a SQLite row to a `ScheduleEntry`.
fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduleEntry> {
    fn conv<E: std::error::Error + Send + Sync + 'static>(
        idx: usize,
    ) -> impl FnOnce(E) -> rusqlite::Error {
        move |e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    }

    let brand = reelcast_core::Brand::new(row.get::<_, String>(1)?);
    let variant = row
        .get::<_, String>(2)?
        .parse::<reelcast_core::Variant>()
        .map_err(conv(2))?;
    let scheduled_time = parse_utc(&row.get::<_, String>(6)?).map_err(conv(6))?;
    let platforms: Vec<reelcast_core::Platform> =
        serde_json::from_str(&row.get::<_, String>(7)?).map_err(conv(7))?;
    let status = row
        .get::<_, String>(8)?
        .parse::<EntryStatus>()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                8,
                Type::Text,
                Box::<dyn std::error::Error + Send + Sync>::from(e),
            )
        })?;
    let publish_results: PublishResults =
        serde_json::from_str(&row.get::<_, String>(9)?).map_err(conv(9))?;
    let created_at = parse_utc(&row.get::<_, String>(11)?).map_err(conv(11))?;
    let published_at = row
        .get::<_, Option<String>>(12)?
        .map(|s| parse_utc(&s))
        .transpose()
        .map_err(conv(12))?;
    let updated_at = parse_utc(&row.get::<_, String>(13)?).map_err(conv(13))?;

    Ok(ScheduleEntry {
        id: row.get(0)?,
        brand,
        variant,
        reel: reelcast_core::ReelRef {
            video_url: row.get(3)?,
            thumbnail_url: row.get(4)?,
            caption: row.get(5)?,
        },
        scheduled_time,
        platforms,
        status,
        publish_results,
        last_error: row.get(10)?,
        created_at,
        published_at,
        updated_at,
    })
}
