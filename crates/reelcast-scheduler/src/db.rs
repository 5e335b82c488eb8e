use rusqlite::Connection;

use crate::error::Result;

/// Initialise the scheduler schema in `conn`.
///
/// Creates the `entries` table (idempotent) plus the two indexes the hot
/// queries need: the worker's due-scan and the calendar's booked-slot lookup.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS entries (
            id              TEXT    NOT NULL PRIMARY KEY,
            brand           TEXT    NOT NULL,
            variant         TEXT    NOT NULL,
            video_url       TEXT    NOT NULL,
            thumbnail_url   TEXT    NOT NULL,
            caption         TEXT    NOT NULL,
            scheduled_time  TEXT    NOT NULL,   -- RFC3339 UTC
            platforms       TEXT    NOT NULL,   -- JSON array of platform names
            status          TEXT    NOT NULL DEFAULT 'scheduled',
            publish_results TEXT    NOT NULL DEFAULT '{}',  -- JSON platform -> result
            last_error      TEXT,
            created_at      TEXT    NOT NULL,
            published_at    TEXT,
            updated_at      TEXT    NOT NULL
        ) STRICT;

        -- Worker due-scan: SELECT … WHERE status = ? AND scheduled_time <= ?
        CREATE INDEX IF NOT EXISTS idx_entries_due
            ON entries (status, scheduled_time);

        -- Calendar occupancy lookup per brand+variant.
        CREATE INDEX IF NOT EXISTS idx_entries_brand_slot
            ON entries (brand, variant, scheduled_time);
        ",
    )?;
    Ok(())
}
