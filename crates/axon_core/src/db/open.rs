//! Connection setup for the item store.
//!
//! # Invariants
//! - Returned connections carry the latest schema.
//! - File databases run in WAL mode and wait on locks instead of failing fast.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const LOCK_WAIT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy)]
enum Target {
    File,
    Memory,
}

impl Target {
    fn label(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Memory => "memory",
        }
    }
}

/// Opens (or creates) a database file with the current schema.
///
/// # Side effects
/// - Emits one `db_open` event with duration and outcome.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    timed_open(Target::File, || Ok(Connection::open(path)?))
}

/// Opens a private in-memory database with the current schema.
pub fn open_db_in_memory() -> DbResult<Connection> {
    timed_open(Target::Memory, || Ok(Connection::open_in_memory()?))
}

fn timed_open(target: Target, connect: impl FnOnce() -> DbResult<Connection>) -> DbResult<Connection> {
    let started_at = Instant::now();
    let result = connect().and_then(|mut conn| {
        let steps = prepare(&mut conn, target)?;
        Ok((conn, steps))
    });
    let elapsed_ms = started_at.elapsed().as_millis();

    match result {
        Ok((conn, steps)) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={elapsed_ms} schema_steps={steps}",
                target.label()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={elapsed_ms} error={err}",
                target.label()
            );
            Err(err)
        }
    }
}

fn prepare(conn: &mut Connection, target: Target) -> DbResult<usize> {
    conn.busy_timeout(LOCK_WAIT)?;
    if matches!(target, Target::File) {
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
    }
    apply_migrations(conn)
}
