//! An embedded, local, append-only structured log store.
//!
//! This crate plays the role that `libsystemd`'s `sd_journal_*` family
//! plays for the real `journal-gatewayd`: it is the thing the gateway
//! crate (`journal-gatewayd`) drives a cursor over, never writes to in
//! the course of serving a request, and treats cursors from as opaque
//! strings. Unlike the real journal it also exposes [`Journal::append`],
//! because something in this workspace has to originate entries — the
//! real journal is written by `systemd-journald`, a separate process this
//! crate doesn't have.
//!
//! Storage is an embedded SQLite database (`rusqlite`, bundled), in the
//! same spirit as `receiver`'s `Db` in the teacher workspace: a single
//! connection, guarded by a lock, holding both record data and the
//! machine identity.

pub mod error;

mod cursor;
mod ids;

pub use error::{JournalError, JournalResult};
pub use ids::process_boot_id;

use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, Notify};

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Mirrors `SD_JOURNAL_LOCAL_ONLY`/`SD_JOURNAL_SYSTEM_ONLY`. Both flags are
/// accepted for interface parity with the real journal API but have no
/// effect: this store has exactly one "machine" and one "system" to
/// speak of.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFlags {
    pub local_only: bool,
    pub system_only: bool,
}

/// Outcome of an advance (`next`/`next_skip`/`previous_skip`). Keeps the
/// "ran off the end" case out of [`JournalError`], matching `sd_journal_next`'s
/// `0` return rather than a negative `errno`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Advanced,
    NoMoreEntries,
}

/// Outcome of [`Journal::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Appended,
    TimedOut,
}

/// A fully materialized journal record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub cursor: String,
    pub boot_id: String,
    pub realtime_usec: u64,
    pub monotonic_usec: u64,
    pub fields: Vec<(String, String)>,
}

struct Shared {
    conn: Mutex<Connection>,
    notify: Notify,
}

/// A single reader's view over the journal: its own cursor position,
/// its own accumulated matches, and its own field-enumeration state.
/// Multiple `Journal` handles may share the same underlying store (via
/// [`Journal::open`] called twice against the same path, or — in tests —
/// [`Journal::handle`]) and observe each other's appends through
/// [`Journal::wait`].
pub struct Journal {
    shared: Arc<Shared>,
    /// The pointer between two entries: forward steps look for
    /// `seq > pointer`, backward steps for `seq <= pointer`. See
    /// `seek_head`/`seek_tail`/`seek_cursor` for how this is seeded.
    pointer: i64,
    /// The seq of the entry we are concretely sitting on, if any
    /// advance has succeeded since the last seek.
    current: Option<i64>,
    matches: Vec<(String, String)>,
    unique_field: Option<String>,
    unique_after: Option<String>,
    machine_id: String,
}

impl Journal {
    pub async fn open(path: impl AsRef<Path>, _flags: OpenFlags) -> JournalResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;
        conn.execute_batch(SCHEMA_SQL)?;
        Self::from_connection(conn).await
    }

    /// Backing store for tests and for `--help`-less local runs: no file
    /// on disk, contents vanish when the last handle is dropped.
    pub async fn open_in_memory() -> JournalResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Self::from_connection(conn).await
    }

    async fn from_connection(conn: Connection) -> JournalResult<Self> {
        let machine_id = {
            let existing: Option<String> = conn
                .query_row("SELECT machine_id FROM machine LIMIT 1", [], |r| r.get(0))
                .optional()?;
            match existing {
                Some(id) => id,
                None => {
                    let id = ids::generate_id();
                    conn.execute("INSERT INTO machine (machine_id) VALUES (?1)", params![id])?;
                    id
                }
            }
        };
        Ok(Self {
            shared: Arc::new(Shared {
                conn: Mutex::new(conn),
                notify: Notify::new(),
            }),
            pointer: 0,
            current: None,
            matches: Vec::new(),
            unique_field: None,
            unique_after: None,
            machine_id,
        })
    }

    /// A second, independent cursor over the same store — used by tests
    /// that need one handle to `append` while another `follow`s.
    pub fn handle(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            pointer: 0,
            current: None,
            matches: Vec::new(),
            unique_field: None,
            unique_after: None,
            machine_id: self.machine_id.clone(),
        }
    }

    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    /// No-op beyond running `Drop` — kept for interface parity with
    /// `sd_journal_close`.
    pub fn close(self) {}

    /// Append a new entry with the given `KEY=VALUE` fields, tagging it
    /// with the current process boot ID and the current time. Wakes any
    /// reader blocked in [`Journal::wait`].
    pub async fn append(&self, fields: Vec<(String, String)>) -> JournalResult<String> {
        let boot_id = ids::process_boot_id().to_owned();
        let realtime_usec = now_usec();
        let monotonic_usec = monotonic_usec();

        let cursor = {
            let conn = self.shared.conn.lock().await;
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO entries (cursor, boot_id, realtime_usec, monotonic_usec) VALUES ('', ?1, ?2, ?3)",
                params![boot_id, realtime_usec as i64, monotonic_usec as i64],
            )?;
            let seq = tx.last_insert_rowid();
            let cursor = cursor::format_cursor(seq, &boot_id, monotonic_usec, realtime_usec);
            tx.execute(
                "UPDATE entries SET cursor = ?1 WHERE seq = ?2",
                params![cursor, seq],
            )?;
            for (k, v) in &fields {
                tx.execute(
                    "INSERT INTO entry_fields (entry_seq, key, value) VALUES (?1, ?2, ?3)",
                    params![seq, k, v],
                )?;
            }
            tx.commit()?;
            cursor
        };

        self.shared.notify.notify_waiters();
        Ok(cursor)
    }

    pub fn add_match(&mut self, key: &str, value: &str) -> JournalResult<()> {
        if key.is_empty() {
            return Err(JournalError::InvalidFieldName);
        }
        self.matches.push((key.to_owned(), value.to_owned()));
        Ok(())
    }

    pub fn clear_matches(&mut self) {
        self.matches.clear();
    }

    pub fn seek_head(&mut self) {
        self.pointer = 0;
        self.current = None;
    }

    pub fn seek_tail(&mut self) {
        self.pointer = i64::MAX;
        self.current = None;
    }

    /// Positions the pointer just before the entry named by `cursor`,
    /// mirroring `sd_journal_seek_cursor`: the cursor's own entry is not
    /// yet "current" until the next `next`/`next_skip`/`previous_skip`
    /// call. Errors with [`JournalError::CursorNotFound`] if no entry in
    /// the store (ignoring matches — matches only gate stepping) carries
    /// that cursor.
    pub async fn seek_cursor(&mut self, cursor: &str) -> JournalResult<()> {
        let conn = self.shared.conn.lock().await;
        let seq: Option<i64> = conn
            .query_row(
                "SELECT seq FROM entries WHERE cursor = ?1",
                params![cursor],
                |r| r.get(0),
            )
            .optional()?;
        match seq {
            Some(seq) => {
                self.pointer = seq - 1;
                self.current = None;
                Ok(())
            }
            None => Err(JournalError::CursorNotFound),
        }
    }

    /// `true` if the entry we are currently sitting on (per the last
    /// successful advance) is the one named by `cursor`.
    pub async fn test_cursor(&self, cursor: &str) -> JournalResult<bool> {
        let Some(current) = self.current else {
            return Ok(false);
        };
        let conn = self.shared.conn.lock().await;
        let seq: Option<i64> = conn
            .query_row(
                "SELECT seq FROM entries WHERE cursor = ?1",
                params![cursor],
                |r| r.get(0),
            )
            .optional()?;
        Ok(seq == Some(current))
    }

    pub async fn next(&mut self) -> JournalResult<StepOutcome> {
        self.step(1, Direction::Forward).await
    }

    pub async fn next_skip(&mut self, n: u64) -> JournalResult<StepOutcome> {
        self.step(n.max(1), Direction::Forward).await
    }

    pub async fn previous_skip(&mut self, n: u64) -> JournalResult<StepOutcome> {
        self.step(n.max(1), Direction::Backward).await
    }

    async fn step(&mut self, count: u64, direction: Direction) -> JournalResult<StepOutcome> {
        let (predicate, pred_params) = self.build_predicate();
        let sql = match direction {
            Direction::Forward => format!(
                "SELECT seq FROM entries WHERE seq > ? {predicate} ORDER BY seq ASC LIMIT ?"
            ),
            Direction::Backward => format!(
                "SELECT seq FROM entries WHERE seq <= ? {predicate} ORDER BY seq DESC LIMIT ?"
            ),
        };

        let conn = self.shared.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let mut query_params: Vec<rusqlite::types::Value> = Vec::with_capacity(pred_params.len() + 2);
        query_params.push(self.pointer.into());
        for p in pred_params {
            query_params.push(p.into());
        }
        query_params.push((count as i64).into());

        let rows: Vec<i64> = stmt
            .query_map(rusqlite::params_from_iter(query_params.iter()), |r| {
                r.get(0)
            })?
            .collect::<Result<_, _>>()?;
        drop(stmt);
        drop(conn);

        if rows.is_empty() {
            return Ok(StepOutcome::NoMoreEntries);
        }
        // Land on the furthest row actually reached, even if fewer than
        // `count` rows were available — mirrors `sd_journal_next_skip`,
        // which advances as far as it can and reports how many steps it
        // took rather than failing outright on a partial skip.
        let target = rows[rows.len() - 1];
        self.pointer = target;
        self.current = Some(target);
        Ok(StepOutcome::Advanced)
    }

    fn build_predicate(&self) -> (String, Vec<String>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        for (k, v) in &self.matches {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM entry_fields ef WHERE ef.entry_seq = entries.seq AND ef.key = ? AND ef.value = ?)",
            );
            params.push(k.clone());
            params.push(v.clone());
        }
        (sql, params)
    }

    /// Fetches the entry we are currently sitting on, or `None` if no
    /// advance has succeeded since the last seek.
    pub async fn current_entry(&self) -> JournalResult<Option<Entry>> {
        let Some(seq) = self.current else {
            return Ok(None);
        };
        let conn = self.shared.conn.lock().await;
        let (cursor, boot_id, realtime_usec, monotonic_usec): (String, String, i64, i64) = conn
            .query_row(
                "SELECT cursor, boot_id, realtime_usec, monotonic_usec FROM entries WHERE seq = ?1",
                params![seq],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM entry_fields WHERE entry_seq = ?1 ORDER BY rowid ASC")?;
        let fields = stmt
            .query_map(params![seq], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(Entry {
            cursor,
            boot_id,
            realtime_usec: realtime_usec as u64,
            monotonic_usec: monotonic_usec as u64,
            fields,
        }))
    }

    /// Blocks until a new entry is appended to the store (by any handle
    /// sharing it) or `deadline` elapses. `None` blocks indefinitely,
    /// matching `sd_journal_wait(journal, (uint64_t) -1)`.
    pub async fn wait(&self, deadline: Option<Duration>) -> JournalResult<WaitOutcome> {
        let notified = self.shared.notify.notified();
        match deadline {
            None => {
                notified.await;
                Ok(WaitOutcome::Appended)
            }
            Some(d) => match tokio::time::timeout(d, notified).await {
                Ok(()) => Ok(WaitOutcome::Appended),
                Err(_) => Ok(WaitOutcome::TimedOut),
            },
        }
    }

    /// Resets field-enumeration state for a fresh scan of `field`'s
    /// distinct values, in ascending order.
    pub fn query_unique(&mut self, field: &str) {
        self.unique_field = Some(field.to_owned());
        self.unique_after = None;
    }

    /// Returns the next not-yet-seen `FIELD=value` pair as raw bytes, or
    /// `None` once every distinct value has been returned once.
    pub async fn enumerate_unique(&mut self) -> JournalResult<Option<Vec<u8>>> {
        let field = self.unique_field.clone().ok_or(JournalError::NoPosition)?;
        let conn = self.shared.conn.lock().await;
        let next_value: Option<String> = match &self.unique_after {
            None => conn
                .query_row(
                    "SELECT value FROM entry_fields WHERE key = ?1 ORDER BY value ASC LIMIT 1",
                    params![field],
                    |r| r.get(0),
                )
                .optional()?,
            Some(after) => conn
                .query_row(
                    "SELECT value FROM entry_fields WHERE key = ?1 AND value > ?2 ORDER BY value ASC LIMIT 1",
                    params![field, after],
                    |r| r.get(0),
                )
                .optional()?,
        };
        drop(conn);
        match next_value {
            None => Ok(None),
            Some(v) => {
                self.unique_after = Some(v.clone());
                Ok(Some(format!("{field}={v}").into_bytes()))
            }
        }
    }

    /// Bytes occupied by the backing store on disk (`page_count *
    /// page_size`, same quantity `sd_journal_get_usage` reports).
    pub async fn get_usage(&self) -> JournalResult<u64> {
        let conn = self.shared.conn.lock().await;
        let page_count: i64 = conn.query_row("PRAGMA page_count", [], |r| r.get(0))?;
        let page_size: i64 = conn.query_row("PRAGMA page_size", [], |r| r.get(0))?;
        Ok((page_count * page_size) as u64)
    }

    /// Realtime timestamps of the oldest and newest entries across the
    /// whole store, ignoring matches — `(0, 0)` if the store is empty.
    pub async fn get_cutoff_realtime_usec(&self) -> JournalResult<(u64, u64)> {
        let conn = self.shared.conn.lock().await;
        let (from, to): (Option<i64>, Option<i64>) = conn.query_row(
            "SELECT MIN(realtime_usec), MAX(realtime_usec) FROM entries",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        Ok((from.unwrap_or(0) as u64, to.unwrap_or(0) as u64))
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

fn now_usec() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}

static PROCESS_START: OnceLock<Instant> = OnceLock::new();

fn monotonic_usec() -> u64 {
    let start = PROCESS_START.get_or_init(Instant::now);
    start.elapsed().as_micros() as u64
}
