//! SQLite queue backend.

#![cfg(feature = "sqlite")]

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, Row};

use namechain_core::model::{NameOpKind, Txid};

use super::{QueueEntry, QueueStore};

const MIG_0001: &str = include_str!("migrations/0001_init.sql");
const MIG_0002: &str = include_str!("migrations/0002_indexes.sql");

pub struct SqliteQueue {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteQueue {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        let this = Self { path, conn: Mutex::new(conn) };
        this.migrate()?;
        Ok(this)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(MIG_0001)?;
        conn.execute_batch(MIG_0002)?;
        let v: i64 = conn.query_row("PRAGMA user_version;", [], |r| r.get(0))?;
        if v < 2 {
            conn.execute_batch("PRAGMA user_version = 2;")?;
        }
        Ok(())
    }

    fn now_unix() -> i64 {
        time::OffsetDateTime::now_utc().unix_timestamp()
    }
}

struct RawRow {
    op: String,
    name: String,
    txid: String,
    broadcast_height: i64,
    confirmations: i64,
    payload: Option<Vec<u8>>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        op: row.get(0)?,
        name: row.get(1)?,
        txid: row.get(2)?,
        broadcast_height: row.get(3)?,
        confirmations: row.get(4)?,
        payload: row.get(5)?,
    })
}

impl QueueStore for SqliteQueue {
    fn enqueue(&mut self, entry: QueueEntry) -> Result<()> {
        let ts = Self::now_unix();
        let conn = self.conn.lock();
        conn.execute(
            r#"INSERT INTO queue(op,name,txid,broadcast_height,confirmations,payload,updated_at)
               VALUES(?1,?2,?3,?4,?5,?6,?7)"#,
            params![
                entry.op.queue_id(),
                entry.name,
                entry.txid.as_str(),
                entry.broadcast_height as i64,
                i64::from(entry.confirmations),
                entry.payload,
                ts
            ],
        )?;
        Ok(())
    }

    fn find(&self, op: NameOpKind, name: &str) -> Result<Vec<QueueEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"SELECT op,name,txid,broadcast_height,confirmations,payload
               FROM queue WHERE op = ?1 AND name = ?2 ORDER BY id ASC"#,
        )?;
        let rows = stmt.query_map(params![op.queue_id(), name], read_row)?;
        collect_entries(rows)
    }

    fn remove(&mut self, op: NameOpKind, name: &str, txid: &Txid) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM queue WHERE op = ?1 AND name = ?2 AND txid = ?3",
            params![op.queue_id(), name, txid.as_str()],
        )?;
        Ok(())
    }

    fn update_confirmations(&mut self, txid: &Txid, confirmations: u32) -> Result<()> {
        let ts = Self::now_unix();
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE queue SET confirmations = ?1, updated_at = ?2 WHERE txid = ?3",
            params![i64::from(confirmations), ts, txid.as_str()],
        )?;
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<QueueEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"SELECT op,name,txid,broadcast_height,confirmations,payload
               FROM queue ORDER BY id ASC"#,
        )?;
        let rows = stmt.query_map([], read_row)?;
        collect_entries(rows)
    }
}

fn collect_entries<I>(rows: I) -> Result<Vec<QueueEntry>>
where
    I: Iterator<Item = rusqlite::Result<RawRow>>,
{
    let mut out = Vec::new();
    for r in rows {
        let raw = r?;
        let op = NameOpKind::from_queue_id(&raw.op)
            .ok_or_else(|| anyhow!("unknown queued op kind: {}", raw.op))?;
        let txid = Txid::new(raw.txid).map_err(|e| anyhow!("corrupt queue row: {e}"))?;
        out.push(QueueEntry {
            op,
            name: raw.name,
            txid,
            broadcast_height: raw.broadcast_height as u64,
            confirmations: raw.confirmations as u32,
            payload: raw.payload,
        });
    }
    Ok(out)
}
