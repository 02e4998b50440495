//! Queue storage backends.

mod memory;

#[cfg(feature = "sqlite")]
mod sqlite;

use std::path::Path;

use anyhow::{anyhow, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use namechain_core::model::{NameOpKind, Txid};

pub use memory::MemoryQueue;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteQueue;

/// One pending operation: created when a transaction is broadcast, updated
/// by the confirmation poller, removed once confirmed past the threshold or
/// explicitly unqueued.
///
/// The queue is best-effort bookkeeping: the broadcast is the authoritative
/// side effect, and a lost entry can be reconciled by re-reading the name's
/// on-chain state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub op: NameOpKind,
    pub name: String,
    pub txid: Txid,
    /// Chain height at the time of broadcast.
    pub broadcast_height: u64,
    /// Confirmations observed at the last poll.
    pub confirmations: u32,
    /// Zonefile bytes for update operations.
    #[serde(default)]
    pub payload: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub enum QueueBackend {
    Memory,
    #[cfg(feature = "sqlite")]
    Sqlite { path: String },
}

impl Default for QueueBackend {
    fn default() -> Self {
        #[cfg(feature = "sqlite")]
        {
            return QueueBackend::Sqlite { path: "queues.db".to_string() };
        }
        #[cfg(not(feature = "sqlite"))]
        {
            QueueBackend::Memory
        }
    }
}

/// The durable operation queue.
///
/// All mutation goes through an exclusive lock so the CLI-invoked flows and
/// the background poller cannot interleave read-modify-write cycles.
pub struct Queue {
    inner: RwLock<Box<dyn QueueStore + Send + Sync>>,
}

impl Queue {
    pub fn open<P: AsRef<Path>>(dir: P, backend: QueueBackend) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let store: Box<dyn QueueStore + Send + Sync> = match backend {
            QueueBackend::Memory => Box::new(MemoryQueue::default()),
            #[cfg(feature = "sqlite")]
            QueueBackend::Sqlite { path } => Box::new(SqliteQueue::open(dir.join(path))?),
        };

        Ok(Self { inner: RwLock::new(store) })
    }

    pub fn enqueue(&self, entry: QueueEntry) -> Result<()> {
        validate_entry(&entry)?;
        self.inner.write().enqueue(entry)
    }

    pub fn find(&self, op: NameOpKind, name: &str) -> Result<Vec<QueueEntry>> {
        self.inner.read().find(op, name)
    }

    pub fn is_queued(&self, op: NameOpKind, name: &str) -> Result<bool> {
        Ok(!self.find(op, name)?.is_empty())
    }

    pub fn remove(&self, op: NameOpKind, name: &str, txid: &Txid) -> Result<()> {
        self.inner.write().remove(op, name, txid)
    }

    pub fn update_confirmations(&self, txid: &Txid, confirmations: u32) -> Result<()> {
        self.inner.write().update_confirmations(txid, confirmations)
    }

    pub fn list_all(&self) -> Result<Vec<QueueEntry>> {
        self.inner.read().list_all()
    }
}

pub trait QueueStore {
    fn enqueue(&mut self, entry: QueueEntry) -> Result<()>;
    fn find(&self, op: NameOpKind, name: &str) -> Result<Vec<QueueEntry>>;
    fn remove(&mut self, op: NameOpKind, name: &str, txid: &Txid) -> Result<()>;
    fn update_confirmations(&mut self, txid: &Txid, confirmations: u32) -> Result<()>;
    fn list_all(&self) -> Result<Vec<QueueEntry>>;
}

pub fn validate_entry(entry: &QueueEntry) -> Result<()> {
    if !entry.op.is_name_op() {
        return Err(anyhow!("only per-name operations are queued: {}", entry.op));
    }
    if entry.name.is_empty() || entry.name.len() > 256 {
        return Err(anyhow!("queue entry name must be 1..=256 chars"));
    }
    Ok(())
}
