//! In-memory queue backend.

use anyhow::Result;

use namechain_core::model::{NameOpKind, Txid};

use super::{QueueEntry, QueueStore};

#[derive(Default)]
pub struct MemoryQueue {
    entries: Vec<QueueEntry>,
}

impl QueueStore for MemoryQueue {
    fn enqueue(&mut self, entry: QueueEntry) -> Result<()> {
        self.entries.push(entry);
        Ok(())
    }

    fn find(&self, op: NameOpKind, name: &str) -> Result<Vec<QueueEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.op == op && e.name == name)
            .cloned()
            .collect())
    }

    fn remove(&mut self, op: NameOpKind, name: &str, txid: &Txid) -> Result<()> {
        self.entries
            .retain(|e| !(e.op == op && e.name == name && &e.txid == txid));
        Ok(())
    }

    fn update_confirmations(&mut self, txid: &Txid, confirmations: u32) -> Result<()> {
        for e in &mut self.entries {
            if &e.txid == txid {
                e.confirmations = confirmations;
            }
        }
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<QueueEntry>> {
        Ok(self.entries.clone())
    }
}
