//! Zonefile replication to storage backends.
//!
//! A zonefile is only useful to third parties if it can be tied to the
//! transaction that committed its hash on chain; that binding is what makes
//! the bytes verifiable. Replication therefore refuses to proceed until the
//! txid is established: from the caller, from the pending update queue, or
//! from the name's on-chain record and history.
//!
//! Backend pushes are independent; each backend's outcome is reported on
//! its own so callers can retry just the failures.

use tracing::{debug, info, warn};

use namechain_core::model::Txid;
use namechain_core::zonefile::hash_zonefile_data;
use namechain_core::{NameOpKind, ZonefileHash};
use namechain_store::queue::Queue;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::retry::{retry_transient, RetryPolicy};
use crate::services::{NameIndexer, StorageProvider};

/// Outcome of pushing to one storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStatus {
    pub driver: String,
    /// URL the backend stored the bytes under, on success.
    pub url: Option<String>,
    pub error: Option<String>,
}

impl BackendStatus {
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a replication pass. Partial backend failure lives inside this
/// success value, per backend, never as one aggregate error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationReport {
    pub name: String,
    pub value_hash: ZonefileHash,
    /// The transaction that committed this zonefile's hash.
    pub txid: Txid,
    pub backends: Vec<BackendStatus>,
}

impl ReplicationReport {
    pub fn fully_replicated(&self) -> bool {
        self.backends.iter().all(BackendStatus::ok)
    }
}

pub struct ZonefileReplicator<'a> {
    indexer: &'a dyn NameIndexer,
    queue: &'a Queue,
    retry: RetryPolicy,
}

impl<'a> ZonefileReplicator<'a> {
    pub fn new(cfg: &'a ClientConfig, indexer: &'a dyn NameIndexer, queue: &'a Queue) -> Self {
        let retry = RetryPolicy::from(&cfg.retry);
        Self { indexer, queue, retry }
    }

    /// Push `zonefile_data` for `name` to every backend.
    ///
    /// If `txid` is not supplied it is attributed from, in order: the
    /// pending update queue, the name's current record, the name's history
    /// walked newest-first. Attribution failure aborts the replication.
    pub fn replicate(
        &self,
        name: &str,
        zonefile_data: &[u8],
        txid: Option<Txid>,
        backends: &[&dyn StorageProvider],
    ) -> ClientResult<ReplicationReport> {
        namechain_core::check_name(name)?;
        let value_hash = hash_zonefile_data(zonefile_data);

        let txid = match txid {
            Some(t) => t,
            None => self.attribute_txid(name, &value_hash)?,
        };

        info!(name, %value_hash, %txid, backends = backends.len(), "replicating zonefile");

        let mut statuses = Vec::with_capacity(backends.len());
        for backend in backends {
            let driver = backend.name().to_string();
            let result = retry_transient(&self.retry, "storage_put", || {
                backend.put(value_hash.as_str(), zonefile_data)
            });
            match result {
                Ok(url) => {
                    debug!(%driver, %url, "replicated");
                    statuses.push(BackendStatus { driver, url: Some(url), error: None });
                }
                Err(e) => {
                    warn!(%driver, error = %e, "backend push failed");
                    statuses.push(BackendStatus { driver, url: None, error: Some(e.to_string()) });
                }
            }
        }

        Ok(ReplicationReport {
            name: name.to_string(),
            value_hash,
            txid,
            backends: statuses,
        })
    }

    /// Find the transaction that committed this zonefile hash.
    fn attribute_txid(&self, name: &str, value_hash: &ZonefileHash) -> ClientResult<Txid> {
        // a pending update we broadcast ourselves?
        for entry in self
            .queue
            .find(NameOpKind::NameUpdate, name)
            .map_err(ClientError::from)?
        {
            let Some(payload) = &entry.payload else { continue };
            if &hash_zonefile_data(payload) == value_hash {
                debug!(name, txid = %entry.txid, "zonefile attributed from queue");
                return Ok(entry.txid);
            }
        }

        // the current record, or its history walked newest-first
        let record = retry_transient(&self.retry, "get_name_record", || {
            self.indexer.get_name_record(name)
        })?
        .ok_or_else(|| ClientError::NotFound(format!("{name} is not registered")))?;

        if let Some(txid) = record.find_update_txid(value_hash) {
            debug!(name, %txid, "zonefile attributed from chain");
            return Ok(txid);
        }

        Err(ClientError::Precondition(format!(
            "cannot attribute zonefile {value_hash} for {name} to a transaction"
        )))
    }
}
