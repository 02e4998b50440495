//! Confirmation polling for queued operations.
//!
//! The poller is the only writer of confirmation counts. It runs as an
//! independent periodic task (`ClientConfig::poll_interval_secs`); the
//! scheduling itself belongs to the embedding daemon, which calls
//! `poll_once` on its timer.
//!
//! Retirement rules: an entry past the target confirmation count is done
//! and leaves the queue, except preorders, which must stay visible until
//! their register is sent (the register flow drops them), and are otherwise
//! pruned only once they exceed the stale maximum.

use tracing::{debug, info, warn};

use namechain_core::model::{NameOpKind, Txid};
use namechain_store::queue::{Queue, QueueEntry};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::retry::{retry_transient, RetryPolicy};
use crate::services::TxService;

/// What one polling pass did.
#[derive(Debug, Default)]
pub struct PollReport {
    pub polled: usize,
    pub retired: Vec<QueueEntry>,
    /// Entries whose confirmation lookup failed; left untouched for the
    /// next pass.
    pub errors: Vec<(Txid, String)>,
}

pub struct QueuePoller<'a> {
    cfg: &'a ClientConfig,
    tx: &'a dyn TxService,
    queue: &'a Queue,
    retry: RetryPolicy,
}

impl<'a> QueuePoller<'a> {
    pub fn new(cfg: &'a ClientConfig, tx: &'a dyn TxService, queue: &'a Queue) -> Self {
        let retry = RetryPolicy::from(&cfg.retry);
        Self { cfg, tx, queue, retry }
    }

    /// Refresh confirmation counts for every queued entry and retire the
    /// ones that are done or stale.
    pub fn poll_once(&self) -> ClientResult<PollReport> {
        let mut report = PollReport::default();

        for entry in self.queue.list_all().map_err(ClientError::from)? {
            report.polled += 1;

            let confirmations = match retry_transient(&self.retry, "get_tx_confirmations", || {
                self.tx.get_tx_confirmations(&entry.txid)
            }) {
                Ok(c) => c,
                Err(e) => {
                    warn!(name = %entry.name, txid = %entry.txid, error = %e, "confirmation poll failed");
                    report.errors.push((entry.txid.clone(), e.to_string()));
                    continue;
                }
            };

            self.queue
                .update_confirmations(&entry.txid, confirmations)
                .map_err(ClientError::from)?;
            debug!(name = %entry.name, op = %entry.op, confirmations, "polled");

            if self.should_retire(entry.op, confirmations) {
                info!(name = %entry.name, op = %entry.op, confirmations, "operation confirmed; retiring");
                self.queue
                    .remove(entry.op, &entry.name, &entry.txid)
                    .map_err(ClientError::from)?;
                report.retired.push(entry);
            }
        }

        Ok(report)
    }

    /// Remove a stuck entry by operator request. This cannot un-broadcast
    /// the transaction; it only stops the client from tracking it.
    pub fn unqueue(&self, op: NameOpKind, name: &str, txid: &Txid) -> ClientResult<()> {
        self.queue.remove(op, name, txid).map_err(ClientError::from)?;
        info!(name, %op, %txid, "entry unqueued by operator");
        Ok(())
    }

    fn should_retire(&self, op: NameOpKind, confirmations: u32) -> bool {
        if confirmations > self.cfg.max_confirmations {
            return true;
        }
        if op == NameOpKind::NamePreorder {
            // the register flow consumes preorder entries; keep them alive
            // until then or until stale
            return false;
        }
        confirmations > self.cfg.target_confirmations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{txid, MockTx};
    use namechain_store::queue::QueueBackend;
    use tempfile::TempDir;

    fn entry(op: NameOpKind, name: &str, txid_byte: &str) -> QueueEntry {
        QueueEntry {
            op,
            name: name.to_string(),
            txid: txid(txid_byte),
            broadcast_height: 400000,
            confirmations: 0,
            payload: None,
        }
    }

    fn cfg() -> ClientConfig {
        let mut cfg = ClientConfig::default();
        cfg.retry.backoff_ms = 0;
        cfg
    }

    #[test]
    fn updates_counts_and_retires_past_threshold() {
        let td = TempDir::new().unwrap();
        let cfg = cfg();
        let queue = Queue::open(td.path(), QueueBackend::Memory).unwrap();
        let tx = MockTx::with_balance(0);

        queue.enqueue(entry(NameOpKind::NameUpdate, "alice.id", "aa")).unwrap();
        queue.enqueue(entry(NameOpKind::NameTransfer, "bob.id", "bb")).unwrap();
        tx.set_confirmations(&txid("aa"), 7);
        tx.set_confirmations(&txid("bb"), 3);

        let poller = QueuePoller::new(&cfg, &tx, &queue);
        let report = poller.poll_once().unwrap();

        assert_eq!(report.polled, 2);
        assert_eq!(report.retired.len(), 1);
        assert_eq!(report.retired[0].name, "alice.id");

        let remaining = queue.list_all().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "bob.id");
        assert_eq!(remaining[0].confirmations, 3);
    }

    #[test]
    fn preorders_survive_the_normal_threshold() {
        let td = TempDir::new().unwrap();
        let cfg = cfg();
        let queue = Queue::open(td.path(), QueueBackend::Memory).unwrap();
        let tx = MockTx::with_balance(0);

        queue.enqueue(entry(NameOpKind::NamePreorder, "alice.id", "cc")).unwrap();
        tx.set_confirmations(&txid("cc"), 20);

        let poller = QueuePoller::new(&cfg, &tx, &queue);
        poller.poll_once().unwrap();
        assert!(queue.is_queued(NameOpKind::NamePreorder, "alice.id").unwrap());

        // but stale preorders are pruned
        tx.set_confirmations(&txid("cc"), 131);
        poller.poll_once().unwrap();
        assert!(!queue.is_queued(NameOpKind::NamePreorder, "alice.id").unwrap());
    }

    /// A transaction layer whose every call fails with a connection error.
    struct DownTx;

    impl crate::services::TxService for DownTx {
        fn build_transaction(
            &self,
            _: &crate::services::OpIntent,
            _: &crate::services::WalletKeys,
        ) -> ClientResult<Vec<u8>> {
            Err(ClientError::Connection("down".into()))
        }
        fn broadcast_transaction(&self, _: &[u8]) -> ClientResult<namechain_core::Txid> {
            Err(ClientError::Connection("down".into()))
        }
        fn get_utxos(
            &self,
            _: &namechain_core::Address,
        ) -> ClientResult<Vec<crate::services::Utxo>> {
            Err(ClientError::Connection("down".into()))
        }
        fn get_tx_confirmations(&self, _: &namechain_core::Txid) -> ClientResult<u32> {
            Err(ClientError::Connection("down".into()))
        }
        fn block_height(&self) -> ClientResult<u64> {
            Err(ClientError::Connection("down".into()))
        }
        fn consensus_hash_in_tx(
            &self,
            _: &namechain_core::Txid,
        ) -> ClientResult<Option<namechain_core::ConsensusHash>> {
            Err(ClientError::Connection("down".into()))
        }
        fn serial_number_to_txid(
            &self,
            _: namechain_core::SerialNumber,
        ) -> ClientResult<Option<namechain_core::Txid>> {
            Err(ClientError::Connection("down".into()))
        }
    }

    #[test]
    fn poll_errors_leave_entries_in_place() {
        let td = TempDir::new().unwrap();
        let cfg = cfg();
        let queue = Queue::open(td.path(), QueueBackend::Memory).unwrap();
        queue.enqueue(entry(NameOpKind::NameUpdate, "alice.id", "dd")).unwrap();

        let poller = QueuePoller::new(&cfg, &DownTx, &queue);
        let report = poller.poll_once().unwrap();

        assert_eq!(report.errors.len(), 1);
        assert!(queue.is_queued(NameOpKind::NameUpdate, "alice.id").unwrap());
    }

    #[test]
    fn unqueue_removes_entry() {
        let td = TempDir::new().unwrap();
        let cfg = cfg();
        let queue = Queue::open(td.path(), QueueBackend::Memory).unwrap();
        let tx = MockTx::with_balance(0);

        queue.enqueue(entry(NameOpKind::NameUpdate, "alice.id", "ee")).unwrap();
        let poller = QueuePoller::new(&cfg, &tx, &queue);
        poller.unqueue(NameOpKind::NameUpdate, "alice.id", &txid("ee")).unwrap();
        assert!(queue.list_all().unwrap().is_empty());
    }
}
