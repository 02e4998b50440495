//! Simple Name Verification.
//!
//! Verifies a name's state at a past block using only a trust anchor from a
//! later block, without trusting the indexer that serves the data. The
//! anchor pins one consensus hash; every earlier consensus hash is folded
//! into later ones through a Merkle skip list, so the resolver can walk
//! backward from the anchor, recomputing each visited block's snapshot from
//! its ops hash and prior consensus hashes. A server that lies anywhere
//! along the chain produces a snapshot mismatch, and the walk fails closed.
//!
//! Verification failures are reported as `ClientError::Verification`,
//! deliberately distinct from connectivity errors: "couldn't verify" must
//! never read as "verified false", and vice versa.

use std::collections::BTreeMap;

use tracing::{debug, error};

use namechain_core::consensus::{make_snapshot, ops_hash, skip_list_heights};
use namechain_core::model::{ConsensusHash, NameOp, SerialNumber, Txid};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::retry::{retry_transient, RetryPolicy};
use crate::services::{NameIndexer, TxService};

/// A height-bound piece of chain data known out-of-band to be valid. Only
/// ever used to validate records at a *lower* height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustAnchor {
    ConsensusHash(ConsensusHash),
    Txid(Txid),
    SerialNumber(SerialNumber),
}

impl TrustAnchor {
    /// Classify an operator-supplied anchor string: 64 hex chars is a txid,
    /// 32 hex chars is a consensus hash, `<block>-<vtxindex>` is a serial
    /// number.
    pub fn parse(s: &str) -> ClientResult<Self> {
        if let Ok(txid) = Txid::new(s.to_string()) {
            return Ok(Self::Txid(txid));
        }
        if let Ok(ch) = ConsensusHash::new(s.to_string()) {
            return Ok(Self::ConsensusHash(ch));
        }
        if let Ok(serial) = SerialNumber::parse(s) {
            return Ok(Self::SerialNumber(serial));
        }
        Err(ClientError::Precondition(format!(
            "not a valid txid, consensus hash, or serial number: {s}"
        )))
    }
}

pub struct SnvResolver<'a> {
    cfg: &'a ClientConfig,
    indexer: &'a dyn NameIndexer,
    tx: &'a dyn TxService,
    retry: RetryPolicy,
}

impl<'a> SnvResolver<'a> {
    pub fn new(cfg: &'a ClientConfig, indexer: &'a dyn NameIndexer, tx: &'a dyn TxService) -> Self {
        let retry = RetryPolicy::from(&cfg.retry);
        Self { cfg, indexer, tx, retry }
    }

    /// Verify `name`'s operation at `block_height` against the trust
    /// anchor. Returns the operation only if the reconstructed hash chain
    /// reproduces the anchor; a record the chain cannot vouch for is never
    /// returned.
    pub fn lookup(
        &self,
        name: &str,
        block_height: u64,
        anchor: &TrustAnchor,
    ) -> ClientResult<NameOp> {
        namechain_core::check_name(name)?;
        if block_height < self.cfg.first_block {
            return Err(ClientError::Precondition(format!(
                "block {block_height} precedes the first block {}",
                self.cfg.first_block
            )));
        }

        let (anchor_height, anchor_hash) = self.resolve_anchor(anchor)?;
        if anchor_height < block_height {
            return Err(ClientError::Precondition(format!(
                "trusted anchor at block {anchor_height} precedes the queried block {block_height}"
            )));
        }

        let ops = self.verified_nameops_at(block_height, anchor_height, &anchor_hash)?;

        let mut matches = ops.into_iter().filter(|op| {
            op.name.as_deref() == Some(name)
        });
        let Some(found) = matches.next() else {
            return Err(ClientError::NotFound(format!(
                "{name} has no operation at block {block_height}"
            )));
        };
        if matches.next().is_some() {
            // a valid chain never yields two histories for one name at one
            // height; refuse to pick one
            error!(name, block_height, "multiple candidate records; failing closed");
            return Err(ClientError::Verification(format!(
                "multiple candidate records for {name} at block {block_height}"
            )));
        }

        Ok(found)
    }

    /// Turn a trust anchor into a `(height, consensus hash)` pair.
    ///
    /// Txid and serial-number anchors resolve through the transaction
    /// layer, which SPV-verifies the transaction carrying the consensus
    /// hash; the hash's height then comes from the indexer. An inauthentic
    /// hash is harmless here: it will simply be unreachable from the rest
    /// of the chain and verification will fail.
    fn resolve_anchor(&self, anchor: &TrustAnchor) -> ClientResult<(u64, ConsensusHash)> {
        let hash = match anchor {
            TrustAnchor::ConsensusHash(ch) => ch.clone(),
            TrustAnchor::Txid(txid) => self.consensus_hash_of_tx(txid)?,
            TrustAnchor::SerialNumber(serial) => {
                let txid = retry_transient(&self.retry, "serial_number_to_txid", || {
                    self.tx.serial_number_to_txid(*serial)
                })?
                .ok_or_else(|| {
                    ClientError::NotFound(format!("no transaction at serial number {serial}"))
                })?;
                self.consensus_hash_of_tx(&txid)?
            }
        };

        let height = retry_transient(&self.retry, "get_block_from_consensus", || {
            self.indexer.get_block_from_consensus(&hash)
        })?
        .ok_or_else(|| {
            ClientError::NotFound(format!("no block found for consensus hash {hash}"))
        })?;

        Ok((height, hash))
    }

    fn consensus_hash_of_tx(&self, txid: &Txid) -> ClientResult<ConsensusHash> {
        retry_transient(&self.retry, "consensus_hash_in_tx", || {
            self.tx.consensus_hash_in_tx(txid)
        })?
        .ok_or_else(|| {
            ClientError::Precondition(format!(
                "transaction {txid} does not carry a consensus hash"
            ))
        })
    }

    /// Walk the skip list backward from the anchor to the target block,
    /// recomputing every visited snapshot, then return the target block's
    /// operations once they hash to the chained ops hash.
    fn verified_nameops_at(
        &self,
        target: u64,
        anchor_height: u64,
        anchor_hash: &ConsensusHash,
    ) -> ClientResult<Vec<NameOp>> {
        debug!(target, anchor_height, %anchor_hash, "verifying backward from anchor");

        let mut known_ops_hashes: BTreeMap<u64, String> = BTreeMap::new();
        let mut known_consensus: BTreeMap<u64, ConsensusHash> = BTreeMap::new();
        known_consensus.insert(anchor_height, anchor_hash.clone());

        let mut next = anchor_height;
        loop {
            if !known_ops_hashes.contains_key(&next) {
                let oh = retry_transient(&self.retry, "get_nameops_hash_at", || {
                    self.indexer.get_nameops_hash_at(next)
                })?;
                known_ops_hashes.insert(next, oh);
            }

            // fetch the skip-list consensus hashes feeding this snapshot
            let mut prior = Vec::new();
            for height in skip_list_heights(next, self.cfg.first_block) {
                if let std::collections::btree_map::Entry::Vacant(slot) =
                    known_consensus.entry(height)
                {
                    let fetched = retry_transient(&self.retry, "get_consensus_at", || {
                        self.indexer.get_consensus_at(height)
                    })?;
                    match fetched {
                        Some(ch) => {
                            slot.insert(ch);
                        }
                        None => break,
                    }
                }
                prior.push(known_consensus[&height].clone());
            }

            // the server's claims must reproduce the snapshot we already
            // trust for this height
            let expected = known_consensus[&next].clone();
            let computed = make_snapshot(&known_ops_hashes[&next], &prior);
            if computed != expected {
                error!(
                    block = next,
                    %expected,
                    %computed,
                    "consensus hash mismatch"
                );
                return Err(ClientError::Verification(format!(
                    "consensus hash mismatch at block {next}: expected {expected}, computed {computed}"
                )));
            }

            if next == target {
                break;
            }

            // advance to the lowest now-trusted height that is still at or
            // above the target
            let candidate = known_consensus
                .range(target..next)
                .map(|(h, _)| *h)
                .next();
            match candidate {
                Some(h) => next = h,
                None => break,
            }
        }

        let Some(target_ops_hash) = known_ops_hashes.get(&target) else {
            return Err(ClientError::Verification(format!(
                "block {target} is unreachable from the trust anchor at {anchor_height}"
            )));
        };

        // finally, the ops themselves must hash to the chained value
        let ops = retry_transient(&self.retry, "get_nameops_at", || {
            self.indexer.get_nameops_at(target)
        })?;
        let recomputed = ops_hash(&ops);
        if &recomputed != target_ops_hash {
            error!(block = target, "operations do not match chained ops hash");
            return Err(ClientError::Verification(format!(
                "name operations at block {target} are not consistent with the consensus hash"
            )));
        }

        Ok(ops)
    }
}
