//! On-chain name records and their history.
//!
//! A `NameRecord` is the indexer's view of a name's current state; the
//! blockchain owns it and the client only ever holds a read-only copy. Its
//! `history` maps block heights to the operations that took effect there,
//! totally ordered by height; the latest entry's effect is the current
//! record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ops::NameOpKind;
use crate::model::types::{Address, ConsensusHash, Txid, ZonefileHash};

/// One operation as it appears in indexer responses and name histories.
///
/// Fields are optional where the operation kind does not carry them (a
/// preorder has no plaintext name, only `preorder_name_hash`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameOp {
    pub opcode: NameOpKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preorder_name_hash: Option<String>,
    #[serde(default)]
    pub consensus_hash: Option<ConsensusHash>,
    pub sender: String,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub recipient_address: Option<Address>,
    #[serde(default)]
    pub value_hash: Option<ZonefileHash>,
    pub block_number: u64,
    pub vtxindex: u32,
    pub txid: Txid,
    #[serde(default)]
    pub op_fee: u64,
}

/// Block height -> operations that took effect after that height.
pub type NameHistory = BTreeMap<u64, Vec<NameOp>>;

/// Current on-chain state of a name, plus its history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    pub name: String,
    /// Owner address.
    pub address: Address,
    /// scriptPubKey hex that owns the name.
    pub sender: String,
    /// Content hash of the current zonefile, if any has been set.
    #[serde(default)]
    pub value_hash: Option<ZonefileHash>,
    /// Block at which the name was first preordered.
    pub block_number: u64,
    /// Block of the most recent preorder.
    pub preorder_block_number: u64,
    /// Block at which the current owner registered the name.
    pub first_registered: u64,
    /// Block of the most recent renewal.
    pub last_renewed: u64,
    /// Revocation is terminal: no further operation is valid.
    pub revoked: bool,
    /// The last operation to affect this name.
    pub op: NameOpKind,
    pub txid: Txid,
    pub vtxindex: u32,
    /// Burn fee paid at preorder or renewal, in satoshis.
    pub op_fee: u64,
    /// scriptPubKey hex of the importer, for imported names.
    #[serde(default)]
    pub importer: Option<String>,
    #[serde(default)]
    pub history: NameHistory,
}

impl NameRecord {
    /// Walk the history newest-first for the last update that set the given
    /// zonefile hash, returning its txid.
    pub fn find_update_txid(&self, zonefile_hash: &ZonefileHash) -> Option<Txid> {
        if self.op == NameOpKind::NameUpdate && self.value_hash.as_ref() == Some(zonefile_hash) {
            return Some(self.txid.clone());
        }

        for ops in self.history.values().rev() {
            for op in ops.iter().rev() {
                if op.opcode != NameOpKind::NameUpdate {
                    continue;
                }
                if op.value_hash.as_ref() == Some(zonefile_hash) {
                    return Some(op.txid.clone());
                }
            }
        }

        None
    }

    /// The earliest history entry and the block it took effect at.
    ///
    /// For preordered names this is the preorder block; imported names use
    /// their first history block.
    pub fn creation_op(&self) -> Option<(u64, &NameOp)> {
        let block = if self.history.contains_key(&self.preorder_block_number) {
            self.preorder_block_number
        } else {
            *self.history.keys().next()?
        };
        self.history
            .get(&block)
            .and_then(|ops| ops.first())
            .map(|op| (block, op))
    }
}
