//! Collaborator interfaces the client core consumes.
//!
//! The indexer, transaction layer, content storage, and wallet are external
//! services; the core only sees these traits. Implementations are expected
//! to be blocking from the caller's perspective; retry and backoff policy
//! live in the core (`retry` module), not in the implementations.

use serde::{Deserialize, Serialize};

use namechain_core::model::{
    Address, ConsensusHash, NameOp, NameRecord, NamespaceRecord, SerialNumber, Txid, ZonefileHash,
};
use namechain_core::NameOpKind;

use crate::error::ClientResult;

/// One unspent output of an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub txid: Txid,
    pub vout: u32,
    /// Value in satoshis.
    pub value: u64,
    pub confirmations: u32,
}

/// The indexer's view of the chain tip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub last_block: u64,
    pub consensus_hash: ConsensusHash,
}

/// Decrypted key material handed over by the wallet collaborator.
#[derive(Debug, Clone)]
pub struct KeyInfo {
    pub privkey: String,
    pub address: Address,
}

#[derive(Debug, Clone)]
pub struct WalletKeys {
    pub owner: KeyInfo,
    pub payment: KeyInfo,
    pub data: KeyInfo,
}

/// Everything the transaction layer needs to construct one name operation.
/// Construction and signing are the collaborator's problem; the core only
/// decides what to send.
#[derive(Debug, Clone)]
pub struct OpIntent {
    pub kind: NameOpKind,
    pub name: String,
    pub consensus_hash: Option<ConsensusHash>,
    pub value_hash: Option<ZonefileHash>,
    pub recipient: Option<Address>,
    /// Burn fee for preorder/renewal, in satoshis.
    pub name_price: Option<u64>,
}

impl OpIntent {
    pub fn new(kind: NameOpKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            consensus_hash: None,
            value_hash: None,
            recipient: None,
            name_price: None,
        }
    }
}

/// Blockchain indexer queries.
pub trait NameIndexer {
    fn get_name_record(&self, name: &str) -> ClientResult<Option<NameRecord>>;
    fn get_namespace_record(&self, namespace_id: &str) -> ClientResult<Option<NamespaceRecord>>;
    fn get_names_owned_by_address(&self, address: &Address) -> ClientResult<Vec<String>>;
    fn get_consensus_at(&self, block_height: u64) -> ClientResult<Option<ConsensusHash>>;
    fn get_nameops_at(&self, block_height: u64) -> ClientResult<Vec<NameOp>>;
    /// The Merkle root over the block's serialized operations.
    fn get_nameops_hash_at(&self, block_height: u64) -> ClientResult<String>;
    fn get_block_from_consensus(&self, consensus_hash: &ConsensusHash) -> ClientResult<Option<u64>>;
    fn server_info(&self) -> ClientResult<ServerInfo>;
}

/// Transaction construction, broadcast, and chain queries.
pub trait TxService {
    /// Construct and sign a name-operation transaction.
    fn build_transaction(&self, intent: &OpIntent, keys: &WalletKeys) -> ClientResult<Vec<u8>>;
    fn broadcast_transaction(&self, raw_tx: &[u8]) -> ClientResult<Txid>;
    fn get_utxos(&self, address: &Address) -> ClientResult<Vec<Utxo>>;
    fn get_tx_confirmations(&self, txid: &Txid) -> ClientResult<u32>;
    fn block_height(&self) -> ClientResult<u64>;
    /// Extract the consensus hash carried by a consensus-bearing
    /// transaction, SPV-verified by the transaction layer.
    fn consensus_hash_in_tx(&self, txid: &Txid) -> ClientResult<Option<ConsensusHash>>;
    /// Resolve a `<block>-<vtxindex>` serial number to the transaction at
    /// that position.
    fn serial_number_to_txid(&self, serial: SerialNumber) -> ClientResult<Option<Txid>>;
}

/// One pluggable content-storage backend.
pub trait StorageProvider {
    fn name(&self) -> &str;
    fn get(&self, key: &str) -> ClientResult<Vec<u8>>;
    /// Store bytes under a key; returns the backend's URL for them.
    fn put(&self, key: &str, bytes: &[u8]) -> ClientResult<String>;
}

/// Wallet key access. Decryption happens before the core ever sees keys.
pub trait Wallet {
    fn keys(&self) -> ClientResult<WalletKeys>;
}

/// Sum of an address's unspent outputs, in satoshis.
pub fn address_balance(tx: &dyn TxService, address: &Address) -> ClientResult<u64> {
    let utxos = tx.get_utxos(address)?;
    Ok(utxos.iter().map(|u| u.value).sum())
}

/// An address is unusable while any of its outputs is unconfirmed; spending
/// from it would race the pending transaction's fees.
pub fn address_usable(tx: &dyn TxService, address: &Address) -> ClientResult<bool> {
    let utxos = tx.get_utxos(address)?;
    Ok(utxos.iter().all(|u| u.confirmations > 0))
}
