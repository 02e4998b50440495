//! Mock collaborators shared by this crate's tests.

use std::collections::HashMap;
use std::sync::Mutex;

use namechain_core::consensus::{make_snapshot, ops_hash, skip_list_heights};
use namechain_core::model::{
    Address, ConsensusHash, NameHistory, NameOp, NameRecord, NamespaceRecord, SerialNumber, Txid,
    ZonefileHash,
};
use namechain_core::NameOpKind;

use crate::error::{ClientError, ClientResult};
use crate::services::{
    KeyInfo, NameIndexer, OpIntent, ServerInfo, StorageProvider, TxService, Utxo, Wallet,
    WalletKeys,
};

pub fn addr(seed: &str) -> Address {
    let mut s = String::from(seed);
    while s.len() < 33 {
        s.push('a');
    }
    s.truncate(33);
    Address::new(s).expect("test address seed must be base58-clean")
}

/// `byte` is one hex pair, e.g. `"ab"` -> `"abab...ab"` (64 chars).
pub fn txid(byte: &str) -> Txid {
    Txid::new(byte.repeat(32)).unwrap()
}

pub fn zh(byte: &str) -> ZonefileHash {
    ZonefileHash::new(byte.repeat(20)).unwrap()
}

pub fn name_record(name: &str, owner: &Address, value_hash: Option<ZonefileHash>) -> NameRecord {
    NameRecord {
        name: name.to_string(),
        address: owner.clone(),
        sender: "76a914".to_string(),
        value_hash,
        block_number: 400000,
        preorder_block_number: 400000,
        first_registered: 400010,
        last_renewed: 400010,
        revoked: false,
        op: NameOpKind::NameRegistration,
        txid: txid("ab"),
        vtxindex: 0,
        op_fee: 6400,
        importer: None,
        history: NameHistory::new(),
    }
}

pub fn id_namespace() -> NamespaceRecord {
    NamespaceRecord {
        namespace_id: "id".to_string(),
        recipient_address: addr("9"),
        lifetime: 52595,
        coeff: 250,
        base: 4,
        buckets: vec![6, 5, 4, 3, 2, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        nonalpha_discount: 10,
        no_vowel_discount: 10,
        block_number: 373601,
        reveal_block: 373601,
        ready_block: Some(373620),
    }
}

// ---------------------------------------------------------------------------
// transaction layer
// ---------------------------------------------------------------------------

pub struct MockTx {
    /// None means the UTXO provider is unreachable.
    pub balance: Option<u64>,
    pub unconfirmed_utxos: bool,
    pub fail_broadcast: bool,
    pub height: u64,
    pub confirmations: Mutex<HashMap<String, u32>>,
    pub consensus_by_tx: HashMap<String, ConsensusHash>,
    pub serials: HashMap<SerialNumber, Txid>,
    pub broadcasts: Mutex<Vec<Txid>>,
    next_txid: Mutex<u8>,
}

impl MockTx {
    pub fn with_balance(balance: u64) -> Self {
        Self {
            balance: Some(balance),
            unconfirmed_utxos: false,
            fail_broadcast: false,
            height: 400100,
            confirmations: Mutex::new(HashMap::new()),
            consensus_by_tx: HashMap::new(),
            serials: HashMap::new(),
            broadcasts: Mutex::new(Vec::new()),
            next_txid: Mutex::new(0),
        }
    }

    pub fn unreachable() -> Self {
        let mut tx = Self::with_balance(0);
        tx.balance = None;
        tx
    }

    pub fn broadcast_count(&self) -> usize {
        self.broadcasts.lock().unwrap().len()
    }

    pub fn set_confirmations(&self, txid: &Txid, confs: u32) {
        self.confirmations
            .lock()
            .unwrap()
            .insert(txid.as_str().to_string(), confs);
    }
}

impl TxService for MockTx {
    fn build_transaction(&self, intent: &OpIntent, _keys: &WalletKeys) -> ClientResult<Vec<u8>> {
        Ok(format!("{}:{}", intent.kind, intent.name).into_bytes())
    }

    fn broadcast_transaction(&self, _raw_tx: &[u8]) -> ClientResult<Txid> {
        if self.fail_broadcast {
            return Err(ClientError::Connection("broadcast refused".into()));
        }
        let mut n = self.next_txid.lock().unwrap();
        *n += 1;
        let t = Txid::new(format!("{:02x}", *n).repeat(32)).unwrap();
        self.broadcasts.lock().unwrap().push(t.clone());
        Ok(t)
    }

    fn get_utxos(&self, _address: &Address) -> ClientResult<Vec<Utxo>> {
        match self.balance {
            None => Err(ClientError::Connection("utxo provider unreachable".into())),
            Some(0) => Ok(vec![]),
            Some(v) => Ok(vec![Utxo {
                txid: txid("f0"),
                vout: 0,
                value: v,
                confirmations: if self.unconfirmed_utxos { 0 } else { 6 },
            }]),
        }
    }

    fn get_tx_confirmations(&self, txid: &Txid) -> ClientResult<u32> {
        Ok(*self
            .confirmations
            .lock()
            .unwrap()
            .get(txid.as_str())
            .unwrap_or(&0))
    }

    fn block_height(&self) -> ClientResult<u64> {
        Ok(self.height)
    }

    fn consensus_hash_in_tx(&self, txid: &Txid) -> ClientResult<Option<ConsensusHash>> {
        Ok(self.consensus_by_tx.get(txid.as_str()).cloned())
    }

    fn serial_number_to_txid(&self, serial: SerialNumber) -> ClientResult<Option<Txid>> {
        Ok(self.serials.get(&serial).cloned())
    }
}

// ---------------------------------------------------------------------------
// indexer and simulated chain
// ---------------------------------------------------------------------------

/// A small chain built forward with the same consensus math the resolver
/// recomputes backward.
pub struct MockChain {
    pub first_block: u64,
    pub blocks: Vec<Vec<NameOp>>,
    pub ops_hashes: Vec<String>,
    pub consensus: Vec<ConsensusHash>,
}

impl MockChain {
    pub fn build(first_block: u64, blocks: Vec<Vec<NameOp>>) -> Self {
        let mut ops_hashes = Vec::with_capacity(blocks.len());
        let mut consensus: Vec<ConsensusHash> = Vec::with_capacity(blocks.len());

        for (i, ops) in blocks.iter().enumerate() {
            let height = first_block + i as u64;
            let oh = ops_hash(ops);
            let prev: Vec<ConsensusHash> = skip_list_heights(height, first_block)
                .into_iter()
                .map(|h| consensus[(h - first_block) as usize].clone())
                .collect();
            consensus.push(make_snapshot(&oh, &prev));
            ops_hashes.push(oh);
        }

        Self { first_block, blocks, ops_hashes, consensus }
    }

    pub fn tip(&self) -> u64 {
        self.first_block + self.blocks.len() as u64 - 1
    }

    fn index_of(&self, height: u64) -> Option<usize> {
        if height < self.first_block {
            return None;
        }
        let i = (height - self.first_block) as usize;
        (i < self.blocks.len()).then_some(i)
    }
}

#[derive(Default)]
pub struct MockIndexer {
    pub records: HashMap<String, NameRecord>,
    pub namespaces: HashMap<String, NamespaceRecord>,
    pub owned: HashMap<String, Vec<String>>,
    pub chain: Option<MockChain>,
    /// Lie about the consensus hash served at this height.
    pub tamper_consensus_at: Option<u64>,
    /// Lie about the ops served at the target height.
    pub tamper_ops_at: Option<u64>,
    pub fail: bool,
}

impl MockIndexer {
    pub fn with_record(record: NameRecord) -> Self {
        let mut ix = Self::default();
        ix.namespaces.insert("id".to_string(), id_namespace());
        ix.records.insert(record.name.clone(), record);
        ix
    }

    pub fn own_names(&mut self, address: &Address, names: &[&str]) {
        self.owned.insert(
            address.as_str().to_string(),
            names.iter().map(|s| s.to_string()).collect(),
        );
    }

    fn check_up(&self) -> ClientResult<()> {
        if self.fail {
            Err(ClientError::Connection("indexer unreachable".into()))
        } else {
            Ok(())
        }
    }
}

impl NameIndexer for MockIndexer {
    fn get_name_record(&self, name: &str) -> ClientResult<Option<NameRecord>> {
        self.check_up()?;
        Ok(self.records.get(name).cloned())
    }

    fn get_namespace_record(&self, namespace_id: &str) -> ClientResult<Option<NamespaceRecord>> {
        self.check_up()?;
        Ok(self.namespaces.get(namespace_id).cloned())
    }

    fn get_names_owned_by_address(&self, address: &Address) -> ClientResult<Vec<String>> {
        self.check_up()?;
        Ok(self.owned.get(address.as_str()).cloned().unwrap_or_default())
    }

    fn get_consensus_at(&self, block_height: u64) -> ClientResult<Option<ConsensusHash>> {
        self.check_up()?;
        let Some(chain) = &self.chain else { return Ok(None) };
        if self.tamper_consensus_at == Some(block_height) {
            return Ok(Some(ConsensusHash::new("f".repeat(32)).unwrap()));
        }
        Ok(chain
            .index_of(block_height)
            .map(|i| chain.consensus[i].clone()))
    }

    fn get_nameops_at(&self, block_height: u64) -> ClientResult<Vec<NameOp>> {
        self.check_up()?;
        let Some(chain) = &self.chain else { return Ok(vec![]) };
        let Some(i) = chain.index_of(block_height) else { return Ok(vec![]) };
        let mut ops = chain.blocks[i].clone();
        if self.tamper_ops_at == Some(block_height) {
            for op in &mut ops {
                op.op_fee += 1;
            }
        }
        Ok(ops)
    }

    fn get_nameops_hash_at(&self, block_height: u64) -> ClientResult<String> {
        self.check_up()?;
        let chain = self
            .chain
            .as_ref()
            .ok_or_else(|| ClientError::NotFound("no chain".into()))?;
        let i = chain
            .index_of(block_height)
            .ok_or_else(|| ClientError::NotFound(format!("no block {block_height}")))?;
        Ok(chain.ops_hashes[i].clone())
    }

    fn get_block_from_consensus(&self, consensus_hash: &ConsensusHash) -> ClientResult<Option<u64>> {
        self.check_up()?;
        let Some(chain) = &self.chain else { return Ok(None) };
        Ok(chain
            .consensus
            .iter()
            .position(|ch| ch == consensus_hash)
            .map(|i| chain.first_block + i as u64))
    }

    fn server_info(&self) -> ClientResult<ServerInfo> {
        self.check_up()?;
        match &self.chain {
            Some(chain) => Ok(ServerInfo {
                last_block: chain.tip(),
                consensus_hash: chain.consensus.last().unwrap().clone(),
            }),
            None => Ok(ServerInfo {
                last_block: 400100,
                consensus_hash: ConsensusHash::new("ab".repeat(16)).unwrap(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// storage and wallet
// ---------------------------------------------------------------------------

pub struct MemoryStorage {
    driver: String,
    pub fail: bool,
    pub contents: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new(driver: &str) -> Self {
        Self {
            driver: driver.to_string(),
            fail: false,
            contents: Mutex::new(HashMap::new()),
        }
    }

    pub fn failing(driver: &str) -> Self {
        let mut s = Self::new(driver);
        s.fail = true;
        s
    }
}

impl StorageProvider for MemoryStorage {
    fn name(&self) -> &str {
        &self.driver
    }

    fn get(&self, key: &str) -> ClientResult<Vec<u8>> {
        if self.fail {
            return Err(ClientError::Connection(format!("{} down", self.driver)));
        }
        self.contents
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("{key} not in {}", self.driver)))
    }

    fn put(&self, key: &str, bytes: &[u8]) -> ClientResult<String> {
        if self.fail {
            return Err(ClientError::Connection(format!("{} down", self.driver)));
        }
        self.contents
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(format!("mock://{}/{key}", self.driver))
    }
}

pub struct MockWallet {
    pub keys: WalletKeys,
}

impl MockWallet {
    pub fn new(owner: Address, payment: Address, data: Address) -> Self {
        Self {
            keys: WalletKeys {
                owner: KeyInfo { privkey: "owner-key".into(), address: owner },
                payment: KeyInfo { privkey: "payment-key".into(), address: payment },
                data: KeyInfo { privkey: "data-key".into(), address: data },
            },
        }
    }
}

impl Wallet for MockWallet {
    fn keys(&self) -> ClientResult<WalletKeys> {
        Ok(self.keys.clone())
    }
}
