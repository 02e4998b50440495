//! The name-operation lifecycle.
//!
//! A name moves through `UNREGISTERED -> PREORDERED -> REGISTERED ->
//! {UPDATED, TRANSFERRED, RENEWED}* -> REVOKED`, each transition a separate
//! blockchain transaction that confirms asynchronously. Every mutating
//! operation here follows the same contract:
//!
//! 1. run the fail-fast sanity checks; any failure returns a precondition
//!    error with no side effects, no broadcast, no queue entry;
//! 2. build and broadcast the transaction;
//! 3. record a queue entry for the confirmation poller. The broadcast is the
//!    authoritative side effect; a failed queue write is logged and the
//!    receipt still returned, since the chain can always be re-read.
//!
//! The balance/ownership reads are not atomic with the broadcast. Callers
//! must not initiate more than one mutating operation per name at a time;
//! operations on different names are independent.

use tracing::{debug, info, warn};

use namechain_core::model::{check_name, split_fqu, validate_buckets, Address, NameRecord};
use namechain_core::zonefile::{validate_zonefile, Zonefile, ZonefileCheck};
use namechain_core::{NameOpKind, Txid, ZonefileHash};
use namechain_store::queue::{Queue, QueueEntry};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::fees::FeeEstimator;
use crate::retry::{retry_transient, RetryPolicy};
use crate::services::{
    address_balance, address_usable, NameIndexer, OpIntent, TxService, Wallet, WalletKeys,
};

/// Default `$TTL` for freshly generated zonefiles, in seconds.
pub const USER_ZONEFILE_TTL: u32 = 3600;

/// Successful broadcast of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpReceipt {
    pub name: String,
    pub kind: NameOpKind,
    pub txid: Txid,
    /// Dust-inclusive fee the estimate committed to, in satoshis.
    pub fee: u64,
}

/// Outcome of a zonefile-carrying operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Broadcast(OpReceipt),
    /// The candidate hashes to the name's current `value_hash`; nothing was
    /// broadcast and nothing was queued.
    Identical { value_hash: ZonefileHash },
}

pub struct NameLifecycle<'a> {
    cfg: &'a ClientConfig,
    indexer: &'a dyn NameIndexer,
    tx: &'a dyn TxService,
    wallet: &'a dyn Wallet,
    queue: &'a Queue,
    retry: RetryPolicy,
}

struct SanityOk {
    keys: WalletKeys,
    fee: u64,
}

impl<'a> NameLifecycle<'a> {
    pub fn new(
        cfg: &'a ClientConfig,
        indexer: &'a dyn NameIndexer,
        tx: &'a dyn TxService,
        wallet: &'a dyn Wallet,
        queue: &'a Queue,
    ) -> Self {
        let retry = RetryPolicy::from(&cfg.retry);
        Self { cfg, indexer, tx, wallet, queue, retry }
    }

    /// Pending operations, for display.
    pub fn get_queue_state(&self) -> ClientResult<Vec<QueueEntry>> {
        self.queue.list_all().map_err(ClientError::from)
    }

    // -----------------------------------------------------------------------
    // operations
    // -----------------------------------------------------------------------

    /// Reserve a name. The preorder commits to the name without revealing
    /// it; the follow-up `register` reveals it once the preorder has
    /// confirmed.
    pub fn preorder(&self, name: &str) -> ClientResult<OpReceipt> {
        check_name(name)?;

        if self.fetch_record(name)?.is_some() {
            return Err(ClientError::Precondition(format!(
                "{name} is already registered"
            )));
        }

        for kind in [NameOpKind::NamePreorder, NameOpKind::NameRegistration] {
            if self.queue.is_queued(kind, name).map_err(ClientError::from)? {
                return Err(ClientError::Precondition(format!(
                    "{name} already has a pending {kind} operation"
                )));
            }
        }

        let keys = self.wallet.keys()?;
        self.check_can_receive(&keys.owner.address)?;

        let price = self.name_price(name)?;
        let estimator = FeeEstimator::new(self.cfg, self.tx);
        let fees = estimator.registration_fees(price, &keys.payment.address)?;
        for w in &fees.warnings {
            warn!(name, warning = %w, "fee estimate degraded");
        }

        self.check_payment_address(&keys.payment.address, fees.total)?;

        let mut intent = OpIntent::new(NameOpKind::NamePreorder, name);
        intent.consensus_hash = Some(self.fresh_consensus_hash()?);
        intent.name_price = Some(price);

        self.broadcast_and_enqueue(&intent, &keys, fees.total, None)
    }

    /// Reveal and claim a previously preordered name.
    ///
    /// Requires the queued preorder to have reached the configured
    /// confirmation count first; until then this fails with a retryable
    /// precondition error, not a fatal one.
    pub fn register(&self, name: &str) -> ClientResult<OpReceipt> {
        check_name(name)?;

        if self.fetch_record(name)?.is_some() {
            return Err(ClientError::Precondition(format!(
                "{name} is already registered"
            )));
        }

        let preorders = self.queue.find(NameOpKind::NamePreorder, name).map_err(ClientError::from)?;
        let Some(preorder) = preorders.last() else {
            return Err(ClientError::Precondition(format!(
                "no preorder found for {name}; preorder it first"
            )));
        };
        if preorder.confirmations < self.cfg.preorder_confirmations {
            return Err(ClientError::Precondition(format!(
                "preorder for {name} has {} of {} confirmations; retry after more confirmations",
                preorder.confirmations, self.cfg.preorder_confirmations
            )));
        }

        let keys = self.wallet.keys()?;
        let estimator = FeeEstimator::new(self.cfg, self.tx);
        let fee = estimator.estimate(NameOpKind::NameRegistration, None, &keys.payment.address);
        self.check_payment_address(&keys.payment.address, fee.satoshis)?;

        let intent = OpIntent::new(NameOpKind::NameRegistration, name);
        let receipt = self.broadcast_and_enqueue(&intent, &keys, fee.satoshis, None)?;

        // the preorder served its purpose; drop it so the queue shows one
        // live entry per name
        if let Err(e) = self.queue.remove(NameOpKind::NamePreorder, name, &preorder.txid) {
            warn!(name, error = %e, "failed to drop confirmed preorder from queue");
        }

        Ok(receipt)
    }

    /// Set a name's zonefile.
    ///
    /// The candidate is validated first; a zonefile whose hash equals the
    /// current on-chain `value_hash` short-circuits as `Identical` without
    /// broadcasting anything.
    pub fn update(&self, name: &str, zonefile_data: &str) -> ClientResult<UpdateOutcome> {
        check_name(name)?;
        let record = self.require_registered(name)?;

        let (text, hash) = match validate_zonefile(name, zonefile_data, record.value_hash.as_ref())
        {
            ZonefileCheck::Identical { hash } => {
                info!(name, %hash, "zonefile matches the current value hash; not updating");
                return Ok(UpdateOutcome::Identical { value_hash: hash });
            }
            ZonefileCheck::Invalid { reason } => {
                return Err(ClientError::DataFormat(reason));
            }
            ZonefileCheck::Valid { text, hash, .. } => (text, hash),
        };

        let ok = self.sanity_check(&record, NameOpKind::NameUpdate, None, None)?;

        let mut intent = OpIntent::new(NameOpKind::NameUpdate, name);
        intent.consensus_hash = Some(self.fresh_consensus_hash()?);
        intent.value_hash = Some(hash);

        let receipt =
            self.broadcast_and_enqueue(&intent, &ok.keys, ok.fee, Some(text.into_bytes()))?;
        Ok(UpdateOutcome::Broadcast(receipt))
    }

    /// Transfer a name to a new owner address.
    pub fn transfer(&self, name: &str, recipient: &Address) -> ClientResult<OpReceipt> {
        check_name(name)?;
        let record = self.require_registered(name)?;
        let ok = self.sanity_check(&record, NameOpKind::NameTransfer, Some(recipient), None)?;

        let mut intent = OpIntent::new(NameOpKind::NameTransfer, name);
        intent.consensus_hash = Some(self.fresh_consensus_hash()?);
        intent.recipient = Some(recipient.clone());

        self.broadcast_and_enqueue(&intent, &ok.keys, ok.fee, None)
    }

    /// Renew a name, paying its current price again.
    pub fn renew(&self, name: &str) -> ClientResult<OpReceipt> {
        check_name(name)?;
        let record = self.require_registered(name)?;
        let price = self.name_price(name)?;
        let ok = self.sanity_check(&record, NameOpKind::NameRenewal, None, Some(price))?;

        let mut intent = OpIntent::new(NameOpKind::NameRenewal, name);
        intent.name_price = Some(price);

        self.broadcast_and_enqueue(&intent, &ok.keys, ok.fee, None)
    }

    /// Revoke a name. Terminal: a revoked name accepts no further
    /// operations, ever.
    pub fn revoke(&self, name: &str) -> ClientResult<OpReceipt> {
        check_name(name)?;
        let record = self.require_registered(name)?;
        let ok = self.sanity_check(&record, NameOpKind::NameRevoke, None, None)?;

        let intent = OpIntent::new(NameOpKind::NameRevoke, name);
        self.broadcast_and_enqueue(&intent, &ok.keys, ok.fee, None)
    }

    /// Replace a legacy or non-standard profile with a standard zonefile
    /// pointing at the given profile URLs.
    ///
    /// `current_data` is the name's existing zonefile/profile data when the
    /// caller has it; it is only used to detect that the name is already
    /// migrated.
    pub fn migrate(
        &self,
        name: &str,
        current_data: Option<&str>,
        profile_urls: &[String],
    ) -> ClientResult<UpdateOutcome> {
        check_name(name)?;
        let record = self.require_registered(name)?;

        if let Some(data) = current_data {
            if let ZonefileCheck::Identical { hash } =
                validate_zonefile(name, data, record.value_hash.as_ref())
            {
                debug!(name, "profile already standard and current");
                return Ok(UpdateOutcome::Identical { value_hash: hash });
            }
        }

        let zonefile = Zonefile::standard(name, USER_ZONEFILE_TTL, profile_urls);
        let hash = zonefile.hash();
        if record.value_hash.as_ref() == Some(&hash) {
            return Ok(UpdateOutcome::Identical { value_hash: hash });
        }

        let ok = self.sanity_check(&record, NameOpKind::NameUpdate, None, None)?;

        let mut intent = OpIntent::new(NameOpKind::NameUpdate, name);
        intent.consensus_hash = Some(self.fresh_consensus_hash()?);
        intent.value_hash = Some(hash);

        let receipt = self.broadcast_and_enqueue(
            &intent,
            &ok.keys,
            ok.fee,
            Some(zonefile.serialize().into_bytes()),
        )?;
        Ok(UpdateOutcome::Broadcast(receipt))
    }

    /// Reveal a namespace and set its pricing parameters.
    ///
    /// The bucket exponents are validated before any transaction is
    /// constructed.
    #[allow(clippy::too_many_arguments)]
    pub fn namespace_reveal(
        &self,
        namespace_id: &str,
        reveal_address: &Address,
        lifetime: i64,
        coeff: u64,
        base: u64,
        buckets: &[u8],
        nonalpha_discount: u64,
        no_vowel_discount: u64,
    ) -> ClientResult<OpReceipt> {
        validate_buckets(buckets)?;
        if nonalpha_discount == 0 || no_vowel_discount == 0 {
            return Err(ClientError::Precondition(
                "discount denominators must be nonzero".to_string(),
            ));
        }
        if !namechain_core::is_b40(namespace_id) {
            return Err(ClientError::Precondition(format!(
                "invalid namespace id: {namespace_id}"
            )));
        }

        let lifetime = namechain_core::model::normalize_lifetime(lifetime);
        debug!(
            namespace_id,
            lifetime, coeff, base, "revealing namespace"
        );

        let keys = self.wallet.keys()?;
        let estimator = FeeEstimator::new(self.cfg, self.tx);
        let fee = estimator.estimate(NameOpKind::NamespaceReveal, None, &keys.payment.address);
        self.check_payment_address(&keys.payment.address, fee.satoshis)?;

        let mut intent = OpIntent::new(NameOpKind::NamespaceReveal, namespace_id);
        intent.recipient = Some(reveal_address.clone());

        let raw = self.tx.build_transaction(&intent, &keys)?;
        let txid = retry_transient(&self.retry, "broadcast", || {
            self.tx.broadcast_transaction(&raw)
        })?;

        info!(namespace_id, %txid, "namespace reveal broadcast");
        Ok(OpReceipt {
            name: namespace_id.to_string(),
            kind: NameOpKind::NamespaceReveal,
            txid,
            fee: fee.satoshis,
        })
    }

    // -----------------------------------------------------------------------
    // preconditions
    // -----------------------------------------------------------------------

    /// The shared fail-fast checks for update/transfer/renew/revoke:
    /// registered and not revoked, owned by the wallet's owner address, the
    /// payment address covers a dust-inclusive fee estimate and has no
    /// unconfirmed transactions, and a transfer recipient is under the name
    /// cap. Performs no mutation and broadcasts nothing.
    fn sanity_check(
        &self,
        record: &NameRecord,
        kind: NameOpKind,
        transfer_address: Option<&Address>,
        name_price: Option<u64>,
    ) -> ClientResult<SanityOk> {
        let name = &record.name;
        let keys = self.wallet.keys()?;

        if record.address != keys.owner.address {
            return Err(ClientError::Precondition(format!(
                "{name} is not in your possession"
            )));
        }

        let estimator = FeeEstimator::new(self.cfg, self.tx);
        let fee = estimator.estimate(kind, name_price, &keys.payment.address);
        if let Some(w) = &fee.warning {
            warn!(name = %name, warning = %w, "fee estimate degraded");
        }

        self.check_payment_address(&keys.payment.address, fee.satoshis)?;

        if let Some(recipient) = transfer_address {
            self.check_can_receive(recipient)?;
        }

        Ok(SanityOk { keys, fee: fee.satoshis })
    }

    fn check_payment_address(&self, payment: &Address, need: u64) -> ClientResult<()> {
        let balance = retry_transient(&self.retry, "get_utxos", || {
            address_balance(self.tx, payment)
        })?;
        if balance < need {
            return Err(ClientError::Precondition(format!(
                "address {payment} does not have a sufficient balance (need {need}, have {balance})"
            )));
        }

        let usable = retry_transient(&self.retry, "get_utxos", || {
            address_usable(self.tx, payment)
        })?;
        if !usable {
            return Err(ClientError::Precondition(format!(
                "address {payment} has insufficiently confirmed transactions; wait and try again later"
            )));
        }

        Ok(())
    }

    fn check_can_receive(&self, address: &Address) -> ClientResult<()> {
        let owned = retry_transient(&self.retry, "get_names_owned_by_address", || {
            self.indexer.get_names_owned_by_address(address)
        })?;
        if owned.len() >= self.cfg.max_names_per_address {
            return Err(ClientError::Precondition(format!(
                "address {address} owns too many names already ({} of {})",
                owned.len(),
                self.cfg.max_names_per_address
            )));
        }
        Ok(())
    }

    fn require_registered(&self, name: &str) -> ClientResult<NameRecord> {
        let record = self.fetch_record(name)?.ok_or_else(|| {
            ClientError::Precondition(format!("{name} is not registered yet"))
        })?;
        if record.revoked {
            return Err(ClientError::Precondition(format!(
                "{name} is revoked; no further operations are possible"
            )));
        }
        Ok(record)
    }

    // -----------------------------------------------------------------------
    // plumbing
    // -----------------------------------------------------------------------

    fn fetch_record(&self, name: &str) -> ClientResult<Option<NameRecord>> {
        retry_transient(&self.retry, "get_name_record", || {
            self.indexer.get_name_record(name)
        })
    }

    fn name_price(&self, name: &str) -> ClientResult<u64> {
        let (label, namespace_id) = split_fqu(name)?;
        let ns = retry_transient(&self.retry, "get_namespace_record", || {
            self.indexer.get_namespace_record(namespace_id)
        })?
        .ok_or_else(|| ClientError::NotFound(format!("no such namespace: {namespace_id}")))?;
        Ok(ns.name_cost(label)?)
    }

    fn fresh_consensus_hash(&self) -> ClientResult<namechain_core::ConsensusHash> {
        let info = retry_transient(&self.retry, "server_info", || self.indexer.server_info())?;
        Ok(info.consensus_hash)
    }

    fn broadcast_and_enqueue(
        &self,
        intent: &OpIntent,
        keys: &WalletKeys,
        fee: u64,
        payload: Option<Vec<u8>>,
    ) -> ClientResult<OpReceipt> {
        // read the height before broadcasting so a flaky connection after
        // the send cannot leave the entry unrecorded
        let height = retry_transient(&self.retry, "block_height", || self.tx.block_height())?;

        let raw = self.tx.build_transaction(intent, keys)?;
        let txid = retry_transient(&self.retry, "broadcast", || {
            self.tx.broadcast_transaction(&raw)
        })?;

        info!(name = %intent.name, kind = %intent.kind, %txid, "operation broadcast");

        let entry = QueueEntry {
            op: intent.kind,
            name: intent.name.clone(),
            txid: txid.clone(),
            broadcast_height: height,
            confirmations: 0,
            payload,
        };
        if let Err(e) = self.queue.enqueue(entry) {
            // the transaction is out; the queue is only bookkeeping and the
            // chain remains the source of truth
            warn!(name = %intent.name, %txid, error = %e, "broadcast succeeded but queue write failed");
        }

        Ok(OpReceipt {
            name: intent.name.clone(),
            kind: intent.kind,
            txid,
            fee,
        })
    }
}
