//! namechain-client
//!
//! The client core for a blockchain-anchored naming system:
//! - the name-operation lifecycle (preorder, register, update, transfer,
//!   renew, revoke, migrate) with fail-fast preconditions
//! - fee estimation with a flagged low-confidence fallback
//! - the durable queue poller that tracks confirmations
//! - SNV: trust-anchored verification of historical records served by an
//!   untrusted indexer
//! - zonefile replication with per-backend status
//!
//! The blockchain indexer, transaction layer, content storage, and wallet
//! are consumed through the traits in [`services`]; nothing in this crate
//! talks to the network directly. Configuration is an explicit
//! [`config::ClientConfig`] threaded through every constructor.

pub mod config;
pub mod error;
pub mod fees;
pub mod lifecycle;
pub mod poller;
pub mod replicate;
pub mod resolve;
pub mod retry;
pub mod services;
pub mod snv;
pub mod telemetry;

#[cfg(test)]
mod testutil;

pub use config::{load_config, ClientConfig};
pub use error::{ClientError, ClientResult};
pub use fees::{FeeEstimate, FeeEstimator, RegistrationFees};
pub use lifecycle::{NameLifecycle, OpReceipt, UpdateOutcome};
pub use poller::{PollReport, QueuePoller};
pub use replicate::{BackendStatus, ReplicationReport, ZonefileReplicator};
pub use resolve::{LookupResult, ProfileClass, Resolver, WhoisResult};
pub use retry::{retry_transient, RetryPolicy};
pub use services::{
    NameIndexer, OpIntent, ServerInfo, StorageProvider, TxService, Utxo, Wallet, WalletKeys,
};
pub use snv::{SnvResolver, TrustAnchor};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn version_is_nonempty() {
        assert!(!super::VERSION.is_empty());
    }
}
