//! namechain-core
//!
//! Domain logic for the namechain client, free of I/O:
//! - validated field newtypes and the name/namespace record model
//! - fully-qualified name rules and the namespace pricing function
//! - zonefile parsing, validation, and content addressing
//! - the consensus-hash math that verification recomputes
//!
//! Network access, persistence, and orchestration live in the
//! `namechain-store` and `namechain-client` crates.

pub mod consensus;
pub mod errors;
pub mod model;
pub mod zonefile;

pub use errors::{CoreError, CoreResult};
pub use model::{
    check_name, is_b40, split_fqu, validate_buckets, Address, ConsensusHash, NameHistory,
    NameOp, NameOpKind, NameRecord, NamespaceRecord, SerialNumber, Txid, ZonefileHash,
    MAX_NAME_LENGTH, NAMESPACE_LIFE_INFINITE, NAME_COST_UNIT, PRICE_BUCKETS,
};
pub use zonefile::{
    hash_zonefile_data, is_legacy_profile, validate_zonefile, TxtRecord, UriRecord, Zonefile,
    ZonefileCheck,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
