//! Domain model: validated field newtypes, operation kinds, and the
//! name/namespace records the indexer serves.

pub mod name;
pub mod namespace;
pub mod ops;
pub mod record;
pub mod types;

pub use name::{check_name, is_b40, split_fqu, MAX_NAME_LENGTH};
pub use namespace::{
    normalize_lifetime, validate_buckets, NamespaceRecord, NAMESPACE_LIFE_INFINITE,
    NAME_COST_UNIT, PRICE_BUCKETS,
};
pub use ops::NameOpKind;
pub use record::{NameHistory, NameOp, NameRecord};
pub use types::{Address, ConsensusHash, SerialNumber, Txid, ZonefileHash};
