//! Validated newtypes for frequently used chain fields.
//!
//! The wire model (`model::record`) is JSON-friendly; this module provides:
//! - validated newtypes for ids and hashes (txids, consensus hashes, ...)
//! - parsing and formatting helpers
//! - deterministic constraints (lowercase hex, fixed lengths)
//!
//! These types are safe to use across client/store layers. They do not
//! perform I/O.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, CoreResult};

/// A 16-byte per-block consensus hash, lowercase hex (32 chars).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConsensusHash(String);

impl ConsensusHash {
    pub fn new(hex32: impl Into<String>) -> CoreResult<Self> {
        let s = hex32.into();
        validate_lower_hex(&s, 32, "consensus hash")?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// A 32-byte transaction id, lowercase hex (64 chars).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Txid(String);

impl Txid {
    pub fn new(hex64: impl Into<String>) -> CoreResult<Self> {
        let s = hex64.into();
        validate_lower_hex(&s, 64, "txid")?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// A 20-byte zonefile content hash, lowercase hex (40 chars).
///
/// Always RIPEMD160(SHA256(bytes)) of the zonefile data, recomputed locally
/// and never trusted from input.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZonefileHash(String);

impl ZonefileHash {
    pub fn new(hex40: impl Into<String>) -> CoreResult<Self> {
        let s = hex40.into();
        validate_lower_hex(&s, 40, "zonefile hash")?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// The `<block>-<vtxindex>` pair that uniquely orders an operation on the
/// chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SerialNumber {
    pub block_id: u64,
    pub vtxindex: u32,
}

impl SerialNumber {
    pub fn new(block_id: u64, vtxindex: u32) -> Self {
        Self { block_id, vtxindex }
    }

    /// Parse the `<block>-<vtxindex>` text form.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let mut it = s.splitn(2, '-');
        let block = it.next().unwrap_or("");
        let index = it.next().unwrap_or("");
        let block_id = block
            .parse::<u64>()
            .map_err(|_| CoreError::invalid_argument(format!("malformed serial number: {s}")))?;
        let vtxindex = index
            .parse::<u32>()
            .map_err(|_| CoreError::invalid_argument(format!("malformed serial number: {s}")))?;
        Ok(Self { block_id, vtxindex })
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.block_id, self.vtxindex)
    }
}

/// A base58check-shaped payment or owner address.
///
/// Full checksum validation belongs to the transaction layer; this type only
/// enforces the shape so obviously bad input is rejected early.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn new(addr: impl Into<String>) -> CoreResult<Self> {
        let s = addr.into();
        validate_address(&s)?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for ConsensusHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConsensusHash").field(&self.0).finish()
    }
}

impl fmt::Display for ConsensusHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Txid").field(&self.0).finish()
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ZonefileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ZonefileHash").field(&self.0).finish()
    }
}

impl fmt::Display for ZonefileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Address").field(&self.0).finish()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ConsensusHash {
    type Error = CoreError;
    fn try_from(s: String) -> CoreResult<Self> {
        Self::new(s)
    }
}

impl From<ConsensusHash> for String {
    fn from(v: ConsensusHash) -> String {
        v.0
    }
}

impl TryFrom<String> for Txid {
    type Error = CoreError;
    fn try_from(s: String) -> CoreResult<Self> {
        Self::new(s)
    }
}

impl From<Txid> for String {
    fn from(v: Txid) -> String {
        v.0
    }
}

impl TryFrom<String> for ZonefileHash {
    type Error = CoreError;
    fn try_from(s: String) -> CoreResult<Self> {
        Self::new(s)
    }
}

impl From<ZonefileHash> for String {
    fn from(v: ZonefileHash) -> String {
        v.0
    }
}

impl TryFrom<String> for Address {
    type Error = CoreError;
    fn try_from(s: String) -> CoreResult<Self> {
        Self::new(s)
    }
}

impl From<Address> for String {
    fn from(v: Address) -> String {
        v.0
    }
}

/// Validate a fixed-length lowercase hex string.
pub fn validate_lower_hex(s: &str, len: usize, what: &str) -> CoreResult<()> {
    if s.len() != len {
        return Err(CoreError::invalid_argument(format!(
            "{what} must be {len} lowercase hex chars, got length {}",
            s.len()
        )));
    }
    if !s.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')) {
        return Err(CoreError::invalid_argument(format!(
            "{what} must be lowercase hex"
        )));
    }
    Ok(())
}

/// Validate base58check address shape.
///
/// Rules:
/// - 26..=35 chars
/// - base58 alphabet only (no `0`, `O`, `I`, `l`)
pub fn validate_address(s: &str) -> CoreResult<()> {
    if s.len() < 26 || s.len() > 35 {
        return Err(CoreError::invalid_argument(format!(
            "address must be 26..=35 chars, got {}",
            s.len()
        )));
    }
    let ok = s.chars().all(|c| {
        c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l')
    });
    if !ok {
        return Err(CoreError::invalid_argument(
            "address contains non-base58 characters",
        ));
    }
    Ok(())
}
