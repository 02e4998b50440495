//! Name resolution: record lookup, zonefile fetch, and classification.

use tracing::{debug, warn};

use namechain_core::model::NameRecord;
use namechain_core::zonefile::{hash_zonefile_data, is_legacy_profile, Zonefile};
use namechain_core::{Txid, ZonefileHash};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::retry::{retry_transient, RetryPolicy};
use crate::services::{NameIndexer, StorageProvider};

/// How a name's off-chain data is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileClass {
    /// A well-formed zonefile with URI records.
    Standard,
    /// A pre-zonefile flat JSON profile; migration candidate.
    Legacy,
    /// Bytes that hash correctly but parse as neither.
    Nonstandard,
}

/// Everything a lookup produces.
#[derive(Debug, Clone)]
pub struct LookupResult {
    pub record: NameRecord,
    /// Raw zonefile bytes, when a backend had them and they hashed
    /// correctly.
    pub zonefile_bytes: Option<Vec<u8>>,
    pub zonefile: Option<Zonefile>,
    pub profile_class: Option<ProfileClass>,
}

/// Ownership and liveness summary for display.
#[derive(Debug, Clone)]
pub struct WhoisResult {
    pub name: String,
    pub owner_address: String,
    pub owner_script: String,
    pub value_hash: Option<ZonefileHash>,
    pub last_txid: Txid,
    pub block_preordered_at: u64,
    pub block_renewed_at: u64,
    pub expire_block: Option<u64>,
    pub revoked: bool,
}

pub struct Resolver<'a> {
    indexer: &'a dyn NameIndexer,
    retry: RetryPolicy,
}

impl<'a> Resolver<'a> {
    pub fn new(cfg: &'a ClientConfig, indexer: &'a dyn NameIndexer) -> Self {
        let retry = RetryPolicy::from(&cfg.retry);
        Self { indexer, retry }
    }

    /// Fetch a name's record and its zonefile from the first backend that
    /// can serve bytes matching the on-chain hash.
    ///
    /// Backend bytes are content-checked before use; a backend serving the
    /// wrong bytes is skipped, not trusted.
    pub fn lookup(
        &self,
        name: &str,
        backends: &[&dyn StorageProvider],
    ) -> ClientResult<LookupResult> {
        namechain_core::check_name(name)?;
        let record = self.fetch_record(name)?;

        let Some(value_hash) = record.value_hash.clone() else {
            return Ok(LookupResult {
                record,
                zonefile_bytes: None,
                zonefile: None,
                profile_class: None,
            });
        };

        let mut zonefile_bytes = None;
        for backend in backends {
            let fetched = retry_transient(&self.retry, "storage_get", || {
                backend.get(value_hash.as_str())
            });
            match fetched {
                Ok(bytes) => {
                    if hash_zonefile_data(&bytes) != value_hash {
                        warn!(
                            name,
                            driver = backend.name(),
                            "backend served bytes that do not match the on-chain hash"
                        );
                        continue;
                    }
                    zonefile_bytes = Some(bytes);
                    break;
                }
                Err(e) => {
                    debug!(name, driver = backend.name(), error = %e, "backend miss");
                }
            }
        }

        let Some(bytes) = zonefile_bytes else {
            return Err(ClientError::NotFound(format!(
                "no storage backend could serve zonefile {value_hash} for {name}"
            )));
        };

        let text = String::from_utf8_lossy(&bytes);
        let (zonefile, class) = match Zonefile::parse(&text) {
            Ok(zf) if zf.is_standard() => (Some(zf), ProfileClass::Standard),
            Ok(zf) => (Some(zf), ProfileClass::Nonstandard),
            Err(_) => {
                let class = match serde_json::from_str::<serde_json::Value>(&text) {
                    Ok(v) if is_legacy_profile(&v) => ProfileClass::Legacy,
                    _ => ProfileClass::Nonstandard,
                };
                (None, class)
            }
        };

        Ok(LookupResult {
            record,
            zonefile_bytes: Some(bytes),
            zonefile,
            profile_class: Some(class),
        })
    }

    /// Ownership summary for a name.
    pub fn whois(&self, name: &str) -> ClientResult<WhoisResult> {
        namechain_core::check_name(name)?;
        let record = self.fetch_record(name)?;

        let (_, namespace_id) = namechain_core::split_fqu(name)?;
        let expire_block = retry_transient(&self.retry, "get_namespace_record", || {
            self.indexer.get_namespace_record(namespace_id)
        })?
        .and_then(|ns| {
            (ns.lifetime != namechain_core::NAMESPACE_LIFE_INFINITE)
                .then(|| record.last_renewed + u64::from(ns.lifetime))
        });

        Ok(WhoisResult {
            name: record.name.clone(),
            owner_address: record.address.as_str().to_string(),
            owner_script: record.sender.clone(),
            value_hash: record.value_hash.clone(),
            last_txid: record.txid.clone(),
            block_preordered_at: record.preorder_block_number,
            block_renewed_at: record.last_renewed,
            expire_block,
            revoked: record.revoked,
        })
    }

    fn fetch_record(&self, name: &str) -> ClientResult<NameRecord> {
        retry_transient(&self.retry, "get_name_record", || {
            self.indexer.get_name_record(name)
        })?
        .ok_or_else(|| ClientError::NotFound(format!("{name} is not registered")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{addr, name_record, MemoryStorage, MockIndexer};

    const ZONEFILE: &str =
        "$ORIGIN alice.id\n$TTL 3600\n_file URI 10 1 \"https://storage.example/alice.json\"\n";

    fn cfg() -> ClientConfig {
        let mut cfg = ClientConfig::default();
        cfg.retry.backoff_ms = 0;
        cfg
    }

    #[test]
    fn lookup_fetches_and_classifies_standard_zonefile() {
        let cfg = cfg();
        let hash = hash_zonefile_data(ZONEFILE.as_bytes());
        let record = name_record("alice.id", &addr("2owner"), Some(hash.clone()));
        let indexer = MockIndexer::with_record(record);

        let disk = MemoryStorage::new("disk");
        disk.put(hash.as_str(), ZONEFILE.as_bytes()).unwrap();

        let resolver = Resolver::new(&cfg, &indexer);
        let out = resolver.lookup("alice.id", &[&disk]).unwrap();
        assert_eq!(out.profile_class, Some(ProfileClass::Standard));
        assert!(out.zonefile.is_some());
    }

    #[test]
    fn lookup_skips_backend_with_wrong_bytes() {
        let cfg = cfg();
        let hash = hash_zonefile_data(ZONEFILE.as_bytes());
        let record = name_record("alice.id", &addr("2owner"), Some(hash.clone()));
        let indexer = MockIndexer::with_record(record);

        let bad = MemoryStorage::new("bad");
        bad.put(hash.as_str(), b"tampered bytes").unwrap();
        let good = MemoryStorage::new("good");
        good.put(hash.as_str(), ZONEFILE.as_bytes()).unwrap();

        let resolver = Resolver::new(&cfg, &indexer);
        let out = resolver.lookup("alice.id", &[&bad, &good]).unwrap();
        assert_eq!(out.zonefile_bytes.as_deref(), Some(ZONEFILE.as_bytes()));
    }

    #[test]
    fn lookup_classifies_legacy_profile() {
        let cfg = cfg();
        let legacy = r#"{"v": "0.2", "bitcoin": {"address": "1abc"}}"#;
        let hash = hash_zonefile_data(legacy.as_bytes());
        let record = name_record("alice.id", &addr("2owner"), Some(hash.clone()));
        let indexer = MockIndexer::with_record(record);

        let disk = MemoryStorage::new("disk");
        disk.put(hash.as_str(), legacy.as_bytes()).unwrap();

        let resolver = Resolver::new(&cfg, &indexer);
        let out = resolver.lookup("alice.id", &[&disk]).unwrap();
        assert_eq!(out.profile_class, Some(ProfileClass::Legacy));
        assert!(out.zonefile.is_none());
    }

    #[test]
    fn whois_reports_expiry_and_revocation() {
        let cfg = cfg();
        let mut record = name_record("alice.id", &addr("2owner"), None);
        record.revoked = true;
        let indexer = MockIndexer::with_record(record);

        let resolver = Resolver::new(&cfg, &indexer);
        let who = resolver.whois("alice.id").unwrap();
        assert!(who.revoked);
        assert_eq!(who.expire_block, Some(400010 + 52595));
    }

    #[test]
    fn unregistered_name_is_not_found() {
        let cfg = cfg();
        let indexer = MockIndexer::default();
        let resolver = Resolver::new(&cfg, &indexer);
        let err = resolver.whois("ghost.id").unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }
}
