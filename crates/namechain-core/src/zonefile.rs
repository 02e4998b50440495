//! Zonefile parsing, validation, and content addressing.
//!
//! A zonefile is the small document a name's on-chain `value_hash` commits
//! to: `$ORIGIN`, `$TTL`, and the URI/TXT records that point at off-chain
//! profile data. Candidates arrive either as zone-file text or as a JSON
//! object with the same fields; both forms serialize to one canonical text,
//! and the content hash is always recomputed from that text.
//!
//! Validation is a three-way classification: `Valid`, `Identical` (hash
//! equals the current on-chain commitment; a no-op for callers, not an
//! error), or `Invalid` with the reason. Legacy-profile detection is a
//! separate, weaker check used only by migration.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::errors::{CoreError, CoreResult};
use crate::model::types::ZonefileHash;

/// A `URI` record: points a service name at a target URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriRecord {
    pub name: String,
    pub priority: u32,
    pub weight: u32,
    pub target: String,
}

/// A `TXT` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxtRecord {
    pub name: String,
    pub text: String,
}

/// A parsed zonefile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zonefile {
    pub origin: String,
    pub ttl: u32,
    pub uri: Vec<UriRecord>,
    pub txt: Vec<TxtRecord>,
}

/// Outcome of validating a candidate zonefile against a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZonefileCheck {
    /// Parses, matches the name, and has the standard record shape.
    Valid {
        zonefile: Zonefile,
        /// Canonical serialization; this is what gets hashed and stored.
        text: String,
        hash: ZonefileHash,
    },
    /// Hash equals the name's current on-chain `value_hash`; callers treat
    /// this as "no update needed", not as a failure.
    Identical { hash: ZonefileHash },
    /// Parse or shape failure.
    Invalid { reason: String },
}

#[derive(Default)]
struct Draft {
    origin: Option<String>,
    ttl: Option<i64>,
    uri: Vec<UriRecord>,
    txt: Vec<TxtRecord>,
}

/// JSON object form of a zonefile.
#[derive(Deserialize)]
struct JsonZonefile {
    #[serde(rename = "$origin")]
    origin: Option<String>,
    #[serde(rename = "$ttl")]
    ttl: Option<i64>,
    #[serde(default)]
    uri: Vec<UriRecord>,
    #[serde(default)]
    txt: Vec<TxtRecord>,
}

impl Zonefile {
    /// Parse zonefile data, accepting JSON first and falling back to text.
    pub fn parse(data: &str) -> CoreResult<Self> {
        let draft = parse_draft(data)?;
        draft_to_zonefile(draft)
    }

    /// A fresh standard zonefile pointing at the given profile URLs.
    pub fn standard(origin: &str, ttl: u32, profile_urls: &[String]) -> Self {
        let uri = profile_urls
            .iter()
            .map(|target| UriRecord {
                name: "_file".to_string(),
                priority: 10,
                weight: 1,
                target: target.clone(),
            })
            .collect();
        Self {
            origin: origin.to_string(),
            ttl,
            uri,
            txt: Vec::new(),
        }
    }

    /// True if the zonefile has the minimum standard record shape.
    pub fn is_standard(&self) -> bool {
        !self.uri.is_empty()
    }

    /// Canonical text serialization. Hashes are computed over this form so
    /// equivalent inputs hash identically.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("$ORIGIN {}\n", self.origin));
        out.push_str(&format!("$TTL {}\n", self.ttl));
        for r in &self.uri {
            out.push_str(&format!(
                "{} URI {} {} \"{}\"\n",
                r.name, r.priority, r.weight, r.target
            ));
        }
        for r in &self.txt {
            out.push_str(&format!("{} TXT \"{}\"\n", r.name, r.text));
        }
        out
    }

    /// Content hash of the canonical serialization.
    pub fn hash(&self) -> ZonefileHash {
        hash_zonefile_data(self.serialize().as_bytes())
    }
}

/// RIPEMD160(SHA256(bytes)), the chain's zonefile commitment hash.
pub fn hash_zonefile_data(data: &[u8]) -> ZonefileHash {
    let sha = Sha256::digest(data);
    let rip = ripemd::Ripemd160::digest(sha);
    ZonefileHash::new(hex::encode(rip)).expect("ripemd160 digest is always 40 hex chars")
}

/// Validate a candidate zonefile for a name.
///
/// `current_value_hash` is the name's on-chain commitment, used for the
/// `Identical` short-circuit.
pub fn validate_zonefile(
    fqu: &str,
    data: &str,
    current_value_hash: Option<&ZonefileHash>,
) -> ZonefileCheck {
    let draft = match parse_draft(data) {
        Ok(d) => d,
        Err(e) => {
            return ZonefileCheck::Invalid {
                reason: format!("zonefile data is invalid: {e}"),
            }
        }
    };

    match draft.origin.as_deref() {
        None => {
            return ZonefileCheck::Invalid {
                reason: "missing $origin".to_string(),
            }
        }
        Some(origin) if origin != fqu => {
            return ZonefileCheck::Invalid {
                reason: format!("invalid $origin; expected {fqu}, got {origin}"),
            }
        }
        Some(_) => {}
    }

    let ttl = match draft.ttl {
        None => {
            return ZonefileCheck::Invalid {
                reason: "missing $ttl; please supply a non-negative integer".to_string(),
            }
        }
        Some(t) if t < 0 || t > i64::from(u32::MAX) => {
            return ZonefileCheck::Invalid {
                reason: "invalid $ttl; must be a non-negative integer".to_string(),
            }
        }
        Some(t) => t as u32,
    };

    let zonefile = Zonefile {
        origin: fqu.to_string(),
        ttl,
        uri: draft.uri,
        txt: draft.txt,
    };

    if !zonefile.is_standard() {
        return ZonefileCheck::Invalid {
            reason: "zonefile is missing URI records".to_string(),
        };
    }

    let text = zonefile.serialize();
    let hash = hash_zonefile_data(text.as_bytes());

    if current_value_hash == Some(&hash) {
        return ZonefileCheck::Identical { hash };
    }

    ZonefileCheck::Valid {
        zonefile,
        text,
        hash,
    }
}

/// Weak classification of a JSON document as a legacy profile.
///
/// Legacy profiles are flat JSON profile objects from before zonefiles
/// existed. Only the migration flow consults this; it plays no part in the
/// validator's pass/fail decision.
pub fn is_legacy_profile(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    if obj.contains_key("$origin") || obj.contains_key("$ttl") || obj.contains_key("zone_file") {
        return false;
    }
    ["account", "avatar", "bio", "bitcoin", "v"]
        .iter()
        .any(|k| obj.contains_key(*k))
}

fn parse_draft(data: &str) -> CoreResult<Draft> {
    if let Ok(json) = serde_json::from_str::<Value>(data) {
        if json.is_object() {
            let parsed: JsonZonefile = serde_json::from_value(json)
                .map_err(|e| CoreError::zonefile(format!("bad JSON zonefile: {e}")))?;
            return Ok(Draft {
                origin: parsed.origin,
                ttl: parsed.ttl,
                uri: parsed.uri,
                txt: parsed.txt,
            });
        }
    }
    parse_text(data)
}

fn parse_text(data: &str) -> CoreResult<Draft> {
    let mut draft = Draft::default();
    let mut saw_record = false;

    for raw in data.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if let Some(rest) = line.strip_prefix("$ORIGIN") {
            draft.origin = Some(rest.trim().trim_end_matches('.').to_string());
            continue;
        }
        if let Some(rest) = line.strip_prefix("$TTL") {
            let ttl = rest
                .trim()
                .parse::<i64>()
                .map_err(|_| CoreError::zonefile("malformed $ttl"))?;
            draft.ttl = Some(ttl);
            continue;
        }

        let (head, quoted) = split_quoted_tail(line)?;
        let tokens: Vec<&str> = head.split_whitespace().collect();

        match tokens.as_slice() {
            [name, "URI", priority, weight] => {
                let priority = priority
                    .parse::<u32>()
                    .map_err(|_| CoreError::zonefile("malformed URI priority"))?;
                let weight = weight
                    .parse::<u32>()
                    .map_err(|_| CoreError::zonefile("malformed URI weight"))?;
                draft.uri.push(UriRecord {
                    name: (*name).to_string(),
                    priority,
                    weight,
                    target: quoted
                        .ok_or_else(|| CoreError::zonefile("URI record missing target"))?,
                });
                saw_record = true;
            }
            [name, "TXT"] => {
                draft.txt.push(TxtRecord {
                    name: (*name).to_string(),
                    text: quoted
                        .ok_or_else(|| CoreError::zonefile("TXT record missing text"))?,
                });
                saw_record = true;
            }
            _ => {
                return Err(CoreError::zonefile(format!(
                    "unrecognized zonefile line: {line}"
                )));
            }
        }
    }

    if draft.origin.is_none() && draft.ttl.is_none() && !saw_record {
        return Err(CoreError::zonefile("no zonefile content found"));
    }

    Ok(draft)
}

fn draft_to_zonefile(draft: Draft) -> CoreResult<Zonefile> {
    let origin = draft
        .origin
        .ok_or_else(|| CoreError::zonefile("missing $origin"))?;
    let ttl = match draft.ttl {
        Some(t) if (0..=i64::from(u32::MAX)).contains(&t) => t as u32,
        Some(_) => return Err(CoreError::zonefile("invalid $ttl")),
        None => return Err(CoreError::zonefile("missing $ttl")),
    };
    Ok(Zonefile {
        origin,
        ttl,
        uri: draft.uri,
        txt: draft.txt,
    })
}

/// Split a record line into its head tokens and a trailing quoted string.
fn split_quoted_tail(line: &str) -> CoreResult<(&str, Option<String>)> {
    match line.find('"') {
        None => Ok((line, None)),
        Some(start) => {
            let tail = &line[start + 1..];
            let end = tail
                .find('"')
                .ok_or_else(|| CoreError::zonefile("unterminated quoted string"))?;
            Ok((line[..start].trim_end(), Some(tail[..end].to_string())))
        }
    }
}
