//! Namespace records and the name pricing function.
//!
//! A namespace fixes the pricing and lifetime rules for every name under it:
//! a multiplicative coefficient, an exponential base, sixteen length-bucket
//! exponents, and two discount denominators (non-alpha characters, vowelless
//! names).

use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, CoreResult};
use crate::model::types::Address;

/// Number of length buckets in the price function.
pub const PRICE_BUCKETS: usize = 16;

/// Price floor and unit, in satoshis.
pub const NAME_COST_UNIT: u64 = 100;

/// Lifetime value meaning "names never expire".
pub const NAMESPACE_LIFE_INFINITE: u32 = u32::MAX;

/// On-chain state of a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceRecord {
    pub namespace_id: String,
    /// Address of the revealer, which imports names until ready.
    pub recipient_address: Address,
    /// Name lifetime in blocks; `NAMESPACE_LIFE_INFINITE` means no expiry.
    pub lifetime: u32,
    pub coeff: u64,
    pub base: u64,
    /// Maps name length to the exponent applied to `base`. Exactly 16
    /// entries, each in 0..=15.
    pub buckets: Vec<u8>,
    /// Price denominator for names with digits, dashes, or underscores.
    pub nonalpha_discount: u64,
    /// Price denominator for names without vowels.
    pub no_vowel_discount: u64,
    pub block_number: u64,
    pub reveal_block: u64,
    #[serde(default)]
    pub ready_block: Option<u64>,
}

impl NamespaceRecord {
    /// Validate the pricing parameters.
    pub fn validate(&self) -> CoreResult<()> {
        validate_buckets(&self.buckets)?;
        if self.nonalpha_discount == 0 || self.no_vowel_discount == 0 {
            return Err(CoreError::invalid_argument(
                "discount denominators must be nonzero",
            ));
        }
        Ok(())
    }

    /// Price of a name label under this namespace's rules, in satoshis.
    pub fn name_cost(&self, label: &str) -> CoreResult<u64> {
        self.validate()?;
        if label.is_empty() {
            return Err(CoreError::invalid_argument("label must not be empty"));
        }

        let bucket = self.buckets[label.len().saturating_sub(1).min(PRICE_BUCKETS - 1)];
        let units = (self.coeff as u128)
            .saturating_mul((self.base as u128).saturating_pow(u32::from(bucket)));
        let mut price = units.saturating_mul(u128::from(NAME_COST_UNIT));

        // the larger applicable discount wins; they do not stack
        let mut discount = 1u128;
        if has_nonalpha(label) {
            discount = discount.max(u128::from(self.nonalpha_discount));
        }
        if !has_vowel(label) {
            discount = discount.max(u128::from(self.no_vowel_discount));
        }
        price /= discount;

        if price < u128::from(NAME_COST_UNIT) {
            price = u128::from(NAME_COST_UNIT);
        }

        Ok(u64::try_from(price).unwrap_or(u64::MAX))
    }

    /// Whether a name registered or renewed at `last_renewed` is expired as
    /// of `block_height`.
    pub fn name_expired(&self, last_renewed: u64, block_height: u64) -> bool {
        if self.lifetime == NAMESPACE_LIFE_INFINITE {
            return false;
        }
        block_height > last_renewed.saturating_add(u64::from(self.lifetime))
    }
}

/// Normalize a requested lifetime: negative means "never expires".
pub fn normalize_lifetime(lifetime: i64) -> u32 {
    if lifetime < 0 {
        NAMESPACE_LIFE_INFINITE
    } else {
        u32::try_from(lifetime).unwrap_or(NAMESPACE_LIFE_INFINITE)
    }
}

/// Validate a bucket exponent list: exactly 16 entries, each in 0..=15.
///
/// Runs before any reveal transaction is constructed.
pub fn validate_buckets(buckets: &[u8]) -> CoreResult<()> {
    if buckets.len() != PRICE_BUCKETS {
        return Err(CoreError::invalid_argument(format!(
            "bucket exponents must have exactly {PRICE_BUCKETS} entries, got {}",
            buckets.len()
        )));
    }
    for (i, b) in buckets.iter().enumerate() {
        if *b > 15 {
            return Err(CoreError::invalid_argument(format!(
                "bucket exponent {i} out of range: {b} (must be 0..=15)"
            )));
        }
    }
    Ok(())
}

fn has_nonalpha(label: &str) -> bool {
    label.chars().any(|c| c.is_ascii_digit() || c == '-' || c == '_')
}

fn has_vowel(label: &str) -> bool {
    label.chars().any(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_namespace() -> NamespaceRecord {
        NamespaceRecord {
            namespace_id: "id".to_string(),
            recipient_address: Address::new("16EMaNw3pkn3v6f2BgnSSs53zAKH4Q8YJg").unwrap(),
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

    #[test]
    fn bucket_validation() {
        assert!(validate_buckets(&[0; 16]).is_ok());
        assert!(validate_buckets(&[0; 15]).is_err());
        assert!(validate_buckets(&[0; 17]).is_err());
        let mut bad = [0u8; 16];
        bad[7] = 16;
        assert!(validate_buckets(&bad).is_err());
    }

    #[test]
    fn longer_names_are_cheaper() {
        let ns = id_namespace();
        let short = ns.name_cost("ab").unwrap();
        let long = ns.name_cost("abcdefg").unwrap();
        assert!(short > long);
    }

    #[test]
    fn discounts_divide_price() {
        let ns = id_namespace();
        let plain = ns.name_cost("alice").unwrap();
        let digits = ns.name_cost("al1ce").unwrap();
        assert_eq!(digits, plain / 10);
    }

    #[test]
    fn discounts_do_not_stack() {
        let ns = id_namespace();
        // vowelless and containing digits: only the larger denominator applies
        let both = ns.name_cost("xz-42").unwrap();
        let vowelless = ns.name_cost("xzqrt").unwrap();
        assert_eq!(both, vowelless);
    }

    #[test]
    fn price_floor_holds() {
        let mut ns = id_namespace();
        ns.coeff = 1;
        ns.base = 1;
        ns.no_vowel_discount = 1000;
        assert_eq!(ns.name_cost("xz").unwrap(), NAME_COST_UNIT);
    }

    #[test]
    fn lifetime_normalization() {
        assert_eq!(normalize_lifetime(-1), NAMESPACE_LIFE_INFINITE);
        assert_eq!(normalize_lifetime(52595), 52595);
    }

    #[test]
    fn expiry_checks() {
        let ns = id_namespace();
        assert!(!ns.name_expired(400000, 400001));
        assert!(ns.name_expired(400000, 400000 + 52596));

        let mut forever = id_namespace();
        forever.lifetime = NAMESPACE_LIFE_INFINITE;
        assert!(!forever.name_expired(1, u64::MAX));
    }
}
