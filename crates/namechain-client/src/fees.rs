//! Transaction fee estimation.
//!
//! Each operation kind has a fixed approximate transaction size; the live
//! path refines that with the payment address's actual UTXO set. When the
//! UTXO source is unreachable the estimator falls back to the size
//! heuristic alone and says so; a fallback estimate is always flagged, never
//! passed off as exact.

use tracing::warn;

use namechain_core::model::{Address, NameOpKind};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::services::TxService;

/// Approximate transaction byte lengths per operation shape.
pub const APPROX_PREORDER_TX_LEN: u64 = 620;
pub const APPROX_REGISTER_TX_LEN: u64 = 620;
pub const APPROX_UPDATE_TX_LEN: u64 = 1240;
pub const APPROX_TRANSFER_TX_LEN: u64 = 1240;
pub const APPROX_RENEWAL_TX_LEN: u64 = 1240;
pub const APPROX_REVOKE_TX_LEN: u64 = 1240;

/// Marginal size of one additional p2pkh input.
const APPROX_INPUT_LEN: u64 = 148;

/// A fee estimate in satoshis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeEstimate {
    pub satoshis: u64,
    /// True when the live path failed and the size heuristic was used.
    pub low_confidence: bool,
    pub warning: Option<String>,
}

/// Total cost breakdown for a full registration (preorder + register +
/// first update).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationFees {
    pub name_price: u64,
    pub preorder_tx_fee: u64,
    pub register_tx_fee: u64,
    pub update_tx_fee: u64,
    pub total: u64,
    pub warnings: Vec<String>,
}

pub struct FeeEstimator<'a> {
    cfg: &'a ClientConfig,
    tx: &'a dyn TxService,
}

impl<'a> FeeEstimator<'a> {
    pub fn new(cfg: &'a ClientConfig, tx: &'a dyn TxService) -> Self {
        Self { cfg, tx }
    }

    /// Approximate byte length of one operation's transaction shape.
    pub fn approx_tx_len(kind: NameOpKind) -> u64 {
        match kind {
            NameOpKind::NamePreorder => APPROX_PREORDER_TX_LEN,
            NameOpKind::NameRegistration => APPROX_REGISTER_TX_LEN,
            NameOpKind::NameUpdate => APPROX_UPDATE_TX_LEN,
            NameOpKind::NameTransfer => APPROX_TRANSFER_TX_LEN,
            NameOpKind::NameRenewal => APPROX_RENEWAL_TX_LEN,
            _ => APPROX_REVOKE_TX_LEN,
        }
    }

    /// Dust-inclusive fee estimate for one operation.
    ///
    /// `name_price` is the burn fee for preorder/renewal shapes, included in
    /// the amount the payment address must cover.
    pub fn estimate(
        &self,
        kind: NameOpKind,
        name_price: Option<u64>,
        payment_address: &Address,
    ) -> FeeEstimate {
        let base = self.heuristic_fee(kind, name_price);

        match self.tx.get_utxos(payment_address) {
            Ok(utxos) => {
                // extra inputs beyond the first grow the transaction
                let needed = base.satoshis;
                let mut covered = 0u64;
                let mut inputs = 0u64;
                for u in &utxos {
                    if covered >= needed {
                        break;
                    }
                    covered = covered.saturating_add(u.value);
                    inputs += 1;
                }
                let extra_inputs = inputs.saturating_sub(1);
                let satoshis = base
                    .satoshis
                    .saturating_add(extra_inputs * APPROX_INPUT_LEN * self.cfg.fee_per_byte);
                FeeEstimate {
                    satoshis,
                    low_confidence: false,
                    warning: None,
                }
            }
            Err(e) => {
                warn!(kind = %kind, error = %e, "UTXO source unreachable; using size heuristic");
                FeeEstimate {
                    satoshis: base.satoshis,
                    low_confidence: true,
                    warning: Some(format!(
                        "fee for {kind} is a rough size-based estimate: {e}"
                    )),
                }
            }
        }
    }

    /// Everything a full registration will cost.
    pub fn registration_fees(
        &self,
        name_price: u64,
        payment_address: &Address,
    ) -> ClientResult<RegistrationFees> {
        let preorder = self.estimate(NameOpKind::NamePreorder, Some(name_price), payment_address);
        let register = self.estimate(NameOpKind::NameRegistration, None, payment_address);
        let update = self.estimate(NameOpKind::NameUpdate, None, payment_address);

        let mut warnings = Vec::new();
        for est in [&preorder, &register, &update] {
            if let Some(w) = &est.warning {
                warnings.push(w.clone());
            }
        }

        let preorder_tx_fee = preorder.satoshis.saturating_sub(name_price);
        let total = name_price
            .saturating_add(preorder_tx_fee)
            .saturating_add(register.satoshis)
            .saturating_add(update.satoshis);

        if total == 0 {
            return Err(ClientError::Fatal(
                "registration fee estimate collapsed to zero".to_string(),
            ));
        }

        Ok(RegistrationFees {
            name_price,
            preorder_tx_fee,
            register_tx_fee: register.satoshis,
            update_tx_fee: update.satoshis,
            total,
            warnings,
        })
    }

    /// Size heuristic: shape bytes at the configured fee rate, plus dust
    /// outputs, plus the burn fee when there is one.
    fn heuristic_fee(&self, kind: NameOpKind, name_price: Option<u64>) -> FeeEstimate {
        let dust_outputs = match kind {
            NameOpKind::NameRegistration | NameOpKind::NameTransfer => 3,
            _ => 2,
        };
        let satoshis = Self::approx_tx_len(kind) * self.cfg.fee_per_byte
            + dust_outputs * self.cfg.dust_minimum
            + name_price.unwrap_or(0);
        FeeEstimate {
            satoshis,
            low_confidence: false,
            warning: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{addr, MockTx};

    fn cfg() -> ClientConfig {
        ClientConfig::default()
    }

    #[test]
    fn live_estimate_is_confident() {
        let cfg = cfg();
        let tx = MockTx::with_balance(10_000_000);
        let est = FeeEstimator::new(&cfg, &tx).estimate(
            NameOpKind::NameUpdate,
            None,
            &addr("1"),
        );
        assert!(!est.low_confidence);
        assert!(est.warning.is_none());
        assert!(est.satoshis >= APPROX_UPDATE_TX_LEN * cfg.fee_per_byte);
    }

    #[test]
    fn fallback_is_present_and_flagged() {
        let cfg = cfg();
        let tx = MockTx::unreachable();
        let est = FeeEstimator::new(&cfg, &tx).estimate(
            NameOpKind::NameTransfer,
            None,
            &addr("1"),
        );
        assert!(est.low_confidence);
        assert!(est.warning.is_some());
        assert!(est.satoshis > 0);
    }

    #[test]
    fn name_price_is_included_for_preorder() {
        let cfg = cfg();
        let tx = MockTx::with_balance(10_000_000);
        let fe = FeeEstimator::new(&cfg, &tx);
        let without = fe.estimate(NameOpKind::NamePreorder, None, &addr("1"));
        let with = fe.estimate(NameOpKind::NamePreorder, Some(640_000), &addr("1"));
        assert!(with.satoshis >= without.satoshis + 640_000);
    }

    #[test]
    fn registration_fees_totals_add_up() {
        let cfg = cfg();
        let tx = MockTx::with_balance(10_000_000);
        let fees = FeeEstimator::new(&cfg, &tx)
            .registration_fees(640_000, &addr("1"))
            .unwrap();
        assert_eq!(
            fees.total,
            fees.name_price + fees.preorder_tx_fee + fees.register_tx_fee + fees.update_tx_fee
        );
        assert!(fees.warnings.is_empty());
    }

    #[test]
    fn registration_fees_carry_warnings_on_fallback() {
        let cfg = cfg();
        let tx = MockTx::unreachable();
        let fees = FeeEstimator::new(&cfg, &tx)
            .registration_fees(640_000, &addr("1"))
            .unwrap();
        assert!(!fees.warnings.is_empty());
    }
}
