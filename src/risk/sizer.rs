use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

use crate::config::RiskConfig;
use crate::error::{Result, StalkerError};
use crate::models::trade::{RiskClass, SizedTrade, TradeProposal};

#[derive(Debug, Clone, Default)]
pub struct RiskSizer {
    config: RiskConfig,
}

impl RiskSizer {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// `InsufficientBalance` when `balance` is under the configured floor.
    pub fn check_balance(&self, balance: Decimal) -> Result<()> {
        if balance < self.config.min_balance {
            return Err(StalkerError::InsufficientBalance {
                balance,
                minimum: self.config.min_balance,
            });
        }
        Ok(())
    }

    /// Quantity for `proposal`, truncated toward zero to the symbol's lot scale.
    pub fn amount(&self, proposal: &TradeProposal, balance: Decimal) -> Decimal {
        if proposal.entry_price <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let raw = balance * self.config.risk_fraction / proposal.entry_price;
        raw.round_dp_with_strategy(
            self.config.lot_scale_for(&proposal.symbol),
            RoundingStrategy::ToZero,
        )
    }

    /// Size and classify every proposal. Below the balance floor all are `TooHigh`.
    pub fn size(&self, proposals: &[TradeProposal], balance: Decimal) -> Vec<SizedTrade> {
        if let Err(e) = self.check_balance(balance) {
            if !proposals.is_empty() {
                warn!(
                    balance = %balance,
                    proposals = proposals.len(),
                    error = %e,
                    "RiskSizer: rejecting all {} proposals",
                    proposals.len()
                );
            }
            return proposals
                .iter()
                .map(|proposal| SizedTrade {
                    proposal: proposal.clone(),
                    amount: Decimal::ZERO,
                    risk_class: RiskClass::TooHigh,
                })
                .collect();
        }

        proposals
            .iter()
            .map(|proposal| {
                let amount = self.amount(proposal, balance);
                let risk_class = if amount.is_zero() {
                    RiskClass::TooHigh
                } else {
                    self.config
                        .class_policy
                        .classify(proposal.direction, proposal.conviction)
                };
                debug!(
                    symbol = %proposal.symbol,
                    direction = %proposal.direction,
                    amount = %amount,
                    risk = risk_class.description(),
                    "RiskSizer: {} {} sized at {} ({})",
                    proposal.direction,
                    proposal.symbol,
                    amount,
                    risk_class.description()
                );
                SizedTrade {
                    proposal: proposal.clone(),
                    amount,
                    risk_class,
                }
            })
            .collect()
    }

    /// Only trades classified `Acceptable`.
    pub fn accepted(&self, proposals: &[TradeProposal], balance: Decimal) -> Vec<SizedTrade> {
        self.size(proposals, balance)
            .into_iter()
            .filter(SizedTrade::is_acceptable)
            .collect()
    }
}
