//! Trade proposals, sized trades and live trades

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use super::interval::Interval;
use super::signal::{PatternResult, SignalDirection};
use crate::error::StalkerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeDirection {
    Buy,
    Sell,
}

impl Display for TradeDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        })
    }
}

impl TryFrom<SignalDirection> for TradeDirection {
    type Error = StalkerError;

    fn try_from(direction: SignalDirection) -> Result<Self, Self::Error> {
        match direction {
            SignalDirection::StrongBuy | SignalDirection::Buy => Ok(Self::Buy),
            SignalDirection::StrongSell | SignalDirection::Sell => Ok(Self::Sell),
            SignalDirection::Hold => Err(StalkerError::InvalidSignalState(
                "Hold cannot become a trade direction".to_string(),
            )),
        }
    }
}

impl TryFrom<PatternResult> for TradeDirection {
    type Error = StalkerError;

    fn try_from(pattern: PatternResult) -> Result<Self, Self::Error> {
        match pattern {
            PatternResult::BullishReversal => Ok(Self::Buy),
            PatternResult::BearishReversal => Ok(Self::Sell),
            PatternResult::None => Err(StalkerError::InvalidSignalState(
                "no pattern cannot become a trade direction".to_string(),
            )),
        }
    }
}

/// How strongly the originating signal argued for the trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Conviction {
    Strong,
    Regular,
}

impl From<SignalDirection> for Conviction {
    fn from(direction: SignalDirection) -> Self {
        match direction {
            SignalDirection::StrongBuy | SignalDirection::StrongSell => Self::Strong,
            _ => Self::Regular,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OriginKind {
    Indicator,
    Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeProposal {
    pub symbol: String,
    pub interval: Interval,
    pub direction: TradeDirection,
    pub conviction: Conviction,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub origin: OriginKind,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskClass {
    Acceptable,
    Low,
    Medium,
    High,
    TooHigh,
}

impl RiskClass {
    pub fn description(self) -> &'static str {
        match self {
            Self::Acceptable => "Acceptable Risk",
            Self::Low => "Low Risk",
            Self::Medium => "Moderate Risk",
            Self::High => "High Risk",
            Self::TooHigh => "Too High Risk",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizedTrade {
    pub proposal: TradeProposal,
    pub amount: Decimal,
    pub risk_class: RiskClass,
}

impl SizedTrade {
    pub fn is_acceptable(&self) -> bool {
        self.risk_class == RiskClass::Acceptable
    }

    pub fn order_request(&self) -> OrderRequest {
        OrderRequest {
            symbol: self.proposal.symbol.clone(),
            side: self.proposal.direction,
            quantity: self.amount,
            price: self.proposal.entry_price,
            stop_loss: self.proposal.stop_loss,
            take_profit: self.proposal.take_profit,
        }
    }
}

/// Limit order with attached stop loss / take profit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: TradeDirection,
    pub quantity: Decimal,
    pub price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeState {
    Open,
    Monitoring,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
}

/// A submitted trade being watched until it exits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTrade {
    pub order_id: String,
    pub symbol: String,
    pub side: TradeDirection,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub amount: Decimal,
    pub origin: OriginKind,
    pub state: TradeState,
    pub opened_at: DateTime<Utc>,
}

impl ActiveTrade {
    pub fn from_sized(order_id: impl Into<String>, trade: &SizedTrade) -> Self {
        Self {
            order_id: order_id.into(),
            symbol: trade.proposal.symbol.clone(),
            side: trade.proposal.direction,
            entry_price: trade.proposal.entry_price,
            stop_loss: trade.proposal.stop_loss,
            take_profit: trade.proposal.take_profit,
            amount: trade.amount,
            origin: trade.proposal.origin,
            state: TradeState::Open,
            opened_at: Utc::now(),
        }
    }

    pub fn unrealized_pnl(&self, current_price: Decimal) -> Decimal {
        match self.side {
            TradeDirection::Buy => (current_price - self.entry_price) * self.amount,
            TradeDirection::Sell => (self.entry_price - current_price) * self.amount,
        }
    }

    /// Unrealized P&L as a percentage of the position notional.
    pub fn pnl_pct(&self, current_price: Decimal) -> Decimal {
        let notional = self.entry_price * self.amount;
        if notional.is_zero() {
            return Decimal::ZERO;
        }
        self.unrealized_pnl(current_price) / notional * Decimal::ONE_HUNDRED
    }

    /// Exit reached-or-passed at `current_price`, direction-aware.
    pub fn exit_reason(&self, current_price: Decimal) -> Option<ExitReason> {
        match self.side {
            TradeDirection::Buy if current_price >= self.take_profit => Some(ExitReason::TakeProfit),
            TradeDirection::Buy if current_price <= self.stop_loss => Some(ExitReason::StopLoss),
            TradeDirection::Sell if current_price <= self.take_profit => Some(ExitReason::TakeProfit),
            TradeDirection::Sell if current_price >= self.stop_loss => Some(ExitReason::StopLoss),
            _ => None,
        }
    }
}
