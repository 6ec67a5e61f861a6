//! Turns indicator signals and pin-bar patterns into trade proposals

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::FusionConfig;
use crate::models::bar::Series;
use crate::models::signal::{PatternResult, Signal};
use crate::models::trade::{Conviction, OriginKind, TradeDirection, TradeProposal};

#[derive(Debug, Clone, Default)]
pub struct SignalFuser {
    config: FusionConfig,
}

impl SignalFuser {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    /// Stop loss and take profit around `entry`: `(stop, target)`.
    pub fn levels(&self, direction: TradeDirection, entry: Decimal) -> (Decimal, Decimal) {
        let stop = self.config.stop_loss_pct;
        let target = self.config.take_profit_pct;
        match direction {
            TradeDirection::Buy => (entry * (Decimal::ONE - stop), entry * (Decimal::ONE + target)),
            TradeDirection::Sell => (entry * (Decimal::ONE + stop), entry * (Decimal::ONE - target)),
        }
    }

    /// `Hold` produces nothing.
    pub fn from_signal(&self, signal: &Signal) -> Option<TradeProposal> {
        let direction = TradeDirection::try_from(signal.direction).ok()?;
        let entry = signal.reference_price;
        let (stop_loss, take_profit) = self.levels(direction, entry);

        Some(TradeProposal {
            symbol: signal.symbol.clone(),
            interval: signal.interval,
            direction,
            conviction: Conviction::from(signal.direction),
            entry_price: entry,
            stop_loss,
            take_profit,
            origin: OriginKind::Indicator,
            timestamp: signal.timestamp,
        })
    }

    /// A pattern needs its triggering bar to clear the volume policy.
    pub fn from_pattern(&self, series: &Series, pattern: PatternResult) -> Option<TradeProposal> {
        let direction = TradeDirection::try_from(pattern).ok()?;
        let trigger = series.newest()?;

        let bars = series.bars();
        let history_end = bars.len() - 1;
        let history_start = history_end.saturating_sub(self.config.volume_lookback);
        let history: Vec<Decimal> = bars[history_start..history_end]
            .iter()
            .map(|bar| bar.volume)
            .collect();

        if !self.config.volume_policy.confirms(trigger.volume, &history) {
            debug!(
                symbol = %series.symbol(),
                interval = %series.interval(),
                volume = %trigger.volume,
                "SignalFuser: {:?} on {} dropped, volume not confirmed",
                pattern,
                series.key()
            );
            return None;
        }

        let (stop_loss, take_profit) = self.levels(direction, trigger.close);
        Some(TradeProposal {
            symbol: series.symbol().to_string(),
            interval: series.interval(),
            direction,
            conviction: Conviction::Regular,
            entry_price: trigger.close,
            stop_loss,
            take_profit,
            origin: OriginKind::Pattern,
            timestamp: trigger.timestamp,
        })
    }

    /// Union of indicator- and pattern-sourced proposals; nothing is merged.
    pub fn fuse(
        &self,
        signals: &[Signal],
        pattern: Option<(&Series, PatternResult)>,
    ) -> Vec<TradeProposal> {
        let mut proposals: Vec<TradeProposal> =
            signals.iter().filter_map(|s| self.from_signal(s)).collect();

        if let Some(proposal) = pattern.and_then(|(series, result)| self.from_pattern(series, result)) {
            proposals.push(proposal);
        }

        if !proposals.is_empty() {
            debug!(count = proposals.len(), "SignalFuser: {} proposals", proposals.len());
        }
        proposals
    }
}
