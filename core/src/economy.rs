//! Round-type classification from round context.
//!
//! Providers rarely ship a reliable buy field, so rounds without a
//! `round_type` are classified by replaying an estimated credit bank
//! through the match in round order. Supplied types are kept as-is but
//! still advance the bank.
//!
//! At round start the team's buying power is its banked credits plus
//! the loadout it kept from a won round (capped at full_buy_cost, lost
//! with any lost round). Thresholds compare buying power, not credits:
//!   - power ≥ full_buy_threshold → full buy
//!   - power ≥ eco_threshold      → force
//!   - otherwise                  → eco
//!
//! Rounds 1 and half_length + 1 are pistol rounds. Overtime rounds are
//! played on fixed credits and count as full buys.

use crate::{
    config::EconomyConfig,
    tables::{RoundRecord, RoundType},
    types::RoundNumber,
};

pub fn is_pistol_round(round: RoundNumber, config: &EconomyConfig) -> bool {
    round == 1 || round == config.half_length + 1
}

pub fn is_overtime(round: RoundNumber, config: &EconomyConfig) -> bool {
    round > config.half_length * 2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bank {
    credits:     u32,
    retained:    u32,
    loss_streak: u32,
}

impl Bank {
    fn half_start(config: &EconomyConfig) -> Self {
        Self {
            credits:     config.pistol_credits,
            retained:    0,
            loss_streak: 0,
        }
    }

    fn buying_power(&self) -> u32 {
        self.credits + self.retained
    }

    fn spend_for(&self, kind: RoundType, config: &EconomyConfig) -> u32 {
        match kind {
            RoundType::Pistol  => self.credits.min(config.pistol_credits),
            RoundType::FullBuy => config
                .full_buy_cost
                .saturating_sub(self.retained)
                .min(self.credits),
            RoundType::Force   => self.credits,
            RoundType::Eco     => 0,
        }
    }

    fn settle(&mut self, kind: RoundType, won: bool, config: &EconomyConfig) {
        let spend = self.spend_for(kind, config);
        self.credits -= spend;
        let loadout = self.retained + spend;

        let reward = if won {
            self.loss_streak = 0;
            self.retained = loadout.min(config.full_buy_cost);
            config.win_reward
        } else {
            let reward = (config.loss_reward + config.loss_streak_bonus * self.loss_streak)
                .min(config.max_loss_reward);
            self.loss_streak += 1;
            self.retained = 0;
            reward
        };
        self.credits = (self.credits + reward).min(config.credit_cap);
    }
}

fn infer(round: RoundNumber, bank: &Bank, config: &EconomyConfig) -> RoundType {
    if is_pistol_round(round, config) {
        RoundType::Pistol
    } else if is_overtime(round, config) {
        RoundType::FullBuy
    } else if bank.buying_power() >= config.full_buy_threshold {
        RoundType::FullBuy
    } else if bank.buying_power() >= config.eco_threshold {
        RoundType::Force
    } else {
        RoundType::Eco
    }
}

/// Resolve `round_type` for every round of one match.
/// `rounds` must belong to a single match and be sorted by round number.
pub fn classify_match_rounds(rounds: &mut [RoundRecord], config: &EconomyConfig) {
    let mut bank = Bank::half_start(config);
    for round in rounds.iter_mut() {
        if is_pistol_round(round.round_number, config) {
            bank = Bank::half_start(config);
        }
        let kind = round
            .round_type
            .unwrap_or_else(|| infer(round.round_number, &bank, config));
        round.round_type = Some(kind);
        bank.settle(kind, round.team_won(), config);
    }
}
