//! Vote value estimate and voting power regeneration.
//!
//! Uses the linear rshares approximation published for the Hive reward
//! curve, always at 100% vote weight.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::asset::{DELEGATED_VESTING_SHARES, RECEIVED_VESTING_SHARES, VESTING_SHARES};
use crate::models::hive::Account;
use crate::services::cache::ChainSnapshot;
use crate::services::history::parse_chain_time;

/// Seconds for voting power to regenerate from 0 to 100%
pub const VOTE_REGENERATION_SECONDS: i64 = 432_000;
pub const MAX_VOTING_POWER: u32 = 10_000;
const FULL_VOTE_WEIGHT: f64 = 10_000.0;

/// Stored voting power plus linear regeneration since the last vote, capped at 10000
pub fn regenerated_voting_power(stored: u32, last_vote_time: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let elapsed_secs = now.signed_duration_since(last_vote_time).num_seconds().max(0);
    let regenerated = elapsed_secs.saturating_mul(MAX_VOTING_POWER as i64) / VOTE_REGENERATION_SECONDS;
    let total = (stored as i64).saturating_add(regenerated);
    total.clamp(0, MAX_VOTING_POWER as i64) as u32
}

/// Own + received - delegated vesting shares
pub fn effective_vesting_shares(account: &Account) -> f64 {
    account.amount(VESTING_SHARES) + account.amount(RECEIVED_VESTING_SHARES)
        - account.amount(DELEGATED_VESTING_SHARES)
}

/// Inputs of the vote value formula, all as plain numbers
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoteValuation {
    /// Out of 10000
    pub current_voting_power: u32,
    pub effective_vesting_shares: f64,
    pub reward_balance: f64,
    pub recent_claims: f64,
    pub hbd_median_price: f64,
}

impl VoteValuation {
    pub fn from_chain(account: &Account, chain: &ChainSnapshot, now: DateTime<Utc>) -> Self {
        let current_voting_power = match account.last_vote_time.as_deref().and_then(parse_chain_time) {
            Some(last_vote) => regenerated_voting_power(account.voting_power, last_vote, now),
            None => account.voting_power.min(MAX_VOTING_POWER),
        };

        Self {
            current_voting_power,
            effective_vesting_shares: effective_vesting_shares(account),
            reward_balance: chain.reward_fund.reward_balance(),
            recent_claims: chain.reward_fund.recent_claims(),
            hbd_median_price: chain.price_feed.median_price(),
        }
    }

    /// USD value of a full-weight vote cast at `percent` voting power.
    /// `percent` is clamped to `[0, 100]`; unusable inputs yield 0.
    pub fn value_for_power(&self, percent: f64) -> f64 {
        let percent = if percent.is_finite() { percent.clamp(0.0, 100.0) } else { 0.0 };
        let voting_power = percent * 100.0;
        let power = (voting_power * FULL_VOTE_WEIGHT / 10_000.0) / 50.0;
        let rshares = power * self.effective_vesting_shares * 1e6 / 10_000.0;
        let value = rshares / self.recent_claims * self.reward_balance * self.hbd_median_price;

        if value.is_finite() { value } else { 0.0 }
    }

    /// Voting power as a percentage
    pub fn voting_power_percent(&self) -> f64 {
        self.current_voting_power as f64 / 100.0
    }

    pub fn current_value(&self) -> f64 {
        self.value_for_power(self.voting_power_percent())
    }
}

/// Dollar amount rounded for display
pub fn format_usd(value: f64) -> String {
    format!("{:.4}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample() -> VoteValuation {
        VoteValuation {
            current_voting_power: 10_000,
            effective_vesting_shares: 1_000_000.0,
            reward_balance: 100_000.0,
            recent_claims: 1e15,
            hbd_median_price: 1.0,
        }
    }

    #[test]
    fn test_value_matches_formula() {
        let valuation = sample();
        // power = 200, rshares = 200 * 1e12 / 1e4 = 2e10, value = 2e10 / 1e15 * 1e5
        assert_eq!(valuation.value_for_power(100.0), 2.0);
        assert_eq!(valuation.current_value(), 2.0);
        assert_eq!(format_usd(valuation.current_value()), "2.0000");
    }

    #[test]
    fn test_value_at_zero_power() {
        assert_eq!(sample().value_for_power(0.0), 0.0);
    }

    #[test]
    fn test_value_monotonic_in_power() {
        let valuation = sample();
        let mut previous = valuation.value_for_power(0.0);
        for percent in 1..=100 {
            let value = valuation.value_for_power(percent as f64);
            assert!(value >= previous, "value dropped at {}%", percent);
            previous = value;
        }
        assert_eq!(valuation.value_for_power(150.0), valuation.value_for_power(100.0));
    }

    #[test]
    fn test_value_with_zero_claims_is_zero() {
        let mut valuation = sample();
        valuation.recent_claims = 0.0;
        assert_eq!(valuation.value_for_power(50.0), 0.0);
    }

    #[test]
    fn test_regeneration() {
        let last = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        // One day regenerates 20%
        let one_day = last + Duration::days(1);
        assert_eq!(regenerated_voting_power(5_000, last, one_day), 7_000);

        // Partial seconds floor
        let short = last + Duration::seconds(43);
        assert_eq!(regenerated_voting_power(5_000, last, short), 5_000 + 43 * 10_000 / 432_000);

        // Capped at 10000
        let week = last + Duration::days(7);
        assert_eq!(regenerated_voting_power(5_000, last, week), 10_000);

        // Clock skew does not drain power
        assert_eq!(regenerated_voting_power(5_000, one_day, last), 5_000);
    }
}
