use serde::{Deserialize, Serialize};

use crate::services::account_stats::HivePower;
use crate::services::balance::BalanceSummary;
use crate::services::valuation::VoteValuation;

/// Response for GET /api/accounts/{username}/stats
#[derive(Debug, Clone, Serialize)]
pub struct AccountStatsResponse {
    pub username: String,
    pub vote_value: f64,
    pub vote_value_display: String,     // "$0.1234"
    pub voting_power: f64,              // percent
    pub hive_power: HivePower,
    pub rc_percent: f64,
    pub rc_mana: f64,
    pub reputation: i64,
    pub followers: u64,
    pub following: u64,
    pub votes_given: usize,
    pub votes_received: i64,
    pub post_count: u64,
    pub valuation: VoteValuation,
    pub fetched_at: String,
}

/// Query parameters for GET /api/accounts/{username}/vote-value
#[derive(Debug, Clone, Deserialize)]
pub struct VoteValueQuery {
    pub percent: Option<f64>,           // Defaults to current voting power
}

#[derive(Debug, Clone, Serialize)]
pub struct VoteValueResponse {
    pub username: String,
    pub percent: f64,
    pub vote_value: f64,
    pub vote_value_display: String,
    pub current_voting_power: f64,
}

/// Response for GET /api/accounts/{username}/balance
#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    #[serde(flatten)]
    pub balance: BalanceSummary,
    pub total_display: String,
}
