//! Wire types for the condenser/bridge/rc JSON-RPC results used by the dashboard.
//!
//! Amount fields whose names changed across chain history are kept in the
//! flattened `fields` maps and read through [`FieldCandidates`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::asset::{
    value_amount, Asset, FieldCandidates, TOTAL_VESTING_FUND, TOTAL_VESTING_SHARES,
};

/// One entry of `condenser_api.get_accounts`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    /// Voting power at `last_vote_time`, out of 10000
    #[serde(default)]
    pub voting_power: u32,
    #[serde(default)]
    pub last_vote_time: Option<String>,
    /// Raw reputation, a number or a numeric string depending on the node
    #[serde(default)]
    pub reputation: Value,
    #[serde(default)]
    pub post_count: u64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Account {
    pub fn amount(&self, candidates: FieldCandidates) -> f64 {
        candidates.amount(&self.fields)
    }

    pub fn raw_reputation(&self) -> f64 {
        value_amount(&self.reputation)
    }
}

/// `condenser_api.get_dynamic_global_properties`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DynamicGlobalProperties {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DynamicGlobalProperties {
    /// HIVE per VEST. Falls back to 1 when the pool values are missing.
    pub fn vests_to_hp(&self) -> f64 {
        let ratio = TOTAL_VESTING_FUND.amount(&self.fields) / TOTAL_VESTING_SHARES.amount(&self.fields);
        if ratio.is_finite() { ratio } else { 1.0 }
    }
}

/// `condenser_api.get_reward_fund`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardFund {
    #[serde(default)]
    pub reward_balance: String,
    #[serde(default)]
    pub recent_claims: Value,
}

impl RewardFund {
    pub fn reward_balance(&self) -> f64 {
        crate::models::asset::parse_amount(&self.reward_balance)
    }

    pub fn recent_claims(&self) -> f64 {
        value_amount(&self.recent_claims)
    }
}

/// `condenser_api.get_current_median_history_price`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceFeed {
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub quote: String,
}

impl PriceFeed {
    /// `base / quote`, or 1 when the feed is unusable
    pub fn median_price(&self) -> f64 {
        let price = crate::models::asset::parse_amount(&self.base)
            / crate::models::asset::parse_amount(&self.quote);
        if price.is_finite() { price } else { 1.0 }
    }
}

/// One delegation from `get_vesting_delegations` or `list_vesting_delegations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VestingDelegation {
    pub delegator: String,
    pub delegatee: String,
    pub vesting_shares: Asset,
    #[serde(default, alias = "delegation_date")]
    pub min_delegation_time: Option<String>,
}

/// One entry of `condenser_api.get_followers`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowEntry {
    pub follower: String,
    pub following: String,
    #[serde(default)]
    pub what: Vec<String>,
}

/// One entry of `condenser_api.get_account_votes`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountVote {
    #[serde(default)]
    pub authorperm: String,
    #[serde(default)]
    pub percent: Value,
}

impl AccountVote {
    pub fn is_upvote(&self) -> bool {
        value_amount(&self.percent) > 0.0
    }
}

/// One entry of `condenser_api.get_blog`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogEntry {
    #[serde(default)]
    pub comment: Option<Map<String, Value>>,
    #[serde(default)]
    pub net_votes: Option<Value>,
}

impl BlogEntry {
    /// Net votes of the post; reads the nested comment first
    pub fn net_votes(&self) -> i64 {
        let nested = self.comment.as_ref().and_then(|c| c.get("net_votes"));
        nested
            .or(self.net_votes.as_ref())
            .map(|v| value_amount(v) as i64)
            .unwrap_or(0)
    }
}

/// `bridge.get_profile`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stats: Option<ProfileStats>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileStats {
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
}

/// One entry of `condenser_api.get_account_reputations`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountReputation {
    pub account: String,
    #[serde(default)]
    pub reputation: Value,
}

/// `rc_api.find_rc_accounts` result body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RcAccounts {
    #[serde(default)]
    pub rc_accounts: Vec<RcAccount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RcAccount {
    pub account: String,
    pub rc_manabar: RcManabar,
    #[serde(default)]
    pub max_rc: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RcManabar {
    #[serde(default)]
    pub current_mana: Value,
}

impl RcAccount {
    pub fn current_mana(&self) -> f64 {
        value_amount(&self.rc_manabar.current_mana)
    }

    /// Current mana as a percentage of max RC, 0 when max RC is unknown
    pub fn percent(&self) -> f64 {
        let pct = self.current_mana() / value_amount(&self.max_rc) * 100.0;
        if pct.is_finite() { pct } else { 0.0 }
    }
}

/// `database_api.list_vesting_delegations` result body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DelegationList {
    #[serde(default)]
    pub delegations: Vec<VestingDelegation>,
}
