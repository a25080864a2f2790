use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::error::RpcError;
use crate::models::asset::{
    HBD_BALANCE, HIVE_BALANCE, REWARD_HBD, REWARD_HIVE, REWARD_VESTING_HIVE, SAVINGS_HBD,
    SAVINGS_HIVE,
};
use crate::models::hive::Account;
use crate::services::account_stats::HivePower;
use crate::services::cache::ChainCache;
use crate::services::hive_rpc::HiveClient;

/// Wallet figures for one account, amounts in their own unit and in USD.
///
/// Liquid HIVE, HBD and HP are valued at the median feed price. Savings and
/// pending rewards add their HBD part unscaled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceSummary {
    pub username: String,
    pub hive: f64,
    pub hbd: f64,
    pub hive_power: HivePower,
    pub savings_hive: f64,
    pub savings_hbd: f64,
    pub reward_hive: f64,
    pub reward_hbd: f64,
    pub reward_vesting_hive: f64,
    pub hive_price: f64,
    pub hive_usd: f64,
    pub hbd_usd: f64,
    pub hive_power_usd: f64,
    pub effective_hive_power_usd: f64,
    pub savings_usd: f64,
    pub rewards_usd: f64,
    /// Liquid + HBD + own HP + savings
    pub total_usd: f64,
}

pub fn summarize_balance(account: &Account, vests_to_hp: f64, hive_price: f64) -> BalanceSummary {
    let hive = account.amount(HIVE_BALANCE);
    let hbd = account.amount(HBD_BALANCE);
    let hive_power = HivePower::from_account(account, vests_to_hp);
    let savings_hive = account.amount(SAVINGS_HIVE);
    let savings_hbd = account.amount(SAVINGS_HBD);
    let reward_hive = account.amount(REWARD_HIVE);
    let reward_hbd = account.amount(REWARD_HBD);
    let reward_vesting_hive = account.amount(REWARD_VESTING_HIVE);

    let hive_usd = hive * hive_price;
    let hbd_usd = hbd * hive_price;
    let hive_power_usd = hive_power.own * hive_price;
    let savings_usd = savings_hive * hive_price + savings_hbd;

    BalanceSummary {
        username: account.name.clone(),
        hive,
        hbd,
        hive_power,
        savings_hive,
        savings_hbd,
        reward_hive,
        reward_hbd,
        reward_vesting_hive,
        hive_price,
        hive_usd,
        hbd_usd,
        hive_power_usd,
        effective_hive_power_usd: hive_power.effective * hive_price,
        savings_usd,
        rewards_usd: reward_hive * hive_price + reward_hbd + reward_vesting_hive * hive_price,
        total_usd: hive_usd + hbd_usd + hive_power_usd + savings_usd,
    }
}

#[derive(Clone)]
pub struct BalanceService {
    hive: HiveClient,
    chain: Arc<ChainCache>,
}

impl BalanceService {
    pub fn new(hive: HiveClient, chain: Arc<ChainCache>) -> Self {
        Self { hive, chain }
    }

    pub async fn get_balance(&self, username: &str) -> Result<BalanceSummary, RpcError> {
        let username = username.to_lowercase();
        info!("Fetching balances for @{}", username);

        let (account, globals, price_feed) = tokio::join!(
            self.hive.get_account(&username),
            self.chain.globals(&self.hive),
            self.chain.price_feed(&self.hive),
        );

        Ok(summarize_balance(
            &account?,
            globals?.vests_to_hp(),
            price_feed?.median_price(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summarize_balance() {
        let account: Account = serde_json::from_value(json!({
            "name": "alice",
            "balance": "10.000 HIVE",
            "hbd_balance": "5.000 HBD",
            "savings_balance": "2.000 HIVE",
            "savings_hbd_balance": "1.000 HBD",
            "reward_hive_balance": "1.000 HIVE",
            "reward_hbd_balance": "0.500 HBD",
            "reward_vesting_hive": "2.000 HIVE",
            "vesting_shares": "200.000000 VESTS",
            "delegated_vesting_shares": "20.000000 VESTS",
            "received_vesting_shares": "0.000000 VESTS",
        }))
        .unwrap();

        let summary = summarize_balance(&account, 0.5, 0.25);
        assert_eq!(summary.hive_usd, 2.5);
        assert_eq!(summary.hbd_usd, 1.25);
        assert_eq!(summary.hive_power.own, 100.0);
        assert_eq!(summary.hive_power_usd, 25.0);
        assert_eq!(summary.effective_hive_power_usd, 22.5);
        assert_eq!(summary.savings_usd, 1.5);
        assert_eq!(summary.rewards_usd, 1.25);
        assert_eq!(summary.total_usd, 30.25);
    }

    #[test]
    fn test_hbd_valued_at_feed_price() {
        let account: Account = serde_json::from_value(json!({
            "name": "carol",
            "hbd_balance": "4.000 HBD",
        }))
        .unwrap();

        let summary = summarize_balance(&account, 1.0, 0.25);
        assert_eq!(summary.hbd_usd, 1.0);
        assert_eq!(summary.total_usd, 1.0);

        let summary = summarize_balance(&account, 1.0, 2.0);
        assert_eq!(summary.hbd_usd, 8.0);
        assert_eq!(summary.total_usd, 8.0);
    }

    #[test]
    fn test_legacy_field_names() {
        let account: Account = serde_json::from_value(json!({
            "name": "old",
            "balance": "1.000 STEEM",
            "sbd_balance": "3.000 SBD",
            "savings_sbd_balance": "4.000 SBD",
            "reward_steem_balance": "1.000 STEEM",
        }))
        .unwrap();

        let summary = summarize_balance(&account, 1.0, 1.0);
        assert_eq!(summary.hbd, 3.0);
        assert_eq!(summary.savings_hbd, 4.0);
        assert_eq!(summary.reward_hive, 1.0);
        assert_eq!(summary.hive_power.own, 0.0);
        assert_eq!(summary.total_usd, 8.0);
    }
}
