use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::RpcError;
use crate::models::asset::{DELEGATED_VESTING_SHARES, RECEIVED_VESTING_SHARES, VESTING_SHARES};
use crate::models::asset::value_amount;
use crate::models::hive::Account;
use crate::services::cache::{ChainCache, ChainSnapshot};
use crate::services::hive_rpc::HiveClient;
use crate::services::valuation::VoteValuation;

/// Blog entries scanned when counting received upvotes
const BLOG_SAMPLE: u32 = 50;

/// Reputation score as shown on Hive front ends.
///
/// `0 -> 25`; otherwise `max(log10(|rep|) - 9, 0)` scaled by 9 and offset
/// by 25, sign preserved, never below 1.
pub fn reputation_score(raw: f64) -> i64 {
    if raw == 0.0 || !raw.is_finite() {
        return 25;
    }
    let mut level = (raw.abs().log10() - 9.0).max(0.0);
    if raw < 0.0 {
        level = -level;
    }
    ((level * 9.0 + 25.0).floor() as i64).max(1)
}

/// Stake of an account in HIVE Power
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HivePower {
    pub own: f64,
    pub delegated: f64,
    pub received: f64,
    pub effective: f64,
}

impl HivePower {
    pub fn from_account(account: &Account, vests_to_hp: f64) -> Self {
        let own_vests = account.amount(VESTING_SHARES);
        let delegated_vests = account.amount(DELEGATED_VESTING_SHARES);
        let received_vests = account.amount(RECEIVED_VESTING_SHARES);

        Self {
            own: own_vests * vests_to_hp,
            delegated: delegated_vests * vests_to_hp,
            received: received_vests * vests_to_hp,
            effective: (own_vests - delegated_vests + received_vests) * vests_to_hp,
        }
    }
}

/// Everything shown on the main stats card for one account
#[derive(Debug, Clone, Serialize)]
pub struct AccountStats {
    pub username: String,
    pub valuation: VoteValuation,
    pub vote_value: f64,
    /// Percent, 0-100
    pub voting_power: f64,
    pub hive_power: HivePower,
    pub rc_percent: f64,
    pub rc_mana: f64,
    pub reputation: i64,
    pub followers: u64,
    pub following: u64,
    pub votes_given: usize,
    pub votes_received: i64,
    pub post_count: u64,
    pub fetched_at: DateTime<Utc>,
}

/// Side lookups that only decorate the stats; failed lookups leave defaults
#[derive(Debug, Clone, Default)]
pub struct SocialFacts {
    pub reputation: Option<f64>,
    pub rc_percent: f64,
    pub rc_mana: f64,
    pub followers: u64,
    pub following: u64,
    pub votes_given: usize,
    pub votes_received: i64,
}

pub fn assemble_stats(
    account: &Account,
    chain: &ChainSnapshot,
    social: SocialFacts,
    now: DateTime<Utc>,
) -> AccountStats {
    let valuation = VoteValuation::from_chain(account, chain, now);
    let raw_reputation = social.reputation.unwrap_or_else(|| account.raw_reputation());

    AccountStats {
        username: account.name.clone(),
        vote_value: valuation.current_value(),
        voting_power: valuation.voting_power_percent(),
        valuation,
        hive_power: HivePower::from_account(account, chain.globals.vests_to_hp()),
        rc_percent: social.rc_percent,
        rc_mana: social.rc_mana,
        reputation: reputation_score(raw_reputation),
        followers: social.followers,
        following: social.following,
        votes_given: social.votes_given,
        votes_received: social.votes_received,
        post_count: account.post_count,
        fetched_at: now,
    }
}

/// Assembles account stats and keeps them for one freshness window per user
#[derive(Clone)]
pub struct AccountStatsService {
    hive: HiveClient,
    chain: Arc<ChainCache>,
    cache: Arc<Cache<String, AccountStats>>,
}

impl AccountStatsService {
    pub fn new(hive: HiveClient, chain: Arc<ChainCache>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();

        Self {
            hive,
            chain,
            cache: Arc::new(cache),
        }
    }

    pub async fn get_stats(&self, username: &str) -> Result<AccountStats, RpcError> {
        let key = username.to_lowercase();

        if let Some(cached) = self.cache.get(&key).await {
            debug!("Cache hit for stats of @{}", key);
            return Ok(cached);
        }

        info!("Fetching account stats for @{}", key);

        let (account, chain) = tokio::join!(self.hive.get_account(&key), self.chain.snapshot(&self.hive));
        let account = account?;
        let chain = chain?;

        let social = self.fetch_social_facts(&key).await;
        let stats = assemble_stats(&account, &chain, social, Utc::now());

        self.cache.insert(key, stats.clone()).await;
        Ok(stats)
    }

    /// Current valuation inputs for the vote slider
    pub async fn get_valuation(&self, username: &str) -> Result<VoteValuation, RpcError> {
        Ok(self.get_stats(username).await?.valuation)
    }

    async fn fetch_social_facts(&self, username: &str) -> SocialFacts {
        let (reputations, rc, profile, votes, blog) = tokio::join!(
            self.hive.get_account_reputations(username),
            self.hive.find_rc_account(username),
            self.hive.get_profile(username),
            self.hive.get_account_votes(username),
            self.hive.get_blog(username, BLOG_SAMPLE),
        );

        let mut facts = SocialFacts::default();

        match reputations {
            Ok(list) => {
                facts.reputation = list
                    .into_iter()
                    .find(|r| r.account.eq_ignore_ascii_case(username))
                    .map(|r| value_amount(&r.reputation));
            }
            Err(e) => warn!("Reputation lookup failed for @{}: {}", username, e),
        }

        match rc {
            Ok(Some(rc)) => {
                facts.rc_percent = rc.percent();
                facts.rc_mana = rc.current_mana();
            }
            Ok(None) => debug!("No RC account for @{}", username),
            Err(e) => warn!("RC lookup failed for @{}: {}", username, e),
        }

        match profile {
            Ok(profile) => {
                let stats = profile.stats.unwrap_or_default();
                facts.followers = stats.followers;
                facts.following = stats.following;
            }
            Err(e) => warn!("Profile lookup failed for @{}: {}", username, e),
        }

        match votes {
            Ok(votes) => facts.votes_given = votes.iter().filter(|v| v.is_upvote()).count(),
            Err(e) => warn!("Vote lookup failed for @{}: {}", username, e),
        }

        match blog {
            Ok(entries) => {
                facts.votes_received = entries.iter().map(|e| e.net_votes().max(0)).sum();
            }
            Err(e) => warn!("Blog lookup failed for @{}: {}", username, e),
        }

        facts
    }
}
