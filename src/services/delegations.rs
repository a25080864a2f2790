//! Outgoing and incoming vesting delegations.
//!
//! Outgoing delegations come straight from `get_vesting_delegations`.
//! Nodes have no reliable "delegations received by X" query, so incoming
//! delegations are discovered in stages and may be incomplete:
//!
//! 1. delegators named in the account's own history
//! 2. exact delegatee lookups (`find_vesting_delegations`, then the
//!    `database_api` delegation index)
//! 3. followers, then active witnesses, checked with bounded concurrency
//!    under a deadline
//!
//! Discovery stops as soon as the identified shares cover the account's
//! `received_vesting_shares`.

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::config::FanoutConfig;
use crate::error::RpcError;
use crate::models::asset::{Asset, RECEIVED_VESTING_SHARES};
use crate::models::hive::{Account, VestingDelegation};
use crate::services::cache::ChainCache;
use crate::services::hive_rpc::HiveClient;
use crate::services::history::normalize_entry;

/// Outgoing delegations requested per account
const OUTGOING_LIMIT: u32 = 1000;
/// Delegations scanned per checked candidate
const CANDIDATE_LIMIT: u32 = 100;
const FOLLOWER_LIMIT: u32 = 1000;
const INDEX_PAGE: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    History,
    DelegateeLookup,
    DelegationIndex,
    Followers,
    Witnesses,
}

impl DiscoverySource {
    /// Follower and witness lookups guess at candidates rather than query by delegatee
    pub fn is_speculative(&self) -> bool {
        matches!(self, DiscoverySource::Followers | DiscoverySource::Witnesses)
    }
}

impl fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiscoverySource::History => "history",
            DiscoverySource::DelegateeLookup => "delegatee_lookup",
            DiscoverySource::DelegationIndex => "delegation_index",
            DiscoverySource::Followers => "followers",
            DiscoverySource::Witnesses => "witnesses",
        };
        write!(f, "{}", name)
    }
}

/// One row of the incoming list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IncomingDelegation {
    Identified {
        delegation: VestingDelegation,
        source: DiscoverySource,
    },
    /// Received shares known from the account but with no delegator found
    UnidentifiedAggregate { vesting_shares: Asset },
}

impl IncomingDelegation {
    pub fn vesting_shares(&self) -> &Asset {
        match self {
            IncomingDelegation::Identified { delegation, .. } => &delegation.vesting_shares,
            IncomingDelegation::UnidentifiedAggregate { vesting_shares } => vesting_shares,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomingDelegations {
    pub entries: Vec<IncomingDelegation>,
    /// Set when a speculative stage contributed or the identified delegations
    /// do not add up to the received shares
    pub approximate: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DelegationSummary {
    pub username: String,
    pub vests_to_hp: f64,
    pub outgoing: Vec<VestingDelegation>,
    pub incoming: IncomingDelegations,
    pub total_outgoing_vests: Decimal,
    pub total_incoming_vests: Decimal,
    pub total_outgoing_hp: f64,
    pub total_incoming_hp: f64,
}

/// `received_vesting_shares` of an account as an exact amount
pub fn received_shares(account: &Account) -> Asset {
    RECEIVED_VESTING_SHARES
        .lookup(&account.fields)
        .and_then(|value| serde_json::from_value::<Asset>(value.clone()).ok())
        .unwrap_or_else(|| Asset::zero("VESTS"))
}

/// Delegators named by `delegate_vesting_shares` operations towards `delegatee`,
/// in history order, without duplicates
pub fn history_delegators(raw_history: &[serde_json::Value], delegatee: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw_history
        .iter()
        .filter_map(normalize_entry)
        .filter(|record| record.operation_type == "delegate_vesting_shares")
        .filter(|record| record.str_field("delegatee").eq_ignore_ascii_case(delegatee))
        .map(|record| record.str_field("delegator").to_string())
        .filter(|delegator| !delegator.is_empty() && seen.insert(delegator.to_lowercase()))
        .collect()
}

/// Sum of amounts, ignoring units
pub fn total_shares<'a>(shares: impl IntoIterator<Item = &'a Asset>) -> Decimal {
    shares.into_iter().map(|asset| asset.amount).sum()
}

/// Collects identified delegations, first entry per delegator wins
#[derive(Debug, Default)]
struct Discovery {
    found: Vec<(VestingDelegation, DiscoverySource)>,
    delegators: HashSet<String>,
    identified: Decimal,
}

impl Discovery {
    fn add(&mut self, delegation: VestingDelegation, source: DiscoverySource) -> bool {
        if !self.delegators.insert(delegation.delegator.to_lowercase()) {
            return false;
        }
        self.identified += delegation.vesting_shares.amount;
        self.found.push((delegation, source));
        true
    }

    fn knows(&self, delegator: &str) -> bool {
        self.delegators.contains(&delegator.to_lowercase())
    }

    fn covers(&self, received: Decimal) -> bool {
        self.identified >= received
    }

    fn finish(self, received: &Asset) -> IncomingDelegations {
        if self.found.is_empty() {
            return IncomingDelegations {
                entries: vec![IncomingDelegation::UnidentifiedAggregate {
                    vesting_shares: received.clone(),
                }],
                approximate: true,
            };
        }

        let speculative = self.found.iter().any(|(_, source)| source.is_speculative());
        let approximate = speculative || !self.covers(received.amount);
        IncomingDelegations {
            entries: self
                .found
                .into_iter()
                .map(|(delegation, source)| IncomingDelegation::Identified { delegation, source })
                .collect(),
            approximate,
        }
    }
}

fn to_delegatee(delegations: Vec<VestingDelegation>, delegatee: &str) -> Vec<VestingDelegation> {
    delegations
        .into_iter()
        .filter(|d| d.delegatee.eq_ignore_ascii_case(delegatee))
        .collect()
}

#[derive(Clone)]
pub struct DelegationService {
    hive: HiveClient,
    chain: Arc<ChainCache>,
    fanout: FanoutConfig,
    history_limit: u32,
}

impl DelegationService {
    pub fn new(hive: HiveClient, chain: Arc<ChainCache>, fanout: FanoutConfig, history_limit: u32) -> Self {
        Self {
            hive,
            chain,
            fanout,
            history_limit,
        }
    }

    pub async fn get_delegations(&self, username: &str) -> Result<DelegationSummary, RpcError> {
        let username = username.to_lowercase();
        info!("Fetching delegations for @{}", username);

        let (account, globals, outgoing) = tokio::join!(
            self.hive.get_account(&username),
            self.chain.globals(&self.hive),
            self.hive.get_vesting_delegations(&username, OUTGOING_LIMIT),
        );
        let account = account?;
        let vests_to_hp = globals?.vests_to_hp();
        let outgoing = outgoing?;

        let received = received_shares(&account);
        let incoming = if received.is_positive() {
            self.discover_incoming(&username, &received).await
        } else {
            IncomingDelegations {
                entries: Vec::new(),
                approximate: false,
            }
        };

        let total_outgoing_vests = total_shares(outgoing.iter().map(|d| &d.vesting_shares));
        let total_incoming_vests = total_shares(incoming.entries.iter().map(|e| e.vesting_shares()));

        Ok(DelegationSummary {
            username,
            vests_to_hp,
            total_outgoing_hp: total_outgoing_vests.to_f64().unwrap_or(0.0) * vests_to_hp,
            total_incoming_hp: total_incoming_vests.to_f64().unwrap_or(0.0) * vests_to_hp,
            outgoing,
            incoming,
            total_outgoing_vests,
            total_incoming_vests,
        })
    }

    async fn discover_incoming(&self, username: &str, received: &Asset) -> IncomingDelegations {
        let started = Utc::now();
        let mut discovery = Discovery::default();

        match self.hive.get_account_history(username, self.history_limit).await {
            Ok(raw) => {
                let candidates = history_delegators(&raw, username);
                debug!("History names {} delegators of @{}", candidates.len(), username);
                self.check_candidates(candidates, username, received.amount, DiscoverySource::History, &mut discovery)
                    .await;
            }
            Err(e) => warn!("History lookup for delegations of @{} failed: {}", username, e),
        }

        if !discovery.covers(received.amount) {
            match self.hive.find_vesting_delegations(username).await {
                Ok(list) => {
                    for delegation in to_delegatee(list, username) {
                        discovery.add(delegation, DiscoverySource::DelegateeLookup);
                    }
                }
                Err(e) => warn!("find_vesting_delegations for @{} failed: {}", username, e),
            }
        }

        if !discovery.covers(received.amount) {
            match self.hive.list_vesting_delegations(username, INDEX_PAGE).await {
                Ok(list) => {
                    for delegation in to_delegatee(list, username) {
                        discovery.add(delegation, DiscoverySource::DelegationIndex);
                    }
                }
                Err(e) => warn!("list_vesting_delegations for @{} failed: {}", username, e),
            }
        }

        if !discovery.covers(received.amount) {
            match self.hive.get_followers(username, FOLLOWER_LIMIT).await {
                Ok(followers) => {
                    let candidates = followers.into_iter().map(|f| f.follower).collect();
                    self.check_candidates(candidates, username, received.amount, DiscoverySource::Followers, &mut discovery)
                        .await;
                }
                Err(e) => warn!("Follower lookup for @{} failed: {}", username, e),
            }
        }

        if !discovery.covers(received.amount) {
            match self.hive.get_active_witnesses().await {
                Ok(witnesses) => {
                    self.check_candidates(witnesses, username, received.amount, DiscoverySource::Witnesses, &mut discovery)
                        .await;
                }
                Err(e) => warn!("Witness lookup failed: {}", e),
            }
        }

        let incoming = discovery.finish(received);
        info!(
            "Identified {} incoming delegation entries for @{} in {}ms (approximate: {})",
            incoming.entries.len(),
            username,
            (Utc::now() - started).num_milliseconds(),
            incoming.approximate
        );
        incoming
    }

    /// Check each candidate's outgoing delegations for `delegatee`.
    ///
    /// At most `max_candidates` unknown candidates are checked, `concurrency`
    /// at a time. The stage ends early on coverage or at the deadline;
    /// failed candidates are skipped.
    async fn check_candidates(
        &self,
        candidates: Vec<String>,
        delegatee: &str,
        received: Decimal,
        source: DiscoverySource,
        discovery: &mut Discovery,
    ) {
        let candidates: Vec<String> = candidates
            .into_iter()
            .filter(|candidate| !candidate.is_empty() && !discovery.knows(candidate))
            .take(self.fanout.max_candidates)
            .collect();

        if candidates.is_empty() {
            return;
        }

        debug!("Checking {} {} candidates for @{}", candidates.len(), source, delegatee);

        let deadline = Instant::now() + self.fanout.deadline;
        let mut results = stream::iter(candidates)
            .map(|candidate| {
                let hive = self.hive.clone();
                async move {
                    let result = hive.get_vesting_delegations(&candidate, CANDIDATE_LIMIT).await;
                    (candidate, result)
                }
            })
            .buffer_unordered(self.fanout.concurrency.max(1));

        loop {
            match timeout_at(deadline, results.next()).await {
                Ok(Some((_, Ok(delegations)))) => {
                    for delegation in to_delegatee(delegations, delegatee) {
                        discovery.add(delegation, source);
                    }
                    if discovery.covers(received) {
                        debug!("{} stage covered received shares of @{}", source, delegatee);
                        break;
                    }
                }
                Ok(Some((candidate, Err(e)))) => {
                    warn!("Delegation check of @{} failed: {}", candidate, e);
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        "{} stage for @{} stopped at the {}ms deadline",
                        source,
                        delegatee,
                        self.fanout.deadline.as_millis()
                    );
                    break;
                }
            }
        }
    }
}
