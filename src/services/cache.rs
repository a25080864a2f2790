//! Time-boxed caches for chain-wide values.
//!
//! Entries are `(value, fetched_at)` pairs checked with an explicit freshness
//! predicate. Writes are last-writer-wins and nothing is invalidated except by
//! expiry.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::future::Future;
use std::time::Duration;

use crate::error::RpcError;
use crate::models::hive::{DynamicGlobalProperties, PriceFeed, RewardFund};
use crate::services::hive_rpc::HiveClient;

#[derive(Debug, Clone)]
pub struct Timed<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> Timed<T> {
    pub fn new(value: T, fetched_at: DateTime<Utc>) -> Self {
        Self { value, fetched_at }
    }

    /// Fresh while `now - fetched_at < ttl`. Entries stamped in the future
    /// (clock moved backwards) count as stale.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let age = now.signed_duration_since(self.fetched_at);
        match age.to_std() {
            Ok(age) => age < ttl,
            Err(_) => false,
        }
    }
}

/// Single-slot cache for one value
pub struct TimedCache<T> {
    slot: RwLock<Option<Timed<T>>>,
    ttl: Duration,
}

impl<T: Clone> TimedCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl,
        }
    }

    pub fn get_fresh(&self, now: DateTime<Utc>) -> Option<T> {
        let slot = self.slot.read();
        slot.as_ref()
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| entry.value.clone())
    }

    pub fn put(&self, value: T, now: DateTime<Utc>) {
        *self.slot.write() = Some(Timed::new(value, now));
    }

    /// Return the fresh value or run `fetch` and store its result.
    /// Failed fetches leave the slot untouched.
    pub async fn get_or_fetch<F, Fut>(&self, now: DateTime<Utc>, fetch: F) -> Result<T, RpcError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RpcError>>,
    {
        if let Some(value) = self.get_fresh(now) {
            return Ok(value);
        }

        let value = fetch().await?;
        self.put(value.clone(), now);
        Ok(value)
    }
}

/// Chain-wide inputs shared by every account lookup
pub struct ChainCache {
    pub globals: TimedCache<DynamicGlobalProperties>,
    pub reward_fund: TimedCache<RewardFund>,
    pub price_feed: TimedCache<PriceFeed>,
}

/// The three chain-wide values needed for valuation, fetched together
#[derive(Debug, Clone)]
pub struct ChainSnapshot {
    pub globals: DynamicGlobalProperties,
    pub reward_fund: RewardFund,
    pub price_feed: PriceFeed,
}

impl ChainCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            globals: TimedCache::new(ttl),
            reward_fund: TimedCache::new(ttl),
            price_feed: TimedCache::new(ttl),
        }
    }

    pub async fn globals(&self, hive: &HiveClient) -> Result<DynamicGlobalProperties, RpcError> {
        self.globals
            .get_or_fetch(Utc::now(), || hive.get_dynamic_global_properties())
            .await
    }

    pub async fn reward_fund(&self, hive: &HiveClient) -> Result<RewardFund, RpcError> {
        self.reward_fund
            .get_or_fetch(Utc::now(), || hive.get_reward_fund())
            .await
    }

    pub async fn price_feed(&self, hive: &HiveClient) -> Result<PriceFeed, RpcError> {
        self.price_feed
            .get_or_fetch(Utc::now(), || hive.get_current_median_history_price())
            .await
    }

    pub async fn snapshot(&self, hive: &HiveClient) -> Result<ChainSnapshot, RpcError> {
        let (globals, reward_fund, price_feed) = tokio::join!(
            self.globals(hive),
            self.reward_fund(hive),
            self.price_feed(hive)
        );
        Ok(ChainSnapshot {
            globals: globals?,
            reward_fund: reward_fund?,
            price_feed: price_feed?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_is_fresh_window() {
        let entry = Timed::new(1u32, at(0));
        let ttl = Duration::from_secs(60);
        assert!(entry.is_fresh(at(0), ttl));
        assert!(entry.is_fresh(at(59), ttl));
        assert!(!entry.is_fresh(at(60), ttl));
        assert!(!entry.is_fresh(at(-1), ttl));
    }

    #[test]
    fn test_last_writer_wins() {
        let cache = TimedCache::new(Duration::from_secs(60));
        cache.put(1u32, at(0));
        cache.put(2u32, at(1));
        assert_eq!(cache.get_fresh(at(2)), Some(2));
        assert_eq!(cache.get_fresh(at(61)), None);
    }

    #[tokio::test]
    async fn test_get_or_fetch_uses_fresh_value() {
        let cache = TimedCache::new(Duration::from_secs(60));
        let first = cache
            .get_or_fetch(at(0), || async { Ok::<_, RpcError>(10u32) })
            .await
            .unwrap();
        let second = cache
            .get_or_fetch(at(30), || async { Ok::<_, RpcError>(20u32) })
            .await
            .unwrap();
        let third = cache
            .get_or_fetch(at(90), || async { Ok::<_, RpcError>(30u32) })
            .await
            .unwrap();

        assert_eq!((first, second, third), (10, 10, 30));
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_slot_empty() {
        let cache: TimedCache<u32> = TimedCache::new(Duration::from_secs(60));
        let result = cache
            .get_or_fetch(at(0), || async { Err(RpcError::NotFound("x".into())) })
            .await;
        assert!(result.is_err());
        assert_eq!(cache.get_fresh(at(0)), None);
    }
}
