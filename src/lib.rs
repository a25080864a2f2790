// src/lib.rs

use axum::{http::Method, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use config::AppConfig;
use services::{
    account_stats::AccountStatsService, balance::BalanceService, cache::ChainCache,
    delegations::DelegationService, hive_rpc::HiveClient, history::HistorySessions,
};

#[derive(Clone)]
pub struct AppState {
    pub hive: HiveClient,
    pub account_stats: AccountStatsService,
    pub balances: BalanceService,
    pub delegations: DelegationService,
    pub history: HistorySessions,
}

impl AppState {
    pub fn new(config: AppConfig, hive: HiveClient) -> Self {
        let ttl = config.cache_ttl();
        let chain = Arc::new(ChainCache::new(ttl));

        Self {
            account_stats: AccountStatsService::new(hive.clone(), chain.clone(), ttl),
            balances: BalanceService::new(hive.clone(), chain.clone()),
            delegations: DelegationService::new(
                hive.clone(),
                chain.clone(),
                config.fanout,
                config.history_limit,
            ),
            history: HistorySessions::new(ttl, config.history_limit, config.history_window_days),
            hive,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(handlers::health))
        .route(
            "/api/accounts/{username}/stats",
            get(handlers::accounts::get_account_stats),
        )
        .route(
            "/api/accounts/{username}/vote-value",
            get(handlers::accounts::get_vote_value),
        )
        .route(
            "/api/accounts/{username}/balance",
            get(handlers::accounts::get_balance),
        )
        .route(
            "/api/accounts/{username}/operations",
            get(handlers::operations::get_operations),
        )
        .route(
            "/api/accounts/{username}/delegations",
            get(handlers::delegations::get_delegations),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub mod config;
pub mod error;

pub mod services {
    pub mod account_stats;
    pub mod balance;
    pub mod cache;
    pub mod classifier;
    pub mod delegations;
    pub mod describe;
    pub mod hive_rpc;
    pub mod history;
    pub mod valuation;
}

pub mod models;
pub mod handlers;
