use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    handlers::{upstream_error, ApiError},
    models::stats::{AccountStatsResponse, BalanceResponse, VoteValueQuery, VoteValueResponse},
    services::valuation::format_usd,
    AppState,
};

/// Handler for GET /api/accounts/{username}/stats
pub async fn get_account_stats(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<AccountStatsResponse>, ApiError> {
    tracing::info!("Account stats requested for @{}", username);

    let stats = state
        .account_stats
        .get_stats(&username)
        .await
        .map_err(|e| upstream_error("Failed to load account stats", e))?;

    Ok(Json(AccountStatsResponse {
        vote_value_display: format!("${}", format_usd(stats.vote_value)),
        username: stats.username,
        vote_value: stats.vote_value,
        voting_power: stats.voting_power,
        hive_power: stats.hive_power,
        rc_percent: stats.rc_percent,
        rc_mana: stats.rc_mana,
        reputation: stats.reputation,
        followers: stats.followers,
        following: stats.following,
        votes_given: stats.votes_given,
        votes_received: stats.votes_received,
        post_count: stats.post_count,
        valuation: stats.valuation,
        fetched_at: stats.fetched_at.to_rfc3339(),
    }))
}

/// Handler for GET /api/accounts/{username}/vote-value?percent=
/// Values a full-weight vote at the given voting power, current power when omitted
pub async fn get_vote_value(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<VoteValueQuery>,
) -> Result<Json<VoteValueResponse>, ApiError> {
    let valuation = state
        .account_stats
        .get_valuation(&username)
        .await
        .map_err(|e| upstream_error("Failed to load vote valuation", e))?;

    let percent = query
        .percent
        .filter(|p| p.is_finite())
        .unwrap_or_else(|| valuation.voting_power_percent())
        .clamp(0.0, 100.0);
    let vote_value = valuation.value_for_power(percent);

    tracing::debug!("Vote value of @{} at {}%: {}", username, percent, vote_value);

    Ok(Json(VoteValueResponse {
        username: username.to_lowercase(),
        percent,
        vote_value,
        vote_value_display: format!("${}", format_usd(vote_value)),
        current_voting_power: valuation.voting_power_percent(),
    }))
}

/// Handler for GET /api/accounts/{username}/balance
pub async fn get_balance(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state
        .balances
        .get_balance(&username)
        .await
        .map_err(|e| upstream_error("Failed to load balances", e))?;

    tracing::info!("Balance of @{}: ${:.2} total", balance.username, balance.total_usd);

    Ok(Json(BalanceResponse {
        total_display: format!("${:.2}", balance.total_usd),
        balance,
    }))
}
