use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    handlers::{upstream_error, ApiError},
    models::delegations::DelegationsResponse,
    AppState,
};

/// Handler for GET /api/accounts/{username}/delegations
pub async fn get_delegations(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<DelegationsResponse>, ApiError> {
    let summary = state
        .delegations
        .get_delegations(&username)
        .await
        .map_err(|e| upstream_error("Failed to load delegations", e))?;

    tracing::info!(
        "@{} has {} outgoing and {} incoming delegation entries",
        summary.username,
        summary.outgoing.len(),
        summary.incoming.entries.len()
    );

    Ok(Json(DelegationsResponse {
        username: summary.username,
        outgoing: summary.outgoing,
        incoming: summary.incoming.entries,
        incoming_approximate: summary.incoming.approximate,
        total_outgoing_vests: summary.total_outgoing_vests,
        total_incoming_vests: summary.total_incoming_vests,
        total_outgoing_hp: summary.total_outgoing_hp,
        total_incoming_hp: summary.total_incoming_hp,
    }))
}
