use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;

use crate::{
    handlers::{bad_request, upstream_error, ApiError},
    models::operations::{DayGroup, FilterOption, OperationItem, OperationsQuery, OperationsResponse},
    services::{
        classifier::{classify, filter_operations, DayBucket, OperationFilter},
        describe::{describe, details, group_by_day},
        history::OperationRecord,
    },
    AppState,
};

/// Handler for GET /api/accounts/{username}/operations?day=&filter=
/// Filters the cached history of the account; a fresh history is fetched
/// once the previous one expires.
pub async fn get_operations(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<OperationsQuery>,
) -> Result<Json<OperationsResponse>, ApiError> {
    let day: DayBucket = query
        .day
        .as_deref()
        .unwrap_or("all")
        .parse()
        .map_err(bad_request)?;
    let filter: OperationFilter = query
        .filter
        .as_deref()
        .unwrap_or("all")
        .parse()
        .map_err(bad_request)?;

    let viewer = username.to_lowercase();
    let records = state
        .history
        .load(&state.hive, &viewer)
        .await
        .map_err(|e| upstream_error("Failed to load account history", e))?;

    let now = Utc::now();
    let selected = filter_operations(&records, &viewer, day, filter, now);

    tracing::debug!(
        "@{}: {} of {} operations match day={} filter={}",
        viewer,
        selected.len(),
        records.len(),
        day,
        filter
    );

    let groups = group_by_day(&selected, now)
        .into_iter()
        .map(|(label, members)| DayGroup {
            label,
            operations: members.into_iter().map(|op| to_item(op, &viewer)).collect(),
        })
        .collect();

    Ok(Json(OperationsResponse {
        username: viewer,
        day: day.to_string(),
        filter: filter.to_string(),
        total_in_window: records.len(),
        count: selected.len(),
        groups,
        filters: OperationFilter::ALL
            .iter()
            .map(|f| FilterOption {
                key: f.as_str().to_string(),
                label: f.label().to_string(),
            })
            .collect(),
    }))
}

fn to_item(op: &OperationRecord, viewer: &str) -> OperationItem {
    let classification = classify(op, viewer);

    OperationItem {
        transaction_id: op.transaction_id.clone(),
        block_number: op.block_number,
        timestamp: op.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
        operation_type: op.operation_type.clone(),
        direction: classification.direction,
        categories: classification.categories,
        description: describe(op),
        details: details(op),
    }
}
