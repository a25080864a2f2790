use serde::{Deserialize, Serialize};

use crate::services::classifier::{Category, Direction};
use crate::services::describe::DetailRow;

/// Query parameters for GET /api/accounts/{username}/operations
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationsQuery {
    pub day: Option<String>,            // "all", "today", "yesterday", "day-N"
    pub filter: Option<String>,         // see FilterOption.key
}

/// One operation with its presentation values
#[derive(Debug, Clone, Serialize)]
pub struct OperationItem {
    pub transaction_id: String,
    pub block_number: u64,
    pub timestamp: String,
    pub operation_type: String,
    pub direction: Direction,
    pub categories: Vec<Category>,
    pub description: String,
    pub details: Vec<DetailRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayGroup {
    pub label: String,                  // "Today", "Yesterday", "Jan 5"
    pub operations: Vec<OperationItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterOption {
    pub key: String,
    pub label: String,
}

/// Response for GET /api/accounts/{username}/operations
#[derive(Debug, Clone, Serialize)]
pub struct OperationsResponse {
    pub username: String,
    pub day: String,
    pub filter: String,
    pub total_in_window: usize,
    pub count: usize,
    pub groups: Vec<DayGroup>,
    pub filters: Vec<FilterOption>,
}
