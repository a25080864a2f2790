use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::hive::VestingDelegation;
use crate::services::delegations::IncomingDelegation;

/// Response for GET /api/accounts/{username}/delegations
#[derive(Debug, Clone, Serialize)]
pub struct DelegationsResponse {
    pub username: String,
    pub outgoing: Vec<VestingDelegation>,
    pub incoming: Vec<IncomingDelegation>,
    pub incoming_approximate: bool,
    pub total_outgoing_vests: Decimal,
    pub total_incoming_vests: Decimal,
    pub total_outgoing_hp: f64,
    pub total_incoming_hp: f64,
}
