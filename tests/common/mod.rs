use async_trait::async_trait;
use hivestats_backend::{
    config::AppConfig,
    error::RpcError,
    services::hive_rpc::{HiveClient, RpcTransport},
    AppState,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// In-memory node: one canned `result` per JSON-RPC method.
/// Unscripted methods answer with an HTTP 503.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: HashMap<String, Value>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, method: &str, result: Value) -> Self {
        self.responses.insert(method.to_string(), result);
        self
    }
}

#[async_trait]
impl RpcTransport for ScriptedTransport {
    async fn call(&self, method: &str, _params: Value) -> Result<Value, RpcError> {
        tracing::debug!("Scripted call to {}", method);
        self.responses.get(method).cloned().ok_or_else(|| RpcError::Http {
            status: 503,
            body: format!("{} not scripted", method),
        })
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.fanout.deadline = Duration::from_secs(2);
    config
}

pub fn app_state(transport: ScriptedTransport) -> AppState {
    AppState::new(test_config(), HiveClient::new(Arc::new(transport)))
}

/// Chain-wide values giving 0.5 HP per VEST and a price of 1
pub fn chain_globals(transport: ScriptedTransport) -> ScriptedTransport {
    transport
        .with(
            "condenser_api.get_dynamic_global_properties",
            json!({
                "total_vesting_fund_hive": "1.000 HIVE",
                "total_vesting_shares": "2.000000 VESTS",
            }),
        )
        .with(
            "condenser_api.get_reward_fund",
            json!({
                "reward_balance": "100000.000 HIVE",
                "recent_claims": "1000000000000000",
            }),
        )
        .with(
            "condenser_api.get_current_median_history_price",
            json!({"base": "1.000 HBD", "quote": "1.000 HIVE"}),
        )
}

pub fn account(name: &str) -> Value {
    json!({
        "name": name,
        "voting_power": 10000,
        "reputation": "1000000000000",
        "post_count": 12,
        "balance": "10.000 HIVE",
        "hbd_balance": "5.000 HBD",
        "savings_balance": "0.000 HIVE",
        "savings_hbd_balance": "1.000 HBD",
        "vesting_shares": "1000000.000000 VESTS",
        "delegated_vesting_shares": "0.000000 VESTS",
        "received_vesting_shares": "0.000000 VESTS",
    })
}
