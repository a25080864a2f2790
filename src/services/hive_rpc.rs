use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::error::RpcError;
use crate::models::hive::{
    Account, AccountReputation, AccountVote, BlogEntry, DelegationList, DynamicGlobalProperties,
    FollowEntry, PriceFeed, Profile, RcAccount, RcAccounts, RewardFund, VestingDelegation,
};

/// One JSON-RPC round trip. Implemented over HTTP for production and by
/// scripted doubles in tests.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Returns the `result` member of the response.
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// JSON-RPC 2.0 over HTTP POST
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: String, timeout_secs: u64) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        tracing::debug!("Calling {} on {}", method, self.url);

        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });

        let response = self
            .client
            .post(&self.url)
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RpcError::Http {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let envelope: RpcResponse = response.json().await?;
        unwrap_envelope(method, envelope)
    }
}

fn unwrap_envelope(method: &str, envelope: RpcResponse) -> Result<Value, RpcError> {
    if let Some(error) = envelope.error {
        return Err(RpcError::Rpc {
            method: method.to_string(),
            code: error.code,
            message: error.message,
        });
    }

    match envelope.result {
        Some(Value::Null) | None => Err(RpcError::MissingResult {
            method: method.to_string(),
        }),
        Some(result) => Ok(result),
    }
}

/// Typed read-only queries against a Hive full node
#[derive(Clone)]
pub struct HiveClient {
    transport: Arc<dyn RpcTransport>,
}

impl HiveClient {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    pub fn http(url: String, timeout_secs: u64) -> Result<Self, RpcError> {
        Ok(Self::new(Arc::new(HttpTransport::new(url, timeout_secs)?)))
    }

    async fn query<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let result = self.transport.call(method, params).await?;
        serde_json::from_value(result).map_err(|source| RpcError::Decode {
            method: method.to_string(),
            source,
        })
    }

    pub async fn get_accounts(&self, usernames: &[&str]) -> Result<Vec<Account>, RpcError> {
        self.query("condenser_api.get_accounts", json!([usernames])).await
    }

    /// Single account, `NotFound` when the node returns an empty list
    pub async fn get_account(&self, username: &str) -> Result<Account, RpcError> {
        self.get_accounts(&[username])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RpcError::NotFound(format!("Account @{} not found", username)))
    }

    /// Latest `limit` history entries as raw `[index, entry]` pairs
    pub async fn get_account_history(&self, username: &str, limit: u32) -> Result<Vec<Value>, RpcError> {
        self.query("condenser_api.get_account_history", json!([username, -1, limit]))
            .await
    }

    pub async fn get_dynamic_global_properties(&self) -> Result<DynamicGlobalProperties, RpcError> {
        self.query("condenser_api.get_dynamic_global_properties", json!([]))
            .await
    }

    pub async fn get_reward_fund(&self) -> Result<RewardFund, RpcError> {
        self.query("condenser_api.get_reward_fund", json!(["post"])).await
    }

    pub async fn get_current_median_history_price(&self) -> Result<PriceFeed, RpcError> {
        self.query("condenser_api.get_current_median_history_price", json!([]))
            .await
    }

    pub async fn get_vesting_delegations(
        &self,
        delegator: &str,
        limit: u32,
    ) -> Result<Vec<VestingDelegation>, RpcError> {
        self.query(
            "condenser_api.get_vesting_delegations",
            json!([delegator, "", limit]),
        )
        .await
    }

    pub async fn find_vesting_delegations(
        &self,
        delegatee: &str,
    ) -> Result<Vec<VestingDelegation>, RpcError> {
        self.query(
            "condenser_api.find_vesting_delegations",
            json!({ "delegatee": delegatee, "limit": 10000 }),
        )
        .await
    }

    /// Page of the `(delegator, delegatee)` index. The index is keyed by
    /// delegator first, so callers must filter on delegatee themselves.
    pub async fn list_vesting_delegations(
        &self,
        delegatee: &str,
        limit: u32,
    ) -> Result<Vec<VestingDelegation>, RpcError> {
        let list: DelegationList = self
            .query(
                "database_api.list_vesting_delegations",
                json!({
                    "start": ["", delegatee],
                    "limit": limit,
                    "order": "by_delegation",
                }),
            )
            .await?;
        Ok(list.delegations)
    }

    pub async fn get_followers(&self, username: &str, limit: u32) -> Result<Vec<FollowEntry>, RpcError> {
        self.query(
            "condenser_api.get_followers",
            json!([username, null, "blog", limit]),
        )
        .await
    }

    pub async fn get_active_witnesses(&self) -> Result<Vec<String>, RpcError> {
        let witnesses: Vec<String> = self
            .query("condenser_api.get_active_witnesses", json!([]))
            .await?;
        // Empty slots come back as ""
        Ok(witnesses.into_iter().filter(|w| !w.is_empty()).collect())
    }

    pub async fn get_account_votes(&self, username: &str) -> Result<Vec<AccountVote>, RpcError> {
        self.query("condenser_api.get_account_votes", json!([username]))
            .await
    }

    pub async fn get_blog(&self, username: &str, limit: u32) -> Result<Vec<BlogEntry>, RpcError> {
        self.query("condenser_api.get_blog", json!([username, 0, limit]))
            .await
    }

    pub async fn get_account_reputations(
        &self,
        username: &str,
    ) -> Result<Vec<AccountReputation>, RpcError> {
        self.query(
            "condenser_api.get_account_reputations",
            json!([username, 1]),
        )
        .await
    }

    pub async fn find_rc_account(&self, username: &str) -> Result<Option<RcAccount>, RpcError> {
        let found: RcAccounts = self
            .query("rc_api.find_rc_accounts", json!({ "accounts": [username] }))
            .await?;
        Ok(found.rc_accounts.into_iter().next())
    }

    pub async fn get_profile(&self, username: &str) -> Result<Profile, RpcError> {
        self.query("bridge.get_profile", json!({ "account": username }))
            .await
    }
}
