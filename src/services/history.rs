//! Account history normalization.
//!
//! Turns the raw `[index, {trx_id, block, timestamp, op: [type, data]}]`
//! pairs from `condenser_api.get_account_history` into [`OperationRecord`]s
//! restricted to a trailing time window, newest first.

use chrono::{DateTime, Duration, Utc};
use moka::future::Cache;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::RpcError;
use crate::services::hive_rpc::HiveClient;

/// One account-history operation in uniform shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationRecord {
    pub transaction_id: String,
    pub block_number: u64,
    pub timestamp: DateTime<Utc>,
    pub operation_type: String,
    pub payload: Map<String, Value>,
}

impl OperationRecord {
    /// The `[type, data]` pair this record was built from
    pub fn op_tuple(&self) -> (String, Value) {
        (self.operation_type.clone(), Value::Object(self.payload.clone()))
    }

    pub fn str_field(&self, key: &str) -> &str {
        self.payload.get(key).and_then(Value::as_str).unwrap_or("")
    }
}

/// Parse a node timestamp. The node omits the UTC designator, so `Z` is
/// appended before parsing; without it the value would be read as local time.
pub fn parse_chain_time(raw: &str) -> Option<DateTime<Utc>> {
    let with_zone = if raw.ends_with('Z') {
        raw.to_string()
    } else {
        format!("{}Z", raw)
    };
    DateTime::parse_from_rfc3339(&with_zone)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Normalize one raw history pair. Malformed entries yield `None`.
pub fn normalize_entry(raw: &Value) -> Option<OperationRecord> {
    let entry = match raw {
        Value::Array(pair) => pair.get(1)?,
        // Some nodes already unwrap the pair
        Value::Object(_) => raw,
        _ => return None,
    };

    let timestamp = parse_chain_time(entry.get("timestamp")?.as_str()?)?;
    let (operation_type, payload) = split_op(entry.get("op")?)?;

    Some(OperationRecord {
        transaction_id: entry
            .get("trx_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        block_number: entry.get("block").and_then(Value::as_u64).unwrap_or(0),
        timestamp,
        operation_type,
        payload,
    })
}

/// `["transfer", {..}]` or the appbase `{"type": "transfer_operation", "value": {..}}`
fn split_op(op: &Value) -> Option<(String, Map<String, Value>)> {
    match op {
        Value::Array(parts) => {
            let op_type = parts.first()?.as_str()?.to_string();
            let payload = parts.get(1)?.as_object()?.clone();
            Some((op_type, payload))
        }
        Value::Object(fields) => {
            let op_type = fields.get("type")?.as_str()?;
            let op_type = op_type.strip_suffix("_operation").unwrap_or(op_type).to_string();
            let payload = fields.get("value")?.as_object()?.clone();
            Some((op_type, payload))
        }
        _ => None,
    }
}

/// Keep entries inside `[now - window_days, now]`, newest first.
pub fn normalize_history(raw: &[Value], now: DateTime<Utc>, window_days: i64) -> Vec<OperationRecord> {
    let cutoff = now - Duration::days(window_days);

    let mut skipped = 0usize;
    let mut records: Vec<OperationRecord> = raw
        .iter()
        .filter_map(|item| {
            let record = normalize_entry(item);
            if record.is_none() {
                skipped += 1;
            }
            record
        })
        .filter(|record| record.timestamp >= cutoff && record.timestamp <= now)
        .collect();

    if skipped > 0 {
        tracing::debug!("Skipped {} malformed history entries", skipped);
    }

    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records
}

/// Fetch and normalize the trailing history of an account.
///
/// Only the latest `limit` entries are requested; busier accounts lose older
/// operations inside the window.
pub async fn fetch_operations(
    hive: &HiveClient,
    username: &str,
    limit: u32,
    window_days: i64,
    now: DateTime<Utc>,
) -> Result<Vec<OperationRecord>, RpcError> {
    let raw = hive.get_account_history(username, limit).await?;
    let records = normalize_history(&raw, now, window_days);

    if raw.len() as u32 >= limit {
        tracing::debug!(
            "History for @{} hit the {} entry limit, window may be truncated",
            username,
            limit
        );
    }

    tracing::info!(
        "Normalized {} of {} history entries for @{}",
        records.len(),
        raw.len(),
        username
    );

    Ok(records)
}

/// Per-account history held for one view session. A new lookup after
/// expiry replaces the whole list.
#[derive(Clone)]
pub struct HistorySessions {
    sessions: Cache<String, Arc<Vec<OperationRecord>>>,
    limit: u32,
    window_days: i64,
}

impl HistorySessions {
    pub fn new(ttl: std::time::Duration, limit: u32, window_days: i64) -> Self {
        let sessions = Cache::builder()
            .max_capacity(500)
            .time_to_live(ttl)
            .build();

        Self {
            sessions,
            limit,
            window_days,
        }
    }

    pub async fn load(&self, hive: &HiveClient, username: &str) -> Result<Arc<Vec<OperationRecord>>, RpcError> {
        let key = username.to_lowercase();

        if let Some(cached) = self.sessions.get(&key).await {
            tracing::debug!("History session hit for @{}", key);
            return Ok(cached);
        }

        let records = Arc::new(
            fetch_operations(hive, &key, self.limit, self.window_days, Utc::now()).await?,
        );
        self.sessions.insert(key, records.clone()).await;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn raw(index: u64, timestamp: &str, op: Value) -> Value {
        json!([index, {
            "trx_id": format!("trx{}", index),
            "block": 100 + index,
            "timestamp": timestamp,
            "op": op,
        }])
    }

    #[test]
    fn test_parse_chain_time_is_utc() {
        let ts = parse_chain_time("2024-01-01T00:00:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert!(parse_chain_time("not a date").is_none());
    }

    #[test]
    fn test_normalize_entry_round_trip() {
        let op = json!(["transfer", {"from": "alice", "to": "bob", "amount": "5.000 HIVE"}]);
        let record = normalize_entry(&raw(1, "2024-01-01T00:00:00", op.clone())).unwrap();

        assert_eq!(record.transaction_id, "trx1");
        assert_eq!(record.block_number, 101);
        let (op_type, payload) = record.op_tuple();
        assert_eq!(json!([op_type, payload]), op);
    }

    #[test]
    fn test_normalize_entry_appbase_shape() {
        let op = json!({"type": "vote_operation", "value": {"voter": "a", "weight": 100}});
        let record = normalize_entry(&raw(2, "2024-01-01T00:00:00", op)).unwrap();
        assert_eq!(record.operation_type, "vote");
        assert_eq!(record.payload["voter"], "a");
    }

    #[test]
    fn test_normalize_entry_rejects_malformed() {
        assert!(normalize_entry(&json!("garbage")).is_none());
        assert!(normalize_entry(&json!([1, {"timestamp": "2024-01-01T00:00:00"}])).is_none());
        assert!(normalize_entry(&raw(3, "bad", json!(["vote", {}]))).is_none());
    }

    #[test]
    fn test_normalize_history_window_and_order() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let entries = vec![
            raw(1, "2024-01-01T00:00:00", json!(["vote", {}])), // too old
            raw(2, "2024-01-05T00:00:00", json!(["vote", {}])),
            raw(3, "2024-01-10T11:00:00", json!(["comment", {}])),
            raw(4, "2024-01-08T00:00:00", json!(["transfer", {}])),
            raw(5, "2024-01-11T00:00:00", json!(["transfer", {}])), // future
            json!(null),
        ];

        let records = normalize_history(&entries, now, 7);
        let ids: Vec<&str> = records.iter().map(|r| r.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["trx3", "trx4", "trx2"]);
    }

    #[test]
    fn test_window_edges_are_inclusive() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let entries = vec![
            raw(1, "2024-01-03T11:59:59", json!(["vote", {}])),
            raw(2, "2024-01-03T12:00:00", json!(["vote", {}])),
            raw(3, "2024-01-10T12:00:00", json!(["vote", {}])),
            raw(4, "2024-01-10T12:00:01", json!(["vote", {}])),
        ];

        let records = normalize_history(&entries, now, 7);
        let ids: Vec<&str> = records.iter().map(|r| r.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["trx3", "trx2"]);
    }
}
