//! Plain-text descriptions, detail rows and day labels for operations

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::models::asset::{CLAIM_REWARD_HBD, CLAIM_REWARD_HIVE, CLAIM_REWARD_VESTS};
use crate::services::classifier::{vote_weight, DayBucket};
use crate::services::history::OperationRecord;

const TITLE_LIMIT: usize = 30;
const PARENT_PERMLINK_LIMIT: usize = 20;

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let head: String = text.chars().take(limit).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// One-line summary of an operation
pub fn describe(op: &OperationRecord) -> String {
    let field = |key: &str| op.str_field(key);

    match op.operation_type.as_str() {
        "transfer" => format!("Transferred {} to @{}", field("amount"), field("to")),
        "vote" => format!(
            "Voted {:.2}% on @{}/{}",
            vote_weight(op) as f64 / 100.0,
            field("author"),
            field("permlink")
        ),
        "comment" => {
            if field("parent_author").is_empty() {
                let title = match field("title") {
                    "" => field("permlink"),
                    title => title,
                };
                format!("Created a post: {}", truncate(title, TITLE_LIMIT))
            } else {
                format!(
                    "Commented on @{}/{}",
                    field("parent_author"),
                    truncate(field("parent_permlink"), PARENT_PERMLINK_LIMIT)
                )
            }
        }
        "claim_reward_balance" => {
            let parts: Vec<String> = [CLAIM_REWARD_HIVE, CLAIM_REWARD_HBD, CLAIM_REWARD_VESTS]
                .iter()
                .filter_map(|candidates| candidates.text(&op.payload))
                .collect();
            format!("Claimed rewards: {}", parts.join(" "))
        }
        "delegate_vesting_shares" => format!(
            "Delegated {} to @{}",
            field("vesting_shares"),
            field("delegatee")
        ),
        "account_witness_vote" => {
            let approve = op.payload.get("approve").and_then(Value::as_bool).unwrap_or(false);
            format!(
                "{} witness @{}",
                if approve { "Approved" } else { "Unapproved" },
                field("witness")
            )
        }
        other => format!("{} operation", other),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailRow {
    pub label: String,
    pub value: String,
}

impl DetailRow {
    fn new(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Expanded key/value rows for an operation
pub fn details(op: &OperationRecord) -> Vec<DetailRow> {
    let field = |key: &str| op.str_field(key);
    let mut rows = vec![
        DetailRow::new("Transaction ID", op.transaction_id.clone()),
        DetailRow::new("Block", op.block_number.to_string()),
    ];

    match op.operation_type.as_str() {
        "transfer" => {
            rows.push(DetailRow::new("From", format!("@{}", field("from"))));
            rows.push(DetailRow::new("To", format!("@{}", field("to"))));
            rows.push(DetailRow::new("Amount", field("amount")));
            if !field("memo").is_empty() {
                rows.push(DetailRow::new("Memo", field("memo")));
            }
        }
        "vote" => {
            rows.push(DetailRow::new("Voter", format!("@{}", field("voter"))));
            rows.push(DetailRow::new("Author", format!("@{}", field("author"))));
            rows.push(DetailRow::new(
                "Weight",
                format!("{:.2}%", vote_weight(op) as f64 / 100.0),
            ));
            if !field("permlink").is_empty() {
                rows.push(DetailRow::new("Permlink", field("permlink")));
            }
        }
        "comment" => {
            rows.push(DetailRow::new("Author", format!("@{}", field("author"))));
            if !field("parent_author").is_empty() {
                rows.push(DetailRow::new("Replying to", format!("@{}", field("parent_author"))));
            } else if !field("title").is_empty() {
                rows.push(DetailRow::new("Title", field("title")));
            }
            if !field("permlink").is_empty() {
                rows.push(DetailRow::new("Permlink", field("permlink")));
            }
        }
        "claim_reward_balance" => {
            for (label, candidates) in [
                ("HIVE", CLAIM_REWARD_HIVE),
                ("HBD", CLAIM_REWARD_HBD),
                ("VESTS", CLAIM_REWARD_VESTS),
            ] {
                if let Some(text) = candidates.text(&op.payload) {
                    rows.push(DetailRow::new(label, text));
                }
            }
        }
        "delegate_vesting_shares" => {
            rows.push(DetailRow::new("Delegator", format!("@{}", field("delegator"))));
            rows.push(DetailRow::new("Delegatee", format!("@{}", field("delegatee"))));
            rows.push(DetailRow::new("Amount", field("vesting_shares")));
        }
        _ => {
            for (key, value) in &op.payload {
                rows.push(DetailRow::new(key, value_text(value)));
            }
        }
    }

    rows
}

/// "Today", "Yesterday" or a short date such as "Jan 5"
pub fn day_label(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match DayBucket::of(timestamp, now) {
        DayBucket::Today => "Today".to_string(),
        DayBucket::Yesterday => "Yesterday".to_string(),
        _ => timestamp.format("%b %-d").to_string(),
    }
}

/// Consecutive groups of operations sharing a day label, newest first
pub fn group_by_day<'a>(
    records: &[&'a OperationRecord],
    now: DateTime<Utc>,
) -> Vec<(String, Vec<&'a OperationRecord>)> {
    let mut groups: Vec<(String, Vec<&'a OperationRecord>)> = Vec::new();

    for record in records {
        let label = day_label(record.timestamp, now);
        match groups.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, members)) => members.push(*record),
            None => groups.push((label, vec![*record])),
        }
    }

    groups
}
