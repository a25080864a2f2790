//! Direction and category tags for account operations, plus the filter
//! predicates built on them.
//!
//! Everything here is a pure function of `(record, viewer, now)`; results are
//! recomputed on every filter request instead of being stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::history::OperationRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Transfer,
    Vote,
    Downvotes,
    Votes,
    Comments,
    Content,
    Rewards,
    Delegations,
    Witness,
    Governance,
    CustomJson,
    Market,
    Escrow,
    Sps,
    Other,
}

const REWARD_TYPES: &[&str] = &[
    "claim_reward_balance",
    "curation_reward",
    "author_reward",
    "producer_reward",
];

const ESCROW_TYPES: &[&str] = &[
    "escrow_transfer",
    "escrow_approve",
    "escrow_dispute",
    "escrow_release",
];

const MARKET_TYPES: &[&str] = &["limit_order_create", "limit_order_create2", "limit_order_cancel"];

fn same_account(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Whether the operation moved something toward or away from `viewer`
pub fn direction(op: &OperationRecord, viewer: &str) -> Direction {
    let party_is_viewer = |key: &str| same_account(op.str_field(key), viewer);

    match op.operation_type.as_str() {
        "transfer" => {
            if party_is_viewer("to") {
                Direction::In
            } else {
                Direction::Out
            }
        }
        "vote" => {
            if party_is_viewer("voter") {
                Direction::Out
            } else {
                Direction::In
            }
        }
        "comment" => {
            if party_is_viewer("author") {
                Direction::Out
            } else {
                Direction::In
            }
        }
        "delegate_vesting_shares" => {
            if party_is_viewer("delegator") {
                Direction::Out
            } else {
                Direction::In
            }
        }
        "account_witness_vote" => Direction::Out,
        t if REWARD_TYPES.contains(&t) => Direction::In,
        _ => Direction::Neutral,
    }
}

/// Vote weight in basis points; numeric strings are accepted
pub fn vote_weight(op: &OperationRecord) -> i64 {
    match op.payload.get("weight") {
        Some(serde_json::Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Category tags of an operation. Never empty.
pub fn categories(op: &OperationRecord) -> Vec<Category> {
    let op_type = op.operation_type.as_str();

    match op_type {
        "transfer" => {
            // SPS token movements show up as plain transfers with an SPS memo
            if op.str_field("memo").contains("SPS") {
                vec![Category::Transfer, Category::Sps]
            } else {
                vec![Category::Transfer]
            }
        }
        "vote" => {
            if vote_weight(op) < 0 {
                vec![Category::Vote, Category::Downvotes]
            } else {
                vec![Category::Vote, Category::Votes]
            }
        }
        "comment" => vec![Category::Comments, Category::Content],
        "delegate_vesting_shares" => vec![Category::Delegations],
        "account_witness_vote" => vec![Category::Witness, Category::Governance],
        "custom_json" => vec![Category::CustomJson],
        t if REWARD_TYPES.contains(&t) => vec![Category::Rewards],
        t if ESCROW_TYPES.contains(&t) => vec![Category::Escrow],
        t if MARKET_TYPES.contains(&t) => vec![Category::Market],
        t if t.contains("sps") => vec![Category::Sps],
        _ => vec![Category::Other],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub direction: Direction,
    pub categories: Vec<Category>,
}

pub fn classify(op: &OperationRecord, viewer: &str) -> Classification {
    Classification {
        direction: direction(op, viewer),
        categories: categories(op),
    }
}

/// Named operation-type filters offered to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationFilter {
    All,
    #[serde(rename = "inout")]
    InOut,
    In,
    Out,
    Comments,
    CommentsVotes,
    CustomJson,
    Delegations,
    Downvotes,
    Escrow,
    Market,
    Rewards,
    Sps,
}

impl OperationFilter {
    pub const ALL: [OperationFilter; 13] = [
        OperationFilter::All,
        OperationFilter::InOut,
        OperationFilter::In,
        OperationFilter::Out,
        OperationFilter::Comments,
        OperationFilter::CommentsVotes,
        OperationFilter::CustomJson,
        OperationFilter::Delegations,
        OperationFilter::Downvotes,
        OperationFilter::Escrow,
        OperationFilter::Market,
        OperationFilter::Rewards,
        OperationFilter::Sps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationFilter::All => "all",
            OperationFilter::InOut => "inout",
            OperationFilter::In => "in",
            OperationFilter::Out => "out",
            OperationFilter::Comments => "comments",
            OperationFilter::CommentsVotes => "comments_votes",
            OperationFilter::CustomJson => "custom_json",
            OperationFilter::Delegations => "delegations",
            OperationFilter::Downvotes => "downvotes",
            OperationFilter::Escrow => "escrow",
            OperationFilter::Market => "market",
            OperationFilter::Rewards => "rewards",
            OperationFilter::Sps => "sps",
        }
    }

    /// Button label shown next to the filter
    pub fn label(&self) -> &'static str {
        match self {
            OperationFilter::All => "All",
            OperationFilter::InOut => "In & Out",
            OperationFilter::In => "In",
            OperationFilter::Out => "Out",
            OperationFilter::Comments => "Comments",
            OperationFilter::CommentsVotes => "Comments & Votes",
            OperationFilter::CustomJson => "Custom JSON",
            OperationFilter::Delegations => "Delegations",
            OperationFilter::Downvotes => "Downvotes (Flags)",
            OperationFilter::Escrow => "Escrow Related",
            OperationFilter::Market => "Market Orders",
            OperationFilter::Rewards => "Rewards",
            OperationFilter::Sps => "SPS Related",
        }
    }

    pub fn matches(&self, op: &OperationRecord, viewer: &str) -> bool {
        let has = |category: Category| categories(op).contains(&category);

        match self {
            OperationFilter::All => true,
            OperationFilter::InOut => direction(op, viewer) != Direction::Neutral,
            OperationFilter::In => direction(op, viewer) == Direction::In,
            OperationFilter::Out => direction(op, viewer) == Direction::Out,
            OperationFilter::Comments => has(Category::Comments),
            OperationFilter::CommentsVotes => has(Category::Comments) || has(Category::Vote),
            OperationFilter::CustomJson => has(Category::CustomJson),
            OperationFilter::Delegations => has(Category::Delegations),
            OperationFilter::Downvotes => has(Category::Downvotes),
            OperationFilter::Escrow => has(Category::Escrow),
            OperationFilter::Market => has(Category::Market),
            OperationFilter::Rewards => has(Category::Rewards),
            OperationFilter::Sps => has(Category::Sps),
        }
    }
}

impl std::fmt::Display for OperationFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OperationFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        OperationFilter::ALL
            .into_iter()
            .find(|filter| filter.as_str() == wanted)
            .ok_or_else(|| format!("Unknown operation filter: {}", s))
    }
}

/// Calendar-day bucket of an operation relative to "now" (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBucket {
    All,
    Today,
    Yesterday,
    DaysAgo(u32),
}

impl DayBucket {
    /// Bucket of `timestamp` as seen at `now`
    pub fn of(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> DayBucket {
        let days = (now.date_naive() - timestamp.date_naive()).num_days().unsigned_abs();
        match days {
            0 => DayBucket::Today,
            1 => DayBucket::Yesterday,
            n => DayBucket::DaysAgo(u32::try_from(n).unwrap_or(u32::MAX)),
        }
    }

    pub fn contains(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            DayBucket::All => true,
            bucket => DayBucket::of(timestamp, now) == *bucket,
        }
    }
}

impl std::fmt::Display for DayBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayBucket::All => write!(f, "all"),
            DayBucket::Today => write!(f, "today"),
            DayBucket::Yesterday => write!(f, "yesterday"),
            DayBucket::DaysAgo(n) => write!(f, "day-{}", n),
        }
    }
}

impl std::str::FromStr for DayBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(DayBucket::All),
            "today" => Ok(DayBucket::Today),
            "yesterday" => Ok(DayBucket::Yesterday),
            other => other
                .strip_prefix("day-")
                .and_then(|n| n.parse::<u32>().ok())
                .map(|n| match n {
                    0 => DayBucket::Today,
                    1 => DayBucket::Yesterday,
                    n => DayBucket::DaysAgo(n),
                })
                .ok_or_else(|| format!("Unknown day filter: {}", s)),
        }
    }
}

/// Records passing both the day bucket and the type filter, order preserved
pub fn filter_operations<'a>(
    records: &'a [OperationRecord],
    viewer: &str,
    day: DayBucket,
    filter: OperationFilter,
    now: DateTime<Utc>,
) -> Vec<&'a OperationRecord> {
    records
        .iter()
        .filter(|op| day.contains(op.timestamp, now) && filter.matches(op, viewer))
        .collect()
}
