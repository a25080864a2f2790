//! Parsing of `"<number> <UNIT>"` amount strings returned by the Hive API.
//!
//! Every numeric field the node returns as text goes through here. Parsing is
//! best-effort: anything unreadable becomes zero instead of an error, because
//! field names and units have changed over the chain's history (STEEM/SBD vs
//! HIVE/HBD) and a dashboard should still render with partial data.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Parse the numeric prefix of an amount string, e.g. `"5.000 HIVE"` -> 5.0.
/// Returns 0 on any failure.
///
/// Only the text before the first space is read, so a unit glued to the
/// number (`"5.000HIVE"`) is unreadable and yields 0.
pub fn parse_amount(raw: &str) -> f64 {
    let number = raw.trim().split(' ').next().unwrap_or("");
    match number.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Numeric value of a JSON field that may be an amount string or a bare number.
pub fn value_amount(value: &Value) -> f64 {
    match value {
        Value::String(s) => parse_amount(s),
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Ordered list of field names to try for one logical value. The first
/// present, non-null, non-empty field wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldCandidates(pub &'static [&'static str]);

pub const HIVE_BALANCE: FieldCandidates = FieldCandidates(&["balance"]);
pub const HBD_BALANCE: FieldCandidates = FieldCandidates(&["hbd_balance", "sbd_balance"]);
pub const SAVINGS_HIVE: FieldCandidates = FieldCandidates(&["savings_balance"]);
pub const SAVINGS_HBD: FieldCandidates =
    FieldCandidates(&["savings_hbd_balance", "savings_sbd_balance"]);
pub const REWARD_HIVE: FieldCandidates =
    FieldCandidates(&["reward_hive_balance", "reward_steem_balance"]);
pub const REWARD_HBD: FieldCandidates =
    FieldCandidates(&["reward_hbd_balance", "reward_sbd_balance"]);
pub const REWARD_VESTING_HIVE: FieldCandidates =
    FieldCandidates(&["reward_vesting_hive", "reward_vesting_steem"]);
pub const VESTING_SHARES: FieldCandidates = FieldCandidates(&["vesting_shares"]);
pub const DELEGATED_VESTING_SHARES: FieldCandidates =
    FieldCandidates(&["delegated_vesting_shares"]);
pub const RECEIVED_VESTING_SHARES: FieldCandidates =
    FieldCandidates(&["received_vesting_shares"]);
pub const TOTAL_VESTING_FUND: FieldCandidates =
    FieldCandidates(&["total_vesting_fund_hive", "total_vesting_fund_steem"]);
pub const TOTAL_VESTING_SHARES: FieldCandidates = FieldCandidates(&["total_vesting_shares"]);

/// Claimed reward fields inside a `claim_reward_balance` operation
pub const CLAIM_REWARD_HIVE: FieldCandidates = FieldCandidates(&["reward_hive", "reward_steem"]);
pub const CLAIM_REWARD_HBD: FieldCandidates = FieldCandidates(&["reward_hbd", "reward_sbd"]);
pub const CLAIM_REWARD_VESTS: FieldCandidates = FieldCandidates(&["reward_vests"]);

impl FieldCandidates {
    /// First usable value in priority order
    pub fn lookup<'a>(&self, fields: &'a Map<String, Value>) -> Option<&'a Value> {
        self.0
            .iter()
            .filter_map(|name| fields.get(*name))
            .find(|value| match value {
                Value::Null => false,
                Value::String(s) => !s.is_empty(),
                _ => true,
            })
    }

    pub fn amount(&self, fields: &Map<String, Value>) -> f64 {
        self.lookup(fields).map(value_amount).unwrap_or(0.0)
    }

    /// Raw text of the winning field, for display
    pub fn text(&self, fields: &Map<String, Value>) -> Option<String> {
        self.lookup(fields).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Exact fixed-point amount with its unit, e.g. `123.456789 VESTS`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub amount: Decimal,
    pub symbol: String,
}

impl Asset {
    pub fn zero(symbol: &str) -> Self {
        Self {
            amount: Decimal::ZERO,
            symbol: symbol.to_string(),
        }
    }

    /// Parse without failing; unreadable amounts become zero.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            let symbol = raw.trim().split_once(' ').map(|(_, unit)| unit.trim()).unwrap_or("");
            Self::zero(symbol)
        })
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

impl FromStr for Asset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (number, symbol) = match trimmed.split_once(' ') {
            Some((number, symbol)) => (number, symbol.trim()),
            None => (trimmed, ""),
        };
        let amount = Decimal::from_str(number)
            .map_err(|e| format!("Invalid amount '{}': {}", s, e))?;
        Ok(Self {
            amount,
            symbol: symbol.to_string(),
        })
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.symbol.is_empty() {
            write!(f, "{}", self.amount)
        } else {
            write!(f, "{} {}", self.amount, self.symbol)
        }
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => Asset::parse_lenient(&s),
            Value::Number(n) => Asset {
                amount: Decimal::from_str(&n.to_string()).unwrap_or(Decimal::ZERO),
                symbol: String::new(),
            },
            Value::Object(fields) => Asset::from_nai(&fields),
            _ => Asset::zero(""),
        })
    }
}

impl Asset {
    /// Parse the `{amount, precision, nai}` object form used by `database_api`
    fn from_nai(fields: &Map<String, Value>) -> Self {
        let symbol = match fields.get("nai").and_then(Value::as_str) {
            Some("@@000000021") => "HIVE",
            Some("@@000000013") => "HBD",
            Some("@@000000037") => "VESTS",
            _ => "",
        };
        let precision = fields
            .get("precision")
            .and_then(Value::as_u64)
            .unwrap_or(0)
            .min(28) as u32;
        let raw = fields
            .get("amount")
            .and_then(|v| match v {
                Value::String(s) => s.parse::<i128>().ok(),
                Value::Number(n) => n.as_i64().map(i128::from),
                _ => None,
            })
            .unwrap_or(0);

        Self {
            amount: Decimal::try_from_i128_with_scale(raw, precision).unwrap_or(Decimal::ZERO),
            symbol: symbol.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("5.000 HIVE"), 5.0);
        assert_eq!(parse_amount("123456.789012 VESTS"), 123456.789012);
        assert_eq!(parse_amount("42"), 42.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("abc HIVE"), 0.0);
        assert_eq!(parse_amount("NaN HIVE"), 0.0);
        assert_eq!(parse_amount("5.000HIVE"), 0.0);
    }

    #[test]
    fn test_candidates_prefer_first_present() {
        let account = json!({
            "sbd_balance": "3.000 SBD",
            "hbd_balance": "7.500 HBD",
        });
        let fields = account.as_object().unwrap();
        assert_eq!(HBD_BALANCE.amount(fields), 7.5);
    }

    #[test]
    fn test_candidates_fall_back_to_legacy_name() {
        let account = json!({ "hbd_balance": "", "sbd_balance": "3.000 SBD" });
        let fields = account.as_object().unwrap();
        assert_eq!(HBD_BALANCE.amount(fields), 3.0);
        assert_eq!(HBD_BALANCE.text(fields).as_deref(), Some("3.000 SBD"));

        let empty = json!({});
        assert_eq!(HBD_BALANCE.amount(empty.as_object().unwrap()), 0.0);
    }

    #[test]
    fn test_asset_parsing() {
        let asset: Asset = "1234.567890 VESTS".parse().unwrap();
        assert_eq!(asset.amount, dec!(1234.567890));
        assert_eq!(asset.symbol, "VESTS");
        assert!(asset.is_positive());

        let broken = Asset::parse_lenient("n/a VESTS");
        assert_eq!(broken.amount, Decimal::ZERO);
        assert_eq!(broken.symbol, "VESTS");
    }

    #[test]
    fn test_asset_deserialize_lenient() {
        let asset: Asset = serde_json::from_value(json!("oops")).unwrap();
        assert_eq!(asset.amount, Decimal::ZERO);

        let asset: Asset = serde_json::from_value(json!("10.000 HP")).unwrap();
        assert_eq!(asset.to_string(), "10.000 HP");
    }

    #[test]
    fn test_asset_deserialize_nai_object() {
        let asset: Asset = serde_json::from_value(json!({
            "amount": "2500000000",
            "precision": 6,
            "nai": "@@000000037",
        }))
        .unwrap();
        assert_eq!(asset.amount, dec!(2500.000000));
        assert_eq!(asset.symbol, "VESTS");
    }
}
