use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a ledger subject (bank, customer, supplier).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountCode(String);

impl AccountCode {
    /// Bucket for movements that arrive without an account code.
    pub const UNASSIGNED: &'static str = "__NA__";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn unassigned() -> Self {
        Self(Self::UNASSIGNED.to_string())
    }

    pub fn is_unassigned(&self) -> bool {
        self.0 == Self::UNASSIGNED
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub code: AccountCode,
    pub name: Option<String>,
}

impl Account {
    pub fn label(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() && name != self.code.as_str() => {
                format!("{} - {}", self.code, name)
            }
            _ => self.code.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    /// Category value that decreases the account balance.
    pub const DECREASING_CATEGORY: &'static str = "drawing";

    /// Resolves a categorical direction field.
    ///
    /// Policy: only the exact value `"drawing"` decreases the balance. Every
    /// other value, including a missing field, a misspelling or a category
    /// added later on the server, is treated as an increase. This mirrors
    /// the behavior the bank statement has always had and is kept here, in
    /// one place, until product owners confirm or replace it.
    pub fn from_category(category: Option<&str>) -> Self {
        match category {
            Some(Self::DECREASING_CATEGORY) => Direction::Decrease,
            _ => Direction::Increase,
        }
    }

    /// Moves `balance` by `magnitude`. Results beyond the `Decimal` range
    /// saturate at `Decimal::MAX` / `Decimal::MIN` instead of panicking.
    pub fn apply(self, balance: Decimal, magnitude: Decimal) -> Decimal {
        match self {
            Direction::Increase => balance.saturating_add(magnitude),
            Direction::Decrease => balance.saturating_sub(magnitude),
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Direction::Increase => "DEPO",
            Direction::Decrease => "DRW",
        }
    }
}

/// Canonical movement produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Tie-break key; 0 when the source record had no usable identifier.
    pub id: i64,
    pub account: AccountCode,
    pub account_name: Option<String>,
    pub effective_at: DateTime<Utc>,
    pub direction: Direction,
    pub magnitude: Decimal,

    #[serde(default)]
    pub entry_no: Option<String>,
    #[serde(default)]
    pub slip_no: Option<String>,
}

impl Movement {
    pub fn sort_key(&self) -> (DateTime<Utc>, i64) {
        (self.effective_at, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub before: Decimal,
    pub after: Decimal,
}

/// Raw movement row as delivered by the movement source.
///
/// Every field is kept as an untyped JSON value so that one malformed column
/// never rejects the whole payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMovement {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub bank_code: serde_json::Value,
    #[serde(default)]
    pub bank_name: serde_json::Value,
    #[serde(default)]
    pub transaction_date: serde_json::Value,
    #[serde(default)]
    pub slip_date: serde_json::Value,
    #[serde(default)]
    pub transaction_type: serde_json::Value,
    #[serde(default)]
    pub cash_amount: serde_json::Value,
    #[serde(default)]
    pub entry_no: serde_json::Value,
    #[serde(default)]
    pub slip_no: serde_json::Value,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn only_drawing_decreases() {
        assert_eq!(Direction::from_category(Some("drawing")), Direction::Decrease);
        assert_eq!(Direction::from_category(Some("deposit")), Direction::Increase);
        assert_eq!(Direction::from_category(Some("Drawing")), Direction::Increase);
        assert_eq!(Direction::from_category(Some("drawnig")), Direction::Increase);
        assert_eq!(Direction::from_category(None), Direction::Increase);
    }

    #[test]
    fn apply_moves_balance_by_direction() {
        assert_eq!(Direction::Increase.apply(dec!(10), dec!(2.5)), dec!(12.5));
        assert_eq!(Direction::Decrease.apply(dec!(10), dec!(2.5)), dec!(7.5));
    }

    #[test]
    fn apply_saturates_at_decimal_bounds() {
        let big = dec!(50000000000000000000000000000);
        assert_eq!(Direction::Increase.apply(big, big), Decimal::MAX);
        assert_eq!(Direction::Decrease.apply(-big, big), Decimal::MIN);
        assert_eq!(Direction::Decrease.apply(big, -big), Decimal::MAX);
    }

    #[test]
    fn account_label_includes_distinct_name() {
        let named = Account {
            code: "HBL".into(),
            name: Some("Habib Bank".to_string()),
        };
        assert_eq!(named.label(), "HBL - Habib Bank");

        let same = Account {
            code: "HBL".into(),
            name: Some("HBL".to_string()),
        };
        assert_eq!(same.label(), "HBL");

        let bare = Account {
            code: "MCB".into(),
            name: None,
        };
        assert_eq!(bare.label(), "MCB");
    }
}
