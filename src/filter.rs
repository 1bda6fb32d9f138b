use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::accumulate::{Trail, compute_trail};
use crate::domain::{AccountCode, Movement};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AccountFilter {
    #[default]
    All,
    Only(AccountCode),
}

impl AccountFilter {
    pub fn from_option(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            None | Some("") => AccountFilter::All,
            Some(c) => AccountFilter::Only(AccountCode::new(c)),
        }
    }

    pub fn includes(&self, account: &AccountCode) -> bool {
        match self {
            AccountFilter::All => true,
            AccountFilter::Only(code) => code == account,
        }
    }
}

/// Everything a statement display needs, computed from one set of inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementView {
    pub trail: Trail,
    /// Sum of closings for the included accounts.
    pub combined_total: Decimal,
    /// Plain sum of the visible movement amounts.
    pub total_amount: Decimal,
    pub movement_count: usize,
}

fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Runs the statement pipeline restricted to `filter`.
pub fn project(
    movements: &[Movement],
    openings: &BTreeMap<AccountCode, Decimal>,
    filter: &AccountFilter,
) -> StatementView {
    let visible: Vec<&Movement> = movements
        .iter()
        .filter(|m| filter.includes(&m.account))
        .collect();

    let total_amount = saturating_sum(visible.iter().map(|m| m.magnitude));
    let movement_count = visible.len();
    let trail = compute_trail(visible, openings);

    // Accounts are balance-independent: a plain sum, not a global fold.
    let combined_total: Decimal = match filter {
        AccountFilter::All => saturating_sum(trail.accounts.values().map(|t| t.closing)),
        AccountFilter::Only(code) => trail.closing(code).unwrap_or(Decimal::ZERO),
    };

    StatementView {
        trail,
        combined_total,
        total_amount,
        movement_count,
    }
}
