//! Running balance fold over chronologically ordered movements.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::{AccountCode, BalanceSnapshot, Movement};
use crate::sequence::sequence;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrailEntry {
    pub movement: Movement,
    pub balance: BalanceSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountTrail {
    pub account: AccountCode,
    pub opening: Decimal,
    pub entries: Vec<TrailEntry>,
    pub closing: Decimal,
}

/// Folds one account's sorted movements starting from `opening`.
///
/// No guard is applied to the magnitudes: a negative amount on an increasing
/// movement lowers the balance.
pub fn accumulate(account: AccountCode, sorted: Vec<Movement>, opening: Decimal) -> AccountTrail {
    let mut running = opening;
    let mut entries = Vec::with_capacity(sorted.len());

    for movement in sorted {
        let before = running;
        let after = movement.direction.apply(before, movement.magnitude);
        running = after;
        entries.push(TrailEntry {
            movement,
            balance: BalanceSnapshot { before, after },
        });
    }

    AccountTrail {
        account,
        opening,
        entries,
        closing: running,
    }
}

/// Balance trail for every account present in a movement set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Trail {
    pub accounts: BTreeMap<AccountCode, AccountTrail>,
}

impl Trail {
    pub fn closing(&self, account: &AccountCode) -> Option<Decimal> {
        self.accounts.get(account).map(|t| t.closing)
    }

    pub fn closings(&self) -> BTreeMap<AccountCode, Decimal> {
        self.accounts
            .iter()
            .map(|(code, t)| (code.clone(), t.closing))
            .collect()
    }

    /// Snapshots keyed by movement id. Movements sharing an id collapse to
    /// the last one in chronological order.
    pub fn snapshots_by_id(&self) -> BTreeMap<i64, BalanceSnapshot> {
        let mut out = BTreeMap::new();
        for t in self.accounts.values() {
            for e in &t.entries {
                out.insert(e.movement.id, e.balance);
            }
        }
        out
    }

    pub fn snapshot(&self, id: i64) -> Option<BalanceSnapshot> {
        self.accounts
            .values()
            .flat_map(|t| t.entries.iter())
            .filter(|e| e.movement.id == id)
            .last()
            .map(|e| e.balance)
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// Sequences and folds every account. Accounts absent from `openings` start at 0.
pub fn compute_trail<'a, I>(movements: I, openings: &BTreeMap<AccountCode, Decimal>) -> Trail
where
    I: IntoIterator<Item = &'a Movement>,
{
    let accounts = sequence(movements)
        .into_iter()
        .map(|(code, sorted)| {
            let opening = openings.get(&code).copied().unwrap_or(Decimal::ZERO);
            let trail = accumulate(code.clone(), sorted, opening);
            (code, trail)
        })
        .collect();

    Trail { accounts }
}
