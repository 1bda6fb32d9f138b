//! Keyed, versioned store of opening balances.
//!
//! Each fetch is issued a ticket carrying a per-account version. A completed
//! fetch is merged only when its version is newer than the last one applied
//! for the same account, so a slow response can never overwrite a fresher one.
//! A failure writes nothing and so never blocks an older fetch that succeeds
//! later.
//! Accounts never interact: completion order across accounts is irrelevant.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::domain::AccountCode;
use crate::error::SourceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub account: AccountCode,
    pub version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpeningState {
    Unrequested,
    Pending,
    Resolved(Decimal),
    Failed,
}

impl OpeningState {
    pub fn label(&self) -> &'static str {
        match self {
            OpeningState::Unrequested => "unrequested",
            OpeningState::Pending => "pending",
            OpeningState::Resolved(_) => "resolved",
            OpeningState::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer fetch for the account already completed.
    Stale,
    /// The fetch failed; the previous value, if any, is kept.
    Failed,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    issued: u64,
    /// Version of the last value written. Failures never move it.
    applied: u64,
    /// Newest version that completed with an error.
    failed_at: u64,
    value: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct OpeningBook {
    slots: BTreeMap<AccountCode, Slot>,
}

impl OpeningBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_fetch(&mut self, account: &AccountCode) -> FetchTicket {
        let slot = self.slots.entry(account.clone()).or_default();
        slot.issued += 1;
        FetchTicket {
            account: account.clone(),
            version: slot.issued,
        }
    }

    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Decimal, SourceError>,
    ) -> FetchOutcome {
        let Some(slot) = self.slots.get_mut(&ticket.account) else {
            tracing::debug!(account = %ticket.account, "discarding opening for unknown ticket");
            return FetchOutcome::Stale;
        };

        if ticket.version > slot.issued || ticket.version <= slot.applied {
            tracing::debug!(
                account = %ticket.account,
                version = ticket.version,
                applied = slot.applied,
                "discarding stale opening balance"
            );
            return FetchOutcome::Stale;
        }

        match result {
            Ok(value) => {
                slot.applied = ticket.version;
                slot.value = Some(value);
                tracing::debug!(account = %ticket.account, %value, "opening balance resolved");
                FetchOutcome::Applied
            }
            Err(err) => {
                slot.failed_at = slot.failed_at.max(ticket.version);
                tracing::debug!(account = %ticket.account, error = %err, "opening balance unavailable");
                FetchOutcome::Failed
            }
        }
    }

    pub fn has_requested(&self, account: &AccountCode) -> bool {
        self.slots.get(account).is_some_and(|s| s.issued > 0)
    }

    /// Resolved opening balance, or 0 while pending, failed or never requested.
    pub fn opening(&self, account: &AccountCode) -> Decimal {
        self.slots
            .get(account)
            .and_then(|s| s.value)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn state(&self, account: &AccountCode) -> OpeningState {
        let Some(slot) = self.slots.get(account) else {
            return OpeningState::Unrequested;
        };
        match slot.value {
            Some(v) => OpeningState::Resolved(v),
            None if slot.issued == 0 => OpeningState::Unrequested,
            None if slot.failed_at >= slot.issued => OpeningState::Failed,
            None => OpeningState::Pending,
        }
    }

    /// Immutable copy of every resolved value, for one pipeline run.
    pub fn snapshot(&self) -> BTreeMap<AccountCode, Decimal> {
        self.slots
            .iter()
            .filter_map(|(code, s)| s.value.map(|v| (code.clone(), v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> AccountCode {
        AccountCode::from(s)
    }

    #[test]
    fn unresolved_account_reads_zero() {
        let mut book = OpeningBook::new();
        assert_eq!(book.state(&code("C")), OpeningState::Unrequested);
        let _ticket = book.begin_fetch(&code("C"));
        assert_eq!(book.opening(&code("C")), Decimal::ZERO);
        assert_eq!(book.state(&code("C")), OpeningState::Pending);
    }

    #[test]
    fn late_older_fetch_does_not_overwrite_newer() {
        let mut book = OpeningBook::new();
        let old = book.begin_fetch(&code("A"));
        let new = book.begin_fetch(&code("A"));

        assert_eq!(book.complete(new, Ok(dec!(900))), FetchOutcome::Applied);
        assert_eq!(book.complete(old, Ok(dec!(100))), FetchOutcome::Stale);
        assert_eq!(book.opening(&code("A")), dec!(900));
    }

    #[test]
    fn older_fetch_applies_until_newer_arrives() {
        let mut book = OpeningBook::new();
        let old = book.begin_fetch(&code("A"));
        let new = book.begin_fetch(&code("A"));

        assert_eq!(book.complete(old, Ok(dec!(100))), FetchOutcome::Applied);
        assert_eq!(book.opening(&code("A")), dec!(100));
        assert_eq!(book.state(&code("A")), OpeningState::Resolved(dec!(100)));

        assert_eq!(book.complete(new, Ok(dec!(900))), FetchOutcome::Applied);
        assert_eq!(book.opening(&code("A")), dec!(900));
    }

    #[test]
    fn failure_is_swallowed_and_keeps_previous_value() {
        let mut book = OpeningBook::new();
        let first = book.begin_fetch(&code("A"));
        book.complete(first, Ok(dec!(300)));

        let retry = book.begin_fetch(&code("A"));
        let outcome = book.complete(retry, Err(SourceError::NotFound(code("A"))));
        assert_eq!(outcome, FetchOutcome::Failed);
        assert_eq!(book.opening(&code("A")), dec!(300));
        assert_eq!(book.state(&code("A")), OpeningState::Resolved(dec!(300)));
    }

    #[test]
    fn failure_without_value_reports_failed_then_recovers() {
        let mut book = OpeningBook::new();
        let t = book.begin_fetch(&code("B"));
        book.complete(t, Err(SourceError::NotFound(code("B"))));
        assert_eq!(book.state(&code("B")), OpeningState::Failed);
        assert_eq!(book.opening(&code("B")), Decimal::ZERO);

        let t = book.begin_fetch(&code("B"));
        book.complete(t, Ok(dec!(75)));
        assert_eq!(book.state(&code("B")), OpeningState::Resolved(dec!(75)));
    }

    #[test]
    fn older_success_lands_after_newer_failure() {
        let mut book = OpeningBook::new();
        let old = book.begin_fetch(&code("A"));
        let new = book.begin_fetch(&code("A"));

        let outcome = book.complete(new, Err(SourceError::NotFound(code("A"))));
        assert_eq!(outcome, FetchOutcome::Failed);
        assert_eq!(book.state(&code("A")), OpeningState::Failed);

        assert_eq!(book.complete(old, Ok(dec!(500))), FetchOutcome::Applied);
        assert_eq!(book.opening(&code("A")), dec!(500));
        assert_eq!(book.state(&code("A")), OpeningState::Resolved(dec!(500)));
    }

    #[test]
    fn failure_older_than_applied_value_is_stale() {
        let mut book = OpeningBook::new();
        let old = book.begin_fetch(&code("A"));
        let new = book.begin_fetch(&code("A"));

        book.complete(new, Ok(dec!(900)));
        let outcome = book.complete(old, Err(SourceError::NotFound(code("A"))));
        assert_eq!(outcome, FetchOutcome::Stale);
        assert_eq!(book.state(&code("A")), OpeningState::Resolved(dec!(900)));
    }

    #[test]
    fn tickets_never_issued_by_the_book_are_ignored() {
        let mut book = OpeningBook::new();
        let unknown = FetchTicket {
            account: code("Z"),
            version: 1,
        };
        assert_eq!(book.complete(unknown, Ok(dec!(5))), FetchOutcome::Stale);
        assert_eq!(book.state(&code("Z")), OpeningState::Unrequested);

        let issued = book.begin_fetch(&code("A"));
        let forged = FetchTicket {
            account: code("A"),
            version: issued.version + 10,
        };
        assert_eq!(book.complete(forged, Ok(dec!(1))), FetchOutcome::Stale);

        // the real ticket still applies and later tickets keep counting from it
        assert_eq!(book.complete(issued, Ok(dec!(40))), FetchOutcome::Applied);
        assert_eq!(book.begin_fetch(&code("A")).version, 2);
        assert_eq!(book.opening(&code("A")), dec!(40));
    }

    #[test]
    fn accounts_are_independent() {
        let mut book = OpeningBook::new();
        let a = book.begin_fetch(&code("A"));
        let b = book.begin_fetch(&code("B"));

        book.complete(b, Err(SourceError::NotFound(code("B"))));
        book.complete(a, Ok(dec!(10)));

        let snap = book.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[&code("A")], dec!(10));
    }
}
