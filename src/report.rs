//! Statement report state: the raw inputs and nothing derived.
//!
//! The movements snapshot, the opening-balance book and the active filter
//! are the only state. Every [`StatementReport::view`] call recomputes the
//! trail from them.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{Account, AccountCode, Movement, RawMovement};
use crate::error::{ReportError, SourceError};
use crate::filter::{AccountFilter, StatementView, project};
use crate::normalize::normalize_all;
use crate::openings::{FetchOutcome, FetchTicket, OpeningBook, OpeningState};
use crate::source::{MovementSource, OpeningBalanceSource, fan_out};

#[derive(Debug, Clone)]
pub struct StatementReport {
    movements: Arc<[Movement]>,
    openings: OpeningBook,
    filter: AccountFilter,
}

impl StatementReport {
    pub fn from_rows(rows: &[RawMovement]) -> Self {
        Self {
            movements: normalize_all(rows).into(),
            openings: OpeningBook::new(),
            filter: AccountFilter::All,
        }
    }

    /// Fetches movements once. Failure is a report-level error.
    pub fn load<S>(source: &S) -> Result<Self, ReportError>
    where
        S: MovementSource + ?Sized,
    {
        let rows = source.fetch_movements().map_err(ReportError::Movements)?;
        let report = Self::from_rows(&rows);
        tracing::info!(movements = report.movements.len(), "bank statement loaded");
        Ok(report)
    }

    pub fn movements(&self) -> &[Movement] {
        &self.movements
    }

    pub fn filter(&self) -> &AccountFilter {
        &self.filter
    }

    /// Changes the account selection and returns the visible accounts whose
    /// opening balance was never requested. Movements are not refetched.
    pub fn set_filter(&mut self, filter: AccountFilter) -> Vec<AccountCode> {
        self.filter = filter;
        self.unrequested_accounts()
    }

    pub fn visible_accounts(&self) -> Vec<AccountCode> {
        let mut codes: Vec<AccountCode> = self
            .movements
            .iter()
            .filter(|m| self.filter.includes(&m.account))
            .map(|m| m.account.clone())
            .collect();
        codes.sort();
        codes.dedup();
        codes
    }

    pub fn unrequested_accounts(&self) -> Vec<AccountCode> {
        self.visible_accounts()
            .into_iter()
            .filter(|c| !c.is_unassigned() && !self.openings.has_requested(c))
            .collect()
    }

    /// Issues tickets for every visible account not yet requested.
    pub fn begin_opening_fetches(&mut self) -> Vec<FetchTicket> {
        self.unrequested_accounts()
            .iter()
            .map(|c| self.openings.begin_fetch(c))
            .collect()
    }

    /// Issues a new ticket for `account`, superseding any fetch in flight.
    pub fn refetch_opening(&mut self, account: &AccountCode) -> FetchTicket {
        self.openings.begin_fetch(account)
    }

    pub fn apply_opening(
        &mut self,
        ticket: FetchTicket,
        result: Result<Decimal, SourceError>,
    ) -> FetchOutcome {
        self.openings.complete(ticket, result)
    }

    /// Fetches missing opening balances for the visible accounts concurrently
    /// and merges each result as it completes. Failures leave the account at
    /// its current value.
    pub fn refresh_openings<S>(&mut self, source: &S) -> usize
    where
        S: OpeningBalanceSource + Sync + ?Sized,
    {
        let tickets = self.begin_opening_fetches();
        let requested = tickets.len();
        let book = &mut self.openings;
        fan_out(source, tickets, |ticket, result| {
            book.complete(ticket, result);
        });
        requested
    }

    pub fn opening_state(&self, account: &AccountCode) -> OpeningState {
        self.openings.state(account)
    }

    pub fn view(&self) -> StatementView {
        project(&self.movements, &self.openings.snapshot(), &self.filter)
    }

    /// Distinct assigned accounts, sorted by display label ignoring case.
    pub fn accounts(&self) -> Vec<Account> {
        let mut by_code: BTreeMap<AccountCode, Option<String>> = BTreeMap::new();
        for m in self.movements.iter() {
            if m.account.is_unassigned() {
                continue;
            }
            let name = by_code.entry(m.account.clone()).or_default();
            if name.is_none() {
                *name = m.account_name.clone();
            }
        }

        let mut accounts: Vec<Account> = by_code
            .into_iter()
            .map(|(code, name)| Account { code, name })
            .collect();
        accounts.sort_by_cached_key(|a| {
            let label = a.label();
            (label.to_lowercase(), label)
        });
        accounts
    }
}
