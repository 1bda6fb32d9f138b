//! Running-balance engine for bank statement ledgers.
//!
//! Raw movement rows are normalized, grouped per account, put in
//! chronological order and folded from each account's opening balance into a
//! before/after trail plus closing totals.

pub mod accumulate;
pub mod domain;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod openings;
pub mod report;
pub mod sequence;
pub mod source;

pub use accumulate::{AccountTrail, Trail, TrailEntry, compute_trail};
pub use domain::{Account, AccountCode, BalanceSnapshot, Direction, Movement, RawMovement};
pub use error::{ReportError, SourceError};
pub use filter::{AccountFilter, StatementView, project};
pub use openings::{FetchOutcome, FetchTicket, OpeningBook, OpeningState};
pub use report::StatementReport;
pub use source::{FileSource, HttpSource, MovementSource, OpeningBalanceSource};
