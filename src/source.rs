//! Movement and opening-balance collaborators.

use reqwest::Url;
use reqwest::blocking::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use crate::domain::{AccountCode, RawMovement};
use crate::error::{Result, SourceError};
use crate::normalize::{decimal, parse_payload};
use crate::openings::FetchTicket;

pub trait MovementSource {
    fn fetch_movements(&self) -> Result<Vec<RawMovement>>;
}

pub trait OpeningBalanceSource {
    fn fetch_opening(&self, account: &AccountCode) -> Result<Decimal>;
}

/// Fetches every ticket's opening balance concurrently.
///
/// `on_result` runs on the calling thread, once per ticket, in completion
/// order.
pub fn fan_out<S, F>(source: &S, tickets: Vec<FetchTicket>, mut on_result: F)
where
    S: OpeningBalanceSource + Sync + ?Sized,
    F: FnMut(FetchTicket, Result<Decimal>),
{
    if tickets.is_empty() {
        return;
    }

    let (tx, rx) = mpsc::channel();
    std::thread::scope(|scope| {
        for ticket in tickets {
            let tx = tx.clone();
            scope.spawn(move || {
                let result = source.fetch_opening(&ticket.account);
                let _ = tx.send((ticket, result));
            });
        }
        drop(tx);

        for (ticket, result) in rx {
            on_result(ticket, result);
        }
    });
}

pub struct HttpSource {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpSource {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let parsed =
            Url::parse(base_url).map_err(|_| SourceError::InvalidUrl(base_url.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(SourceError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ledgertrail/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: parsed,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Appends percent-encoded path segments to the base URL.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get_json(&self, url: Url) -> Result<Value> {
        let mut req = self
            .client
            .get(url.clone())
            .header("Accept", "application/json");
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send()?;
        if !resp.status().is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        resp.json::<Value>()
            .map_err(|e| SourceError::Decode(e.to_string()))
    }
}

impl MovementSource for HttpSource {
    fn fetch_movements(&self) -> Result<Vec<RawMovement>> {
        let url = self.endpoint(&["reports", "bank-deposits"])?;
        tracing::debug!(%url, "fetching bank movements");
        Ok(parse_payload(self.get_json(url)?))
    }
}

impl OpeningBalanceSource for HttpSource {
    fn fetch_opening(&self, account: &AccountCode) -> Result<Decimal> {
        let url = self.endpoint(&["banks", account.as_str(), "metrics"])?;
        tracing::debug!(%url, "fetching opening balance");
        opening_from_metrics(&self.get_json(url)?)
    }
}

/// Reads `totals.opening` from a metrics payload. A present `totals` object
/// without `opening` means an opening of 0.
pub fn opening_from_metrics(body: &Value) -> Result<Decimal> {
    match body.get("totals") {
        Some(totals @ Value::Object(_)) => Ok(totals
            .get("opening")
            .and_then(decimal)
            .unwrap_or(Decimal::ZERO)),
        _ => Err(SourceError::Decode("metrics response has no totals".to_string())),
    }
}

/// Local JSON files: a movement array and an optional `{ code: opening }` map.
pub struct FileSource {
    movements: PathBuf,
    openings: Option<PathBuf>,
}

impl FileSource {
    pub fn new(movements: impl Into<PathBuf>, openings: Option<PathBuf>) -> Self {
        Self {
            movements: movements.into(),
            openings,
        }
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| SourceError::Decode(format!("{}: {e}", path.display())))
}

impl MovementSource for FileSource {
    fn fetch_movements(&self) -> Result<Vec<RawMovement>> {
        Ok(parse_payload(read_json(&self.movements)?))
    }
}

impl OpeningBalanceSource for FileSource {
    fn fetch_opening(&self, account: &AccountCode) -> Result<Decimal> {
        let Some(path) = &self.openings else {
            return Err(SourceError::NotFound(account.clone()));
        };

        let map = read_json(path)?;
        let entry = map
            .get(account.as_str())
            .ok_or_else(|| SourceError::NotFound(account.clone()))?;

        let value = match entry {
            Value::Object(_) => return opening_from_metrics(entry),
            other => decimal(other),
        };
        value.ok_or_else(|| SourceError::Decode(format!("opening for {account} is not a number")))
    }
}
