use ledgertrail::{AccountCode, AccountFilter, OpeningState, StatementReport, StatementView};
use std::fmt::Write as _;

pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return "(no columns)\n".to_string();
    }

    let cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().take(cols).enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
        out.push('|');
        for (i, w) in widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let _ = write!(out, " {:width$} |", cell, width = *w);
        }
        out.push('\n');
    }

    let mut out = String::new();
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_row(&mut out, &header_cells, &widths);
    out.push('|');
    for w in &widths {
        let _ = write!(out, "{}|", "-".repeat(w + 2));
    }
    out.push('\n');
    for row in rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn opening_status(report: &StatementReport, account: &AccountCode) -> &'static str {
    if account.is_unassigned() {
        return "n/a";
    }
    match report.opening_state(account) {
        OpeningState::Failed => "unavailable",
        state => state.label(),
    }
}

fn empty_message(filter: &AccountFilter) -> String {
    match filter {
        AccountFilter::All => "(no movements)".to_string(),
        AccountFilter::Only(code) => format!("(no movements for account {code})"),
    }
}

pub fn statement_table(report: &StatementReport, view: &StatementView) -> String {
    if view.trail.is_empty() {
        return format!("{}\n", empty_message(report.filter()));
    }

    let mut rows = Vec::new();
    for t in view.trail.accounts.values() {
        for e in &t.entries {
            let m = &e.movement;
            rows.push(vec![
                m.account.to_string(),
                m.entry_no.clone().unwrap_or_else(|| "-".to_string()),
                m.direction.short_label().to_string(),
                m.slip_no.clone().unwrap_or_else(|| "-".to_string()),
                m.effective_at.format("%Y-%m-%d").to_string(),
                e.balance.before.to_string(),
                m.magnitude.to_string(),
                e.balance.after.to_string(),
            ]);
        }
    }

    let mut out = format_table(
        &["ACCOUNT", "ENTRY", "TYPE", "SLIP", "DATE", "BEFORE", "AMOUNT", "AFTER"],
        &rows,
    );
    out.push('\n');

    let closing_rows: Vec<Vec<String>> = view
        .trail
        .accounts
        .values()
        .map(|t| {
            vec![
                t.account.to_string(),
                t.opening.to_string(),
                opening_status(report, &t.account).to_string(),
                t.closing.to_string(),
            ]
        })
        .collect();
    out.push_str(&format_table(
        &["ACCOUNT", "OPENING", "STATUS", "CLOSING"],
        &closing_rows,
    ));
    out.push('\n');

    let _ = writeln!(out, "Total amount: {}", view.total_amount);
    let _ = writeln!(out, "Cash in bank: {}", view.combined_total);
    out
}

pub fn statement_tsv(report: &StatementReport, view: &StatementView) -> String {
    let mut out = String::new();
    if view.trail.is_empty() {
        let _ = writeln!(out, "{}", empty_message(report.filter()));
    }

    for t in view.trail.accounts.values() {
        for e in &t.entries {
            let m = &e.movement;
            let _ = writeln!(
                out,
                "movement\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                m.account,
                m.id,
                m.direction.short_label(),
                m.effective_at.format("%Y-%m-%d"),
                e.balance.before,
                m.magnitude,
                e.balance.after
            );
        }
    }
    for t in view.trail.accounts.values() {
        let _ = writeln!(
            out,
            "closing\t{}\t{}\t{}\t{}",
            t.account,
            t.closing,
            t.opening,
            opening_status(report, &t.account)
        );
    }
    let _ = writeln!(out, "amount_total\t{}", view.total_amount);
    let _ = writeln!(out, "total\t{}", view.combined_total);
    out
}

pub fn accounts_table(report: &StatementReport) -> String {
    let accounts = report.accounts();
    if accounts.is_empty() {
        return "(no accounts)\n".to_string();
    }

    let rows: Vec<Vec<String>> = accounts
        .iter()
        .map(|a| {
            let opening = match report.opening_state(&a.code) {
                OpeningState::Resolved(v) => v.to_string(),
                _ => "-".to_string(),
            };
            vec![
                a.code.to_string(),
                a.label(),
                opening,
                opening_status(report, &a.code).to_string(),
            ]
        })
        .collect();
    format_table(&["CODE", "LABEL", "OPENING", "STATUS"], &rows)
}
