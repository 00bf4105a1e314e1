//! Plain-text rendering of the console grid.

use std::fmt::Write;

use stockline_core::{ConsoleRow, ConsoleView, Severity};

/// Formats basis points as a percentage with two decimals.
pub fn percent(bps: i64) -> String {
    let sign = if bps < 0 { "-" } else { "" };
    let abs = bps.unsigned_abs();
    format!("{}{}.{:02}%", sign, abs / 100, abs % 100)
}

/// `M` modified, `W` warning, `X` blocked.
pub fn flags(row: &ConsoleRow) -> String {
    let mut out = String::new();
    if row.is_modified {
        out.push('M');
    }
    if row.validation.has_warnings() {
        out.push('W');
    }
    if row.is_blocked() {
        out.push('X');
    }
    out
}

pub fn table(view: &ConsoleView) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:<14} {:<24} {:>4} {:>12} {:>7} {:>12} {:>12} {:>8}  {}",
        "CODE", "NAME", "GST", "COST", "STOCK", "PRICE", "INCL GST", "MARGIN", "FLAGS"
    );

    for row in &view.rows {
        let name: String = row.item_name.chars().take(24).collect();
        let _ = writeln!(
            out,
            "{:<14} {:<24} {:>4} {:>12} {:>7} {:>12} {:>12} {:>8}  {}",
            row.item_code,
            name,
            row.gst_rate.to_string(),
            row.cost_price.to_string(),
            row.stock_quantity,
            row.pricing.base_selling_price.to_string(),
            row.pricing.selling_price_incl_gst.to_string(),
            percent(row.pricing.margin_bps),
            flags(row)
        );

        for issue in &row.validation.issues {
            let marker = match issue.severity {
                Severity::Info => "i",
                Severity::Warning => "!",
                Severity::Error => "x",
            };
            let _ = writeln!(out, "    {} {}", marker, issue.message);
        }
    }

    let summary = view.summary();
    let _ = writeln!(
        out,
        "\n{} item(s), {} modified, {} blocked, {} with warnings",
        summary.total, summary.modified, summary.blocked, summary.with_warnings
    );

    if !view.orphaned_item_codes.is_empty() {
        let _ = writeln!(
            out,
            "Edits ignored for items no longer in the ERP: {}",
            view.orphaned_item_codes.join(", ")
        );
    }

    out
}
