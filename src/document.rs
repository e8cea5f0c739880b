//! A printable Markdown report of the transaction collection.

use crate::model::{date, FuelTransaction};
use crate::report::Summary;
use crate::spreadsheet::HEADER;
use crate::utils::format_number;
use chrono::NaiveDate;
use std::fmt::Write;

const TITLE: &str = "Fuel Expense Report";

/// Renders the title, a table with one row per transaction and the summary lines.
pub fn render(transactions: &[FuelTransaction], exported_on: NaiveDate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {TITLE}\n");
    let _ = writeln!(out, "Exported on {}\n", date::display_date(exported_on));

    let _ = writeln!(out, "| {} |", HEADER.join(" | "));
    let _ = writeln!(out, "|{}", "---|".repeat(HEADER.len()));
    for tx in transactions {
        let cells = [
            date::display_date(tx.date()),
            format_number(tx.amount(), 2),
            format_number(tx.price_per_liter(), 0),
            format_number(tx.total_cost(), 0),
            km(tx.last_km_reading()),
            km(tx.km_reading()),
            km(tx.distance()),
            escape(tx.location().unwrap_or_default()),
            escape(tx.notes().unwrap_or_default()),
        ];
        let _ = writeln!(out, "| {} |", cells.join(" | "));
    }

    let summary = Summary::of(transactions);
    let _ = writeln!(out);
    let _ = writeln!(out, "- Total cost: {}", format_number(summary.total_cost, 0));
    let _ = writeln!(out, "- Total liters: {}", format_number(summary.total_liters, 2));
    let _ = writeln!(
        out,
        "- Average price per liter: {}",
        format_number(summary.average_price, 0)
    );
    out
}

fn km(value: Option<f64>) -> String {
    value.map(|v| format_number(v, 0)).unwrap_or_default()
}

fn escape(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransactionFields;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_render() {
        let txs = vec![
            FuelTransaction::new(
                "a",
                TransactionFields::new(ymd(2024, 3, 15), 30.0, 23000.0)
                    .with_km(Some(12000.0), Some(12500.0))
                    .with_location("A | B"),
            ),
            FuelTransaction::new(
                "b",
                TransactionFields::new(ymd(2024, 3, 16), 20.0, 24000.0),
            ),
        ];
        let doc = render(&txs, ymd(2024, 3, 20));
        assert!(doc.starts_with("# Fuel Expense Report\n"));
        assert!(doc.contains("Exported on 20/03/2024"));
        assert!(doc.contains("| Date | Liters | Price/L |"));
        assert!(doc.contains(
            "| 15/03/2024 | 30.00 | 23,000 | 690,000 | 12,000 | 12,500 | 500 | A \\| B |  |"
        ));
        assert!(doc.contains("- Total cost: 1,170,000"));
        assert!(doc.contains("- Total liters: 50.00"));
        assert!(doc.contains("- Average price per liter: 23,400"));
    }

    #[test]
    fn test_render_empty() {
        let doc = render(&[], ymd(2024, 3, 20));
        assert!(doc.contains("- Total cost: 0"));
        assert!(doc.contains("- Average price per liter: 0"));
    }
}
