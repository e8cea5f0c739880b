//! CSV import and export of the transaction collection.
//!
//! Columns, by position: `Date, Liters, Price/L, TotalCost, LastKm, CurrentKm, DistanceKm,
//! Location, Notes`. The first row is always a header.

use crate::error::Res;
use crate::model::{date, FuelTransaction, TransactionFields};
use anyhow::Context;
use chrono::NaiveDate;
use tracing::debug;

pub const HEADER: [&str; 9] = [
    "Date",
    "Liters",
    "Price/L",
    "TotalCost",
    "LastKm",
    "CurrentKm",
    "DistanceKm",
    "Location",
    "Notes",
];

const DATE: usize = 0;
const LITERS: usize = 1;
const PRICE: usize = 2;
const TOTAL: usize = 3;
const LAST_KM: usize = 4;
const CURRENT_KM: usize = 5;
const LOCATION: usize = 7;
const NOTES: usize = 8;

/// Renders `transactions` as CSV, in the order given.
pub fn write_csv(transactions: &[FuelTransaction]) -> Res<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(HEADER)
        .context("Unable to write the CSV header")?;
    for tx in transactions {
        writer
            .write_record(row(tx))
            .with_context(|| format!("Unable to write transaction {}", tx.id()))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to finish the CSV output: {}", e.error()))
}

/// The cells of one transaction. Distance is only filled in when both readings are present.
pub fn row(tx: &FuelTransaction) -> [String; 9] {
    let opt = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();
    [
        date::display_date(tx.date()),
        tx.amount().to_string(),
        tx.price_per_liter().to_string(),
        tx.total_cost().to_string(),
        opt(tx.last_km_reading()),
        opt(tx.km_reading()),
        opt(tx.distance()),
        tx.location().unwrap_or_default().to_string(),
        tx.notes().unwrap_or_default().to_string(),
    ]
}

/// Parses CSV `data` into candidate rows. The header row is skipped, as is any row without a
/// readable date. Rows are not validated here; that is up to `TransactionStore::import_batch`.
///
/// # Errors
/// Returns an error if `data` is not well-formed CSV, in which case nothing should be imported.
pub fn parse_csv(data: &[u8]) -> Res<Vec<TransactionFields>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);
    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        // Row numbers as a spreadsheet user would count them, header included.
        let line = i + 2;
        let record = record.with_context(|| format!("Unable to read row {line}"))?;
        let cell = |index: usize| record.get(index).unwrap_or("");
        let Some(date) = parse_date_cell(cell(DATE)) else {
            debug!("Skipping row {line}: no readable date in '{}'", cell(DATE));
            continue;
        };
        let mut fields = TransactionFields::new(
            date,
            number_or_zero(cell(LITERS)),
            number_or_zero(cell(PRICE)),
        )
        .with_km(number(cell(LAST_KM)), number(cell(CURRENT_KM)))
        .with_location(cell(LOCATION))
        .with_notes(cell(NOTES));
        if !cell(TOTAL).is_empty() {
            fields.total_cost = Some(number_or_zero(cell(TOTAL)));
        }
        rows.push(fields);
    }
    Ok(rows)
}

fn parse_date_cell(s: &str) -> Option<NaiveDate> {
    date::parse_date(s).or_else(|| number(s).and_then(date::from_serial))
}

/// Parses a number, ignoring thousands separators and spaces. `None` for empty or unreadable
/// cells.
fn number(s: &str) -> Option<f64> {
    let cleaned: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn number_or_zero(s: &str) -> f64 {
    number(s).unwrap_or(0.0)
}
