//! Bucketing of transactions into day, week, month or year windows, and the totals derived from
//! them.
//!
//! Every average is guarded: a zero denominator yields `0.0`, never a non-finite value.

mod period;

pub use period::{reference_dates, Period};

use crate::model::FuelTransaction;
use chrono::NaiveDate;
use serde::Serialize;

/// Sums and averages over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub total_cost: f64,
    pub total_liters: f64,
    pub transaction_count: usize,
    /// `total_cost / total_liters`, or `0.0` without liters.
    pub avg_price: f64,
    /// The sum of the clamped distances of entries that carry both odometer readings.
    pub total_km_driven: f64,
    /// How many entries carry both odometer readings.
    pub km_entry_count: usize,
    /// `total_km_driven / km_entry_count`, or `0.0` when no entry has both readings.
    pub avg_km_per_transaction: f64,
}

impl Totals {
    pub fn of<'a, I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a FuelTransaction>,
    {
        let mut totals = Totals::default();
        for tx in transactions {
            totals.total_cost += tx.total_cost();
            totals.total_liters += tx.amount();
            totals.transaction_count += 1;
            if let Some(km) = tx.driven_km() {
                totals.total_km_driven += km;
                totals.km_entry_count += 1;
            }
        }
        totals.with_averages()
    }

    /// Adds up `parts` and recomputes the averages from the sums. The km average divides by
    /// the entries that carry both readings, the same rule as a single bucket.
    pub fn combine<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = &'a Totals>,
    {
        let mut totals = Totals::default();
        for part in parts {
            totals.total_cost += part.total_cost;
            totals.total_liters += part.total_liters;
            totals.transaction_count += part.transaction_count;
            totals.total_km_driven += part.total_km_driven;
            totals.km_entry_count += part.km_entry_count;
        }
        totals.with_averages()
    }

    fn with_averages(mut self) -> Self {
        self.avg_price = ratio(self.total_cost, self.total_liters);
        self.avg_km_per_transaction = ratio(self.total_km_driven, self.km_entry_count as f64);
        self
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// One window of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub reference_date: NaiveDate,
    pub label: String,
    pub totals: Totals,
    pub transaction_ids: Vec<String>,
}

/// A fixed number of buckets, oldest first, plus totals across all of them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub period: Period,
    pub buckets: Vec<Bucket>,
    pub totals: Totals,
}

/// Builds the report for `period` ending at `today`. Transactions older than the first bucket
/// are not counted.
pub fn aggregate(transactions: &[FuelTransaction], period: Period, today: NaiveDate) -> Report {
    let buckets: Vec<Bucket> = reference_dates(period, today)
        .into_iter()
        .map(|reference_date| {
            let members: Vec<&FuelTransaction> = transactions
                .iter()
                .filter(|tx| period.contains(reference_date, tx.date()))
                .collect();
            Bucket {
                reference_date,
                label: period.label(reference_date),
                totals: Totals::of(members.iter().copied()),
                transaction_ids: members.iter().map(|tx| tx.id().to_string()).collect(),
            }
        })
        .collect();
    let totals = Totals::combine(buckets.iter().map(|b| &b.totals));
    Report {
        period,
        buckets,
        totals,
    }
}

/// Whole-collection figures for the summary view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub transaction_count: usize,
    pub total_cost: f64,
    pub total_liters: f64,
    pub average_price: f64,
    pub total_km_driven: f64,
    pub average_km_per_transaction: f64,
}

impl Summary {
    pub fn of(transactions: &[FuelTransaction]) -> Self {
        let totals = Totals::of(transactions);
        Self {
            transaction_count: totals.transaction_count,
            total_cost: totals.total_cost,
            total_liters: totals.total_liters,
            average_price: totals.avg_price,
            total_km_driven: totals.total_km_driven,
            average_km_per_transaction: totals.avg_km_per_transaction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransactionFields;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(id: &str, date: NaiveDate, amount: f64, price: f64) -> FuelTransaction {
        FuelTransaction::new(id, TransactionFields::new(date, amount, price))
    }

    fn tx_km(id: &str, date: NaiveDate, last: Option<f64>, current: Option<f64>) -> FuelTransaction {
        FuelTransaction::new(
            id,
            TransactionFields::new(date, 10.0, 20000.0).with_km(last, current),
        )
    }

    #[test]
    fn test_grand_totals_scenario() {
        let today = ymd(2024, 3, 20);
        let txs = vec![
            tx("a", ymd(2024, 3, 15), 30.0, 23000.0),
            tx("b", ymd(2024, 3, 16), 20.0, 24000.0),
        ];
        let report = aggregate(&txs, Period::Month, today);
        assert!((report.totals.total_cost - 1_170_000.0).abs() < 1e-6);
        assert!((report.totals.total_liters - 50.0).abs() < 1e-9);
        assert!((report.totals.avg_price - 23_400.0).abs() < 1e-6);
        assert_eq!(report.totals.transaction_count, 2);

        let summary = Summary::of(&txs);
        assert!((summary.total_cost - 1_170_000.0).abs() < 1e-6);
        assert!((summary.average_price - 23_400.0).abs() < 1e-6);
    }

    #[test]
    fn test_month_membership_is_exclusive() {
        let today = ymd(2024, 10, 14);
        let txs = vec![tx("march", ymd(2024, 3, 15), 30.0, 23000.0)];
        let report = aggregate(&txs, Period::Month, today);
        let holding: Vec<&Bucket> = report
            .buckets
            .iter()
            .filter(|b| b.transaction_ids.contains(&"march".to_string()))
            .collect();
        assert_eq!(holding.len(), 1);
        assert_eq!(holding[0].reference_date, ymd(2024, 3, 14));
        assert_eq!(holding[0].label, "Mar 24");
    }

    #[test]
    fn test_empty_bucket_averages_are_zero() {
        let report = aggregate(&[], Period::Week, ymd(2024, 10, 14));
        assert_eq!(report.buckets.len(), 8);
        for bucket in &report.buckets {
            assert_eq!(bucket.totals.avg_price, 0.0);
            assert_eq!(bucket.totals.avg_km_per_transaction, 0.0);
            assert_eq!(bucket.totals.transaction_count, 0);
        }
        assert_eq!(report.totals, Totals::default());
    }

    #[test]
    fn test_km_average_only_counts_entries_with_both_readings() {
        let date = ymd(2024, 10, 14);
        let txs = vec![
            tx_km("both", date, Some(12000.0), Some(12500.0)),
            tx_km("current-only", date, None, Some(13000.0)),
            tx_km("none", date, None, None),
        ];
        let report = aggregate(&txs, Period::Day, date);
        let today_bucket = report.buckets.last().unwrap();
        assert_eq!(today_bucket.totals.total_km_driven, 500.0);
        assert_eq!(today_bucket.totals.km_entry_count, 1);
        assert_eq!(today_bucket.totals.avg_km_per_transaction, 500.0);
        assert_eq!(today_bucket.totals.transaction_count, 3);
        assert_eq!(report.totals.avg_km_per_transaction, 500.0);
    }

    #[test]
    fn test_negative_distance_is_clamped_but_counted() {
        let date = ymd(2024, 10, 14);
        let txs = vec![
            tx_km("forward", date, Some(12000.0), Some(12600.0)),
            tx_km("backward", date, Some(13000.0), Some(12500.0)),
            tx_km("zero-start", date, Some(0.0), Some(100.0)),
        ];
        let totals = Totals::of(&txs);
        assert_eq!(totals.total_km_driven, 700.0);
        assert_eq!(totals.km_entry_count, 3);
        assert!((totals.avg_km_per_transaction - 700.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_transactions_outside_the_window_are_ignored() {
        let today = ymd(2024, 10, 14);
        let txs = vec![
            tx("old", ymd(2024, 10, 1), 30.0, 23000.0),
            tx("recent", ymd(2024, 10, 13), 20.0, 24000.0),
            tx("future", ymd(2024, 10, 15), 20.0, 24000.0),
        ];
        let report = aggregate(&txs, Period::Day, today);
        assert_eq!(report.totals.transaction_count, 1);
        assert_eq!(report.buckets[5].transaction_ids, vec!["recent".to_string()]);
    }

    #[test]
    fn test_year_buckets() {
        let today = ymd(2024, 6, 1);
        let txs = vec![
            tx("a", ymd(2020, 1, 1), 10.0, 20000.0),
            tx("b", ymd(2019, 12, 31), 10.0, 20000.0),
            tx("c", ymd(2024, 12, 31), 10.0, 20000.0),
        ];
        let report = aggregate(&txs, Period::Year, today);
        let labels: Vec<&str> = report.buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["2020", "2021", "2022", "2023", "2024"]);
        assert_eq!(report.buckets[0].transaction_ids, vec!["a".to_string()]);
        assert_eq!(report.buckets[4].transaction_ids, vec!["c".to_string()]);
        assert_eq!(report.totals.transaction_count, 2);
    }

    #[test]
    fn test_summary_of_empty_collection() {
        let summary = Summary::of(&[]);
        assert_eq!(summary, Summary::default());
        assert!(summary.average_price.is_finite());
    }
}
