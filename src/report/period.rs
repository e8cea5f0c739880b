use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// The granularity of a report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

serde_plain::derive_display_from_serialize!(Period);
serde_plain::derive_fromstr_from_deserialize!(Period);

impl Period {
    /// The number of buckets in a report of this period.
    pub fn bucket_count(self) -> usize {
        match self {
            Period::Day => 7,
            Period::Week => 8,
            Period::Month => 12,
            Period::Year => 5,
        }
    }

    /// Whether `date` falls into the bucket anchored at `reference`.
    pub fn contains(self, reference: NaiveDate, date: NaiveDate) -> bool {
        match self {
            Period::Day => date == reference,
            Period::Week => {
                let start = week_start(reference);
                date >= start && start.checked_add_days(Days::new(6)).is_some_and(|end| date <= end)
            }
            Period::Month => date.year() == reference.year() && date.month() == reference.month(),
            Period::Year => date.year() == reference.year(),
        }
    }

    /// A short label for the bucket anchored at `reference`, e.g. `Mon 14/10`, `W2/10`, `Oct 24`
    /// or `2024`.
    pub fn label(self, reference: NaiveDate) -> String {
        match self {
            Period::Day => reference.format("%a %d/%m").to_string(),
            Period::Week => format!("W{}/{}", reference.day().div_ceil(7), reference.month()),
            Period::Month => reference.format("%b %y").to_string(),
            Period::Year => reference.format("%Y").to_string(),
        }
    }

    /// The date `steps` periods before `today`. Month and year steps clamp the day to the end of
    /// the target month.
    fn step_back(self, today: NaiveDate, steps: u32) -> Option<NaiveDate> {
        match self {
            Period::Day => today.checked_sub_days(Days::new(u64::from(steps))),
            Period::Week => today.checked_sub_days(Days::new(7 * u64::from(steps))),
            Period::Month => today.checked_sub_months(Months::new(steps)),
            Period::Year => today.checked_sub_months(Months::new(12 * steps)),
        }
    }
}

/// The bucket anchors of a report for `period` ending at `today`, oldest first.
pub fn reference_dates(period: Period, today: NaiveDate) -> Vec<NaiveDate> {
    let count = period.bucket_count() as u32;
    (0..count)
        .rev()
        .filter_map(|steps| period.step_back(today, steps))
        .collect()
}

/// The Sunday on or before `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_sunday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}
