use crate::error::Res;
use anyhow::ensure;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single refueling event.
///
/// The serialized form uses camelCase keys (`pricePerLiter`, `kmReading`, ...) so that the
/// snapshot kept in the key-value store stays readable by the web client that shares the format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelTransaction {
    id: String,
    date: NaiveDate,
    /// Liters of fuel.
    amount: f64,
    price_per_liter: f64,
    /// Stored as given; never recomputed on read.
    total_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    /// The odometer after this fill.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    km_reading: Option<f64>,
    /// The odometer before this fill.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_km_reading: Option<f64>,
}

impl FuelTransaction {
    /// Builds a transaction from `fields`. `total_cost` is computed from amount and price only when
    /// `fields` does not supply it.
    pub(crate) fn new(id: impl Into<String>, fields: TransactionFields) -> Self {
        let total_cost = fields.total_cost();
        Self {
            id: id.into(),
            date: fields.date,
            amount: fields.amount,
            price_per_liter: fields.price_per_liter,
            total_cost,
            location: fields.location,
            notes: fields.notes,
            km_reading: fields.km_reading,
            last_km_reading: fields.last_km_reading,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn price_per_liter(&self) -> f64 {
        self.price_per_liter
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn km_reading(&self) -> Option<f64> {
        self.km_reading
    }

    pub fn last_km_reading(&self) -> Option<f64> {
        self.last_km_reading
    }

    /// `km_reading - last_km_reading` when both readings are present. This can be negative if the
    /// readings were entered the wrong way around.
    pub fn distance(&self) -> Option<f64> {
        match (self.km_reading, self.last_km_reading) {
            (Some(current), Some(last)) => Some(current - last),
            _ => None,
        }
    }

    /// The distance that counts toward statistics: `distance()` clamped at zero.
    pub fn driven_km(&self) -> Option<f64> {
        self.distance().map(|d| d.max(0.0))
    }

    /// Returns every field except the id, e.g. to prefill an edit.
    pub fn fields(&self) -> TransactionFields {
        TransactionFields {
            date: self.date,
            amount: self.amount,
            price_per_liter: self.price_per_liter,
            total_cost: Some(self.total_cost),
            location: self.location.clone(),
            notes: self.notes.clone(),
            km_reading: self.km_reading,
            last_km_reading: self.last_km_reading,
        }
    }
}

/// The data of a transaction without its id. This is what forms, voice input, spreadsheet
/// import and edits produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFields {
    pub date: NaiveDate,
    pub amount: f64,
    pub price_per_liter: f64,
    /// When `None`, the total is `amount * price_per_liter`.
    #[serde(default)]
    pub total_cost: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub km_reading: Option<f64>,
    #[serde(default)]
    pub last_km_reading: Option<f64>,
}

impl TransactionFields {
    /// Creates fields with the required values and no optional ones.
    pub fn new(date: NaiveDate, amount: f64, price_per_liter: f64) -> Self {
        Self {
            date,
            amount,
            price_per_liter,
            total_cost: None,
            location: None,
            notes: None,
            km_reading: None,
            last_km_reading: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = non_empty(location.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = non_empty(notes.into());
        self
    }

    pub fn with_km(mut self, last_km_reading: Option<f64>, km_reading: Option<f64>) -> Self {
        self.last_km_reading = last_km_reading;
        self.km_reading = km_reading;
        self
    }

    pub fn with_total_cost(mut self, total_cost: f64) -> Self {
        self.total_cost = Some(total_cost);
        self
    }

    /// The supplied total, or `amount * price_per_liter` if none was supplied.
    pub fn total_cost(&self) -> f64 {
        self.total_cost
            .unwrap_or(self.amount * self.price_per_liter)
    }

    /// Whether amount and price are both usable, the minimum for a row to be accepted.
    pub fn has_amount_and_price(&self) -> bool {
        is_positive(self.amount) && is_positive(self.price_per_liter)
    }

    /// Checks the constraints of a transaction:
    /// - `amount` and `price_per_liter` are finite and greater than zero
    /// - odometer readings, when given, are finite and non-negative
    pub fn validate(&self) -> Res<()> {
        ensure!(
            is_positive(self.amount),
            "The amount of fuel must be greater than zero, got {}",
            self.amount
        );
        ensure!(
            is_positive(self.price_per_liter),
            "The price per liter must be greater than zero, got {}",
            self.price_per_liter
        );
        if let Some(total) = self.total_cost {
            ensure!(total.is_finite(), "The total cost must be a number");
        }
        for (name, reading) in [
            ("current km", self.km_reading),
            ("last km", self.last_km_reading),
        ] {
            if let Some(value) = reading {
                ensure!(
                    value.is_finite() && value >= 0.0,
                    "The {name} reading cannot be negative, got {value}"
                );
            }
        }
        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
