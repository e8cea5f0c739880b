//! The request and response shapes of the remote metadata API.
//!
//! The API stores generic key/value records. Fuel transactions are records whose `meta_key` is
//! the configured tag (`"fuel"` by default) and whose `meta_value` is a JSON-encoded `FuelMeta`.

use crate::error::Res;
use crate::model::{date, FuelTransaction, TransactionFields};
use anyhow::Context;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One page of records returned by a `GET`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaPage {
    #[serde(default)]
    pub body: Vec<MetaRecord>,
}

/// A generic metadata record as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub meta_id: String,
    pub meta_key: String,
    pub meta_value: String,
}

impl MetaRecord {
    /// Parses `meta_value` and turns it into a transaction that uses `meta_id` as its id.
    pub fn to_transaction(&self) -> Res<FuelTransaction> {
        let meta: FuelMeta = serde_json::from_str(&self.meta_value).with_context(|| {
            format!("Unable to parse the value of metadata record {}", self.meta_id)
        })?;
        meta.into_transaction(&self.meta_id)
    }
}

/// The body of a `POST` that creates or replaces a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaPost {
    pub tokenkey: String,
    pub object_id: String,
    pub meta_key: String,
    /// A JSON-encoded `FuelMeta`.
    pub meta_value: String,
}

impl MetaPost {
    pub(crate) fn new(
        token: impl Into<String>,
        meta_key: impl Into<String>,
        transaction: &FuelTransaction,
    ) -> Res<Self> {
        let meta_value = serde_json::to_string(&FuelMeta::from(transaction))
            .context("Unable to serialize the fuel record")?;
        Ok(Self {
            tokenkey: token.into(),
            object_id: transaction.id().to_string(),
            meta_key: meta_key.into(),
            meta_value,
        })
    }
}

/// The transaction payload nested in `meta_value`. Numbers may arrive as JSON numbers or as
/// numeric strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelMeta {
    pub date: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub liters: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub price_per_liter: f64,
    #[serde(
        default,
        deserialize_with = "lenient_opt_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_cost: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_km: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_km: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub distance: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub note: String,
}

impl FuelMeta {
    pub(crate) fn into_transaction(self, id: &str) -> Res<FuelTransaction> {
        let date = date::parse_date(&self.date)
            .with_context(|| format!("Invalid date '{}' in fuel record {id}", self.date))?;
        let mut fields = TransactionFields::new(date, self.liters, self.price_per_liter)
            .with_location(self.location)
            .with_notes(self.note)
            .with_km(self.last_km, self.current_km);
        fields.total_cost = self.total_cost;
        fields
            .validate()
            .with_context(|| format!("Fuel record {id} is not a valid transaction"))?;
        Ok(FuelTransaction::new(id, fields))
    }
}

impl From<&FuelTransaction> for FuelMeta {
    fn from(tx: &FuelTransaction) -> Self {
        Self {
            date: tx.date().format("%Y-%m-%d").to_string(),
            liters: tx.amount(),
            price_per_liter: tx.price_per_liter(),
            total_cost: Some(tx.total_cost()),
            last_km: tx.last_km_reading(),
            current_km: tx.km_reading(),
            distance: tx.distance(),
            location: tx.location().unwrap_or_default().to_string(),
            note: tx.notes().unwrap_or_default().to_string(),
        }
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_f64(&value).ok_or_else(|| D::Error::custom(format!("expected a number, got {value}")))
}

fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        _ => value_to_f64(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a number, got {value}"))),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("expected a string, got {other}"))),
    }
}
