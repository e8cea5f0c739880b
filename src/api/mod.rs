//! Collaborators outside the process: the remote metadata API and the speech, identity and cloud
//! sync capabilities. Each sits behind a trait so that the mock or test implementation can be
//! swapped in.

mod cloud;
mod identity;
mod meta_http;
mod meta_test;
mod voice;

pub use cloud::{CloudSync, MockCloudSync};
pub use identity::{Identity, IdentityProvider, MockIdentityProvider};
pub use meta_http::HttpMetaApi;
pub use meta_test::{TestMetaApi, TestMetaState};
pub use voice::{MockSpeechToText, SpeechToText};

use crate::error::{ErrorType, IntoResult};
use crate::model::{FuelTransaction, MetaPost, MetaRecord};
use crate::{Config, Result};
use std::collections::HashSet;
use tracing::{debug, warn};

/// The environment variable that switches the program to in-memory collaborators.
pub const TEST_MODE_ENV: &str = "FUEL_TRACKER_IN_TEST_MODE";

/// Selects real or in-memory collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Talk to the configured remote API.
    #[default]
    Live,
    /// Use `TestMetaApi`; nothing leaves the process.
    Test,
}

impl Mode {
    /// `Mode::Test` when `FUEL_TRACKER_IN_TEST_MODE` is set to a non-empty value.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Live,
        }
    }
}

/// The remote metadata API.
#[async_trait::async_trait]
pub trait MetaApi: Send + Sync {
    /// Returns the first page of records matching the configured query.
    async fn fetch(&self) -> Result<Vec<MetaRecord>>;

    /// Creates or replaces one record.
    async fn post(&self, post: &MetaPost) -> Result<()>;
}

/// Builds the `MetaApi` for `mode`.
pub fn meta_api(config: &Config, mode: Mode) -> Result<Box<dyn MetaApi>> {
    match mode {
        Mode::Live => Ok(Box::new(
            HttpMetaApi::new(config).pub_result(ErrorType::Config)?,
        )),
        Mode::Test => Ok(Box::new(TestMetaApi::for_config(config))),
    }
}

/// Fetches the records tagged `meta_key` and turns them into transactions. Records with another
/// key are dropped. Records whose payload cannot be parsed or is not a valid transaction are
/// skipped, as is any record whose `meta_id` was already seen.
pub async fn fetch_transactions(api: &dyn MetaApi, meta_key: &str) -> Result<Vec<FuelTransaction>> {
    let records = api.fetch().await?;
    let total = records.len();
    let mut seen = HashSet::new();
    let transactions: Vec<FuelTransaction> = records
        .iter()
        .filter(|record| record.meta_key == meta_key)
        .filter_map(|record| match record.to_transaction() {
            Ok(tx) => Some(tx),
            Err(e) => {
                warn!("Skipping metadata record {}: {e:#}", record.meta_id);
                None
            }
        })
        .filter(|tx| {
            let first = seen.insert(tx.id().to_string());
            if !first {
                warn!("Skipping metadata record {}: the id is repeated", tx.id());
            }
            first
        })
        .collect();
    debug!(
        "Fetched {total} metadata records, {} of them fuel transactions",
        transactions.len()
    );
    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_fetch_transactions_filters_and_skips() {
        let env = TestEnv::new().await;
        let api = TestMetaApi::for_config(&env.config());
        api.set_state(TestMetaState::new(vec![
            MetaRecord {
                meta_id: "1".to_string(),
                meta_key: "fuel".to_string(),
                meta_value: r#"{"date":"2024-03-15","liters":30,"price_per_liter":23000}"#
                    .to_string(),
            },
            MetaRecord {
                meta_id: "2".to_string(),
                meta_key: "hotel".to_string(),
                meta_value: r#"{"date":"2024-03-15","liters":30,"price_per_liter":23000}"#
                    .to_string(),
            },
            MetaRecord {
                meta_id: "3".to_string(),
                meta_key: "fuel".to_string(),
                meta_value: "{broken".to_string(),
            },
        ]));
        let txs = fetch_transactions(&api, "fuel").await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].id(), "1");
    }

    #[tokio::test]
    async fn test_fetch_transactions_drops_invalid_and_repeated_records() {
        let env = TestEnv::new().await;
        let api = TestMetaApi::for_config(&env.config());
        let record = |id: &str, value: &str| MetaRecord {
            meta_id: id.to_string(),
            meta_key: "fuel".to_string(),
            meta_value: value.to_string(),
        };
        api.set_state(TestMetaState::new(vec![
            record(
                "1",
                r#"{"date":"2024-03-15","liters":30,"price_per_liter":23000}"#,
            ),
            record(
                "2",
                r#"{"date":"2024-03-15","liters":0,"price_per_liter":23000}"#,
            ),
            record(
                "3",
                r#"{"date":"2024-03-15","liters":10,"price_per_liter":-5}"#,
            ),
            record(
                "1",
                r#"{"date":"2024-03-16","liters":40,"price_per_liter":24000}"#,
            ),
        ]));
        let txs = fetch_transactions(&api, "fuel").await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].id(), "1");
        assert_eq!(txs[0].amount(), 30.0);
    }

    #[tokio::test]
    async fn test_meta_api_in_test_mode_is_in_memory() {
        let env = TestEnv::new().await;
        let api = meta_api(&env.config(), Mode::Test).unwrap();
        let txs = fetch_transactions(api.as_ref(), "fuel").await.unwrap();
        assert!(!txs.is_empty());
    }
}
