//! Implements `MetaApi` in memory so that the whole program can run without the network.
//!
//! State is kept in a process-wide map keyed by the fuel home directory, which lets a test seed
//! records and inspect posts through one `TestMetaApi` while the code under test uses another.

use crate::api::MetaApi;
use crate::error::{Error, ErrorType};
use crate::model::{MetaPost, MetaRecord};
use crate::{Config, Result};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

static STATES: OnceLock<Mutex<HashMap<String, TestMetaState>>> = OnceLock::new();

/// What the in-memory API holds for one key.
#[derive(Debug, Clone, PartialEq)]
pub struct TestMetaState {
    pub records: Vec<MetaRecord>,
    /// Every post received, in order.
    pub posts: Vec<MetaPost>,
    /// When set, every call fails with a `Remote` error.
    pub offline: bool,
}

impl TestMetaState {
    pub fn new(records: Vec<MetaRecord>) -> Self {
        Self {
            records,
            posts: Vec::new(),
            offline: false,
        }
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::new(Vec::new())
        }
    }
}

impl Default for TestMetaState {
    /// Two fuel records and one record with an unrelated key.
    fn default() -> Self {
        Self::new(vec![
            seed("101", "fuel", SEED_FUEL_1),
            seed("102", "fuel", SEED_FUEL_2),
            seed("103", "tour", SEED_OTHER),
        ])
    }
}

fn seed(id: &str, key: &str, value: &str) -> MetaRecord {
    MetaRecord {
        meta_id: id.to_string(),
        meta_key: key.to_string(),
        meta_value: value.to_string(),
    }
}

const SEED_FUEL_1: &str = r#"{"date":"2024-03-15T00:00:00.000Z","liters":30,"price_per_liter":23000,"total_cost":690000,"last_km":12000,"current_km":12500,"distance":500,"location":"Petrolimex 12","note":""}"#;
const SEED_FUEL_2: &str = r#"{"date":"2024-03-02","liters":"20.5","price_per_liter":"24000","total_cost":"492000","location":"","note":"highway"}"#;
const SEED_OTHER: &str = r#"{"title":"Ha Long Bay","days":3}"#;

/// An in-memory `MetaApi`.
#[derive(Debug, Clone)]
pub struct TestMetaApi {
    key: String,
}

impl TestMetaApi {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// The instance shared by everything that uses `config`.
    pub fn for_config(config: &Config) -> Self {
        Self::new(config.root().to_string_lossy())
    }

    pub fn get_state(&self) -> TestMetaState {
        self.with_state(|state| state.clone())
    }

    pub fn set_state(&self, state: TestMetaState) {
        self.with_state(|current| *current = state);
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut TestMetaState) -> T) -> T {
        let states = STATES.get_or_init(|| Mutex::new(HashMap::new()));
        let mut guard = match states.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(guard.entry(self.key.clone()).or_default())
    }
}

fn offline_error() -> Error {
    Error::msg(ErrorType::Remote, "The metadata API could not be reached")
}

#[async_trait::async_trait]
impl MetaApi for TestMetaApi {
    async fn fetch(&self) -> Result<Vec<MetaRecord>> {
        self.with_state(|state| {
            if state.offline {
                return Err(offline_error());
            }
            Ok(state.records.clone())
        })
    }

    async fn post(&self, post: &MetaPost) -> Result<()> {
        self.with_state(|state| {
            if state.offline {
                return Err(offline_error());
            }
            state.posts.push(post.clone());
            let record = MetaRecord {
                meta_id: post.object_id.clone(),
                meta_key: post.meta_key.clone(),
                meta_value: post.meta_value.clone(),
            };
            match state
                .records
                .iter_mut()
                .find(|r| r.meta_id == record.meta_id)
            {
                Some(existing) => *existing = record,
                None => state.records.push(record),
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FuelTransaction, TransactionFields};
    use chrono::NaiveDate;

    fn unique_key() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    #[tokio::test]
    async fn test_seeded_state() {
        let api = TestMetaApi::new(unique_key());
        let records = api.fetch().await.unwrap();
        assert_eq!(records.len(), 3);
        let tx = records[1].to_transaction().unwrap();
        assert_eq!(tx.amount(), 20.5);
        assert_eq!(tx.total_cost(), 492_000.0);
        assert_eq!(tx.location(), None);
    }

    #[tokio::test]
    async fn test_post_is_recorded_and_upserted() {
        let key = unique_key();
        let api = TestMetaApi::new(&key);
        api.set_state(TestMetaState::new(Vec::new()));
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let tx = FuelTransaction::new("abc", TransactionFields::new(date, 30.0, 23000.0));
        let post = MetaPost::new("token", "fuel", &tx).unwrap();
        api.post(&post).await.unwrap();
        api.post(&post).await.unwrap();

        let observer = TestMetaApi::new(&key);
        let state = observer.get_state();
        assert_eq!(state.posts.len(), 2);
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.records[0].meta_id, "abc");
    }

    #[tokio::test]
    async fn test_offline() {
        let api = TestMetaApi::new(unique_key());
        api.set_state(TestMetaState::offline());
        let err = api.fetch().await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Remote);
    }
}
