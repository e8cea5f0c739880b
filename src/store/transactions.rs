use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{date, FuelTransaction, TransactionFields};
use crate::store::kv::{KeyValueStore, TRANSACTIONS_KEY};
use crate::{utils, Result};
use anyhow::Context;
use tracing::{debug, warn};

/// The ordered collection of fuel transactions, newest first.
///
/// Every mutation writes the full collection to the `fuelTransactions` key. If that write fails
/// the in-memory change is kept, a warning is logged and the store reports itself as unsaved
/// until a later write succeeds.
#[derive(Debug)]
pub struct TransactionStore {
    storage: Box<dyn KeyValueStore>,
    transactions: Vec<FuelTransaction>,
    unsaved: bool,
}

impl TransactionStore {
    /// Reads the snapshot from `storage`. A missing key is an empty collection.
    pub fn load(storage: Box<dyn KeyValueStore>) -> Result<Self> {
        let transactions = match storage.get(TRANSACTIONS_KEY) {
            None => Vec::new(),
            Some(json) => serde_json::from_str(&json)
                .context("The stored transaction collection is corrupt")
                .pub_result(ErrorType::Store)?,
        };
        debug!("Loaded {} transactions", transactions.len());
        Ok(Self {
            storage,
            transactions,
            unsaved: false,
        })
    }

    pub fn list(&self) -> &[FuelTransaction] {
        &self.transactions
    }

    pub fn get(&self, id: &str) -> Option<&FuelTransaction> {
        self.transactions.iter().find(|t| t.id() == id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Whether the last write to storage failed.
    pub fn is_unsaved(&self) -> bool {
        self.unsaved
    }

    /// Returns a `Store` error if the in-memory collection has changes that could not be written.
    pub fn ensure_saved(&self) -> Result<()> {
        if self.unsaved {
            return Err(Error::msg(
                ErrorType::Store,
                "Changes are kept in memory but could not be written to storage",
            ));
        }
        Ok(())
    }

    /// Adds a new transaction at the front of the collection.
    pub fn add(&mut self, fields: TransactionFields) -> Result<FuelTransaction> {
        fields.validate().pub_result(ErrorType::Validation)?;
        let tx = FuelTransaction::new(utils::generate_transaction_id(), fields);
        self.transactions.insert(0, tx.clone());
        self.persist();
        Ok(tx)
    }

    /// Replaces the fields of the transaction with `id`, keeping its id and position.
    pub fn update(&mut self, id: &str, fields: TransactionFields) -> Result<FuelTransaction> {
        fields.validate().pub_result(ErrorType::Validation)?;
        let slot = self
            .transactions
            .iter_mut()
            .find(|t| t.id() == id)
            .ok_or_else(|| not_found(id))?;
        *slot = FuelTransaction::new(id, fields);
        let updated = slot.clone();
        self.persist();
        Ok(updated)
    }

    /// Removes the transaction with `id`. Returns `false`, and changes nothing, if there is none.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.transactions.len();
        self.transactions.retain(|t| t.id() != id);
        if self.transactions.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// Copies the transaction with `id` under a new id, dated today, at the front of the
    /// collection.
    pub fn duplicate(&mut self, id: &str) -> Result<FuelTransaction> {
        let source = self.get(id).ok_or_else(|| not_found(id))?;
        let mut fields = source.fields();
        fields.date = date::today();
        let copy = FuelTransaction::new(utils::generate_transaction_id(), fields);
        self.transactions.insert(0, copy.clone());
        self.persist();
        Ok(copy)
    }

    /// Adds every row with a positive amount and price, in input order, ahead of the existing
    /// transactions. Other rows are dropped. Returns the number of rows accepted.
    pub fn import_batch<I>(&mut self, rows: I) -> usize
    where
        I: IntoIterator<Item = TransactionFields>,
    {
        let mut accepted: Vec<FuelTransaction> = rows
            .into_iter()
            .filter(TransactionFields::has_amount_and_price)
            .map(|fields| FuelTransaction::new(utils::generate_transaction_id(), fields))
            .collect();
        let count = accepted.len();
        if count == 0 {
            debug!("Import batch had no valid rows");
            return 0;
        }
        accepted.append(&mut self.transactions);
        self.transactions = accepted;
        self.persist();
        count
    }

    /// Replaces the whole collection, e.g. with the records downloaded from the remote API.
    pub fn replace_all(&mut self, transactions: Vec<FuelTransaction>) {
        self.transactions = transactions;
        self.persist();
    }

    /// The underlying key-value store, for the keys that are not the transaction collection.
    pub fn storage(&self) -> &dyn KeyValueStore {
        self.storage.as_ref()
    }

    pub fn storage_mut(&mut self) -> &mut dyn KeyValueStore {
        self.storage.as_mut()
    }

    fn persist(&mut self) {
        let result = serde_json::to_string(&self.transactions)
            .context("Unable to serialize transactions")
            .pub_result(ErrorType::Store)
            .and_then(|json| self.storage.set(TRANSACTIONS_KEY, json));
        match result {
            Ok(()) => self.unsaved = false,
            Err(e) => {
                warn!("Unable to save transactions, keeping them in memory: {e}");
                self.unsaved = true;
            }
        }
    }
}

fn not_found(id: &str) -> Error {
    Error::msg(
        ErrorType::NotFound,
        format!("No transaction with id '{id}'"),
    )
}
