//! Local persistence: a key-value store and the transaction collection kept in it.

mod kv;
mod transactions;

pub use kv::{FileStore, KeyValueStore, MemoryStore, LAST_SYNC_KEY, TRANSACTIONS_KEY, USER_KEY};
pub use transactions::TransactionStore;
