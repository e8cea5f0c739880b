//! Types that represent the core data model: the `FuelTransaction` and the payloads exchanged with
//! the remote metadata API.
pub mod date;
mod meta;
mod transaction;

pub use meta::{FuelMeta, MetaPage, MetaPost, MetaRecord};
pub use transaction::{FuelTransaction, TransactionFields};
