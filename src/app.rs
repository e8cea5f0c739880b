//! The application state: one transaction store plus the collaborators it talks to, and the
//! user mode that decides whether the remote metadata API is involved.

use crate::api::{
    self, CloudSync, Identity, IdentityProvider, MetaApi, MockCloudSync, MockIdentityProvider,
    MockSpeechToText, Mode, SpeechToText,
};
use crate::backup::{IMPORT_PRE, SYNC_DOWN_PRE};
use crate::config::UserMode;
use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{FuelTransaction, MetaPost, TransactionFields};
use crate::report::{self, Period, Report, Summary};
use crate::store::{FileStore, TransactionStore, LAST_SYNC_KEY, USER_KEY};
use crate::{Config, Result};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, error, info, warn};

/// The external collaborators of an `App`.
pub struct Services {
    pub meta_api: Box<dyn MetaApi>,
    pub speech: Box<dyn SpeechToText>,
    pub identity: Box<dyn IdentityProvider>,
    pub cloud: Box<dyn CloudSync>,
}

impl Services {
    /// The metadata API selected by `mode` together with the mock speech, identity and cloud
    /// capabilities.
    pub fn new(config: &Config, mode: Mode) -> Result<Self> {
        Ok(Self {
            meta_api: api::meta_api(config, mode)?,
            speech: Box::new(MockSpeechToText),
            identity: Box::new(MockIdentityProvider),
            cloud: Box::new(MockCloudSync),
        })
    }
}

pub struct App {
    config: Config,
    services: Services,
    store: TransactionStore,
    /// Set once the remote collection has been requested, whether or not that succeeded.
    remote_loaded: bool,
}

impl App {
    pub fn new(config: Config, services: Services, store: TransactionStore) -> Self {
        Self {
            config,
            services,
            store,
            remote_loaded: false,
        }
    }

    /// Opens the storage file named by `config` and loads the transactions from it.
    pub fn open(config: Config, mode: Mode) -> Result<Self> {
        let services = Services::new(&config, mode)?;
        let storage = FileStore::open(config.storage_path())?;
        let store = TransactionStore::load(Box::new(storage))?;
        Ok(Self::new(config, services, store))
    }

    /// Runs the start-up fetch in registered mode. A failure is logged and the local collection
    /// is kept.
    pub async fn start(&mut self) {
        if let Err(e) = self.load_remote_once().await {
            error!("Unable to load transactions from the remote API, using local data: {e}");
        }
    }

    /// Replaces the local collection with the remote one, at most once per `App` and per switch
    /// into registered mode. Returns the number of transactions loaded, or `None` if nothing was
    /// requested. A local collection that differs from the remote one is backed up first.
    pub async fn load_remote_once(&mut self) -> Result<Option<usize>> {
        if self.remote_loaded || self.user_mode() != UserMode::Registered {
            return Ok(None);
        }
        self.remote_loaded = true;
        let transactions =
            api::fetch_transactions(self.services.meta_api.as_ref(), self.config.meta_key())
                .await?;
        if !self.store.is_empty() && self.store.list() != transactions.as_slice() {
            self.backup_local(SYNC_DOWN_PRE).await?;
        }
        let count = transactions.len();
        self.store.replace_all(transactions);
        info!("Loaded {count} transactions from the remote API");
        Ok(Some(count))
    }

    /// Downloads the remote collection and replaces the local one with it, after writing a
    /// backup of the local collection. On failure nothing changes.
    pub async fn refresh_remote(&mut self) -> Result<usize> {
        let transactions =
            api::fetch_transactions(self.services.meta_api.as_ref(), self.config.meta_key())
                .await?;
        self.backup_local(SYNC_DOWN_PRE).await?;
        let count = transactions.len();
        self.store.replace_all(transactions);
        self.remote_loaded = true;
        Ok(count)
    }

    /// Posts every transaction to the remote API, stopping at the first failure.
    pub async fn push_all(&self) -> Result<usize> {
        self.require_registered("upload transactions")?;
        for tx in self.store.list() {
            self.services.meta_api.post(&self.meta_post(tx)?).await?;
        }
        Ok(self.store.len())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &TransactionStore {
        &self.store
    }

    pub fn transactions(&self) -> &[FuelTransaction] {
        self.store.list()
    }

    pub fn user_mode(&self) -> UserMode {
        self.config.user_mode()
    }

    /// The signed-in identity, if any.
    pub fn identity(&self) -> Option<Identity> {
        let json = self.store.storage().get(USER_KEY)?;
        match serde_json::from_str(&json) {
            Ok(identity) => Some(identity),
            Err(e) => {
                warn!("Ignoring the stored identity, it cannot be read: {e}");
                None
            }
        }
    }

    /// The time of the last successful cloud sync.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        let stamp = self.store.storage().get(LAST_SYNC_KEY)?;
        DateTime::parse_from_rfc3339(&stamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Returns a `Store` error if a change could not be written to storage.
    pub fn ensure_saved(&self) -> Result<()> {
        self.store.ensure_saved()
    }

    pub async fn add(&mut self, fields: TransactionFields) -> Result<FuelTransaction> {
        let tx = self.store.add(fields)?;
        self.publish(&tx).await;
        Ok(tx)
    }

    pub async fn update(&mut self, id: &str, fields: TransactionFields) -> Result<FuelTransaction> {
        let tx = self.store.update(id, fields)?;
        self.publish(&tx).await;
        Ok(tx)
    }

    pub fn delete(&mut self, id: &str) -> bool {
        self.store.delete(id)
    }

    pub async fn duplicate(&mut self, id: &str) -> Result<FuelTransaction> {
        let tx = self.store.duplicate(id)?;
        self.publish(&tx).await;
        Ok(tx)
    }

    /// Recognizes `audio` and adds the resulting transaction.
    pub async fn add_by_voice(&mut self, audio: &[u8]) -> Result<FuelTransaction> {
        let fields = self.services.speech.recognize(audio).await?;
        self.add(fields).await
    }

    /// Imports `rows`, backing up the current collection first if any row will be accepted.
    pub async fn import(&mut self, rows: Vec<TransactionFields>) -> Result<usize> {
        if !rows.iter().any(TransactionFields::has_amount_and_price) {
            return Ok(0);
        }
        self.backup_local(IMPORT_PRE).await?;
        let count = self.store.import_batch(rows);
        let imported: Vec<FuelTransaction> = self.store.list()[..count].to_vec();
        for tx in &imported {
            self.publish(tx).await;
        }
        Ok(count)
    }

    /// Switches the user mode. Entering registered mode needs a signed-in identity and triggers
    /// the remote fetch; its result is returned as in `load_remote_once`, with a failed fetch
    /// logged and reported as `None`.
    pub async fn set_user_mode(&mut self, user_mode: UserMode) -> Result<Option<usize>> {
        if user_mode == UserMode::Registered && self.identity().is_none() {
            return Err(Error::msg(
                ErrorType::Validation,
                "Sign in before switching to registered mode",
            ));
        }
        let previous = self.user_mode();
        self.config
            .set_user_mode(user_mode)
            .await
            .pub_result(ErrorType::Config)?;
        if previous == UserMode::Guest && user_mode == UserMode::Registered {
            self.remote_loaded = false;
            return match self.load_remote_once().await {
                Ok(count) => Ok(count),
                Err(e) => {
                    error!("Unable to load transactions from the remote API: {e}");
                    Ok(None)
                }
            };
        }
        Ok(None)
    }

    /// Signs in, remembers the identity and switches to registered mode.
    pub async fn sign_in(&mut self) -> Result<Identity> {
        let identity = self.services.identity.sign_in().await?;
        let json = serde_json::to_string(&identity)
            .context("Unable to serialize the identity")
            .pub_result(ErrorType::Store)?;
        self.store.storage_mut().set(USER_KEY, json)?;
        self.set_user_mode(UserMode::Registered).await?;
        Ok(identity)
    }

    /// Signs out, forgets the identity and the last sync time, and returns to guest mode.
    pub async fn sign_out(&mut self) -> Result<()> {
        if let Some(identity) = self.identity() {
            self.services.identity.sign_out(&identity).await?;
        }
        let storage = self.store.storage_mut();
        storage.remove(USER_KEY)?;
        storage.remove(LAST_SYNC_KEY)?;
        self.set_user_mode(UserMode::Guest).await?;
        Ok(())
    }

    /// Syncs the collection to the cloud for the signed-in user and records the time.
    pub async fn sync_cloud(&mut self) -> Result<DateTime<Utc>> {
        self.require_registered("sync to the cloud")?;
        let identity = self.identity().ok_or_else(|| {
            Error::msg(ErrorType::Validation, "Sign in to sync to the cloud")
        })?;
        let stamp = self
            .services
            .cloud
            .sync(&identity, self.store.list())
            .await?;
        self.store
            .storage_mut()
            .set(LAST_SYNC_KEY, stamp.to_rfc3339())?;
        Ok(stamp)
    }

    pub fn summary(&self) -> Summary {
        Summary::of(self.store.list())
    }

    pub fn report(&self, period: Period, today: NaiveDate) -> Report {
        report::aggregate(self.store.list(), period, today)
    }

    async fn backup_local(&self, prefix: &str) -> Result<()> {
        let backup = self
            .config
            .backup()
            .save_json(prefix, self.store.list())
            .await
            .pub_result(ErrorType::Io)?;
        debug!("Backed up the local collection to {}", backup.display());
        Ok(())
    }

    fn require_registered(&self, action: &str) -> Result<()> {
        if self.user_mode() != UserMode::Registered {
            return Err(Error::msg(
                ErrorType::Validation,
                format!("Switch to registered mode to {action}"),
            ));
        }
        Ok(())
    }

    fn meta_post(&self, tx: &FuelTransaction) -> Result<MetaPost> {
        MetaPost::new(self.config.api_token(), self.config.meta_key(), tx)
            .pub_result(ErrorType::Remote)
    }

    /// Best-effort post of `tx` in registered mode.
    async fn publish(&self, tx: &FuelTransaction) {
        if self.user_mode() != UserMode::Registered {
            return;
        }
        let result = match self.meta_post(tx) {
            Ok(post) => self.services.meta_api.post(&post).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!("Transaction {} was saved locally but not sent: {e}", tx.id());
        }
    }
}
