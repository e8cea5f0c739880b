//! Implements `MetaApi` over HTTP with `reqwest`.

use crate::api::MetaApi;
use crate::error::{ErrorType, IntoResult, Res};
use crate::model::{MetaPage, MetaPost, MetaRecord};
use crate::{Config, Result};
use anyhow::Context;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

const READ_PATH: &str = "readobject_meta.php";
const WRITE_PATH: &str = "addobject_meta.php";
const TIMEOUT: Duration = Duration::from_secs(30);

/// Reads and writes metadata records at the configured `api_url`.
#[derive(Debug, Clone)]
pub struct HttpMetaApi {
    client: reqwest::Client,
    base: Url,
    meta_key: String,
    page_limit: u32,
}

impl HttpMetaApi {
    pub(crate) fn new(config: &Config) -> Res<Self> {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .context("Unable to build the HTTP client")?;
        Ok(Self {
            client,
            base: base_url(config.api_url())?,
            meta_key: config.meta_key().to_string(),
            page_limit: config.page_limit(),
        })
    }

    fn read_url(&self) -> Res<Url> {
        let mut url = self
            .base
            .join(READ_PATH)
            .context("Unable to build the read URL")?;
        url.query_pairs_mut()
            .append_pair("pagenumber", "1")
            .append_pair("limit", &self.page_limit.to_string())
            .append_pair("sortcolumn", "")
            .append_pair("orderby", "asc")
            .append_pair("query", &self.meta_key);
        Ok(url)
    }

    fn write_url(&self) -> Res<Url> {
        self.base
            .join(WRITE_PATH)
            .context("Unable to build the write URL")
    }

    async fn fetch_inner(&self) -> Res<Vec<MetaRecord>> {
        let url = self.read_url()?;
        debug!("GET {url}");
        let page: MetaPage = self
            .client
            .get(url)
            .send()
            .await
            .context("The metadata API could not be reached")?
            .error_for_status()
            .context("The metadata API rejected the read")?
            .json()
            .await
            .context("The metadata API returned an unexpected body")?;
        trace!("Received {} records", page.body.len());
        Ok(page.body)
    }

    async fn post_inner(&self, post: &MetaPost) -> Res<()> {
        let url = self.write_url()?;
        debug!("POST {url} for {}", post.object_id);
        self.client
            .post(url)
            .json(post)
            .send()
            .await
            .context("The metadata API could not be reached")?
            .error_for_status()
            .with_context(|| format!("The metadata API rejected record {}", post.object_id))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl MetaApi for HttpMetaApi {
    async fn fetch(&self) -> Result<Vec<MetaRecord>> {
        self.fetch_inner().await.pub_result(ErrorType::Remote)
    }

    async fn post(&self, post: &MetaPost) -> Result<()> {
        self.post_inner(post).await.pub_result(ErrorType::Remote)
    }
}

/// Parses `api_url` so that relative joins land inside it.
fn base_url(api_url: &str) -> Res<Url> {
    let mut s = api_url.trim().to_string();
    if !s.ends_with('/') {
        s.push('/');
    }
    Url::parse(&s).with_context(|| format!("Invalid api_url '{api_url}'"))
}
