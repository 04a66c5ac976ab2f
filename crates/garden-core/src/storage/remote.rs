//! Hosted REST session table (PostgREST-style API).
//!
//! - insert: `POST {url}/rest/v1/{table}` with the record as JSON
//! - select: `GET {url}/rest/v1/{table}?select=*`
//!
//! Both calls authenticate with the project key in the `apikey` header and
//! as a bearer token. Calls are synchronous to the caller; each one runs on
//! a private current-thread runtime and is bounded by the configured timeout.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use super::{BackendConfig, SessionStore};
use crate::error::{ConfigError, CoreError, Result};
use crate::session::SessionRecord;

const BACKEND: &str = "remote";

pub struct RemoteStore {
    endpoint: Url,
    api_key: String,
    client: Client,
    runtime: tokio::runtime::Runtime,
}

impl RemoteStore {
    /// Build a store for `base_url`. The table endpoint is derived from it.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: &str, table: &str, timeout_secs: u64) -> Result<Self> {
        let invalid = |message: String| {
            CoreError::Config(ConfigError::InvalidValue {
                key: "backend.url".into(),
                message,
            })
        };
        let mut base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        // `join` replaces the last segment unless the path ends in a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(&format!("rest/v1/{table}"))
            .map_err(|e| invalid(e.to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            endpoint,
            api_key: api_key.to_string(),
            client,
            runtime,
        })
    }

    /// Build from config. `Ok(None)` when the url or key is missing.
    pub fn from_config(config: &BackendConfig) -> Result<Option<Self>> {
        let url = config.url.as_deref().map(str::trim).unwrap_or_default();
        let key = config.api_key.as_deref().map(str::trim).unwrap_or_default();
        if url.is_empty() || key.is_empty() {
            tracing::info!("remote backend selected but url or api_key is unset");
            return Ok(None);
        }
        Self::new(url, key, &config.table, config.timeout_secs).map(Some)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    fn fail(&self, status: reqwest::StatusCode, body: String) -> CoreError {
        CoreError::backend(BACKEND, format!("HTTP {status}: {}", body.trim()))
    }
}

impl SessionStore for RemoteStore {
    fn name(&self) -> &str {
        BACKEND
    }

    fn insert(&self, record: &SessionRecord) -> Result<()> {
        let request = self
            .request(reqwest::Method::POST, self.endpoint.clone())
            .header("Prefer", "return=minimal")
            .json(record);
        self.runtime.block_on(async {
            let resp = request.send().await?;
            let status = resp.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(self.fail(status, resp.text().await.unwrap_or_default()))
            }
        })
    }

    fn select_all(&self) -> Result<Vec<SessionRecord>> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("select", "*");
        let request = self.request(reqwest::Method::GET, url);
        self.runtime.block_on(async {
            let resp = request.send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(self.fail(status, resp.text().await.unwrap_or_default()));
            }
            Ok(resp.json::<Vec<SessionRecord>>().await?)
        })
    }
}
