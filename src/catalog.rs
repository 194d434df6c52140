//! Catalog provider: fetches the module snapshot handed to the resolver.
//!
//! Provides:
//! - HTTP retrieval from the catalog API with a hard timeout
//! - JSON snapshot files for offline use and tests
//! - Timeouts and transport failures as typed errors, never as "not found"

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::FetchError;
use crate::model::types::Module;

/// Catalog API root.
pub const DEFAULT_CATALOG_URL: &str = "https://limoka.vsecoder.dev/api";

/// Timeout for catalog requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where a catalog snapshot comes from.
#[derive(Debug, Clone)]
pub enum CatalogSource {
    Http(HttpCatalog),
    File(PathBuf),
}

impl CatalogSource {
    pub async fn fetch_all(&self) -> Result<Vec<Module>, FetchError> {
        match self {
            CatalogSource::Http(http) => http.fetch_all().await,
            CatalogSource::File(path) => load_file(path).await,
        }
    }

    /// Full details of one module, looked up by id after resolution.
    pub async fn fetch_module(&self, id: i64) -> Result<Module, FetchError> {
        match self {
            CatalogSource::Http(http) => http.fetch_module(id).await,
            CatalogSource::File(path) => load_file(path)
                .await?
                .into_iter()
                .find(|m| m.id == id)
                .ok_or_else(|| FetchError::Failed {
                    url: path.display().to_string(),
                    reason: format!("module {id} is not in the snapshot"),
                }),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            CatalogSource::Http(http) => http.base_url().to_string(),
            CatalogSource::File(path) => path.display().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpCatalog {
    base_url: String,
    timeout: Duration,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Every module in the catalog.
    pub async fn fetch_all(&self) -> Result<Vec<Module>, FetchError> {
        let url = format!("{}/module/all", self.base_url);
        let modules: Vec<Module> = self.get_json(&url).await?;
        info!(url = %url, modules = modules.len(), "catalog_fetched");
        Ok(modules)
    }

    /// A single module by id.
    pub async fn fetch_module(&self, id: i64) -> Result<Module, FetchError> {
        let url = format!("{}/module/{id}", self.base_url);
        let module: Module = self.get_json(&url).await?;
        debug!(url = %url, module_id = module.id, "module_fetched");
        Ok(module)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("limoka/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Failed {
                url: url.to_string(),
                reason: format!("building http client: {e}"),
            })?;

        let request = async {
            let response = client
                .get(url)
                .header("Accept", "application/json")
                .send()
                .await
                .map_err(|e| self.transport_error(url, e))?;

            if !response.status().is_success() {
                return Err(FetchError::Failed {
                    url: url.to_string(),
                    reason: format!("server returned {}", response.status()),
                });
            }

            response
                .bytes()
                .await
                .map_err(|e| self.transport_error(url, e))
        };

        // The client timeout covers the request; this bounds the body read too.
        let body = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                after: self.timeout,
            })??;

        debug!(url, bytes = body.len(), "catalog_response");
        decode(url, &body)
    }

    fn transport_error(&self, url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                after: self.timeout,
            }
        } else {
            FetchError::Failed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

impl Default for HttpCatalog {
    fn default() -> Self {
        Self::new(
            DEFAULT_CATALOG_URL,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }
}

/// Download link for a module.
pub fn download_url(base_url: &str, id: i64) -> String {
    format!("{}/module/download/{id}", base_url.trim_end_matches('/'))
}

/// Load a catalog snapshot (a JSON array of modules) from disk.
pub async fn load_file(path: &std::path::Path) -> Result<Vec<Module>, FetchError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&path.display().to_string(), &bytes)
}

fn decode<T: DeserializeOwned>(source_name: &str, bytes: &[u8]) -> Result<T, FetchError> {
    serde_json::from_slice(bytes).map_err(|e| FetchError::Decode {
        source_name: source_name.to_string(),
        reason: e.to_string(),
    })
}
