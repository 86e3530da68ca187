//! Read-only proxies in front of the movie and TV-show catalog APIs
//!
//! Both upstreams authenticate with an `X-API-Key` header and answer list
//! queries in slightly different envelopes. Every list response is decoded
//! once into [`CatalogResponse`] and normalized to a [`CatalogPage`]; single
//! entries are passed through untouched.
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{CatalogPage, CatalogResponse},
};

const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Clone)]
pub struct CatalogClient {
    name: &'static str,
    http_client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    cache: Option<Cache>,
    cache_ttl: u64,
}

impl CatalogClient {
    pub fn new(
        name: &'static str,
        http_client: HttpClient,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            name,
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            cache: None,
            cache_ttl: 0,
        }
    }

    /// Memoizes responses in Redis for `ttl` seconds
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fetches one page of a list endpoint
    ///
    /// An upstream 404 means "nothing matched" and becomes an empty page.
    pub async fn list(&self, path: &str, query: &[(String, String)]) -> AppResult<CatalogPage> {
        match &self.cache {
            Some(cache) => {
                let key = CacheKey::for_request(CacheKey::CatalogPage, self.name, path, query);
                cached!(cache, key, self.cache_ttl, self.fetch_page(path, query))
            }
            None => self.fetch_page(path, query).await,
        }
    }

    /// Fetches a single upstream document as-is
    pub async fn get(&self, path: &str, query: &[(String, String)]) -> AppResult<Value> {
        match &self.cache {
            Some(cache) => {
                let key = CacheKey::for_request(CacheKey::CatalogEntry, self.name, path, query);
                cached!(cache, key, self.cache_ttl, self.fetch_entry(path, query))
            }
            None => self.fetch_entry(path, query).await,
        }
    }

    async fn fetch_page(&self, path: &str, query: &[(String, String)]) -> AppResult<CatalogPage> {
        let requested_limit = requested_limit(query);
        let response = self.send(path, query).await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(upstream = self.name, path, "Catalog query matched nothing");
            return Ok(CatalogPage::empty(requested_limit));
        }

        let response = self.ensure_success(response).await?;
        let body: CatalogResponse = response.json().await?;
        Ok(body.into_page(requested_limit))
    }

    async fn fetch_entry(&self, path: &str, query: &[(String, String)]) -> AppResult<Value> {
        let response = self.send(path, query).await?;
        let response = self.ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn send(&self, path: &str, query: &[(String, String)]) -> AppResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(upstream = self.name, url = %url, "Proxying catalog request");

        let mut request = self
            .http_client
            .get(&url)
            .query(query)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        Ok(request.send().await?)
    }

    async fn ensure_success(&self, response: reqwest::Response) -> AppResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(upstream = self.name, status = %status, body = %body, "Catalog upstream rejected request");

        Err(AppError::ExternalApi {
            status,
            message: format!("{} catalog returned status {}", self.name, status.as_u16()),
        })
    }
}

/// The configured catalog upstreams; either may be absent
#[derive(Clone, Default)]
pub struct CatalogProxies {
    pub movies: Option<CatalogClient>,
    pub tv_shows: Option<CatalogClient>,
}

impl CatalogProxies {
    pub fn movies(&self) -> AppResult<&CatalogClient> {
        self.movies.as_ref().ok_or_else(|| not_configured("Movie"))
    }

    pub fn tv_shows(&self) -> AppResult<&CatalogClient> {
        self.tv_shows.as_ref().ok_or_else(|| not_configured("TV show"))
    }
}

fn not_configured(kind: &str) -> AppError {
    AppError::ExternalApi {
        status: StatusCode::SERVICE_UNAVAILABLE,
        message: format!("{} catalog is not configured", kind),
    }
}

fn requested_limit(query: &[(String, String)]) -> Option<u32> {
    query
        .iter()
        .find(|(key, _)| key == "limit")
        .and_then(|(_, value)| value.parse().ok())
        .filter(|limit| *limit > 0)
}
