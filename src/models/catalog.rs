use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Catalog API Types
// ============================================================================

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 20;

/// Pagination block returned to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// Normalized page of catalog entries. Entries are kept as the upstream sent
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPage {
    pub data: Vec<Value>,
    pub pagination: Pagination,
}

impl CatalogPage {
    /// Page returned when the upstream has nothing for the query
    pub fn empty(requested_limit: Option<u32>) -> Self {
        Self {
            data: Vec::new(),
            pagination: Pagination {
                page: DEFAULT_PAGE,
                limit: requested_limit.unwrap_or(DEFAULT_LIMIT),
                total: 0,
                total_pages: 0,
            },
        }
    }
}

/// Raw list response from either catalog upstream
///
/// The movie API answers `{ data: [...], meta: {...} }`, the TV API answers
/// `{ success, data: [...], page, limit, total, totalPages }`, and either may
/// send a bare array or wrap a single object in `data`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CatalogResponse {
    Bare(Vec<Value>),
    Envelope(CatalogEnvelope),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEnvelope {
    #[serde(default)]
    pub data: Option<CatalogData>,
    #[serde(default)]
    pub meta: Option<CatalogMeta>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CatalogData {
    Many(Vec<Value>),
    One(Map<String, Value>),
    Other(Value),
}

/// Movie API pagination block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogMeta {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub pages: Option<u32>,
}

impl CatalogResponse {
    /// Resolves every upstream shape into one page
    pub fn into_page(self, requested_limit: Option<u32>) -> CatalogPage {
        let envelope = match self {
            CatalogResponse::Bare(data) => {
                return CatalogPage {
                    pagination: Pagination {
                        page: DEFAULT_PAGE,
                        limit: requested_limit.unwrap_or(DEFAULT_LIMIT),
                        total: data.len() as u64,
                        total_pages: 1,
                    },
                    data,
                };
            }
            CatalogResponse::Envelope(envelope) => envelope,
        };

        let data = match envelope.data {
            Some(CatalogData::Many(items)) => items,
            Some(CatalogData::One(item)) => vec![Value::Object(item)],
            Some(CatalogData::Other(_)) | None => Vec::new(),
        };
        let count = data.len() as u64;

        let pagination = match envelope.meta {
            Some(meta) => Pagination {
                page: meta.page.unwrap_or(DEFAULT_PAGE),
                limit: meta.limit.or(requested_limit).unwrap_or(DEFAULT_LIMIT),
                total: meta.total.unwrap_or(count),
                total_pages: meta.pages.unwrap_or(1),
            },
            None => {
                let limit = envelope
                    .limit
                    .or(requested_limit)
                    .unwrap_or(DEFAULT_LIMIT)
                    .max(1);
                let total = envelope.total.unwrap_or(count);
                Pagination {
                    page: envelope.page.unwrap_or(DEFAULT_PAGE),
                    limit,
                    total,
                    total_pages: envelope
                        .total_pages
                        .unwrap_or_else(|| total.div_ceil(u64::from(limit)) as u32),
                }
            }
        };

        CatalogPage { data, pagination }
    }
}
