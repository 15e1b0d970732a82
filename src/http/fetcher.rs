//! HTTP list endpoint fetch strategy
//!
//! Turns an [`EndpointConfig`] into a [`FetchStrategy`] over raw JSON
//! items. In cursor mode the next cursor is read from the response body.
//! In offset mode the cursor is the decimal offset of the next page,
//! derived from the collection total, so the fetcher itself holds no
//! traversal state and a saved cursor resumes where it left off.

use super::client::{HttpClient, HttpClientConfig, RequestConfig};
use super::extract::{extract_cursor, extract_items, extract_u64};
use crate::config::{EndpointConfig, PaginationDef};
use crate::error::{Error, Result};
use crate::pagination::FetchStrategy;
use crate::types::{ListOptions, ListResponse, ListResponseMeta};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// Fetches pages of a configured HTTP list endpoint
#[derive(Debug, Clone)]
pub struct HttpListFetcher {
    client: HttpClient,
    endpoint: EndpointConfig,
}

impl HttpListFetcher {
    /// Create a fetcher with a client built from the endpoint's settings
    pub fn new(endpoint: EndpointConfig) -> Result<Self> {
        let mut builder = HttpClientConfig::builder()
            .base_url(endpoint.base_url.clone())
            .timeout(endpoint.http.timeout());

        for (key, value) in &endpoint.headers {
            builder = builder.header(key.clone(), value.clone());
        }
        if let Some(rate_limit) = endpoint.http.rate_limit {
            builder = builder.rate_limit(rate_limit);
        }
        if let Some(agent) = &endpoint.http.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        let client = HttpClient::with_config(builder.build())?;
        Ok(Self::with_client(client, endpoint))
    }

    /// Create a fetcher over an existing client
    pub fn with_client(client: HttpClient, endpoint: EndpointConfig) -> Self {
        Self { client, endpoint }
    }

    /// Endpoint definition
    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// Build the request for one page
    pub fn request_for(&self, options: &ListOptions) -> Result<RequestConfig> {
        let params = &self.endpoint.request;
        let mut request = RequestConfig::new();

        for (key, value) in &self.endpoint.query {
            request = request.query(key.clone(), value.clone());
        }
        if let Some(limit) = options.limit {
            request = request.query(params.limit_param.clone(), limit.to_string());
        }
        if let Some(field) = &options.sort_by {
            request = request.query(params.sort_param.clone(), field.clone());
            if let Some(direction) = options.sort_direction {
                request = request.query(params.direction_param.clone(), direction.as_str());
            }
        }
        for (key, value) in &options.filters {
            request = request.query(params.filter_param(key), value.to_string());
        }

        match &self.endpoint.pagination {
            PaginationDef::Cursor { cursor_param, .. } => {
                if let Some(cursor) = &options.cursor {
                    request = request.query(cursor_param.clone(), cursor.clone());
                }
            }
            PaginationDef::Offset { offset_param } => {
                let offset = parse_offset(options.cursor.as_deref())?;
                request = request.query(offset_param.clone(), offset.to_string());
            }
        }

        Ok(request)
    }

    /// Decode a response body into a page
    pub fn decode(&self, body: &Value, options: &ListOptions) -> Result<ListResponse<Value>> {
        if !(body.is_object() || body.is_array()) {
            return Err(Error::decode(format!(
                "expected a JSON object or array body, got {body}"
            )));
        }

        let response = &self.endpoint.response;
        let items = extract_items(body, &response.items_path)?;
        let count = items.len() as u64;
        let total = match &response.total_path {
            Some(path) => extract_u64(body, path)?,
            None => None,
        };

        let mut meta = ListResponseMeta::new(total.unwrap_or(count), count);

        match &self.endpoint.pagination {
            PaginationDef::Cursor {
                next_cursor_path,
                prev_cursor_path,
                ..
            } => {
                meta.next_cursor = extract_cursor(body, next_cursor_path);
                meta.prev_cursor = prev_cursor_path
                    .as_deref()
                    .and_then(|path| extract_cursor(body, path));
            }
            PaginationDef::Offset { .. } => {
                let total = total.ok_or_else(|| Error::RecordExtraction {
                    path: response.total_path.clone().unwrap_or_default(),
                    message: "offset pagination needs the collection total".to_string(),
                })?;
                let offset = parse_offset(options.cursor.as_deref())?;
                let next_offset = offset.checked_add(count).ok_or_else(|| {
                    Error::invalid_value("cursor", format!("offset {offset} is out of range"))
                })?;

                if count > 0 && next_offset < total {
                    meta.next_cursor = Some(next_offset.to_string());
                }
                if offset > 0 {
                    let page = options.limit.map_or(count, u64::from);
                    meta.prev_cursor = Some(offset.saturating_sub(page).to_string());
                }
            }
        }

        Ok(ListResponse::new(items, meta))
    }
}

#[async_trait]
impl FetchStrategy<Value> for HttpListFetcher {
    async fn fetch_page(&self, options: ListOptions) -> Result<ListResponse<Value>> {
        let request = self.request_for(&options)?;
        let body: Value = self.client.get_json(&self.endpoint.path, request).await?;
        let page = self.decode(&body, &options)?;

        debug!(
            endpoint = %self.endpoint.name,
            items = page.items.len(),
            next_cursor = ?page.meta.next_cursor,
            "Decoded page"
        );

        Ok(page)
    }
}

/// Offset encoded in a cursor; no cursor means the start
fn parse_offset(cursor: Option<&str>) -> Result<u64> {
    match cursor {
        None => Ok(0),
        Some(raw) => raw.parse().map_err(|_| {
            Error::invalid_value("cursor", format!("expected a decimal offset, got '{raw}'"))
        }),
    }
}
