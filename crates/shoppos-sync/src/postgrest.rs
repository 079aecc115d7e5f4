//! # PostgREST Remote Store
//!
//! [`RemoteStore`] over a PostgREST-style HTTP endpoint
//! (`<base>/rest/v1/<table>`).
//!
//! ## Request Shape
//! ```text
//! insert  POST   /rest/v1/sales                         body: [row, ...]
//! select  GET    /rest/v1/products?select=*&shop_id=eq.s1&is_active=eq.true
//! update  PATCH  /rest/v1/sales?shop_id=eq.s1&client_ref=eq.<uuid>   body: patch
//!
//! headers: apikey: <api key>
//!          Authorization: Bearer <access token | api key>
//!          Prefer: return=representation
//! ```
//!
//! ## Status Mapping
//! ```text
//! connect / timeout   → RemoteUnreachable
//! 5xx                 → RemoteUnreachable
//! other non-2xx       → RemoteRejected { status, message: body }
//! ```

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::PosConfig;
use crate::error::{SyncError, SyncResult};
use crate::remote::{Filter, RemoteQuery, RemoteStore, RemoteTable};

const REST_PREFIX: &str = "rest/v1/";

/// HTTP client for the remote store.
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: Client,
    rest_base: Url,
    api_key: String,
    access_token: Arc<RwLock<Option<String>>>,
}

impl PostgrestStore {
    /// Creates a client for `base_url` (e.g. `https://xyz.example.co`).
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> SyncResult<Self> {
        let mut base = Url::parse(base_url)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(SyncError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                base.scheme()
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let rest_base = base.join(REST_PREFIX)?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(PostgrestStore {
            client,
            rest_base,
            api_key: api_key.into(),
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Builds a client from the `[remote]` section.
    pub fn from_config(config: &PosConfig) -> SyncResult<Self> {
        Self::new(
            config.remote_url()?.as_str(),
            config.remote.api_key.clone(),
            config.remote.timeout(),
        )
    }

    /// Replaces the bearer token; `None` falls back to the API key.
    pub fn set_access_token(&self, token: Option<String>) {
        match self.access_token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    fn bearer(&self) -> String {
        let token = match self.access_token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        token.unwrap_or_else(|| self.api_key.clone())
    }

    /// `<base>/rest/v1/<table>`
    pub fn table_url(&self, table: RemoteTable) -> SyncResult<Url> {
        Ok(self.rest_base.join(table.as_str())?)
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer())
            .header("Prefer", "return=representation")
    }

    async fn rows(response: Response) -> SyncResult<Vec<Value>> {
        let status = response.status();
        if status.is_success() {
            let body: Value = response.json().await?;
            return match body {
                Value::Array(rows) => Ok(rows),
                Value::Null => Ok(Vec::new()),
                row @ Value::Object(_) => Ok(vec![row]),
                other => Err(SyncError::InvalidResponse(format!(
                    "expected rows, got {}",
                    other
                ))),
            };
        }

        let message = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %message, "Remote store error response");

        if status.is_server_error() {
            Err(SyncError::RemoteUnreachable(format!("{}: {}", status, message)))
        } else {
            Err(SyncError::RemoteRejected {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// PostgREST `eq.` operand for a JSON value.
fn eq_operand(value: &Value) -> String {
    match value {
        Value::String(s) => format!("eq.{}", s),
        Value::Null => "is.null".to_string(),
        other => format!("eq.{}", other),
    }
}

/// Query-string pairs for filters, order and limit.
pub(crate) fn query_pairs(filters: &[Filter], query: Option<&RemoteQuery>) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = filters
        .iter()
        .map(|f| (f.column.clone(), eq_operand(&f.value)))
        .collect();

    if let Some(query) = query {
        if let Some(order) = &query.order {
            let dir = if order.ascending { "asc" } else { "desc" };
            pairs.push(("order".to_string(), format!("{}.{}", order.column, dir)));
        }
        if let Some(limit) = query.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
    }

    pairs
}

#[async_trait]
impl RemoteStore for PostgrestStore {
    async fn insert(&self, table: RemoteTable, rows: Vec<Value>) -> SyncResult<Vec<Value>> {
        let url = self.table_url(table)?;
        debug!(%table, count = rows.len(), "Remote insert");

        let response = self
            .request(self.client.post(url))
            .json(&rows)
            .send()
            .await?;
        Self::rows(response).await
    }

    async fn select(&self, table: RemoteTable, query: &RemoteQuery) -> SyncResult<Vec<Value>> {
        let url = self.table_url(table)?;
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(query_pairs(&query.filters, Some(query)));
        debug!(%table, filters = query.filters.len(), "Remote select");

        let response = self
            .request(self.client.get(url))
            .query(&pairs)
            .send()
            .await?;
        Self::rows(response).await
    }

    async fn update(
        &self,
        table: RemoteTable,
        filters: &[Filter],
        patch: Value,
    ) -> SyncResult<Vec<Value>> {
        if filters.is_empty() {
            return Err(SyncError::Internal(format!(
                "refusing unfiltered update on {}",
                table
            )));
        }

        let url = self.table_url(table)?;
        debug!(%table, filters = filters.len(), "Remote update");

        let response = self
            .request(self.client.patch(url))
            .query(&query_pairs(filters, None))
            .json(&patch)
            .send()
            .await?;
        Self::rows(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_url_keeps_base_path() {
        let store = PostgrestStore::new("https://xyz.example.co", "key", Duration::from_secs(5))
            .unwrap();
        assert_eq!(
            store.table_url(RemoteTable::SaleItems).unwrap().as_str(),
            "https://xyz.example.co/rest/v1/sale_items"
        );

        let proxied =
            PostgrestStore::new("http://localhost:8000/api", "key", Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            proxied.table_url(RemoteTable::Sales).unwrap().as_str(),
            "http://localhost:8000/api/rest/v1/sales"
        );
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = PostgrestStore::new("ftp://example.com", "key", Duration::from_secs(5))
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_query_pairs() {
        let query = RemoteQuery::new()
            .eq("shop_id", "s1")
            .eq("is_active", true)
            .eq("sale_id", 42)
            .order_by("created_at", false)
            .limit(1);

        let pairs = query_pairs(&query.filters, Some(&query));
        assert_eq!(
            pairs,
            vec![
                ("shop_id".to_string(), "eq.s1".to_string()),
                ("is_active".to_string(), "eq.true".to_string()),
                ("sale_id".to_string(), "eq.42".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );

        let null = query_pairs(&[Filter::eq("barcode", json!(null))], None);
        assert_eq!(null[0].1, "is.null");
    }

    #[test]
    fn test_access_token_replaces_api_key_as_bearer() {
        let store = PostgrestStore::new("https://xyz.example.co", "anon", Duration::from_secs(5))
            .unwrap();
        assert_eq!(store.bearer(), "anon");

        store.set_access_token(Some("jwt".into()));
        assert_eq!(store.bearer(), "jwt");

        store.set_access_token(None);
        assert_eq!(store.bearer(), "anon");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_retryable() {
        // port 9 (discard) is closed on any sane test host
        let store = PostgrestStore::new("http://127.0.0.1:9", "key", Duration::from_secs(2))
            .unwrap();

        let err = store
            .select(RemoteTable::Products, &RemoteQuery::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::RemoteUnreachable(_)), "got {:?}", err);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_unfiltered_update_is_refused() {
        let store = PostgrestStore::new("http://127.0.0.1:9", "key", Duration::from_secs(2))
            .unwrap();
        let err = store
            .update(RemoteTable::Sales, &[], json!({"is_void": true}))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Internal(_)));
    }
}
