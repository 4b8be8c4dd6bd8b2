use crate::config::AppConfig;
use crate::database::Table;
use crate::error::{ApiError, SiteError};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_RANGE};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Every REST call resolves to rows or the error PostgREST returned.
pub type ApiResult<T> = Result<T, ApiError>;

const PREFER_RETURN: &str = "return=representation";
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=representation";
const PREFER_COUNT: &str = "count=exact";

/// Thin client over the PostgREST endpoint that fronts the hosted database.
///
/// One request per call. Nothing is retried; callers decide whether an
/// error is worth continuing past.
#[derive(Clone)]
pub struct RestClient {
    base_url: String,
    http_client: Client,
}

impl RestClient {
    pub fn new(config: &AppConfig) -> Result<Self, SiteError> {
        Self::with_key(&config.rest_url(), config.write_key(), config.request_timeout)
    }

    /// Builds a client against an explicit endpoint, e.g. `http://localhost:54321/rest/v1`.
    pub fn with_key(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, SiteError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| SiteError::ConfigError(format!("API key is not a valid header value: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| SiteError::ConfigError(format!("API key is not a valid header value: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(reqwest::header::AUTHORIZATION, bearer);

        let http_client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Starts a query against one table.
    pub fn from(&self, table: Table) -> Query<'_> {
        Query {
            client: self,
            table,
            columns: None,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Calls a SQL function exposed under `/rpc/{function}`.
    pub async fn rpc(&self, function: &str, args: &Value) -> ApiResult<Value> {
        let url = format!("{}/rpc/{}", self.base_url, function);
        let request = self.http_client.post(&url).json(args);
        let (_, body) = send(request, &url).await?;

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| ApiError::new(200, format!("Invalid RPC response from {}: {}", function, e)))
    }

    fn request(&self, method: Method, table: Table) -> (RequestBuilder, String) {
        let url = format!("{}/{}", self.base_url, table.name());
        (self.http_client.request(method, &url), url)
    }
}

/// Builder for a single table request. Filters apply to reads, updates and deletes.
pub struct Query<'a> {
    client: &'a RestClient,
    table: Table,
    columns: Option<String>,
    filters: Vec<(String, String)>,
    order: Vec<String>,
    limit: Option<usize>,
}

impl<'a> Query<'a> {
    /// PostgREST `select` expression, e.g. `*, categories(name_en)`.
    pub fn select(mut self, columns: &str) -> Self {
        self.columns = Some(columns.split_whitespace().collect::<Vec<_>>().join(""));
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order.push(format!("{}.{}", column, direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table(&self) -> Table {
        self.table
    }

    /// Query string pairs for the current builder state.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(columns) = &self.columns {
            params.push(("select".to_string(), columns.clone()));
        }
        params.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            params.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    pub async fn fetch(self) -> ApiResult<Vec<Value>> {
        let (request, url) = self.client.request(Method::GET, self.table);
        let request = request.query(&self.params());
        rows(send(request, &url).await?.1, &url)
    }

    /// Fetches and deserializes rows into a typed record.
    pub async fn fetch_as<T: DeserializeOwned>(self) -> ApiResult<Vec<T>> {
        let table = self.table;
        self.fetch()
            .await?
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| {
                    ApiError::new(200, format!("Unexpected {} row shape: {}", table, e))
                })
            })
            .collect()
    }

    pub async fn fetch_one(self) -> ApiResult<Option<Value>> {
        Ok(self.limit(1).fetch().await?.into_iter().next())
    }

    /// Exact row count via `Content-Range`.
    pub async fn count(self) -> ApiResult<u64> {
        let (request, url) = self.client.request(Method::GET, self.table);
        let mut params: Vec<(String, String)> = vec![("select".to_string(), "id".to_string())];
        params.extend(self.filters.iter().cloned());
        params.push(("limit".to_string(), "1".to_string()));

        let request = request.query(&params).header("Prefer", PREFER_COUNT);
        let (headers, _) = send(request, &url).await?;

        headers
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| ApiError::new(200, format!("No row count returned for {}", self.table)))
    }

    pub async fn insert<B: Serialize + ?Sized>(self, body: &B) -> ApiResult<Vec<Value>> {
        let (request, url) = self.client.request(Method::POST, self.table);
        let request = request.header("Prefer", PREFER_RETURN).json(body);
        rows(send(request, &url).await?.1, &url)
    }

    /// Insert-or-merge keyed on `on_conflict`, which must be a unique column.
    pub async fn upsert<B: Serialize + ?Sized>(
        self,
        body: &B,
        on_conflict: &str,
    ) -> ApiResult<Vec<Value>> {
        let (request, url) = self.client.request(Method::POST, self.table);
        let request = request
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", PREFER_UPSERT)
            .json(body);
        rows(send(request, &url).await?.1, &url)
    }

    pub async fn update<B: Serialize + ?Sized>(self, patch: &B) -> ApiResult<Vec<Value>> {
        self.require_filters("update")?;
        let (request, url) = self.client.request(Method::PATCH, self.table);
        let request = request
            .query(&self.filters)
            .header("Prefer", PREFER_RETURN)
            .json(patch);
        rows(send(request, &url).await?.1, &url)
    }

    pub async fn delete(self) -> ApiResult<Vec<Value>> {
        self.require_filters("delete")?;
        let (request, url) = self.client.request(Method::DELETE, self.table);
        let request = request.query(&self.filters).header("Prefer", PREFER_RETURN);
        rows(send(request, &url).await?.1, &url)
    }

    fn require_filters(&self, operation: &str) -> ApiResult<()> {
        if self.filters.is_empty() {
            warn!("Refusing unfiltered {} on {}", operation, self.table);
            return Err(ApiError::new(
                0,
                format!("{} on {} requires at least one filter", operation, self.table),
            ));
        }
        Ok(())
    }
}

async fn send(request: RequestBuilder, url: &str) -> ApiResult<(HeaderMap, String)> {
    debug!(url = %url, "Executing REST request");

    let response = request.send().await.map_err(|e| {
        warn!(url = %url, error = %e, "REST request failed");
        ApiError::transport(&e)
    })?;

    let status = response.status();
    let headers = response.headers().clone();
    let body = response.text().await.map_err(|e| ApiError::transport(&e))?;

    debug!(url = %url, status = status.as_u16(), response_len = body.len(), "REST request completed");

    if status.is_success() {
        Ok((headers, body))
    } else {
        Err(ApiError::from_response(status.as_u16(), &body))
    }
}

fn rows(body: String, url: &str) -> ApiResult<Vec<Value>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(&body) {
        Ok(Value::Array(rows)) => Ok(rows),
        Ok(Value::Null) => Ok(Vec::new()),
        Ok(single) => Ok(vec![single]),
        Err(e) => Err(ApiError::new(200, format!("Invalid JSON from {}: {}", url, e))),
    }
}

/// `0-24/3573` or `*/0` → total.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RestClient {
        RestClient::with_key("http://localhost:54321/rest/v1/", "anon", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_base_url_trimmed() {
        assert_eq!(client().base_url(), "http://localhost:54321/rest/v1");
    }

    #[test]
    fn test_query_params() {
        let client = client();
        let query = client
            .from(Table::Projects)
            .select("*, categories(name_en, name_id)")
            .eq("featured", 1)
            .order("sort_order", true)
            .order("created_at", false)
            .limit(10);

        assert_eq!(
            query.params(),
            vec![
                ("select".to_string(), "*,categories(name_en,name_id)".to_string()),
                ("featured".to_string(), "eq.1".to_string()),
                ("order".to_string(), "sort_order.asc,created_at.desc".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_content_range() {
        assert_eq!(parse_content_range_total("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-1/*"), None);
    }

    #[test]
    fn test_rows_parsing() {
        assert!(rows(String::new(), "u").unwrap().is_empty());
        assert_eq!(rows("[{\"id\":1}]".to_string(), "u").unwrap().len(), 1);
        assert_eq!(rows("{\"id\":1}".to_string(), "u").unwrap().len(), 1);
        assert!(rows("<html>".to_string(), "u").is_err());
    }

    #[tokio::test]
    async fn test_unfiltered_delete_refused() {
        let client = client();
        let err = client.from(Table::Faqs).delete().await.unwrap_err();
        assert_eq!(err.status, 0);
        assert!(err.message.contains("requires at least one filter"));
    }
}
