//! REST client for json-server style backends

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::RequestBuilder;
use reqwest::Response;
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::CollectionQuery;
use crate::api::RecordReader;
use crate::api::RecordWriter;
use crate::error::ApiError;
use crate::model::Record;
use crate::model::RecordId;

/// A record store reached over HTTP.
///
/// Speaks the json-server dialect:
///
/// | Operation | Request |
/// |-----------|---------|
/// | fetch | `GET /{collection}?q=..&_sort=..&_order=..&field=value` |
/// | create | `POST /{collection}` |
/// | update | `PATCH /{collection}/{id}` |
/// | delete | `DELETE /{collection}/{id}` |
///
/// Creates without an identity are given a millisecond timestamp id before
/// they are sent. This client is cheap to clone (uses `Arc` internally).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use crmgrid_lib::RestClient;
///
/// let client = RestClient::builder()
///     .url("http://localhost:3000")
///     .timeout(Duration::from_secs(10))
///     .build()
///     .unwrap();
/// assert_eq!(client.base_url().as_str(), "http://localhost:3000/");
/// ```
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    base_url: Url,
    http_client: Client,
    timeout: Option<Duration>,
}

impl RestClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> RestClientBuilder<Missing> {
        RestClientBuilder::new()
    }

    /// Returns the base URL of the backend.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn with_timeout(&self, request: RequestBuilder) -> RequestBuilder {
        match self.inner.timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

/// Turns a non-success response into [`ApiError::Http`].
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            body
        };
        Err(ApiError::http(status.as_u16(), message))
    }
}

/// Reads a JSON body. An empty body reads as `None`.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<Option<T>, ApiError> {
    let body = check_status(response).await?.text().await?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&body)
        .map(Some)
        .map_err(|e| ApiError::parse_with_body(e.to_string(), body))
}

fn query_pairs(query: &CollectionQuery) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Some(term) = &query.search {
        pairs.push(("q".to_string(), term.clone()));
    }
    if let Some(sort) = &query.sort {
        pairs.push(("_sort".to_string(), sort.property().to_string()));
        pairs.push(("_order".to_string(), sort.direction().as_str().to_string()));
    }
    for (field, value) in &query.criteria {
        pairs.push((field.clone(), value.to_string()));
    }
    pairs
}

#[async_trait]
impl RecordReader for RestClient {
    async fn fetch(&self, query: &CollectionQuery) -> Result<Vec<Record>, ApiError> {
        let url = self.url(&[query.collection.as_str()])?;
        log::debug!("GET {}", url);

        let request = self.inner.http_client.get(url).query(&query_pairs(query));
        let response = self.with_timeout(request).send().await?;
        Ok(read_json(response).await?.unwrap_or_default())
    }
}

#[async_trait]
impl RecordWriter for RestClient {
    async fn create(&self, collection: &str, record: &Record) -> Result<Record, ApiError> {
        let mut record = record.clone();
        if record.id().is_none() {
            record.set_id(RecordId::from_timestamp());
        }
        let url = self.url(&[collection])?;
        log::debug!("POST {}", url);

        let request = self.inner.http_client.post(url).json(&record);
        let response = self.with_timeout(request).send().await?;
        Ok(read_json(response).await?.unwrap_or(record))
    }

    async fn update(
        &self,
        collection: &str,
        id: &RecordId,
        patch: &Record,
    ) -> Result<Option<Record>, ApiError> {
        let url = self.url(&[collection, id.to_string().as_str()])?;
        log::debug!("PATCH {}", url);

        let request = self.inner.http_client.patch(url).json(&patch.without_id());
        let response = self.with_timeout(request).send().await?;
        read_json(response).await
    }

    async fn delete(&self, collection: &str, id: &RecordId) -> Result<(), ApiError> {
        let url = self.url(&[collection, id.to_string().as_str()])?;
        log::debug!("DELETE {}", url);

        let request = self.inner.http_client.delete(url);
        let response = self.with_timeout(request).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`RestClient`].
///
/// Uses the typestate pattern to ensure the base URL is set at compile time.
///
/// # Required Fields
///
/// - `url` - The backend base URL, e.g. `http://localhost:3000`
pub struct RestClientBuilder<U> {
    url: U,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
}

impl RestClientBuilder<Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: Missing,
            timeout: None,
            connect_timeout: None,
            http_client: None,
        }
    }

    /// Sets the backend base URL.
    pub fn url(self, url: impl Into<String>) -> RestClientBuilder<Set<String>> {
        RestClientBuilder {
            url: Set(url.into()),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
        }
    }
}

impl Default for RestClientBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> RestClientBuilder<U> {
    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    ///
    /// If not set, a default client will be created.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl RestClientBuilder<Set<String>> {
    /// Builds the [`RestClient`].
    ///
    /// Fails if the URL does not parse or the HTTP client cannot be built.
    pub fn build(self) -> Result<RestClient, ApiError> {
        let base_url =
            Url::parse(&self.url.0).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", self.url.0, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(self.url.0));
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(RestClient {
            inner: Arc::new(RestClientInner {
                base_url,
                http_client,
                timeout: self.timeout,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortDirective;

    fn client(url: &str) -> RestClient {
        RestClient::builder().url(url).build().unwrap()
    }

    #[test]
    fn test_url_joins_segments() {
        let client = client("http://localhost:3000");
        let url = client.url(&["leads", "42"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/leads/42");

        let client = self::client("http://example.com/api/");
        let url = client.url(&["opportunities"]).unwrap();
        assert_eq!(url.as_str(), "http://example.com/api/opportunities");
    }

    #[test]
    fn test_url_escapes_text_ids() {
        let client = client("http://localhost:3000");
        let url = client.url(&["leads", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/leads/a%20b%2Fc");
    }

    #[test]
    fn test_invalid_urls_are_rejected() {
        assert!(matches!(
            RestClient::builder().url("not a url").build(),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            RestClient::builder().url("mailto:someone@example.com").build(),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_query_pairs() {
        let query = CollectionQuery::new("leads")
            .search("  acme ")
            .criterion("status", "Converted")
            .sort(SortDirective::desc("id"));
        let pairs = query_pairs(&query);
        let pairs: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                ("q", "acme"),
                ("_sort", "id"),
                ("_order", "desc"),
                ("status", "Converted"),
            ]
        );
    }
}
