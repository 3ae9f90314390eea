//! GitLab API client
//!
//! Thin HTTP helper shared by every tool handler. It owns the reqwest client
//! (TLS, proxy, timeout and default headers), attaches credentials and turns
//! non-success responses into [`GitLabError::Api`]. Requests are never retried.

use crate::auth::BoxedAuthProvider;
use crate::config::GitLabConfig;
use crate::error::{GitLabError, GitLabResult};
use crate::gitlab::types::GraphQLResponse;
use reqwest::{Certificate, Client, Proxy, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// GitLab API client
pub struct GitLabClient {
    http: Client,
    base_url: String,
    graphql_url: String,
    auth: Arc<RwLock<BoxedAuthProvider>>,
    timeout_ms: u64,
}

impl GitLabClient {
    /// Create a new GitLab client from configuration
    pub fn new(config: &GitLabConfig, auth: BoxedAuthProvider) -> GitLabResult<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .pool_max_idle_per_host(10)
            .danger_accept_invalid_certs(config.skip_tls_verify)
            .user_agent(format!("gitlab-mcp/{}", env!("CARGO_PKG_VERSION")));

        if let Some(path) = &config.ca_cert_path {
            let path = shellexpand::tilde(path).to_string();
            let pem = std::fs::read(&path)
                .map_err(|e| GitLabError::Setup(format!("cannot read CA bundle {}: {}", path, e)))?;
            let cert = Certificate::from_pem(&pem)
                .map_err(|e| GitLabError::Setup(format!("invalid CA bundle {}: {}", path, e)))?;
            builder = builder.add_root_certificate(cert);
        }

        if let Some(proxy) = proxy_url(config) {
            let proxy = Proxy::all(&proxy)
                .map_err(|e| GitLabError::Setup(format!("invalid proxy '{}': {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }

        let http = builder.build().map_err(GitLabError::Request)?;

        Ok(Self {
            http,
            base_url: config.api_url(),
            graphql_url: config.graphql_url(),
            auth: Arc::new(RwLock::new(auth)),
            timeout_ms: config.timeout_ms,
        })
    }

    /// REST base URL including `/api/vN`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach credentials, reloading them first if the provider asks for it
    async fn authenticate(&self, request: RequestBuilder) -> GitLabResult<RequestBuilder> {
        if self.auth.read().await.needs_refresh() {
            let mut auth = self.auth.write().await;
            if let Err(e) = auth.refresh().await {
                debug!(error = %e, "Credential refresh failed, keeping previous value");
            }
        }

        let auth = self.auth.read().await;
        let header = auth
            .get_auth_header()
            .await
            .map_err(|e| GitLabError::from_response(401, "Unauthorized", &e.to_string()))?;

        Ok(request.header(header.header_name(), header.header_value()))
    }

    /// Send once and check the status
    async fn execute(&self, request: RequestBuilder) -> GitLabResult<Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GitLabError::Timeout {
                    timeout_ms: self.timeout_ms,
                }
            } else {
                GitLabError::Request(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(GitLabError::from_response(
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            &body,
        ))
    }

    async fn read_json<T: DeserializeOwned>(&self, response: Response) -> GitLabResult<T> {
        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                GitLabError::Timeout {
                    timeout_ms: self.timeout_ms,
                }
            } else {
                GitLabError::Request(e)
            }
        })?;
        decode_body(&bytes)
    }

    /// Make a GET request
    #[instrument(skip(self), fields(endpoint = %endpoint))]
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> GitLabResult<T> {
        let request = self.authenticate(self.http.get(self.url(endpoint))).await?;
        let response = self.execute(request).await?;
        self.read_json(response).await
    }

    /// Make a GET request returning raw JSON value
    pub async fn get_json(&self, endpoint: &str) -> GitLabResult<Value> {
        self.get(endpoint).await
    }

    /// GET a binary payload, returning the bytes and the reported content type
    #[instrument(skip(self), fields(endpoint = %endpoint))]
    pub async fn get_bytes(&self, endpoint: &str) -> GitLabResult<(Vec<u8>, Option<String>)> {
        let request = self.authenticate(self.http.get(self.url(endpoint))).await?;
        let response = self.execute(request).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(GitLabError::Request)?;
        Ok((bytes.to_vec(), content_type))
    }

    /// Make a POST request
    #[instrument(skip(self, body), fields(endpoint = %endpoint))]
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> GitLabResult<T> {
        let request = self
            .authenticate(self.http.post(self.url(endpoint)).json(body))
            .await?;
        let response = self.execute(request).await?;
        self.read_json(response).await
    }

    /// Make a PUT request
    #[instrument(skip(self, body), fields(endpoint = %endpoint))]
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> GitLabResult<T> {
        let request = self
            .authenticate(self.http.put(self.url(endpoint)).json(body))
            .await?;
        let response = self.execute(request).await?;
        self.read_json(response).await
    }

    /// Make a DELETE request. A 204 or empty body yields `Value::Null`.
    #[instrument(skip(self), fields(endpoint = %endpoint))]
    pub async fn delete(&self, endpoint: &str) -> GitLabResult<Value> {
        let request = self.authenticate(self.http.delete(self.url(endpoint))).await?;
        let response = self.execute(request).await?;
        self.read_json(response).await
    }

    /// Run a GraphQL query against `/api/graphql` and return its `data`
    #[instrument(skip(self, query, variables))]
    pub async fn graphql(&self, query: &str, variables: Value) -> GitLabResult<Value> {
        let body = json!({ "query": query, "variables": variables });
        let request = self
            .authenticate(self.http.post(&self.graphql_url).json(&body))
            .await?;
        let response = self.execute(request).await?;
        let parsed: GraphQLResponse = self.read_json(response).await?;

        if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
            let message = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(GitLabError::GraphQL(message));
        }

        parsed
            .data
            .ok_or_else(|| GitLabError::InvalidResponse("GraphQL response has no data".into()))
    }

    /// URL-encode a project or group path for use in API endpoints
    pub fn encode_path(path: &str) -> String {
        urlencoding::encode(path).to_string()
    }
}

/// Explicit proxy from config. `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY` are
/// honoured by reqwest itself when this is unset.
fn proxy_url(config: &GitLabConfig) -> Option<String> {
    config.proxy.clone().filter(|p| !p.trim().is_empty())
}

/// Empty bodies (204, some DELETEs) decode as JSON `null`
fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> GitLabResult<T> {
    let result = if bytes.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_slice(bytes)
    };
    result.map_err(|e| GitLabError::InvalidResponse(format!("Failed to parse response: {}", e)))
}
