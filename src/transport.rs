// ============================================================================
// Gateway Transport
// ============================================================================
//
// Request/response primitive shared by the federation gateway client and the
// publish token verifier. The trait is the seam tests replace with a scripted
// fake; `HttpTransport` is the reqwest implementation.
//
// Every call carries a timeout. A timeout is reported like any other
// transport failure and nothing is retried here.
//
// ============================================================================

use async_trait::async_trait;
use bytes::Bytes;
use exposure_config::MtlsConfig;
use exposure_metrics::TRANSPORT_REQUEST_DURATION_SECONDS;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Outbound request, relative to the transport's base URL
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    /// Appended to the base URL; empty for endpoints configured as a full URL
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TransportRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn post(path: impl Into<String>, body: Bytes) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            headers: HeaderMap::new(),
            body,
        }
    }

    /// Add a header, rejecting values that cannot travel in an HTTP header
    pub fn header(mut self, name: HeaderName, value: &str) -> Result<Self, TransportError> {
        let value = HeaderValue::from_str(value).map_err(|e| {
            TransportError::InvalidRequest(format!("bad value for header {}: {}", name, e))
        })?;
        self.headers.insert(name, value);
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TransportResponse {
    /// Header value as UTF-8, if present and readable
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[async_trait]
pub trait GatewayTransport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport bound to one remote
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    /// Label for metrics ("gateway", "verification")
    remote: &'static str,
}

impl HttpTransport {
    pub fn new(
        remote: &'static str,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        Self::build(remote, base_url.into(), timeout, Self::client_builder())
    }

    /// Transport presenting a client certificate, as the federation gateway requires
    pub fn with_mtls(
        remote: &'static str,
        base_url: impl Into<String>,
        timeout: Duration,
        mtls: &MtlsConfig,
    ) -> Result<Self, TransportError> {
        let mut builder = Self::client_builder();

        if let (Some(cert_path), Some(key_path)) = (&mtls.client_cert_path, &mtls.client_key_path) {
            let mut pem = std::fs::read(cert_path).map_err(|e| {
                TransportError::InvalidRequest(format!("cannot read {}: {}", cert_path, e))
            })?;
            let key = std::fs::read(key_path).map_err(|e| {
                TransportError::InvalidRequest(format!("cannot read {}: {}", key_path, e))
            })?;
            pem.push(b'\n');
            pem.extend_from_slice(&key);

            let identity = reqwest::Identity::from_pem(&pem)
                .map_err(|e| TransportError::InvalidRequest(format!("bad client identity: {}", e)))?;
            builder = builder.identity(identity);
        }

        if !mtls.verify_server_cert {
            tracing::warn!(
                remote,
                "Server certificate verification is DISABLED - only acceptable for local gateways"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        Self::build(remote, base_url.into(), timeout, builder)
    }

    fn client_builder() -> reqwest::ClientBuilder {
        // Connection pooling and keep-alive
        reqwest::Client::builder()
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
    }

    fn build(
        remote: &'static str,
        base_url: String,
        timeout: Duration,
        builder: reqwest::ClientBuilder,
    ) -> Result<Self, TransportError> {
        let client = builder
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            remote,
        })
    }

    fn map_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else if err.is_decode() || err.is_body() {
            TransportError::InvalidResponse(err.to_string())
        } else {
            TransportError::Connect(err.to_string())
        }
    }
}

#[async_trait]
impl GatewayTransport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let started = Instant::now();

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(request.headers)
            .timeout(self.timeout);
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let result = async {
            let response = builder.send().await.map_err(|e| self.map_error(e))?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(|e| self.map_error(e))?;
            Ok::<_, TransportError>(TransportResponse {
                status,
                headers,
                body,
            })
        }
        .await;

        TRANSPORT_REQUEST_DURATION_SECONDS
            .with_label_values(&[self.remote])
            .observe(started.elapsed().as_secs_f64());

        match &result {
            Ok(response) => tracing::debug!(
                remote = self.remote,
                method = %request.method,
                url = %url,
                status = response.status.as_u16(),
                "Remote call completed"
            ),
            Err(e) => tracing::warn!(
                remote = self.remote,
                method = %request.method,
                url = %url,
                error = %e,
                "Remote call failed"
            ),
        }

        result
    }
}
