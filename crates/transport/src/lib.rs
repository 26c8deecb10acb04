//! HTTP adapter for the Athena IPAM client.
//!
//! Implements [`ipam::ApiTransport`] over `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Header construction, basic authentication, certificate
//! validation, and the byte-level exchange live here. The `client` crate sees
//! only [`ipam::ApiTransport`] and the plain [`ApiRequest`]/[`ApiResponse`]
//! values.
//!
//! Every request carries the same header set:
//!
//! | Header | Value |
//! |--------|-------|
//! | `Content-Type` | `application/json` |
//! | `Accept` | `*/*` |
//! | `Cache-Control` | `no-cache` |
//! | `Accept-Encoding` | `gzip, deflate` (added by `reqwest`) |
//! | `Connection` | `keep-alive` |
//! | `Host` | `{address}:{port}` |
//! | `SOURCE` | `Terraform` |
//!
//! plus HTTP basic authentication from the [`ServiceConfig`].

use async_trait::async_trait;
use ipam::{ApiRequest, ApiResponse, ApiTransport, HttpMethod, IpamError, Password, ServiceConfig};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, CACHE_CONTROL, CONNECTION, CONTENT_TYPE, HOST,
};
use tracing::{debug, warn};

/// Name of the header identifying the calling integration.
pub const SOURCE_HEADER: &str = "SOURCE";

/// Value sent in [`SOURCE_HEADER`].
pub const SOURCE_VALUE: &str = "Terraform";

/// [`ApiTransport`] backed by a shared `reqwest` connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    user: String,
    password: Password,
}

impl HttpTransport {
    /// Builds the HTTP client for `config`.
    ///
    /// With `verify_ssl = false` certificate validation is disabled
    /// entirely, which accepts self-signed and mismatched certificates.
    ///
    /// # Errors
    ///
    /// [`IpamError::Configuration`] when the address cannot form a `Host`
    /// header or the TLS backend fails to initialise.
    pub fn new(config: &ServiceConfig) -> Result<Self, IpamError> {
        if !config.verify_ssl {
            warn!(address = %config.address, "TLS certificate validation is disabled");
        }
        let http = reqwest::Client::builder()
            .default_headers(default_headers(config)?)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| IpamError::Configuration {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }
}

fn default_headers(config: &ServiceConfig) -> Result<HeaderMap, IpamError> {
    let host = HeaderValue::from_str(&config.authority()).map_err(|e| IpamError::Configuration {
        message: format!("invalid host '{}': {e}", config.authority()),
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(HOST, host);
    headers.insert(
        HeaderName::from_static("source"),
        HeaderValue::from_static(SOURCE_VALUE),
    );
    Ok(headers)
}

fn to_reqwest(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, IpamError> {
        let transport_error = |e: reqwest::Error| IpamError::Transport {
            method: request.method,
            url: request.url.clone(),
            message: e.to_string(),
        };

        let mut builder = self
            .http
            .request(to_reqwest(request.method), &request.url)
            .basic_auth(&self.user, Some(self.password.expose()));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let (HttpMethod::Post | HttpMethod::Put, Some(body)) = (request.method, &request.body) {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        debug!(
            method = %request.method,
            url = %request.url,
            status,
            "HTTP exchange complete"
        );
        Ok(ApiResponse { status, body })
    }
}
