//! The transport port.
//!
//! The client crate drives every request through [`ApiTransport`]; the
//! `transport` crate implements it over HTTP, and tests implement it in memory.
//! Requests and responses are plain values so that the job engine never sees
//! an HTTP library type.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::IpamError;

/// The HTTP verbs the client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Upper-case verb as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Absolute URL without query string.
    pub url: String,
    /// Query parameters, encoded by the transport.
    pub query: Vec<(String, String)>,
    /// JSON body; only sent for `POST` and `PUT`.
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// A `GET` of `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// A `DELETE` of `url`.
    pub fn delete(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Delete,
            ..Self::get(url)
        }
    }

    /// A `POST` of `entity` serialised as JSON.
    pub fn post<T: Serialize>(url: impl Into<String>, entity: &T) -> Result<Self, IpamError> {
        Self::with_body(HttpMethod::Post, url.into(), entity)
    }

    /// A `PUT` of `entity` serialised as JSON.
    pub fn put<T: Serialize>(url: impl Into<String>, entity: &T) -> Result<Self, IpamError> {
        Self::with_body(HttpMethod::Put, url.into(), entity)
    }

    /// Appends a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    fn with_body<T: Serialize>(
        method: HttpMethod,
        url: String,
        entity: &T,
    ) -> Result<Self, IpamError> {
        let body = serde_json::to_value(entity).map_err(|e| IpamError::Encode {
            url: url.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            method,
            url,
            query: Vec::new(),
            body: Some(body),
        })
    }
}

/// A response as received, before status classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    /// Returns `true` for any status of 400 or above.
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// Classifies the response: a status of 400 or above becomes
    /// [`IpamError::Http`] carrying the raw body; anything else yields the body.
    pub fn into_body(self, request: &ApiRequest) -> Result<String, IpamError> {
        if self.is_error() {
            return Err(IpamError::Http {
                method: request.method,
                url: request.url.clone(),
                status: self.status,
                body: self.body,
            });
        }
        Ok(self.body)
    }
}

/// Executes [`ApiRequest`]s against the service.
///
/// Implementations return `Err` only when no response was obtained
/// ([`IpamError::Transport`]); HTTP error statuses come back as an
/// [`ApiResponse`] and are classified by the caller.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, IpamError>;
}

#[async_trait]
impl<T: ApiTransport + ?Sized> ApiTransport for &T {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, IpamError> {
        (**self).execute(request).await
    }
}
