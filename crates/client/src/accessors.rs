//! Synchronous resource accessors.
//!
//! Plain request/response reads that need no job indirection: fetch one
//! object by id, or find the first object of a collection matching a filter.

use std::fmt::Display;

use ipam::{ApiRequest, ApiTransport, EmbeddedCollection, IpamError, ResourceType, ServiceConfig};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Query parameter carrying collection filters.
pub const FILTER_PARAM: &str = "filter";

/// Reads Athena resources through an [`ApiTransport`].
pub struct Accessor<'a, T: ?Sized> {
    transport: &'a T,
    config: &'a ServiceConfig,
}

impl<'a, T: ApiTransport + ?Sized> Accessor<'a, T> {
    pub fn new(transport: &'a T, config: &'a ServiceConfig) -> Self {
        Self { transport, config }
    }

    /// Executes `request` and returns the body of a non-error response.
    pub async fn send(&self, request: &ApiRequest) -> Result<String, IpamError> {
        debug!(method = %request.method, url = %request.url, "Sending request");
        let response = self.transport.execute(request).await?;
        debug!(
            method = %request.method,
            url = %request.url,
            status = response.status,
            body_len = response.body.len(),
            "Received response"
        );
        response.into_body(request)
    }

    /// Executes `request` and decodes the JSON body into `R`.
    pub async fn send_json<R: DeserializeOwned>(&self, request: &ApiRequest) -> Result<R, IpamError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| IpamError::decode(request.url.as_str(), &e, &body))
    }

    /// `GET url`, decoded into `R`.
    pub async fn get_url<R: DeserializeOwned>(&self, url: impl Into<String>) -> Result<R, IpamError> {
        self.send_json(&ApiRequest::get(url)).await
    }

    /// `GET {resourceType}/{id}/`, decoded into `R`.
    pub async fn get_by_id<R: DeserializeOwned>(
        &self,
        resource_type: ResourceType,
        id: impl Display,
    ) -> Result<R, IpamError> {
        self.get_url(self.config.item_url(resource_type, id)).await
    }

    /// First element of `C`'s collection whose name matches `name`.
    ///
    /// Issues `filter=name:{name}{extra_filter}`; `extra_filter` is appended
    /// verbatim, so it must carry its own separator.
    pub async fn find_by_name<C: EmbeddedCollection>(
        &self,
        name: &str,
        extra_filter: &str,
    ) -> Result<C::Item, IpamError> {
        self.find_by_filter::<C>(format!("name:{name}{extra_filter}"), name)
            .await
    }

    /// First element of `C`'s collection matching `filter`.
    ///
    /// Only the first page of results is inspected. An empty page yields
    /// [`IpamError::NotFound`] naming `key`.
    pub async fn find_by_filter<C: EmbeddedCollection>(
        &self,
        filter: String,
        key: &str,
    ) -> Result<C::Item, IpamError> {
        let request =
            ApiRequest::get(self.config.collection_url(C::RESOURCE_TYPE)).with_query(FILTER_PARAM, filter);
        let page: C = self.send_json(&request).await?;
        page.into_first().ok_or_else(|| IpamError::NotFound {
            resource_type: C::RESOURCE_TYPE,
            key: key.to_string(),
        })
    }
}
