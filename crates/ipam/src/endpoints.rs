//! Canonical Athena URLs.
//!
//! Every resource lives under `{scheme}://{address}:{port}/api/v3/onefuse/`.
//! Collections end in `{resourceType}/` and items in `{resourceType}/{id}/`;
//! the trailing slash is significant to the service.

use serde::{Deserialize, Serialize};

use crate::{IpamError, ServiceConfig};

/// API version segment.
pub const API_VERSION: &str = "api/v3";

/// API namespace segment.
pub const API_NAMESPACE: &str = "onefuse";

/// The collections this client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    /// `workspaces`
    Workspaces,
    /// `ipamReservations`
    IpamReservations,
    /// `ipamPolicies`
    IpamPolicies,
    /// `jobStatus`
    JobStatus,
    /// `templateTester`
    TemplateTester,
}

impl ResourceType {
    /// Path segment of the collection.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Workspaces => "workspaces",
            ResourceType::IpamReservations => "ipamReservations",
            ResourceType::IpamPolicies => "ipamPolicies",
            ResourceType::JobStatus => "jobStatus",
            ResourceType::TemplateTester => "templateTester",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ServiceConfig {
    /// `{scheme}://{address}:{port}`
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.address, self.port)
    }

    /// `{base}/api/v3/onefuse/{resourceType}/`
    pub fn collection_url(&self, resource_type: ResourceType) -> String {
        format!(
            "{}/{}/{}/{}/",
            self.base_url(),
            API_VERSION,
            API_NAMESPACE,
            resource_type
        )
    }

    /// `{collection}{id}/`
    pub fn item_url(&self, resource_type: ResourceType, id: impl std::fmt::Display) -> String {
        format!("{}{}/", self.collection_url(resource_type), id)
    }

    /// Joins a service-relative `href` (as found under `_links`) onto the base URL.
    ///
    /// Absolute hrefs are returned unchanged.
    pub fn url_from_href(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            return href.to_string();
        }
        if href.starts_with('/') {
            format!("{}{}", self.base_url(), href)
        } else {
            format!("{}/{}", self.base_url(), href)
        }
    }
}

/// Extracts the numeric id from a `.../{resource}/{id}/` hyperlink.
///
/// The id is the second-to-last `/`-delimited segment, so the trailing slash
/// is required. Any change to the service's hyperlink shape breaks this.
pub fn id_from_href(href: &str) -> Result<u64, IpamError> {
    let segments: Vec<&str> = href.split('/').collect();
    if segments.len() < 2 {
        return Err(IpamError::MalformedLink {
            href: href.to_string(),
        });
    }
    segments[segments.len() - 2]
        .parse::<u64>()
        .map_err(|_| IpamError::MalformedLink {
            href: href.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn config() -> ServiceConfig {
        ServiceConfig::new("athena.local", 8443, "admin", "pw")
    }

    #[test]
    fn builds_collection_and_item_urls() {
        let config = config();
        assert_eq!(
            config.collection_url(ResourceType::IpamReservations),
            "https://athena.local:8443/api/v3/onefuse/ipamReservations/"
        );
        assert_eq!(
            config.item_url(ResourceType::JobStatus, 12),
            "https://athena.local:8443/api/v3/onefuse/jobStatus/12/"
        );
    }

    #[test]
    fn respects_configured_scheme() {
        let config = config().with_scheme("http");
        assert_eq!(
            config.collection_url(ResourceType::Workspaces),
            "http://athena.local:8443/api/v3/onefuse/workspaces/"
        );
    }

    #[rstest]
    #[case(
        "/api/v3/onefuse/ipamReservations/5/",
        "https://athena.local:8443/api/v3/onefuse/ipamReservations/5/"
    )]
    #[case(
        "api/v3/onefuse/ipamReservations/5/",
        "https://athena.local:8443/api/v3/onefuse/ipamReservations/5/"
    )]
    #[case("https://elsewhere:1/x/", "https://elsewhere:1/x/")]
    fn joins_hrefs_onto_base(#[case] href: &str, #[case] expected: &str) {
        assert_eq!(config().url_from_href(href), expected);
    }

    #[rstest]
    #[case("/api/v3/onefuse/modulePolicies/42/", 42)]
    #[case("https://athena.local:8443/api/v3/onefuse/ipamPolicies/7/", 7)]
    fn parses_id_from_href(#[case] href: &str, #[case] expected: u64) {
        assert_eq!(id_from_href(href).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("/api/v3/onefuse/ipamPolicies/42")]
    #[case("/api/v3/onefuse/ipamPolicies/")]
    fn rejects_malformed_hrefs(#[case] href: &str) {
        assert!(matches!(
            id_from_href(href),
            Err(IpamError::MalformedLink { .. })
        ));
    }
}
