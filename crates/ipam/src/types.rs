//! Athena resource representations.
//!
//! These are the exact wire shapes of the JSON the service accepts and
//! returns. Relationships are expressed as hyperlinks under `_links` rather
//! than foreign keys; see [`crate::endpoints::id_from_href`] for turning a
//! link back into an id.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{PolicyId, ReservationId, ResourceType, WorkspaceId};

/// Open-ended properties fed to the service's templating engine.
pub type TemplateProperties = Map<String, Value>;

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// A single hyperlink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl LinkRef {
    /// Returns the href, or `None` when it is empty.
    pub fn href(&self) -> Option<&str> {
        if self.href.is_empty() {
            None
        } else {
            Some(&self.href)
        }
    }
}

/// Hyperlinks of an [`IpamReservation`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationLinks {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<LinkRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<LinkRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<LinkRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_metadata: Option<LinkRef>,
}

/// Hyperlinks of an [`IpamPolicy`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyLinks {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<LinkRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<LinkRef>,
}

/// Hyperlinks of a [`Workspace`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceLinks {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<LinkRef>,
}

// ---------------------------------------------------------------------------
// Reservation
// ---------------------------------------------------------------------------

/// An IP allocation record.
///
/// Used both as the create request (caller-supplied fields only) and as the
/// hydrated result (server-computed network and DNS values, `id`, `_links`).
/// Exactly one of `policy_id` / `policy` identifies the governing policy in a
/// create request; the client converts the id to a URL before submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpamReservation {
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<ReservationLinks>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ReservationId>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hostname: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<PolicyId>,

    /// Absolute URL of the policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,

    /// Absolute URL of the workspace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,

    /// Always present on the wire; unset is sent as `""`.
    #[serde(default, serialize_with = "empty_if_none")]
    pub primary_dns: Option<String>,

    /// Always present on the wire; unset is sent as `""`.
    #[serde(default, serialize_with = "empty_if_none")]
    pub secondary_dns: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_suffix: Option<String>,

    /// Ordered DNS search suffixes. Read back when the service reports them;
    /// never part of the create payload.
    #[serde(default, skip_serializing)]
    pub dns_search_suffixes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nic_label: Option<String>,

    #[serde(
        rename = "template_properties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub template_properties: Option<TemplateProperties>,
}

fn empty_if_none<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or_default())
}

impl IpamReservation {
    /// Starts a create request for `hostname`.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Self::default()
        }
    }

    /// Href of the workspace link, if the service returned one.
    pub fn workspace_href(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|l| l.workspace.as_ref())
            .and_then(LinkRef::href)
    }

    /// Href of the policy link, if the service returned one.
    pub fn policy_href(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|l| l.policy.as_ref())
            .and_then(LinkRef::href)
    }
}

// ---------------------------------------------------------------------------
// Policy and workspace
// ---------------------------------------------------------------------------

/// A named rule set governing how reservations are allocated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpamPolicy {
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<PolicyLinks>,
    pub id: PolicyId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A named scoping container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<WorkspaceLinks>,
    pub id: WorkspaceId,
    #[serde(default)]
    pub name: String,
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// A collection response whose items sit under `_embedded`.
///
/// Name lookups decode the response into the implementing type and take the
/// first element; an empty collection means "not found". Only the first page
/// the service returns is ever inspected.
pub trait EmbeddedCollection: DeserializeOwned {
    type Item;

    /// Collection the lookup is issued against.
    const RESOURCE_TYPE: ResourceType;

    /// The first element, or `None` when the page is empty.
    fn into_first(self) -> Option<Self::Item>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EmbeddedWorkspaces {
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
}

/// `GET workspaces/?filter=...`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WorkspaceCollection {
    #[serde(rename = "_embedded", default)]
    pub embedded: EmbeddedWorkspaces,
}

impl EmbeddedCollection for WorkspaceCollection {
    type Item = Workspace;
    const RESOURCE_TYPE: ResourceType = ResourceType::Workspaces;

    fn into_first(self) -> Option<Workspace> {
        self.embedded.workspaces.into_iter().next()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedIpamPolicies {
    #[serde(default)]
    pub ipam_policies: Vec<IpamPolicy>,
}

/// `GET ipamPolicies/?filter=...`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IpamPolicyCollection {
    #[serde(rename = "_embedded", default)]
    pub embedded: EmbeddedIpamPolicies,
}

impl EmbeddedCollection for IpamPolicyCollection {
    type Item = IpamPolicy;
    const RESOURCE_TYPE: ResourceType = ResourceType::IpamPolicies;

    fn into_first(self) -> Option<IpamPolicy> {
        self.embedded.ipam_policies.into_iter().next()
    }
}

// ---------------------------------------------------------------------------
// Template rendering
// ---------------------------------------------------------------------------

/// Body of `POST templateTester/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderTemplateRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template: String,
    #[serde(
        rename = "template_properties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub template_properties: Option<TemplateProperties>,
}

/// Response of `POST templateTester/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedTemplate {
    #[serde(default)]
    pub value: String,
}
