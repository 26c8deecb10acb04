//! Core domain for the Athena IPAM client.
//!
//! This crate contains every wire representation, newtype identifier, and the
//! shared error type used by the client. Infrastructure crates implement the
//! [`ApiTransport`] port defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Domain types + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is exchanged with the service; the `client` crate defines
//! the protocol and the `transport` crate defines *how* bytes move.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ReservationId`, `JobId`, etc.) |
//! | [`types`] | Reservation, policy, workspace, and collection shapes |
//! | [`job`] | Job status records and job states |
//! | [`config`] | Service address, credentials, and TLS behaviour |
//! | [`endpoints`] | Canonical collection, item, and href URLs |
//! | [`ports`] | The [`ApiTransport`] trait and its request/response values |
//! | [`binding`] | Flat record view of a reservation |
//! | [`errors`] | The [`IpamError`] failure surface |

pub mod binding;
pub mod config;
pub mod endpoints;
pub mod errors;
pub mod identifiers;
pub mod job;
pub mod ports;
pub mod types;

pub use binding::{FieldValue, Record};
pub use config::{Password, ServiceConfig};
pub use endpoints::ResourceType;
pub use errors::IpamError;
pub use identifiers::{JobId, OperationId, PolicyId, ReservationId, WorkspaceId};
pub use job::{ErrorDetails, ErrorMessage, JobLinks, JobState, JobStatus, Timestamp};
pub use ports::{ApiRequest, ApiResponse, ApiTransport, HttpMethod};
pub use types::{
    EmbeddedCollection, IpamPolicy, IpamPolicyCollection, IpamReservation, LinkRef, PolicyLinks,
    RenderTemplateRequest, RenderedTemplate, ReservationLinks, TemplateProperties, Workspace,
    WorkspaceCollection, WorkspaceLinks,
};
