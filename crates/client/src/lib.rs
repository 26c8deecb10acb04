//! Athena IPAM client: resource accessors, the job protocol, and the
//! reservation operations built on them.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** This crate sequences calls through the
//! [`ipam::ApiTransport`] port. It owns the request/poll/resolve protocol but
//! knows nothing about HTTP libraries; the `transport` crate supplies the real
//! implementation.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`accessors`] | GET by id and find-by-name over collections |
//! | [`jobs`] | Submit, poll, and resolve of asynchronous jobs |
//! | [`operations`] | [`IpamClient`]: reservation, workspace, policy, template calls |
//! | [`resource`] | Record-level create/read/update/delete |

pub mod accessors;
pub mod jobs;
pub mod operations;
pub mod resource;

#[cfg(test)]
mod testing;

pub use accessors::Accessor;
pub use jobs::{JobOutcome, JobPhase, JobPolicy, JobRunner, Resolved, POLL_INTERVAL, POLL_TIMEOUT};
pub use operations::{IpamClient, DEFAULT_WORKSPACE};
pub use resource::ReservationResource;
