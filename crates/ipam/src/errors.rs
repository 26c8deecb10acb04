//! Error type shared by every Athena IPAM crate.
//!
//! [`IpamError`] is the single failure surface handed back to callers. The
//! variants follow the failure taxonomy of the client:
//!
//! - request-level failures ([`IpamError::Transport`], [`IpamError::Http`],
//!   [`IpamError::Decode`], [`IpamError::Encode`]);
//! - job-level failures ([`IpamError::JobFailed`], [`IpamError::JobTimedOut`],
//!   [`IpamError::MissingLink`]);
//! - lookup and construction failures ([`IpamError::NotFound`],
//!   [`IpamError::InvalidRequest`], [`IpamError::MalformedLink`],
//!   [`IpamError::NotImplemented`], [`IpamError::Configuration`]).
//!
//! Nothing in the workspace retries on any of these; every error propagates
//! unchanged to the caller.

use std::time::Duration;

use thiserror::Error;

use crate::{HttpMethod, JobId, ResourceType};

/// Maximum number of response-body characters kept in a [`IpamError::Decode`].
pub const BODY_SNIPPET_LEN: usize = 512;

/// Errors produced by the Athena IPAM client.
#[derive(Debug, Error)]
pub enum IpamError {
    /// The request never produced an HTTP response (connection, DNS, or TLS failure).
    #[error("{method} {url} failed: {message}")]
    Transport {
        /// HTTP method of the failed request.
        method: HttpMethod,
        /// Absolute URL of the failed request.
        url: String,
        /// Description reported by the HTTP client.
        message: String,
    },

    /// The service answered with a status of 400 or above.
    ///
    /// The response body is carried verbatim; Athena puts its human-readable
    /// explanation there.
    #[error("{method} {url} returned {status}: {body}")]
    Http {
        /// HTTP method of the failed request.
        method: HttpMethod,
        /// Absolute URL of the failed request.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A response body could not be decoded into the expected type.
    #[error("Failed to decode response from {url}: {message} (body: {snippet})")]
    Decode {
        /// URL the body was fetched from.
        url: String,
        /// Description reported by the JSON decoder.
        message: String,
        /// Leading part of the raw body, at most [`BODY_SNIPPET_LEN`] characters.
        snippet: String,
    },

    /// A request entity could not be serialised to JSON.
    #[error("Failed to encode request body for {url}: {message}")]
    Encode {
        /// URL the body was destined for.
        url: String,
        /// Description reported by the JSON encoder.
        message: String,
    },

    /// The job reached the terminal `Failed` state.
    #[error("Job {job_type} ({job_id}) failed with code {code}: {}", .messages.join("; "))]
    JobFailed {
        /// Job type reported by the service (e.g. `"Create IPAM Reservation"`).
        job_type: String,
        /// The failed job.
        job_id: JobId,
        /// Structured error code, or `0` when the service omitted it.
        code: i64,
        /// Every message from the job's error details, in service order.
        messages: Vec<String>,
    },

    /// The job did not reach a terminal state within the polling budget.
    #[error("Timed out while waiting for job to complete.")]
    JobTimedOut {
        /// The job that was still running.
        job_id: JobId,
        /// Time spent since submission when polling stopped.
        elapsed: Duration,
    },

    /// A successful job did not carry the hyperlink needed to resolve its result.
    #[error("Job {job_id} finished without a '{link}' link")]
    MissingLink {
        /// The finished job.
        job_id: JobId,
        /// Name of the missing link (e.g. `"managedObject"`).
        link: &'static str,
    },

    /// A name lookup returned an empty collection.
    #[error("Could not find {resource_type} '{key}'")]
    NotFound {
        /// Collection that was searched.
        resource_type: ResourceType,
        /// The search key (name or filter expression).
        key: String,
    },

    /// The caller supplied missing, ambiguous, or ill-typed fields.
    ///
    /// Always raised before any network call is made.
    #[error("Invalid request: {reason}")]
    InvalidRequest {
        /// Description of the problem.
        reason: String,
    },

    /// A hyperlink did not have the `.../{resource}/{id}/` shape.
    #[error("Hyperlink '{href}' does not end in a numeric id segment")]
    MalformedLink {
        /// The offending hyperlink.
        href: String,
    },

    /// The operation is not supported by this client.
    #[error("{operation}: not implemented yet")]
    NotImplemented {
        /// Name of the unsupported operation.
        operation: &'static str,
    },

    /// The service configuration is missing a value or holds an invalid one.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl IpamError {
    /// Builds a [`IpamError::Decode`] keeping only the head of `body`.
    pub fn decode(url: impl Into<String>, err: &serde_json::Error, body: &str) -> Self {
        IpamError::Decode {
            url: url.into(),
            message: err.to_string(),
            snippet: snippet(body),
        }
    }

    /// Builds a [`IpamError::InvalidRequest`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        IpamError::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Returns `true` for the terminal job failures (`Failed` and timed out).
    pub fn is_job_failure(&self) -> bool {
        matches!(
            self,
            IpamError::JobFailed { .. } | IpamError::JobTimedOut { .. }
        )
    }
}

fn snippet(body: &str) -> String {
    match body.char_indices().nth(BODY_SNIPPET_LEN) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_failure_message_lists_every_server_message() {
        let err = IpamError::JobFailed {
            job_type: "Create IPAM Reservation".to_string(),
            job_id: JobId::new(7),
            code: 400,
            messages: vec!["bad hostname".to_string(), "no free address".to_string()],
        };

        let text = err.to_string();
        assert!(text.contains("Create IPAM Reservation"));
        assert!(text.contains("(7)"));
        assert!(text.contains("bad hostname; no free address"));
        assert!(err.is_job_failure());
    }

    #[test]
    fn timeout_message_is_fixed() {
        let err = IpamError::JobTimedOut {
            job_id: JobId::new(1),
            elapsed: Duration::from_secs(3600),
        };
        assert_eq!(err.to_string(), "Timed out while waiting for job to complete.");
    }

    #[test]
    fn http_error_carries_raw_body() {
        let err = IpamError::Http {
            method: HttpMethod::Get,
            url: "https://athena:443/api/v3/onefuse/workspaces/".to_string(),
            status: 403,
            body: "{\"detail\":\"Permission denied\"}".to_string(),
        };
        assert!(err.to_string().ends_with("returned 403: {\"detail\":\"Permission denied\"}"));
        assert!(!err.is_job_failure());
    }

    #[test]
    fn decode_error_truncates_long_bodies() {
        let body = "x".repeat(BODY_SNIPPET_LEN * 2);
        let json_err = serde_json::from_str::<serde_json::Value>(&body).unwrap_err();

        match IpamError::decode("https://athena/", &json_err, &body) {
            IpamError::Decode { snippet, .. } => {
                assert_eq!(snippet.len(), BODY_SNIPPET_LEN + 3);
                assert!(snippet.ends_with("..."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn not_found_names_resource_and_key() {
        let err = IpamError::NotFound {
            resource_type: ResourceType::IpamPolicies,
            key: "prod".to_string(),
        };
        assert_eq!(err.to_string(), "Could not find ipamPolicies 'prod'");
    }
}
