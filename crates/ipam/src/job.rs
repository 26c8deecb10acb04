//! Server-side job records.
//!
//! Every mutating request is accepted immediately and tracked by a
//! [`JobStatus`] resource. A job starts in some non-terminal state (the
//! service uses several: `Pending`, `Running`, `Queued`, ...) and moves to
//! exactly one of the terminal states [`JobState::Successful`] or
//! [`JobState::Failed`]. Job ids are never reused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{IpamError, JobId, LinkRef};

/// Terminal state string for a successful job.
pub const JOB_SUCCESS: &str = "Successful";

/// Terminal state string for a failed job.
pub const JOB_FAILED: &str = "Failed";

// ---------------------------------------------------------------------------
// Job state
// ---------------------------------------------------------------------------

/// The `jobState` of a job.
///
/// Only the two terminal strings are recognised; any other value, including
/// an empty or unknown one, is kept verbatim and treated as still running.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum JobState {
    Successful,
    Failed,
    InProgress(String),
    #[default]
    Unknown,
}

impl JobState {
    /// Returns `true` for `Successful` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Successful | JobState::Failed)
    }

    /// The state string as reported by the service.
    pub fn as_str(&self) -> &str {
        match self {
            JobState::Successful => JOB_SUCCESS,
            JobState::Failed => JOB_FAILED,
            JobState::InProgress(state) => state,
            JobState::Unknown => "",
        }
    }
}

impl From<String> for JobState {
    fn from(value: String) -> Self {
        match value.as_str() {
            JOB_SUCCESS => JobState::Successful,
            JOB_FAILED => JobState::Failed,
            "" => JobState::Unknown,
            _ => JobState::InProgress(value),
        }
    }
}

impl From<Option<String>> for JobState {
    fn from(value: Option<String>) -> Self {
        value.map(JobState::from).unwrap_or_default()
    }
}

impl From<&str> for JobState {
    fn from(value: &str) -> Self {
        JobState::from(value.to_string())
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        state.as_str().to_string()
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job status
// ---------------------------------------------------------------------------

/// One structured error message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(default)]
    pub message: String,
}

/// Error details attached to a failed job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub errors: Option<Vec<ErrorMessage>>,
}

/// Hyperlinks of a [`JobStatus`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobLinks {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<LinkRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_metadata: Option<LinkRef>,
    /// The object the job produced or affected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_object: Option<LinkRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<LinkRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<LinkRef>,
}

/// Progress record of one asynchronous job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<JobLinks>,
    pub id: JobId,
    #[serde(default)]
    pub job_state: JobState,
    #[serde(default)]
    pub job_state_description: Option<String>,
    #[serde(default)]
    pub job_tracking_id: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<ErrorDetails>,
}

impl JobStatus {
    /// Href of the produced object, if present.
    pub fn managed_object_href(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|l| l.managed_object.as_ref())
            .and_then(LinkRef::href)
    }

    /// Every error message reported by the service, in order.
    pub fn error_messages(&self) -> Vec<String> {
        self.error_details
            .as_ref()
            .and_then(|d| d.errors.as_ref())
            .map(|errors| errors.iter().map(|e| e.message.clone()).collect())
            .unwrap_or_default()
    }

    /// Converts a `Failed` status into [`IpamError::JobFailed`].
    ///
    /// Returns `None` for any other state.
    pub fn failure(&self) -> Option<IpamError> {
        if self.job_state != JobState::Failed {
            return None;
        }
        Some(IpamError::JobFailed {
            job_type: self.job_type.clone().unwrap_or_default(),
            job_id: self.id,
            code: self
                .error_details
                .as_ref()
                .and_then(|d| d.code)
                .unwrap_or_default(),
            messages: self.error_messages(),
        })
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// UTC wall-clock instant recorded at job submission and completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn only_two_states_are_terminal() {
        assert!(JobState::from("Successful").is_terminal());
        assert!(JobState::from("Failed").is_terminal());
        assert!(!JobState::from("Pending").is_terminal());
        assert!(!JobState::from("successful").is_terminal());
        assert!(!JobState::from("").is_terminal());
    }

    #[test]
    fn decodes_running_job() {
        let status: JobStatus = serde_json::from_value(json!({
            "id": 31,
            "jobState": "Running",
            "jobType": "Create IPAM Reservation",
            "jobTrackingId": "abc-123",
            "_links": {
                "self": { "href": "/api/v3/onefuse/jobStatus/31/" },
                "jobMetadata": { "href": "/api/v3/onefuse/jobMetadata/31/" }
            }
        }))
        .unwrap();

        assert_eq!(status.id, JobId::new(31));
        assert_eq!(status.job_state, JobState::InProgress("Running".to_string()));
        assert_eq!(status.managed_object_href(), None);
        assert!(status.failure().is_none());
    }

    #[test]
    fn missing_state_is_unknown() {
        let status: JobStatus = serde_json::from_value(json!({ "id": 1 })).unwrap();
        assert_eq!(status.job_state, JobState::Unknown);
        assert!(!status.job_state.is_terminal());

        let status: JobStatus =
            serde_json::from_value(json!({ "id": 1, "jobState": null })).unwrap();
        assert_eq!(status.job_state, JobState::Unknown);
    }

    #[test]
    fn failed_job_reports_structured_errors() {
        let status: JobStatus = serde_json::from_value(json!({
            "id": 9,
            "jobState": "Failed",
            "jobType": "Create IPAM Reservation",
            "errorDetails": { "code": 400, "errors": [{ "message": "bad hostname" }] }
        }))
        .unwrap();

        match status.failure() {
            Some(IpamError::JobFailed {
                job_type,
                job_id,
                code,
                messages,
            }) => {
                assert_eq!(job_type, "Create IPAM Reservation");
                assert_eq!(job_id, JobId::new(9));
                assert_eq!(code, 400);
                assert_eq!(messages, vec!["bad hostname".to_string()]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn failed_job_without_details_still_fails() {
        let status: JobStatus =
            serde_json::from_value(json!({ "id": 2, "jobState": "Failed" })).unwrap();
        let err = status.failure().unwrap();
        assert!(err.to_string().contains("(2)"));
    }

    #[test]
    fn state_serialises_back_to_wire_string() {
        let value = serde_json::to_value(JobState::InProgress("Pending".to_string())).unwrap();
        assert_eq!(value, json!("Pending"));
    }
}
