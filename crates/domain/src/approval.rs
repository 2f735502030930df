use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuthorizationRequest, DispatchOutcome};

/// Approval state of a stored request, owned by the approval service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Waiting for an approver's decision.
    Pending,
    /// Approved and eligible for execution.
    Approved,
    /// Rejected; never executed.
    Rejected,
}

impl RequestStatus {
    /// Returns the wire value of this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

/// Execution state of a stored request, written back exactly once by the
/// engine after the request has been applied to its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Not executed yet.
    Pending,
    /// Every target accepted the change.
    Successful,
    /// At least one target failed to apply the change.
    Failed,
}

impl ExecutionStatus {
    /// Returns the wire value of this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Successful => "Successful",
            Self::Failed => "Failed",
        }
    }
}

/// One authorization-change record as stored by the approval service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRecord {
    /// Server-assigned unique identifier.
    pub id: i64,
    /// Approval state.
    pub status: RequestStatus,
    /// Execution state.
    pub execution_status: ExecutionStatus,
    /// Free-text outcome description, empty until executed.
    #[serde(default)]
    pub execution_message: String,
    /// Comma-separated target list.
    pub targets: String,
    /// Raw authorized-users list, prefix included.
    #[serde(default)]
    pub authorized_users: String,
    /// Raw deauthorized-components list, prefix included.
    #[serde(default)]
    pub deauthorized_components: String,
    /// Identity of the original requester.
    #[serde(default)]
    pub requested_by: String,
    /// When the request was submitted, if the service recorded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<DateTime<Utc>>,
}

impl ApprovalRecord {
    /// Re-embeds the stored request fields as an [`AuthorizationRequest`].
    ///
    /// The field values round-trip verbatim, edit prefixes included.
    #[must_use]
    pub fn to_request(&self) -> AuthorizationRequest {
        AuthorizationRequest::new(
            self.targets.as_str(),
            self.authorized_users.as_str(),
            self.deauthorized_components.as_str(),
            self.requested_by.as_str(),
        )
    }
}

/// Execution outcome written back to a record's execute endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    /// Final execution state of the record.
    pub execution_status: ExecutionStatus,
    /// Human-readable description of the per-target results.
    pub execution_message: String,
}

impl ExecutionReport {
    /// Creates a failed report with the given message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            execution_status: ExecutionStatus::Failed,
            execution_message: message.into(),
        }
    }

    /// Returns true when the echoed record matches what was reported.
    #[must_use]
    pub fn matches_echo(&self, echo: &ApprovalRecord) -> bool {
        echo.execution_status == self.execution_status
            && echo.execution_message == self.execution_message
    }
}

impl From<&DispatchOutcome> for ExecutionReport {
    fn from(outcome: &DispatchOutcome) -> Self {
        let execution_status = if outcome.is_complete_success() {
            ExecutionStatus::Successful
        } else {
            ExecutionStatus::Failed
        };
        Self {
            execution_status,
            execution_message: outcome.execution_message(),
        }
    }
}
