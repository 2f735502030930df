use async_trait::async_trait;
use fleetauth_core::AppResult;
use fleetauth_domain::{ApprovalRecord, AuthorizationRequest, ExecutionReport};

/// Port for the external approval service.
///
/// Implementations own the authenticated session and must serialize their
/// network calls so that token acquisition and token use never interleave
/// between concurrent callers.
#[async_trait]
pub trait ApprovalGateway: Send + Sync {
    /// Forwards a request so an approver can accept or reject it.
    ///
    /// No local change is applied. Returns the created record.
    async fn submit_request(&self, request: &AuthorizationRequest) -> AppResult<ApprovalRecord>;

    /// Fetches records that are approved but not executed yet.
    async fn approved_pending_requests(&self) -> AppResult<Vec<ApprovalRecord>>;

    /// Reports the execution outcome of one record.
    ///
    /// Returns the record as echoed by the service, for drift detection.
    async fn report_execution(
        &self,
        id: i64,
        report: &ExecutionReport,
    ) -> AppResult<ApprovalRecord>;

    /// Releases the underlying session.
    async fn close(&self) -> AppResult<()>;
}
