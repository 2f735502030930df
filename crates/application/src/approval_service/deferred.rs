use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fleetauth_core::AppResult;
use fleetauth_domain::{AuthorizationRequest, ExecutionReport};
use tracing::{error, info, warn};

use super::{ApprovalHandler, PollingSupervisor};
use crate::{ApprovalGateway, AuthListDispatcher};

/// Defers every request to an external approval service.
///
/// `handle` only forwards the request; execution happens later, when the
/// background reconciliation finds the request approved. The execution
/// outcome is observable through the approval service's own record state,
/// not through the original caller.
pub struct DeferredApprovalHandler {
    worker: ReconcileWorker,
    supervisor: PollingSupervisor,
}

// The slice of state shared with the background polling task.
#[derive(Clone)]
struct ReconcileWorker {
    gateway: Arc<dyn ApprovalGateway>,
    dispatcher: AuthListDispatcher,
}

impl DeferredApprovalHandler {
    /// Creates a deferred handler; the poller starts out stopped.
    #[must_use]
    pub fn new(gateway: Arc<dyn ApprovalGateway>, dispatcher: AuthListDispatcher) -> Self {
        Self {
            worker: ReconcileWorker {
                gateway,
                dispatcher,
            },
            supervisor: PollingSupervisor::new(),
        }
    }

    /// Runs one reconciliation pass.
    ///
    /// Fetches every approved-but-unexecuted record, applies each to its
    /// targets in list order, and reports the outcome back to the record's
    /// execute endpoint. An error reaching the approval service aborts the
    /// current pass; the next scheduled pass retries from scratch.
    pub async fn reconcile_once(&self) -> AppResult<()> {
        self.worker.reconcile_once().await
    }

    /// (Re)starts periodic reconciliation with the given interval.
    pub async fn start(&self, poll_interval: Duration) {
        let worker = self.worker.clone();
        self.supervisor
            .start(poll_interval, move || {
                let worker = worker.clone();
                async move { worker.reconcile_once().await }
            })
            .await;
    }

    /// Stops periodic reconciliation and releases the gateway session.
    pub async fn stop(&self) -> AppResult<()> {
        self.supervisor.stop().await;
        self.worker.gateway.close().await
    }

    /// Returns true while the background poller is live.
    pub async fn is_polling(&self) -> bool {
        self.supervisor.is_running().await
    }
}

impl ReconcileWorker {
    async fn reconcile_once(&self) -> AppResult<()> {
        let records = self.gateway.approved_pending_requests().await?;

        for record in records {
            let request = record.to_request();
            let report = match request.validate() {
                Ok(targets) => {
                    let outcome = self.dispatcher.apply(&request, &targets).await;
                    ExecutionReport::from(&outcome)
                }
                Err(validation_error) => {
                    // A record the service should never have accepted; report
                    // it as failed rather than aborting the whole batch.
                    warn!(
                        record_id = record.id,
                        error = %validation_error,
                        "stored request failed validation"
                    );
                    ExecutionReport::failed(format!(
                        "stored request is invalid: {validation_error}"
                    ))
                }
            };

            let echo = self.gateway.report_execution(record.id, &report).await?;
            if echo.id != record.id {
                error!(
                    record_id = record.id,
                    echoed_id = echo.id,
                    "approval service echoed a different record id"
                );
            } else if !report.matches_echo(&echo) {
                error!(
                    record_id = record.id,
                    "approval service echo does not match the reported outcome"
                );
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ApprovalHandler for DeferredApprovalHandler {
    async fn handle(&self, request: &AuthorizationRequest) -> AppResult<()> {
        request.validate()?;
        let record = self.worker.gateway.submit_request(request).await?;
        info!(
            record_id = record.id,
            requester = request.requester(),
            "authorization request forwarded for approval"
        );
        Ok(())
    }
}
