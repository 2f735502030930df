use async_trait::async_trait;
use fleetauth_core::AppResult;
use fleetauth_domain::AuthorizationRequest;
use tracing::info;

use super::ApprovalHandler;
use crate::AuthListDispatcher;

/// Applies every request to its targets right away, without external
/// approval.
///
/// Holds no state beyond the dispatcher. Partial delivery is surfaced as a
/// single aggregate error naming both the failed and the succeeded targets.
pub struct ImmediateApprovalHandler {
    dispatcher: AuthListDispatcher,
}

impl ImmediateApprovalHandler {
    /// Creates an immediate handler around the given dispatcher.
    #[must_use]
    pub fn new(dispatcher: AuthListDispatcher) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl ApprovalHandler for ImmediateApprovalHandler {
    async fn handle(&self, request: &AuthorizationRequest) -> AppResult<()> {
        let targets = request.validate()?;
        let outcome = self.dispatcher.apply(request, &targets).await;

        if !outcome.is_complete_success() {
            return Err(outcome.into_partial_failure());
        }

        info!(
            requester = request.requester(),
            target_count = targets.len(),
            "authorization request applied"
        );
        Ok(())
    }
}
