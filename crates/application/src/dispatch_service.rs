//! Fan-out of one validated request to every named target.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use fleetauth_core::TargetId;
use fleetauth_domain::{AuthorizationRequest, DispatchOutcome};
use tracing::{info, warn};

use crate::TargetCommander;

#[cfg(test)]
mod tests;

/// Default per-target delivery timeout.
pub const DEFAULT_TARGET_TIMEOUT: Duration = Duration::from_secs(5);

/// Applies one request to every named target, collecting per-target outcomes.
///
/// Targets are visited in sorted order, strictly sequentially. Every target
/// that can be reached gets the change even when other targets cannot be
/// reached; a slow target delays later targets but never drops them. The
/// dispatcher itself never fails on partial delivery; whether a partial
/// outcome is an error is the calling approval handler's policy.
#[derive(Clone)]
pub struct AuthListDispatcher {
    commander: Arc<dyn TargetCommander>,
    target_timeout: Duration,
}

impl AuthListDispatcher {
    /// Creates a dispatcher with the default per-target timeout.
    #[must_use]
    pub fn new(commander: Arc<dyn TargetCommander>) -> Self {
        Self {
            commander,
            target_timeout: DEFAULT_TARGET_TIMEOUT,
        }
    }

    /// Overrides the per-target delivery timeout.
    #[must_use]
    pub fn with_target_timeout(mut self, target_timeout: Duration) -> Self {
        self.target_timeout = target_timeout;
        self
    }

    /// Applies the request to every target in `targets`.
    ///
    /// The caller validates the request first; `targets` is the validated
    /// target set. The timeout bound is enforced here, independently per
    /// target, even if a commander implementation ignores its timeout
    /// argument.
    pub async fn apply(
        &self,
        request: &AuthorizationRequest,
        targets: &BTreeSet<TargetId>,
    ) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::new();

        for target in targets {
            let delivery = tokio::time::timeout(
                self.target_timeout,
                self.commander.set_auth_list(
                    target,
                    request.authorized_users(),
                    request.deauthorized_components(),
                    self.target_timeout,
                ),
            )
            .await;

            match delivery {
                Ok(Ok(())) => {
                    info!(
                        component = %target,
                        authorized_users = request.authorized_users(),
                        "set auth list"
                    );
                    outcome.record_success(target.clone());
                }
                Ok(Err(error)) => {
                    warn!(component = %target, error = %error, "failed to set auth list");
                    outcome.record_failure(target.clone(), error.to_string());
                }
                Err(_) => {
                    warn!(component = %target, "timed out setting auth list");
                    outcome.record_failure(
                        target.clone(),
                        format!("no acknowledgement within {:?}", self.target_timeout),
                    );
                }
            }
        }

        outcome
    }
}
