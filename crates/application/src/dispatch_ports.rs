use std::time::Duration;

use async_trait::async_trait;
use fleetauth_core::{AppResult, TargetId};

/// Port for delivering a set-auth-list instruction to one target component.
#[async_trait]
pub trait TargetCommander: Send + Sync {
    /// Sends a new auth list to one target component.
    ///
    /// The user and component lists are passed through verbatim, edit prefix
    /// included; the target interprets the prefix semantics. Implementations
    /// must give up after `timeout`.
    async fn set_auth_list(
        &self,
        target: &TargetId,
        authorized_users: &str,
        deauthorized_components: &str,
        timeout: Duration,
    ) -> AppResult<()>;
}
