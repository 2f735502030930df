//! Approval handling for authorization-change requests.
//!
//! Two interchangeable handlers implement the same contract: the immediate
//! handler applies a request to its targets right away, the deferred handler
//! forwards it to an external approval service and reconciles approved
//! requests in the background. The choice is made once at wiring time.

mod deferred;
mod immediate;
mod polling;

use std::str::FromStr;

use async_trait::async_trait;
use fleetauth_core::{AppError, AppResult};
use fleetauth_domain::AuthorizationRequest;

pub use deferred::DeferredApprovalHandler;
pub use immediate::ImmediateApprovalHandler;
pub use polling::PollingSupervisor;

/// Contract shared by both approval handlers.
///
/// Callers stay agnostic to the active approval mode: they hand over a
/// request and get a synchronous verdict on validation and, for the
/// immediate handler, on delivery.
#[async_trait]
pub trait ApprovalHandler: Send + Sync {
    /// Handles one inbound authorization request.
    async fn handle(&self, request: &AuthorizationRequest) -> AppResult<()>;
}

/// Configuration-time choice between the two approval handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalMode {
    /// Apply requests to their targets without external approval.
    Immediate,
    /// Forward requests to the approval service and execute them after
    /// approval.
    Deferred,
}

impl ApprovalMode {
    /// Returns the configuration value of this mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Deferred => "deferred",
        }
    }
}

impl FromStr for ApprovalMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(Self::Immediate),
            "deferred" => Ok(Self::Deferred),
            _ => Err(AppError::Config(format!(
                "unknown approval mode '{value}'; expected 'immediate' or 'deferred'"
            ))),
        }
    }
}
