//! Shared primitives for all Rust crates in fleetauth.

#![forbid(unsafe_code)]

pub mod identifier;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use thiserror::Error;

pub use identifier::{TargetId, UserHost, parse_component_list, parse_target_list, parse_user_list};

/// Result type used across fleetauth crates.
pub type AppResult<T> = Result<T, AppError>;

/// Outcome of a fan-out where at least one target rejected the change.
///
/// Carries both the failed-target reasons and the targets that were updated
/// so callers can report the complete picture, not just "it failed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialFailureReport {
    failed: BTreeMap<String, String>,
    succeeded: BTreeSet<String>,
}

impl PartialFailureReport {
    /// Creates a report from the failed-target reasons and the succeeded set.
    #[must_use]
    pub fn new(failed: BTreeMap<String, String>, succeeded: BTreeSet<String>) -> Self {
        Self { failed, succeeded }
    }

    /// Returns the failed targets mapped to a human-readable reason.
    #[must_use]
    pub fn failed(&self) -> &BTreeMap<String, String> {
        &self.failed
    }

    /// Returns the targets that accepted the change.
    #[must_use]
    pub fn succeeded(&self) -> &BTreeSet<String> {
        &self.succeeded
    }
}

impl Display for PartialFailureReport {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "failed to set the auth list for: ")?;
        let mut first = true;
        for (target, reason) in &self.failed {
            if !first {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{target} ({reason})")?;
            first = false;
        }
        if self.succeeded.is_empty() {
            write!(formatter, "; no components were updated successfully")
        } else {
            let succeeded = self
                .succeeded
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            write!(formatter, "; successfully updated: {succeeded}")
        }
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// The target list is empty, which would make the request a no-op.
    #[error("no targets specified; the request has no effect")]
    EmptyTargets,

    /// A target identifier does not match the `name` or `name:index` grammar.
    #[error("invalid target identifier: {0:?}")]
    InvalidTarget(String),

    /// A user entry does not match the `user@host` grammar.
    #[error("invalid user@host entry: {0:?}")]
    InvalidUser(String),

    /// A single target rejected the change or could not be reached.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// At least one target in a fan-out failed while others succeeded.
    #[error("{0}")]
    PartialFailure(PartialFailureReport),

    /// The approval service rejected the configured credentials or returned
    /// a malformed token response.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The approval service answered with a non-success HTTP status.
    #[error("approval service returned status {status}: {body}")]
    ExternalService {
        /// HTTP status code of the response.
        status: u16,
        /// Decoded response body.
        body: String,
    },

    /// The approval service could not be reached at all.
    #[error("transport error: {0}")]
    Transport(String),

    /// Invalid or missing engine configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
