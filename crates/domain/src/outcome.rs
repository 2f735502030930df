use std::collections::{BTreeMap, BTreeSet};

use fleetauth_core::{AppError, PartialFailureReport, TargetId};

/// Per-target results of applying one request to its targets.
///
/// The succeeded set and the failed map are disjoint and together cover
/// every target the dispatcher attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    succeeded: BTreeSet<TargetId>,
    failed: BTreeMap<TargetId, String>,
}

impl DispatchOutcome {
    /// Creates an empty outcome.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a target that accepted the change.
    pub fn record_success(&mut self, target: TargetId) {
        self.succeeded.insert(target);
    }

    /// Records a target that rejected the change or could not be reached.
    pub fn record_failure(&mut self, target: TargetId, reason: impl Into<String>) {
        self.failed.insert(target, reason.into());
    }

    /// Returns the targets that accepted the change.
    #[must_use]
    pub fn succeeded(&self) -> &BTreeSet<TargetId> {
        &self.succeeded
    }

    /// Returns the failed targets mapped to a human-readable reason.
    #[must_use]
    pub fn failed(&self) -> &BTreeMap<TargetId, String> {
        &self.failed
    }

    /// Returns true when every attempted target accepted the change.
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Builds the execution message reported back to the approval service.
    #[must_use]
    pub fn execution_message(&self) -> String {
        let succeeded = join_sorted(self.succeeded.iter());
        let mut message =
            format!("The following components were updated correctly: {succeeded}.");
        if !self.failed.is_empty() {
            let failed = join_sorted(self.failed.keys());
            message.push_str(&format!(
                " The following components failed to update correctly: {failed}."
            ));
        }
        message
    }

    /// Converts a partially failed outcome into the aggregate error.
    #[must_use]
    pub fn into_partial_failure(self) -> AppError {
        let failed = self
            .failed
            .into_iter()
            .map(|(target, reason)| (target.to_string(), reason))
            .collect();
        let succeeded = self
            .succeeded
            .into_iter()
            .map(|target| target.to_string())
            .collect();
        AppError::PartialFailure(PartialFailureReport::new(failed, succeeded))
    }
}

fn join_sorted<'a>(targets: impl Iterator<Item = &'a TargetId>) -> String {
    targets
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
