use std::collections::BTreeSet;

use fleetauth_core::{
    AppResult, TargetId, parse_component_list, parse_target_list, parse_user_list,
};

/// One authorization-change request, immutable after construction.
///
/// The user and component lists are stored verbatim, including an optional
/// leading `+` (add) or `-` (remove) edit prefix. The prefix is interpreted
/// by each target component, not by this engine, so it must survive
/// untouched all the way to the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    targets: String,
    authorized_users: String,
    deauthorized_components: String,
    requester: String,
}

impl AuthorizationRequest {
    /// Creates a request from the four raw request strings.
    #[must_use]
    pub fn new(
        targets: impl Into<String>,
        authorized_users: impl Into<String>,
        deauthorized_components: impl Into<String>,
        requester: impl Into<String>,
    ) -> Self {
        Self {
            targets: targets.into(),
            authorized_users: authorized_users.into(),
            deauthorized_components: deauthorized_components.into(),
            requester: requester.into(),
        }
    }

    /// Returns the comma-separated target list.
    #[must_use]
    pub fn targets(&self) -> &str {
        self.targets.as_str()
    }

    /// Returns the raw authorized-users list, prefix included.
    #[must_use]
    pub fn authorized_users(&self) -> &str {
        self.authorized_users.as_str()
    }

    /// Returns the raw deauthorized-components list, prefix included.
    #[must_use]
    pub fn deauthorized_components(&self) -> &str {
        self.deauthorized_components.as_str()
    }

    /// Returns the identity of the requester, for audit and forwarding only.
    #[must_use]
    pub fn requester(&self) -> &str {
        self.requester.as_str()
    }

    /// Validates all request fields and returns the parsed target set.
    ///
    /// The returned set is non-empty, deduplicated and sorted, which fixes
    /// the dispatch order.
    pub fn validate(&self) -> AppResult<BTreeSet<TargetId>> {
        let targets = parse_target_list(&self.targets)?;
        parse_user_list(&self.authorized_users)?;
        parse_component_list(&self.deauthorized_components)?;
        Ok(targets)
    }
}
