use std::time::Duration;

use async_trait::async_trait;
use fleetauth_application::TargetCommander;
use fleetauth_core::{AppError, AppResult, TargetId};
use serde::Serialize;

#[cfg(test)]
mod tests;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthListBody<'a> {
    authorized_users: &'a str,
    deauthorized_components: &'a str,
}

/// HTTP adapter for the per-target control call.
///
/// Each target exposes its auth list at
/// `{fleet_base_url}/components/{target}/auth-list`; the user and component
/// lists are forwarded verbatim so each target can interpret an edit prefix
/// itself.
pub struct HttpTargetCommander {
    client: reqwest::Client,
    fleet_base_url: String,
}

impl HttpTargetCommander {
    /// Creates a commander that reaches targets below `fleet_base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, fleet_base_url: impl Into<String>) -> Self {
        Self {
            client,
            fleet_base_url: fleet_base_url.into().trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl TargetCommander for HttpTargetCommander {
    async fn set_auth_list(
        &self,
        target: &TargetId,
        authorized_users: &str,
        deauthorized_components: &str,
        timeout: Duration,
    ) -> AppResult<()> {
        let endpoint = format!("{}/components/{target}/auth-list", self.fleet_base_url);

        let response = self
            .client
            .put(endpoint)
            .timeout(timeout)
            .json(&AuthListBody {
                authorized_users,
                deauthorized_components,
            })
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    AppError::Delivery(format!("no acknowledgement from {target} within {timeout:?}"))
                } else {
                    AppError::Delivery(format!("failed to reach {target}: {error}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_owned());
            return Err(AppError::Delivery(format!(
                "{target} rejected the auth list change with status {}: {body}",
                status.as_u16()
            )));
        }

        Ok(())
    }
}
