use std::time::Duration;

use async_trait::async_trait;
use fleetauth_application::ApprovalGateway;
use fleetauth_core::{AppError, AppResult};
use fleetauth_domain::{ApprovalRecord, AuthorizationRequest, ExecutionReport};
use reqwest::{StatusCode, header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;


const TOKEN_ENDPOINT: &str = "/token";
const REQUESTS_ENDPOINT: &str = "/requests";
const APPROVED_PENDING_QUERY: &str = "?status=Approved&executionStatus=Pending";

/// Credentials presented to the approval service's token endpoint.
///
/// Supplied through the process environment, never taken from a request.
#[derive(Debug, Clone)]
pub struct ApprovalCredentials {
    /// Account name of the engine's service user.
    pub username: String,
    /// Password of the engine's service user.
    pub password: String,
}

impl ApprovalCredentials {
    /// Creates a credentials pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TokenRequestBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponseBody {
    token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionBody<'a> {
    targets: &'a str,
    authorized_users: &'a str,
    deauthorized_components: &'a str,
    requested_by: &'a str,
}

/// REST implementation of the approval gateway.
///
/// One mutex serializes every network call made through this instance, so
/// token acquisition and token use behave as an atomic unit even when a
/// manual reconciliation races the polling timer. The HTTP session is
/// created lazily, reused across calls and dropped again on `close`. A
/// fresh token is acquired per submission and per reconciliation fetch.
pub struct RestApprovalGateway {
    base_url: String,
    credentials: ApprovalCredentials,
    request_timeout: Duration,
    session: Mutex<Session>,
}

#[derive(Default)]
struct Session {
    client: Option<reqwest::Client>,
    token: String,
}

impl RestApprovalGateway {
    /// Creates a gateway for the approval service at `base_url`.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        credentials: ApprovalCredentials,
        request_timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            credentials,
            request_timeout,
            session: Mutex::new(Session::default()),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn client_for(&self, session: &mut Session) -> AppResult<reqwest::Client> {
        if session.client.is_none() {
            let client = reqwest::Client::builder()
                .timeout(self.request_timeout)
                .build()
                .map_err(|error| {
                    AppError::Internal(format!("failed to build HTTP client: {error}"))
                })?;
            session.client = Some(client);
        }

        session
            .client
            .clone()
            .ok_or_else(|| AppError::Internal("HTTP client unavailable".to_owned()))
    }

    async fn authenticate(&self, session: &mut Session) -> AppResult<()> {
        session.token.clear();
        let client = self.client_for(session)?;

        let response = client
            .post(self.endpoint(TOKEN_ENDPOINT))
            .json(&TokenRequestBody {
                username: self.credentials.username.as_str(),
                password: self.credentials.password.as_str(),
            })
            .send()
            .await
            .map_err(|error| {
                AppError::Transport(format!("failed to reach the token endpoint: {error}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = read_body(response).await;
            return Err(AppError::Authentication(format!(
                "token endpoint returned status {}: {body}",
                status.as_u16()
            )));
        }

        let body = response.json::<TokenResponseBody>().await.map_err(|error| {
            AppError::Authentication(format!(
                "token response lacked the expected token field: {error}"
            ))
        })?;
        session.token = body.token;
        Ok(())
    }
}

#[async_trait]
impl ApprovalGateway for RestApprovalGateway {
    async fn submit_request(&self, request: &AuthorizationRequest) -> AppResult<ApprovalRecord> {
        let mut session = self.session.lock().await;
        self.authenticate(&mut session).await?;
        let client = self.client_for(&mut session)?;

        let response = client
            .post(self.endpoint(REQUESTS_ENDPOINT))
            .header(header::AUTHORIZATION, session.token.as_str())
            .json(&SubmissionBody {
                targets: request.targets(),
                authorized_users: request.authorized_users(),
                deauthorized_components: request.deauthorized_components(),
                requested_by: request.requester(),
            })
            .send()
            .await
            .map_err(|error| {
                AppError::Transport(format!("failed to reach the approval service: {error}"))
            })?;

        decode_record(response).await
    }

    async fn approved_pending_requests(&self) -> AppResult<Vec<ApprovalRecord>> {
        let mut session = self.session.lock().await;
        self.authenticate(&mut session).await?;
        let client = self.client_for(&mut session)?;

        let endpoint = self.endpoint(&format!("{REQUESTS_ENDPOINT}{APPROVED_PENDING_QUERY}"));
        let response = client
            .get(endpoint)
            .header(header::AUTHORIZATION, session.token.as_str())
            .send()
            .await
            .map_err(|error| {
                AppError::Transport(format!("failed to reach the approval service: {error}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(external_service_error(status, response).await);
        }

        let records = response.json::<Vec<ApprovalRecord>>().await.map_err(|error| {
            AppError::Internal(format!("failed to decode approval records: {error}"))
        })?;
        debug!(record_count = records.len(), "fetched approved-pending records");
        Ok(records)
    }

    async fn report_execution(
        &self,
        id: i64,
        report: &ExecutionReport,
    ) -> AppResult<ApprovalRecord> {
        let mut session = self.session.lock().await;
        let client = self.client_for(&mut session)?;

        let endpoint = self.endpoint(&format!("{REQUESTS_ENDPOINT}/{id}/execute"));
        let response = client
            .put(endpoint)
            .header(header::AUTHORIZATION, session.token.as_str())
            .json(report)
            .send()
            .await
            .map_err(|error| {
                AppError::Transport(format!("failed to reach the approval service: {error}"))
            })?;

        decode_record(response).await
    }

    async fn close(&self) -> AppResult<()> {
        let mut session = self.session.lock().await;
        session.client = None;
        session.token.clear();
        Ok(())
    }
}

async fn decode_record(response: reqwest::Response) -> AppResult<ApprovalRecord> {
    let status = response.status();
    if !status.is_success() {
        return Err(external_service_error(status, response).await);
    }

    response
        .json::<ApprovalRecord>()
        .await
        .map_err(|error| AppError::Internal(format!("failed to decode approval record: {error}")))
}

async fn external_service_error(status: StatusCode, response: reqwest::Response) -> AppError {
    AppError::ExternalService {
        status: status.as_u16(),
        body: read_body(response).await,
    }
}

async fn read_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_owned())
}
