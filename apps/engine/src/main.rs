//! fleetauth reconciliation daemon.
//!
//! Polls the external approval service for approved-but-unexecuted
//! authorization requests and applies each one to its target components.

#![forbid(unsafe_code)]

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use fleetauth_application::{ApprovalMode, AuthListDispatcher, DeferredApprovalHandler};
use fleetauth_core::{AppError, AppResult};
use fleetauth_infrastructure::{ApprovalCredentials, HttpTargetCommander, RestApprovalGateway};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct EngineConfig {
    approval_mode: ApprovalMode,
    approval_host: String,
    approval_port: u16,
    fleet_base_url: String,
    target_timeout_secs: u64,
    request_timeout_secs: u64,
    poll_interval_secs: u64,
    username: String,
    password: String,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = EngineConfig::load()?;
    if config.approval_mode == ApprovalMode::Immediate {
        // The immediate handler runs inline with the surrounding command
        // framework and needs no background work.
        return Err(AppError::Config(
            "the daemon only serves deferred approval mode".to_owned(),
        ));
    }

    let commander = Arc::new(HttpTargetCommander::new(
        reqwest::Client::new(),
        config.fleet_base_url.clone(),
    ));
    let dispatcher = AuthListDispatcher::new(commander)
        .with_target_timeout(Duration::from_secs(config.target_timeout_secs));
    let gateway = Arc::new(RestApprovalGateway::new(
        format!("http://{}:{}", config.approval_host, config.approval_port),
        ApprovalCredentials::new(config.username.clone(), config.password.clone()),
        Duration::from_secs(config.request_timeout_secs),
    ));
    let handler = DeferredApprovalHandler::new(gateway, dispatcher);

    info!(
        approval_host = %config.approval_host,
        approval_port = config.approval_port,
        fleet_base_url = %config.fleet_base_url,
        poll_interval_secs = config.poll_interval_secs,
        target_timeout_secs = config.target_timeout_secs,
        "fleetauth-engine started"
    );

    handler
        .start(Duration::from_secs(config.poll_interval_secs))
        .await;

    tokio::signal::ctrl_c().await.map_err(|error| {
        AppError::Internal(format!("failed to listen for the shutdown signal: {error}"))
    })?;
    info!("shutdown signal received; stopping the poller");
    handler.stop().await?;

    Ok(())
}

impl EngineConfig {
    fn load() -> AppResult<Self> {
        let approval_mode = match env::var("FLEETAUTH_APPROVAL_MODE") {
            Ok(value) => ApprovalMode::from_str(value.as_str())?,
            Err(_) => ApprovalMode::Deferred,
        };
        let approval_host = required_env("FLEETAUTH_APPROVAL_HOST")?;
        let approval_port = parse_env_u16("FLEETAUTH_APPROVAL_PORT", 8080)?;
        let fleet_base_url = required_env("FLEETAUTH_FLEET_BASE_URL")?
            .trim_end_matches('/')
            .to_owned();
        let target_timeout_secs = parse_env_u64("FLEETAUTH_TARGET_TIMEOUT_SECS", 5)?;
        let request_timeout_secs = parse_env_u64("FLEETAUTH_REQUEST_TIMEOUT_SECS", 15)?;
        let poll_interval_secs = parse_env_u64("FLEETAUTH_POLL_INTERVAL_SECS", 60)?;
        let username = required_env("AUTHLIST_USER_NAME")?;
        let password = required_env("AUTHLIST_USER_PASS")?;

        if target_timeout_secs == 0 {
            return Err(AppError::Config(
                "FLEETAUTH_TARGET_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }
        if request_timeout_secs == 0 {
            return Err(AppError::Config(
                "FLEETAUTH_REQUEST_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }
        if poll_interval_secs == 0 {
            return Err(AppError::Config(
                "FLEETAUTH_POLL_INTERVAL_SECS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            approval_mode,
            approval_host,
            approval_port,
            fleet_base_url,
            target_timeout_secs,
            request_timeout_secs,
            poll_interval_secs,
            username,
            password,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Config(format!("{name} is required")))
}

fn parse_env_u16(name: &str, default: u16) -> AppResult<u16> {
    match env::var(name) {
        Ok(value) => value.parse::<u16>().map_err(|error| {
            AppError::Config(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Config(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
