use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::put;
use axum::{Json, Router};
use fleetauth_application::TargetCommander;
use fleetauth_core::{AppError, TargetId};
use serde_json::Value;
use tokio::sync::Mutex;

use super::HttpTargetCommander;

#[derive(Default)]
struct MockFleetState {
    calls: Mutex<Vec<(String, Value)>>,
    reject: bool,
    stall: bool,
}

async fn auth_list_handler(
    State(state): State<Arc<MockFleetState>>,
    Path(component): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    state.calls.lock().await.push((component, body));
    if state.stall {
        tokio::time::sleep(Duration::from_secs(30)).await;
    }
    if state.reject {
        return StatusCode::CONFLICT;
    }
    StatusCode::NO_CONTENT
}

async fn spawn_mock_fleet(state: Arc<MockFleetState>) -> String {
    let app = Router::new()
        .route("/components/{component}/auth-list", put(auth_list_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|_| unreachable!("failed to bind a loopback port"));
    let address = listener
        .local_addr()
        .unwrap_or_else(|_| unreachable!("listener has no local address"));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    format!("http://{address}")
}

fn target(value: &str) -> TargetId {
    TargetId::parse(value).unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn delivers_lists_verbatim_to_the_addressed_component() {
    let state = Arc::new(MockFleetState::default());
    let base_url = spawn_mock_fleet(state.clone()).await;
    let commander = HttpTargetCommander::new(reqwest::Client::new(), &base_url);

    let result = commander
        .set_auth_list(&target("Foo:1"), "+a@b, c@d", "-Bar", Duration::from_secs(2))
        .await;

    assert!(result.is_ok());
    let calls = state.calls.lock().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "Foo:1");
    assert_eq!(calls[0].1["authorizedUsers"], "+a@b, c@d");
    assert_eq!(calls[0].1["deauthorizedComponents"], "-Bar");
}

#[tokio::test]
async fn rejection_maps_to_a_delivery_error() {
    let state = Arc::new(MockFleetState {
        reject: true,
        ..MockFleetState::default()
    });
    let base_url = spawn_mock_fleet(state).await;
    let commander = HttpTargetCommander::new(reqwest::Client::new(), &base_url);

    let result = commander
        .set_auth_list(&target("Foo:1"), "a@b", "", Duration::from_secs(2))
        .await;

    let Err(AppError::Delivery(reason)) = result else {
        unreachable!("expected a delivery error");
    };
    assert!(reason.contains("rejected"), "unexpected reason {reason:?}");
    assert!(reason.contains("409"), "unexpected reason {reason:?}");
}

#[tokio::test]
async fn stalled_component_times_out() {
    let state = Arc::new(MockFleetState {
        stall: true,
        ..MockFleetState::default()
    });
    let base_url = spawn_mock_fleet(state).await;
    let commander = HttpTargetCommander::new(reqwest::Client::new(), &base_url);

    let result = commander
        .set_auth_list(&target("Slow:3"), "", "", Duration::from_millis(50))
        .await;

    let Err(AppError::Delivery(reason)) = result else {
        unreachable!("expected a delivery error");
    };
    assert!(
        reason.contains("no acknowledgement"),
        "unexpected reason {reason:?}"
    );
}

#[tokio::test]
async fn unreachable_component_is_a_delivery_error() {
    // Nothing listens on this port.
    let commander = HttpTargetCommander::new(reqwest::Client::new(), "http://127.0.0.1:9");

    let result = commander
        .set_auth_list(&target("Gone"), "", "", Duration::from_millis(200))
        .await;

    assert!(matches!(result, Err(AppError::Delivery(_))));
}
