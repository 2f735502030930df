use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fleetauth_core::{AppError, AppResult, TargetId};
use fleetauth_domain::AuthorizationRequest;
use tokio::sync::Mutex;

use super::AuthListDispatcher;
use crate::TargetCommander;

struct RecordedCall {
    target: String,
    authorized_users: String,
    deauthorized_components: String,
}

#[derive(Default)]
struct FakeCommander {
    calls: Mutex<Vec<RecordedCall>>,
    rejecting: HashSet<String>,
    hanging: HashSet<String>,
}

impl FakeCommander {
    fn rejecting(targets: &[&str]) -> Self {
        Self {
            rejecting: targets.iter().map(|&target| target.to_owned()).collect(),
            ..Self::default()
        }
    }

    fn hanging(targets: &[&str]) -> Self {
        Self {
            hanging: targets.iter().map(|&target| target.to_owned()).collect(),
            ..Self::default()
        }
    }

    async fn recorded_targets(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .map(|call| call.target.clone())
            .collect()
    }
}

#[async_trait]
impl TargetCommander for FakeCommander {
    async fn set_auth_list(
        &self,
        target: &TargetId,
        authorized_users: &str,
        deauthorized_components: &str,
        _timeout: Duration,
    ) -> AppResult<()> {
        self.calls.lock().await.push(RecordedCall {
            target: target.to_string(),
            authorized_users: authorized_users.to_owned(),
            deauthorized_components: deauthorized_components.to_owned(),
        });

        if self.hanging.contains(&target.to_string()) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.rejecting.contains(&target.to_string()) {
            return Err(AppError::Delivery("rejected by component".to_owned()));
        }
        Ok(())
    }
}

fn validated(request: &AuthorizationRequest) -> BTreeSet<TargetId> {
    request.validate().unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn single_target_receives_lists_verbatim() {
    let commander = Arc::new(FakeCommander::default());
    let dispatcher = AuthListDispatcher::new(commander.clone());
    let request = AuthorizationRequest::new("Foo:1", "a@b, c@d", "", "op@control");

    let outcome = dispatcher.apply(&request, &validated(&request)).await;

    assert!(outcome.is_complete_success());
    assert_eq!(
        outcome.succeeded().iter().map(ToString::to_string).collect::<Vec<_>>(),
        vec!["Foo:1".to_owned()]
    );

    let calls = commander.calls.lock().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].target, "Foo:1");
    assert_eq!(calls[0].authorized_users, "a@b, c@d");
    assert_eq!(calls[0].deauthorized_components, "");
}

#[tokio::test]
async fn edit_prefix_passes_through_to_targets() {
    let commander = Arc::new(FakeCommander::default());
    let dispatcher = AuthListDispatcher::new(commander.clone());
    let request = AuthorizationRequest::new("Foo", "+a@b", "-Bar:2", "op@control");

    dispatcher.apply(&request, &validated(&request)).await;

    let calls = commander.calls.lock().await;
    assert_eq!(calls[0].authorized_users, "+a@b");
    assert_eq!(calls[0].deauthorized_components, "-Bar:2");
}

#[tokio::test]
async fn rejected_target_does_not_stop_the_batch() {
    let commander = Arc::new(FakeCommander::rejecting(&["Bad:9"]));
    let dispatcher = AuthListDispatcher::new(commander.clone());
    let request = AuthorizationRequest::new("Foo:1, Bad:9, Baz", "a@b", "", "op@control");
    let targets = validated(&request);

    let outcome = dispatcher.apply(&request, &targets).await;

    assert_eq!(outcome.succeeded().len(), 2);
    assert_eq!(outcome.failed().len(), 1);
    assert_eq!(
        outcome.failed().keys().map(ToString::to_string).collect::<Vec<_>>(),
        vec!["Bad:9".to_owned()]
    );

    // The partition covers every requested target.
    let attempted = outcome.succeeded().len() + outcome.failed().len();
    assert_eq!(attempted, targets.len());
    assert_eq!(commander.calls.lock().await.len(), 3);
}

#[tokio::test]
async fn hanging_target_times_out_independently() {
    let commander = Arc::new(FakeCommander::hanging(&["Hang:2"]));
    let dispatcher = AuthListDispatcher::new(commander.clone())
        .with_target_timeout(Duration::from_millis(25));
    let request = AuthorizationRequest::new("Alpha, Hang:2, Zed", "", "", "op@control");

    let outcome = dispatcher.apply(&request, &validated(&request)).await;

    assert_eq!(outcome.succeeded().len(), 2);
    let reason = outcome
        .failed()
        .values()
        .next()
        .map(String::as_str)
        .unwrap_or_default();
    assert!(reason.contains("no acknowledgement"), "unexpected reason {reason:?}");

    // The target after the hanging one was still attempted.
    let recorded = commander.recorded_targets().await;
    assert_eq!(recorded.len(), 3);
    assert_eq!(recorded.last().map(String::as_str), Some("Zed"));
}

#[tokio::test]
async fn targets_are_visited_in_sorted_order() {
    let commander = Arc::new(FakeCommander::default());
    let dispatcher = AuthListDispatcher::new(commander.clone());
    let request = AuthorizationRequest::new("Zed, Alpha, Mid:7", "", "", "op@control");

    dispatcher.apply(&request, &validated(&request)).await;

    assert_eq!(
        commander.recorded_targets().await,
        vec!["Alpha".to_owned(), "Mid:7".to_owned(), "Zed".to_owned()]
    );
}
