use crate::cancellation::CancellationToken;
use crate::transport::tasks::TaskRegistry;

use std::time::Duration;

/// **VALUE**: Verifies only the first `cancel()` reports a transition.
///
/// **WHY THIS MATTERS**: Cancelling twice (user taps twice, reset after cancel) must not abort
/// or count anything twice.
///
/// **BUG THIS CATCHES**: Would catch a non-atomic check-then-set on the flag.
#[test]
fn given_token_when_cancelled_twice_then_second_call_is_noop() {
    // GIVEN: A fresh token
    let token = CancellationToken::new();
    assert!(!token.is_cancelled());

    // WHEN: Cancelling twice through clones
    let first = token.cancel();
    let second = token.clone().cancel();

    // THEN: Only the first call flips it
    assert!(first);
    assert!(!second);
    assert!(token.is_cancelled());
}

/// **VALUE**: Verifies cancelling a token aborts the attached task exactly once.
///
/// **WHY THIS MATTERS**: Cancellation must stop the network work, not just hide its result.
///
/// **BUG THIS CATCHES**: Would catch the token forgetting its task handle, or the registry
/// counting an abort per clone.
#[tokio::test]
async fn given_attached_task_when_token_cancelled_then_task_aborted_once() {
    // GIVEN: A long-running registered task bound to a token
    let registry = TaskRegistry::new();
    let task = registry.spawn(async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        42
    });
    let token = CancellationToken::new();
    token.attach(&registry, task.id());
    assert_eq!(registry.in_flight(), 1);

    // WHEN: Cancelling the token (twice)
    token.cancel();
    token.cancel();

    // THEN: The task ends cancelled, one cancellation is counted, nothing is left in flight
    let result = task.join().await;
    assert!(result.expect_err("task should be aborted").is_cancelled());
    assert_eq!(registry.cancelled_count(), 1);
    assert_eq!(registry.in_flight(), 0);
}

/// **VALUE**: Verifies a token cancelled before its task exists aborts the task on attach.
///
/// **WHY THIS MATTERS**: The cancel can land between "request built" and "task spawned"; that
/// request must still never complete.
///
/// **BUG THIS CATCHES**: Would catch `attach` storing the handle without checking the flag.
#[tokio::test]
async fn given_cancelled_token_when_attached_then_task_aborted_immediately() {
    // GIVEN: A cancelled token
    let registry = TaskRegistry::new();
    let token = CancellationToken::new();
    token.cancel();

    // WHEN: Attaching a new task
    let task = registry.spawn(async {
        tokio::time::sleep(Duration::from_secs(30)).await;
    });
    token.attach(&registry, task.id());

    // THEN: The task is aborted
    assert!(task.join().await.expect_err("task should be aborted").is_cancelled());
    assert_eq!(registry.cancelled_count(), 1);
}

/// **VALUE**: Verifies a finished task is not counted when its token is cancelled later.
///
/// **WHY THIS MATTERS**: Cancelling after completion is common (screen closed after the result
/// arrived) and must not report phantom cancellations.
///
/// **BUG THIS CATCHES**: Would catch `detach` not clearing the binding.
#[tokio::test]
async fn given_completed_task_when_token_cancelled_afterwards_then_nothing_counted() {
    // GIVEN: A task that completed while attached
    let registry = TaskRegistry::new();
    let token = CancellationToken::new();
    let task = registry.spawn(async { "done" });
    let id = task.id();
    token.attach(&registry, id);
    assert_eq!(task.join().await.expect("task should complete"), "done");
    token.detach(id);

    // WHEN: Cancelling afterwards
    token.cancel();

    // THEN: No cancellation counted
    assert_eq!(registry.cancelled_count(), 0);
    assert_eq!(registry.in_flight(), 0);
}
