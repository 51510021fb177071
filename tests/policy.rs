use std::time::Duration;

use cucumber_chain::{
    CancellationToken, Scenario, ScenarioError, ScenarioOptions, StepError,
    StepStatus,
};

fn scenario(options: ScenarioOptions) -> Scenario {
    Scenario::builder("Policies", "Failure handling").options(options).build()
}

fn statuses(scenario: &Scenario) -> Vec<StepStatus> {
    scenario.outcomes().into_iter().map(|o| o.status).collect()
}

#[tokio::test]
async fn stops_on_first_failure_by_default() {
    let scenario = scenario(ScenarioOptions::default());

    let err = scenario
        .given("one", || 1)
        .when_try("it breaks", |_: i32| Err::<i32, _>("broken"))
        .and("it grows", |v: i32| v + 1)
        .then("it is two", |v: &i32| *v == 2)
        .await
        .unwrap_err();

    assert!(matches!(err, ScenarioError::StepFailed { .. }));
    assert_eq!(statuses(&scenario), [StepStatus::Passed, StepStatus::Failed]);
}

#[tokio::test]
async fn continues_on_error() {
    let scenario = scenario(
        ScenarioOptions::default()
            .with_continue_on_error(true)
            .with_halt_on_failed_assertion(false),
    );

    scenario
        .given("one", || 1)
        .when_try("it breaks", |_: i32| Err::<i32, _>("broken"))
        .and("it grows", |v: i32| v + 1)
        .then("it is two", |v: &i32| *v == 2)
        .await
        .unwrap();

    assert_eq!(
        statuses(&scenario),
        [
            StepStatus::Passed,
            StepStatus::Failed,
            StepStatus::Passed,
            StepStatus::Passed,
        ],
    );
    assert!(!scenario.passed());
    assert_eq!(scenario.current::<i32>(), Some(2));
}

#[tokio::test]
async fn continues_past_failed_assertions_when_not_halting() {
    let scenario = scenario(
        ScenarioOptions::default()
            .with_continue_on_error(true)
            .with_halt_on_failed_assertion(false),
    );

    scenario
        .given("one", || 1)
        .then("it is two", |v: &i32| *v == 2)
        .and("it is one", |v: &i32| *v == 1)
        .await
        .unwrap();

    assert_eq!(
        statuses(&scenario),
        [StepStatus::Passed, StepStatus::Failed, StepStatus::Passed],
    );
    assert_eq!(scenario.failed_steps()[0].title, "it is two");
}

#[tokio::test]
async fn halts_on_failed_assertion_despite_continuing() {
    let scenario = scenario(ScenarioOptions::default().with_continue_on_error(true));

    let err = scenario
        .given("one", || 1)
        .then("it is two", |v: &i32| *v == 2)
        .and("it is one", |v: &i32| *v == 1)
        .await
        .unwrap_err();

    assert!(matches!(err, ScenarioError::AssertionFailed { .. }));
    assert_eq!(scenario.outcomes().len(), 2);
}

#[tokio::test]
async fn marks_remaining_as_skipped() {
    let scenario =
        scenario(ScenarioOptions::default().with_mark_remaining_as_skipped(true));

    let err = scenario
        .given("one", || 1)
        .when_try("it breaks", |_: i32| Err::<i32, _>("broken"))
        .and("it grows", |v: i32| v + 1)
        .then("it is two", |v: &i32| *v == 2)
        .await
        .unwrap_err();

    assert_eq!(err.title(), Some("it breaks"));
    assert_eq!(
        statuses(&scenario),
        [
            StepStatus::Passed,
            StepStatus::Failed,
            StepStatus::Skipped,
            StepStatus::Skipped,
        ],
    );

    let outcomes = scenario.outcomes();
    assert!(matches!(
        outcomes[3].error.as_deref(),
        Some(StepError::Skipped { cause }) if cause == "it breaks",
    ));
    assert_eq!(scenario.failed_steps().len(), 1);
}

#[tokio::test]
async fn times_out_slow_steps() {
    let scenario = scenario(
        ScenarioOptions::default()
            .with_step_timeout(Some(Duration::from_millis(20))),
    );

    let err = scenario
        .given("one", || 1)
        .when_async("it sleeps", |v: i32| async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            v
        })
        .await
        .unwrap_err();

    let step = err.step_error().unwrap();
    assert!(step.is_timeout());
    assert_eq!(step.to_string(), "Step timed out after 20ms");
    assert_eq!(scenario.outcomes()[1].status, StepStatus::Failed);
}

#[tokio::test]
async fn timeout_only_fails_the_slow_step() {
    let scenario = scenario(
        ScenarioOptions::default()
            .with_continue_on_error(true)
            .with_step_timeout(Some(Duration::from_millis(20))),
    );

    scenario
        .given("one", || 1)
        .when_async("it sleeps", |v: i32| async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            v * 10
        })
        .and("it grows", |v: i32| v + 1)
        .await
        .unwrap();

    assert_eq!(
        statuses(&scenario),
        [StepStatus::Passed, StepStatus::Failed, StepStatus::Passed],
    );
    let outcomes = scenario.outcomes();
    assert!(outcomes[1].error.as_deref().is_some_and(StepError::is_timeout));
    assert_eq!(scenario.current::<i32>(), Some(2));
}

#[tokio::test]
async fn failed_assertions_are_step_failures_when_not_halting() {
    let scenario =
        scenario(ScenarioOptions::default().with_halt_on_failed_assertion(false));

    let err = scenario
        .given("one", || 1)
        .then("it is two", |v: &i32| *v == 2)
        .await
        .unwrap_err();

    assert!(matches!(err, ScenarioError::StepFailed { .. }));
    assert!(err.is_assertion());
}

#[tokio::test]
async fn aborts_on_external_cancellation() {
    let cancel = CancellationToken::new();
    let scenario = scenario(ScenarioOptions::default());

    let trigger = cancel.clone();
    drop(tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    }));

    let err = scenario
        .given("one", || 1)
        .when_with_cancel("it waits", |v: i32, token| async move {
            token.cancelled().await;
            v
        })
        .then("never checked", |_: &i32| true)
        .run_with_cancel(cancel)
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        ScenarioError::Cancelled { step: Some(title) } if title == "it waits",
    ));
    assert_eq!(statuses(&scenario), [StepStatus::Passed, StepStatus::Canceled]);
    assert_eq!(scenario.failed_steps().len(), 1);
}

#[tokio::test]
async fn cancelled_before_start_runs_nothing() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let scenario = scenario(ScenarioOptions::default());

    let err = scenario
        .given("one", || 1)
        .run_with_cancel(cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(scenario.outcomes().is_empty());
}

#[tokio::test]
async fn options_are_read_on_run() {
    let scenario = scenario(ScenarioOptions::default());
    let chain = scenario
        .given("one", || 1)
        .when_try("it breaks", |_: i32| Err::<i32, _>("broken"))
        .and("it grows", |v: i32| v + 1);

    scenario.set_options(ScenarioOptions::default().with_continue_on_error(true));
    chain.await.unwrap();

    assert_eq!(scenario.outcomes().len(), 3);
}
