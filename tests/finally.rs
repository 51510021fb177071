use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use cucumber_chain::{
    CancellationToken, Scenario, ScenarioError, ScenarioOptions, StepStatus,
};

type Log = Arc<Mutex<Vec<String>>>;

#[tokio::test]
async fn runs_after_the_whole_chain() {
    let log = Log::default();
    let scenario = Scenario::new("Cleanup", "Passing chain");

    let (l1, l2) = (log.clone(), log.clone());
    scenario
        .given("a resource", || 7)
        .finally("the resource is released", move |v: i32| {
            l1.lock().unwrap().push(format!("released {v}"));
        })
        .when("it is used", move |v: i32| {
            l2.lock().unwrap().push(format!("used {v}"));
            v + 1
        })
        .then("it was used", |v: &i32| *v == 8)
        .await
        .unwrap();

    assert_eq!(*log.lock().unwrap(), ["used 7", "released 7"]);

    let outcomes = scenario.outcomes();
    assert_eq!(outcomes.len(), 4);
    assert_eq!(outcomes[1].kind, "And");
    assert_eq!(outcomes[1].title, "the resource is released");
    assert_eq!(scenario.current::<i32>(), Some(8));
}

#[tokio::test]
async fn runs_when_a_later_step_fails() {
    let log = Log::default();
    let scenario = Scenario::new("Cleanup", "Failing chain");

    let l = log.clone();
    let err = scenario
        .given("a connection", || "db".to_owned())
        .finally_async("the connection is closed", move |name: String| async move {
            l.lock().unwrap().push(format!("closed {name}"));
        })
        .when_try("a query runs", |_: String| Err::<u32, _>("timeout"))
        .await
        .unwrap_err();

    assert_eq!(err.title(), Some("a query runs"));
    assert_eq!(*log.lock().unwrap(), ["closed db"]);
}

#[tokio::test]
async fn runs_in_registration_order() {
    let log = Log::default();
    let scenario = Scenario::new("Cleanup", "Many handlers");

    let (l1, l2) = (log.clone(), log.clone());
    scenario
        .given("one", || 1)
        .finally("first", move |v: i32| l1.lock().unwrap().push(format!("first {v}")))
        .when("it grows", |v: i32| v + 1)
        .finally("second", move |v: i32| l2.lock().unwrap().push(format!("second {v}")))
        .await
        .unwrap();

    assert_eq!(*log.lock().unwrap(), ["first 1", "second 2"]);
}

#[tokio::test]
async fn unreached_handlers_never_run() {
    let log = Log::default();
    let scenario = Scenario::builder("Cleanup", "Unreached")
        .options(ScenarioOptions::default().with_mark_remaining_as_skipped(true))
        .build();

    let l = log.clone();
    _ = scenario
        .given("one", || 1)
        .when_try("it breaks", |_: i32| Err::<i32, _>("broken"))
        .finally("never registered", move |_: i32| l.lock().unwrap().push("ran".into()))
        .await
        .unwrap_err();

    assert!(log.lock().unwrap().is_empty());
    assert_eq!(scenario.outcomes()[2].status, StepStatus::Skipped);
}

#[tokio::test]
async fn handler_failures_are_swallowed() {
    let log = Log::default();
    let scenario = Scenario::new("Cleanup", "Panicking handler");

    let l = log.clone();
    scenario
        .given("one", || 1)
        .finally("it panics", |_: i32| panic!("cleanup failed"))
        .finally("it still runs", move |v: i32| l.lock().unwrap().push(v.to_string()))
        .await
        .unwrap();

    assert_eq!(*log.lock().unwrap(), ["1"]);
    assert!(scenario.passed());
}

#[tokio::test]
async fn runs_after_external_cancellation() {
    let log = Log::default();
    let cancel = CancellationToken::new();
    let scenario = Scenario::new("Cleanup", "Cancelled chain");

    let trigger = cancel.clone();
    drop(tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    }));

    let l = log.clone();
    let err = scenario
        .given("one", || 1)
        .finally("it is cleaned", move |v: i32| {
            l.lock().unwrap().push(format!("cleaned {v}"));
        })
        .when_async("it is slow", |v: i32| async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            v
        })
        .run_with_cancel(cancel)
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        ScenarioError::Cancelled { step: Some(title) } if title == "it is slow",
    ));
    assert_eq!(*log.lock().unwrap(), ["cleaned 1"]);
}

#[tokio::test]
async fn runs_after_a_timed_out_step() {
    let log = Log::default();
    let scenario = Scenario::builder("Cleanup", "Timed out chain")
        .options(
            ScenarioOptions::default()
                .with_step_timeout(Some(Duration::from_millis(20))),
        )
        .build();

    let l = log.clone();
    let err = scenario
        .given("one", || 1)
        .finally("it is cleaned", move |v: i32| {
            l.lock().unwrap().push(format!("cleaned {v}"));
        })
        .when_async("it is slow", |v: i32| async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            v
        })
        .await
        .unwrap_err();

    assert!(err.step_error().is_some_and(|e| e.is_timeout()));
    assert_eq!(*log.lock().unwrap(), ["cleaned 1"]);
}
