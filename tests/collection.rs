use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use cucumber_chain::{
    gherkin, step::ExecuteFn, Collection, ConfigError, Phase, Scenario,
    ScenarioError, StepError, StepStatus,
};
use futures::FutureExt as _;
use regex::Regex;

const FEATURE: &str = r#"
Feature: Basket
  Scenario: Adding apples
    Given a basket with 2 apples
    When 3 apples are added
    And 1 apple is added
    Then the basket holds 6 apples
    But the basket holds 6 apples
"#;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

fn steps() -> Collection {
    Collection::new()
        .seed(re(r"^a basket with (\d+) apples?$"), |ctx| ctx.parse::<u32>(1))
        .transform(Phase::When, re(r"^(\d+) apples? (?:is|are) added$"), |n: u32, ctx| {
            ctx.parse::<u32>(1).map(|k| n + k)
        })
        .assertion(re(r"^the basket holds (\d+) apples?$"), |n: &u32, ctx| {
            ctx.parse::<u32>(1).is_ok_and(|want| *n == want)
        })
}

#[tokio::test]
async fn runs_gherkin_steps() {
    let feature =
        gherkin::Feature::parse(FEATURE, gherkin::GherkinEnv::default()).unwrap();
    let steps = steps();
    let scenario = Scenario::new(&feature.name, &feature.scenarios[0].name);

    for step in &feature.scenarios[0].steps {
        scenario.enqueue_gherkin(&steps, step).unwrap();
    }
    scenario.run().await.unwrap();

    let outcomes = scenario.outcomes();
    let kinds = outcomes.iter().map(|o| o.kind).collect::<Vec<_>>();
    assert_eq!(kinds, ["Given", "When", "And", "Then", "But"]);
    assert_eq!(outcomes[0].title, "a basket with 2 apples");
    assert!(outcomes.iter().all(|o| o.status == StepStatus::Passed));
    assert_eq!(scenario.current::<u32>(), Some(6));
}

#[tokio::test]
async fn runs_text_steps() {
    let steps = steps();
    let scenario = Scenario::new("Basket", "Wrong count");

    scenario.enqueue_text(&steps, "Given", "a basket with 1 apple").unwrap();
    scenario.enqueue_text(&steps, "When", "1 apple is added").unwrap();
    scenario.enqueue_text(&steps, "*", "2 apples are added").unwrap();
    scenario.enqueue_text(&steps, "then", "the basket holds 5 apples").unwrap();

    let err = scenario.run().await.unwrap_err();

    let ScenarioError::AssertionFailed { phase, title, .. } = &err else {
        panic!("expected failed assertion, got: {err}");
    };
    assert_eq!(*phase, Phase::Then);
    assert_eq!(title, "the basket holds 5 apples");
    assert_eq!(scenario.outcomes()[2].phase, Phase::When);
    assert_eq!(scenario.current::<u32>(), Some(4));
}

#[test]
fn rejects_unknown_steps() {
    let steps = steps();
    let scenario = Scenario::new("Basket", "Misuse");

    let unknown = scenario.enqueue_text(&steps, "Whenever", "1 apple is added");
    let unresolved = scenario.enqueue_text(&steps, "Given", "an empty basket");

    assert!(matches!(unknown, Err(ConfigError::UnknownKeyword { .. })));
    assert!(matches!(
        unresolved,
        Err(ConfigError::UnresolvedStep { keyword, text })
            if keyword == "Given" && text == "an empty basket",
    ));
    assert_eq!(scenario.pending(), 0);
}

#[test]
fn rejects_ambiguous_steps() {
    let steps = steps().seed(re(r"^a basket with .+$"), |_| Ok::<_, std::num::ParseIntError>(0_u32));
    let scenario = Scenario::new("Basket", "Ambiguity");

    let err = scenario
        .enqueue_text(&steps, "Given", "a basket with 3 apples")
        .unwrap_err();

    let ConfigError::AmbiguousStep { text, source } = &err else {
        panic!("expected ambiguity, got: {err}");
    };
    assert_eq!(text, "a basket with 3 apples");
    assert_eq!(source.patterns().count(), 2);
    assert_eq!(steps.len(Phase::Given), 2);
}

#[test]
fn connectives_need_a_preceding_step() {
    let steps = steps();
    let scenario = Scenario::new("Basket", "Dangling");

    let err = scenario.enqueue_text(&steps, "And", "1 apple is added").unwrap_err();

    assert!(err.is_malformed());
    assert_eq!(
        err.to_string(),
        "Malformed chain: `And` step has no preceding step to inherit its \
         phase from",
    );
    assert_eq!(scenario.pending(), 0);
}

#[tokio::test]
async fn step_factories_may_use_the_scenario() {
    let scenario = Scenario::new("Basket", "Reentrant");
    let seen = Arc::new(AtomicUsize::new(usize::MAX));

    let (handle, pending) = (scenario.clone(), Arc::clone(&seen));
    let steps = Collection::new().given(re(r"^nothing happens$"), move |_| {
        pending.store(handle.pending(), Ordering::SeqCst);
        let execute: ExecuteFn =
            Box::new(|_, _| async { Ok::<_, StepError>(None) }.boxed());
        execute
    });

    scenario.enqueue_text(&steps, "Given", "nothing happens").unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 0);
    scenario.enqueue_text(&steps, "And", "nothing happens").unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 1);

    scenario.run().await.unwrap();
    assert_eq!(scenario.outcomes().len(), 2);
}
