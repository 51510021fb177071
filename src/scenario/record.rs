// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Metadata and results of a single scenario.

use std::{
    collections::HashSet,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use gherkin::tagexpr::TagOperation;

use crate::{
    observer::{ScenarioObserver, StepObserver},
    tag::{self, Ext as _},
    value::{self, Carried, Value},
};

use super::{ScenarioOptions, StepIo, StepOutcome, StepStatus};

/// Name under which tags are forwarded to a [`TraitSink`].
pub const TAG_TRAIT: &str = "Category";

/// External sink of scenario traits, usually a test-runner report.
pub trait TraitSink: Send + Sync {
    /// Attaches the named trait to the current test.
    fn add_trait(&self, name: &str, value: &str);
}

/// Identity of a scenario, immutable after creation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScenarioInfo {
    /// Name of the feature the scenario belongs to.
    pub feature: String,

    /// Free-form description of the feature.
    pub feature_description: Option<String>,

    /// Name of the scenario.
    pub name: String,
}

/// Record of a single scenario: its identity, tags, policies, observers and
/// everything its run produced.
///
/// Written only by the [`StepPipeline`] during a run, readable at any time.
///
/// [`StepPipeline`]: crate::StepPipeline
pub struct ScenarioRecord {
    info: ScenarioInfo,
    tags: Mutex<HashSet<String>>,
    outcomes: Mutex<Vec<StepOutcome>>,
    io: Mutex<Vec<StepIo>>,
    current: Mutex<Option<Value>>,
    options: Mutex<ScenarioOptions>,
    scenario_observers: Mutex<Vec<Arc<dyn ScenarioObserver>>>,
    step_observers: Mutex<Vec<Arc<dyn StepObserver>>>,
    trait_sink: Option<Arc<dyn TraitSink>>,
}

impl ScenarioRecord {
    pub(crate) fn new(
        info: ScenarioInfo,
        options: ScenarioOptions,
        trait_sink: Option<Arc<dyn TraitSink>>,
    ) -> Self {
        Self {
            info,
            tags: Mutex::default(),
            outcomes: Mutex::default(),
            io: Mutex::default(),
            current: Mutex::default(),
            options: Mutex::new(options),
            scenario_observers: Mutex::default(),
            step_observers: Mutex::default(),
            trait_sink,
        }
    }

    /// Returns the identity of this scenario.
    #[must_use]
    pub const fn info(&self) -> &ScenarioInfo {
        &self.info
    }

    /// Returns the feature name of this scenario.
    #[must_use]
    pub fn feature(&self) -> &str {
        &self.info.feature
    }

    /// Returns the scenario name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Adds the given `tag`, forwarding it to the attached [`TraitSink`] if
    /// it wasn't present yet.
    ///
    /// Tags are stored without their leading `@`. Returns whether the tag is
    /// new.
    pub fn add_tag(&self, tag: impl Into<String>) -> bool {
        let tag = tag::normalize(&tag.into()).to_owned();
        let added = lock(&self.tags).insert(tag.clone());
        if added {
            if let Some(sink) = &self.trait_sink {
                sink.add_trait(TAG_TRAIT, &tag);
            }
        }
        added
    }

    /// Returns the tags of this scenario, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        let mut tags = lock(&self.tags).iter().cloned().collect::<Vec<_>>();
        tags.sort_unstable();
        tags
    }

    /// Indicates whether this scenario carries the given `tag`, ignoring a
    /// leading `@`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        lock(&self.tags).contains(tag::normalize(tag))
    }

    /// Evaluates the given tag expression against the tags of this scenario.
    #[must_use]
    pub fn matches_tags(&self, expr: &TagOperation) -> bool {
        expr.eval(lock(&self.tags).iter())
    }

    /// Returns the [`ScenarioOptions`] the next run obeys.
    #[must_use]
    pub fn options(&self) -> ScenarioOptions {
        lock(&self.options).clone()
    }

    /// Replaces the [`ScenarioOptions`].
    ///
    /// A run in progress keeps obeying the ones it started with.
    pub fn set_options(&self, options: ScenarioOptions) {
        *lock(&self.options) = options;
    }

    /// Attaches the given [`ScenarioObserver`].
    pub fn add_scenario_observer(&self, observer: Arc<dyn ScenarioObserver>) {
        lock(&self.scenario_observers).push(observer);
    }

    /// Attaches the given [`StepObserver`].
    pub fn add_step_observer(&self, observer: Arc<dyn StepObserver>) {
        lock(&self.step_observers).push(observer);
    }

    pub(crate) fn scenario_observers(&self) -> Vec<Arc<dyn ScenarioObserver>> {
        lock(&self.scenario_observers).clone()
    }

    pub(crate) fn step_observers(&self) -> Vec<Arc<dyn StepObserver>> {
        lock(&self.step_observers).clone()
    }

    /// Returns the outcome log, in execution order.
    #[must_use]
    pub fn outcomes(&self) -> Vec<StepOutcome> {
        lock(&self.outcomes).clone()
    }

    /// Returns the IO log, in execution order.
    #[must_use]
    pub fn io_log(&self) -> Vec<StepIo> {
        lock(&self.io).clone()
    }

    /// Returns the last successfully produced carried value.
    #[must_use]
    pub fn current_value(&self) -> Option<Value> {
        lock(&self.current).clone()
    }

    /// Returns the last successfully produced carried value as a `T`, if it
    /// is one.
    #[must_use]
    pub fn current<T: Carried>(&self) -> Option<T> {
        value::restore(self.current_value()).ok()
    }

    /// Indicates whether every recorded step passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        lock(&self.outcomes).iter().all(StepOutcome::is_passed)
    }

    /// Returns the outcomes of the steps that failed or were cancelled.
    #[must_use]
    pub fn failed_steps(&self) -> Vec<StepOutcome> {
        lock(&self.outcomes)
            .iter()
            .filter(|o| matches!(o.status, StepStatus::Failed | StepStatus::Canceled))
            .cloned()
            .collect()
    }

    /// Renders the outcome log, one step per line.
    #[must_use]
    pub fn report(&self) -> String {
        lock(&self.outcomes)
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Appends a step to both logs.
    pub(crate) fn record(&self, outcome: StepOutcome, io: StepIo) {
        lock(&self.outcomes).push(outcome);
        lock(&self.io).push(io);
    }

    pub(crate) fn set_current(&self, value: Option<Value>) {
        *lock(&self.current) = value;
    }
}

impl fmt::Debug for ScenarioRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioRecord")
            .field("info", &self.info)
            .field("tags", &self.tags())
            .field("outcomes", &lock(&self.outcomes).len())
            .field("options", &self.options())
            .field("trait_sink", &self.trait_sink.is_some())
            .finish_non_exhaustive()
    }
}

/// Locks the given [`Mutex`], ignoring poisoning.
///
/// Records stay consistent across panics, as every critical section is a
/// single push or assignment.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        error::StepError,
        scenario::StepInfo,
        step::{Phase, Word},
    };

    #[derive(Default)]
    struct Sink(Mutex<Vec<(String, String)>>);

    impl TraitSink for Sink {
        fn add_trait(&self, name: &str, value: &str) {
            lock(&self.0).push((name.to_owned(), value.to_owned()));
        }
    }

    fn record(sink: Option<Arc<dyn TraitSink>>) -> ScenarioRecord {
        ScenarioRecord::new(
            ScenarioInfo {
                feature: "Tags".into(),
                feature_description: None,
                name: "dedup".into(),
            },
            ScenarioOptions::default(),
            sink,
        )
    }

    #[test]
    fn collapses_duplicate_tags() {
        let sink = Arc::new(Sink::default());
        let rec = record(Some(sink.clone()));

        assert!(rec.add_tag("smoke"));
        assert!(!rec.add_tag("smoke"));
        assert!(rec.add_tag("fast"));

        assert_eq!(rec.tags(), ["fast", "smoke"]);
        assert_eq!(
            *lock(&sink.0),
            [
                ("Category".to_owned(), "smoke".to_owned()),
                ("Category".to_owned(), "fast".to_owned()),
            ],
        );
    }

    #[test]
    fn evaluates_tag_expressions() {
        let rec = record(None);
        _ = rec.add_tag("@smoke");

        let expr = "@smoke and not @slow"
            .parse::<TagOperation>()
            .unwrap_or_else(|e| panic!("invalid tag expression: {e}"));

        assert!(rec.matches_tags(&expr));
        assert!(rec.has_tag("smoke"));
        assert!(!rec.has_tag("slow"));
    }

    #[test]
    fn summarizes_outcomes() {
        let rec = record(None);
        let info = StepInfo {
            index: 0,
            phase: Phase::Then,
            word: Word::Primary,
            kind: "Then",
            title: "it holds".into(),
            location: None,
        };
        let io = StepIo {
            kind: "Then",
            title: "it holds".into(),
            input: None,
            output: None,
        };
        rec.record(StepOutcome::new(&info, Duration::ZERO, Ok(())), io.clone());
        assert!(rec.passed());

        rec.record(
            StepOutcome::new(
                &info,
                Duration::ZERO,
                Err((StepStatus::Failed, Arc::new(StepError::assertion("no")))),
            ),
            io,
        );

        assert!(!rec.passed());
        assert_eq!(rec.failed_steps().len(), 1);
        assert_eq!(rec.io_log().len(), rec.outcomes().len());
        assert_eq!(rec.report().lines().count(), 2);
    }

    #[test]
    fn reads_current_value_typed() {
        let rec = record(None);
        rec.set_current(Some(value::erase(4_i32)));

        assert_eq!(rec.current::<i32>(), Some(4));
        assert_eq!(rec.current::<String>(), None);
    }
}
