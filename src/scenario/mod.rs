// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Scenario`] handle and its records.
//!
//! - [`options`]: failure policies of a run.
//! - [`outcome`]: per-step records.
//! - [`record`]: identity and results of a scenario.

pub mod options;
pub mod outcome;
pub mod record;

use std::{
    fmt,
    future::Future,
    ops::Deref,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use futures::future;
use tokio_util::sync::CancellationToken;

use crate::{
    builder::{adapt, GivenBuilder},
    error::{BoxError, ConfigError, ScenarioError},
    observer::{ScenarioObserver, StepObserver},
    pipeline::StepPipeline,
    step::{self, Collection, ExecuteFn, FinallyFn, Location, Phase, Step, Word},
    value::Carried,
};

use self::record::lock;

pub use self::{
    options::ScenarioOptions,
    outcome::{StepInfo, StepIo, StepOutcome, StepStatus},
    record::{ScenarioInfo, ScenarioRecord, TraitSink},
};

/// Shared handle to a single scenario: its [`ScenarioRecord`] and the
/// [`StepPipeline`] of its pending steps.
///
/// Cloning yields another handle to the same scenario.
#[derive(Clone)]
pub struct Scenario {
    inner: Arc<Inner>,
}

struct Inner {
    record: ScenarioRecord,
    pipeline: Mutex<StepPipeline>,
    drained: AtomicBool,
}

impl Scenario {
    /// Creates a new [`Scenario`] with the default [`ScenarioOptions`].
    #[must_use]
    pub fn new(feature: impl Into<String>, name: impl Into<String>) -> Self {
        Self::builder(feature, name).build()
    }

    /// Starts building a new [`Scenario`].
    #[must_use]
    pub fn builder(
        feature: impl Into<String>,
        name: impl Into<String>,
    ) -> ScenarioBuilder {
        ScenarioBuilder {
            info: ScenarioInfo {
                feature: feature.into(),
                feature_description: None,
                name: name.into(),
            },
            tags: Vec::new(),
            options: ScenarioOptions::default(),
            scenario_observers: Vec::new(),
            step_observers: Vec::new(),
            trait_sink: None,
        }
    }

    /// Returns the [`ScenarioRecord`] of this [`Scenario`].
    #[must_use]
    pub fn record(&self) -> &ScenarioRecord {
        &self.inner.record
    }

    /// Starts a chain with a [Given] step producing the first carried value.
    ///
    /// [Given]: https://cucumber.io/docs/gherkin/reference#given
    #[track_caller]
    pub fn given<U, F>(&self, title: impl Into<String>, f: F) -> GivenBuilder<U>
    where
        U: Carried,
        F: FnOnce() -> U + Send + 'static,
    {
        self.seed(title, adapt::seed(move |_| future::ready(Ok::<_, BoxError>(f()))))
    }

    /// Starts a chain with an async [Given] step.
    ///
    /// [Given]: https://cucumber.io/docs/gherkin/reference#given
    #[track_caller]
    pub fn given_async<U, F, Fut>(
        &self,
        title: impl Into<String>,
        f: F,
    ) -> GivenBuilder<U>
    where
        U: Carried,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = U> + Send + 'static,
    {
        self.seed(
            title,
            adapt::seed(move |_| async move { Ok::<_, BoxError>(f().await) }),
        )
    }

    /// Starts a chain with an async [Given] step observing cancellation.
    ///
    /// [Given]: https://cucumber.io/docs/gherkin/reference#given
    #[track_caller]
    pub fn given_with_cancel<U, F, Fut>(
        &self,
        title: impl Into<String>,
        f: F,
    ) -> GivenBuilder<U>
    where
        U: Carried,
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = U> + Send + 'static,
    {
        self.seed(
            title,
            adapt::seed(move |t| async move { Ok::<_, BoxError>(f(t).await) }),
        )
    }

    /// Starts a chain with a fallible [Given] step.
    ///
    /// [Given]: https://cucumber.io/docs/gherkin/reference#given
    #[track_caller]
    pub fn given_try<U, E, F>(
        &self,
        title: impl Into<String>,
        f: F,
    ) -> GivenBuilder<U>
    where
        U: Carried,
        E: Into<BoxError> + Send + 'static,
        F: FnOnce() -> Result<U, E> + Send + 'static,
    {
        self.seed(title, adapt::seed(move |_| future::ready(f())))
    }

    #[track_caller]
    fn seed<U: Carried>(
        &self,
        title: impl Into<String>,
        execute: ExecuteFn,
    ) -> GivenBuilder<U> {
        let title = title.into();
        self.push_step(Some(Phase::Given), Word::Primary, title, |_| execute);
        GivenBuilder::new(self.clone())
    }

    /// Resolves the given step `text` against the `steps` and enqueues it.
    ///
    /// `And`, `But` and `*` keywords inherit the [`Phase`] of the previously
    /// enqueued step.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnknownKeyword`] if the `keyword` is not recognized.
    /// - [`ConfigError::MalformedChain`] if an `And`, `But` or `*` step has
    ///   no preceding step.
    /// - [`ConfigError::UnresolvedStep`] if no step definition matches.
    /// - [`ConfigError::AmbiguousStep`] if many step definitions match.
    pub fn enqueue_text(
        &self,
        steps: &Collection,
        keyword: &str,
        text: &str,
    ) -> Result<(), ConfigError> {
        let (phase, word) = step::parse_keyword(keyword)?;
        let phase = match phase {
            Some(phase) => phase,
            None => lock(&self.inner.pipeline).inherited_phase(word)?,
        };
        // Step factories may use this `Scenario`, so no lock is held here.
        let (execute, loc) = steps.lookup(phase, text)?;
        _ = lock(&self.inner.pipeline)
            .push(Step::new(phase, word, text, execute).at(loc));
        Ok(())
    }

    /// Resolves the given [`gherkin::Step`] against the `steps` and enqueues
    /// it.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnresolvedStep`] if no step definition matches.
    /// - [`ConfigError::AmbiguousStep`] if many step definitions match.
    pub fn enqueue_gherkin(
        &self,
        steps: &Collection,
        step: &gherkin::Step,
    ) -> Result<(), ConfigError> {
        let phase = Phase::from(step.ty);
        let word = step::parse_keyword(&step.keyword)
            .map_or(Word::Primary, |(_, word)| word);
        let (execute, loc) = steps.lookup(phase, &step.value)?;
        _ = lock(&self.inner.pipeline)
            .push(Step::new(phase, word, step.value.clone(), execute).at(loc));
        Ok(())
    }

    /// Gives direct access to the pending [`StepPipeline`].
    pub fn with_pipeline<R>(&self, f: impl FnOnce(&mut StepPipeline) -> R) -> R {
        f(&mut lock(&self.inner.pipeline))
    }

    /// Returns the number of steps waiting for a run.
    #[must_use]
    pub fn pending(&self) -> usize {
        lock(&self.inner.pipeline).len()
    }

    /// Runs every pending step of this [`Scenario`].
    ///
    /// # Errors
    ///
    /// See [`StepPipeline::run()`].
    pub async fn run(&self) -> Result<(), ScenarioError> {
        self.run_with_cancel(CancellationToken::new()).await
    }

    /// Runs every pending step of this [`Scenario`], aborting once the given
    /// `cancel` token is triggered.
    ///
    /// Running a drained [`Scenario`] again does nothing.
    ///
    /// # Errors
    ///
    /// See [`StepPipeline::run()`].
    pub async fn run_with_cancel(
        &self,
        cancel: CancellationToken,
    ) -> Result<(), ScenarioError> {
        let pipeline = lock(&self.inner.pipeline).take();
        let drained = self.inner.drained.swap(true, Ordering::AcqRel);
        if drained && pipeline.is_empty() {
            tracing::trace!(scenario = %self.name(), "nothing left to run");
            return Ok(());
        }
        pipeline.run(&self.inner.record, cancel).await
    }

    /// Enqueues a step built by `make` out of its display title.
    #[track_caller]
    pub(crate) fn push_step(
        &self,
        phase: Option<Phase>,
        word: Word,
        title: String,
        make: impl FnOnce(&str) -> ExecuteFn,
    ) {
        let loc = Location::caller();
        let mut pipeline = lock(&self.inner.pipeline);
        let phase = phase.unwrap_or_else(|| pipeline.last_phase());
        let execute = make(&step::display_title(phase, &title));
        _ = pipeline.push(Step::new(phase, word, title, execute).at(Some(loc)));
    }

    /// Enqueues a finally step registering the given `handler`.
    #[track_caller]
    pub(crate) fn push_finally(&self, title: String, handler: FinallyFn) {
        let loc = Location::caller();
        let mut pipeline = lock(&self.inner.pipeline);
        let phase = pipeline.last_phase();
        _ = pipeline.push(Step::finally(phase, title, handler).at(Some(loc)));
    }
}

impl Deref for Scenario {
    type Target = ScenarioRecord;

    fn deref(&self) -> &Self::Target {
        &self.inner.record
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("record", &self.inner.record)
            .field("pending", &self.pending())
            .finish()
    }
}

/// Builder of a [`Scenario`].
#[must_use]
pub struct ScenarioBuilder {
    info: ScenarioInfo,
    tags: Vec<String>,
    options: ScenarioOptions,
    scenario_observers: Vec<Arc<dyn ScenarioObserver>>,
    step_observers: Vec<Arc<dyn StepObserver>>,
    trait_sink: Option<Arc<dyn TraitSink>>,
}

impl ScenarioBuilder {
    /// Sets the description of the feature.
    pub fn feature_description(mut self, description: impl Into<String>) -> Self {
        self.info.feature_description = Some(description.into());
        self
    }

    /// Adds a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Adds several tags.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Sets the [`ScenarioOptions`].
    pub fn options(mut self, options: ScenarioOptions) -> Self {
        self.options = options;
        self
    }

    /// Attaches a [`ScenarioObserver`].
    pub fn scenario_observer(mut self, observer: Arc<dyn ScenarioObserver>) -> Self {
        self.scenario_observers.push(observer);
        self
    }

    /// Attaches a [`StepObserver`].
    pub fn step_observer(mut self, observer: Arc<dyn StepObserver>) -> Self {
        self.step_observers.push(observer);
        self
    }

    /// Attaches a [`TraitSink`] receiving every new tag.
    pub fn trait_sink(mut self, sink: Arc<dyn TraitSink>) -> Self {
        self.trait_sink = Some(sink);
        self
    }

    /// Builds the [`Scenario`].
    pub fn build(self) -> Scenario {
        let record = ScenarioRecord::new(self.info, self.options, self.trait_sink);
        for tag in self.tags {
            _ = record.add_tag(tag);
        }
        for o in self.scenario_observers {
            record.add_scenario_observer(o);
        }
        for o in self.step_observers {
            record.add_step_observer(o);
        }
        Scenario {
            inner: Arc::new(Inner {
                record,
                pipeline: Mutex::default(),
                drained: AtomicBool::new(false),
            }),
        }
    }
}
