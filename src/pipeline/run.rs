// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Run loop of a [`StepPipeline`].

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::{Duration, Instant},
};

use futures::{future::BoxFuture, FutureExt as _};
use tokio_util::sync::CancellationToken;
use tracing::Instrument as _;

use crate::{
    error::{ScenarioError, StepError},
    observer::{self, StepObserver},
    scenario::{ScenarioOptions, ScenarioRecord, StepInfo, StepIo, StepOutcome, StepStatus},
    step::{Body, ExecuteFn, FinallyFn},
    value::Value,
};

use super::StepPipeline;

/// Cleanup handler registered by a reached finally step, along with the
/// carried state snapshot it receives.
type Registered = (String, FinallyFn, Option<Value>);

impl StepPipeline {
    /// Drains this [`StepPipeline`], executing its steps one by one and
    /// recording their outcomes into the given [`ScenarioRecord`].
    ///
    /// The [`ScenarioOptions`] and observers of the `record` are read once,
    /// on start.
    ///
    /// Steps are run until the queue is empty, or a failure ends the run
    /// according to the [`ScenarioOptions`], or the `cancel` token is
    /// triggered. Scenario observers are notified and the registered
    /// finally-handlers are run in every case.
    ///
    /// # Errors
    ///
    /// - [`ScenarioError::AssertionFailed`] if an assertion failed and the
    ///   run halts on failed assertions.
    /// - [`ScenarioError::StepFailed`] if a step failed and the run doesn't
    ///   continue on errors.
    /// - [`ScenarioError::Cancelled`] if the `cancel` token was triggered
    ///   while steps remained.
    pub async fn run(
        self,
        record: &ScenarioRecord,
        cancel: CancellationToken,
    ) -> Result<(), ScenarioError> {
        let span = tracing::info_span!(
            "scenario",
            feature = %record.feature(),
            scenario = %record.name(),
        );
        let run = Run {
            record,
            options: record.options(),
            step_observers: record.step_observers(),
            cancel,
            pipeline: self,
            state: None,
            index: 0,
            finally: Vec::new(),
        };
        run.execute().instrument(span).await
    }
}

/// State of a single [`StepPipeline::run()`].
struct Run<'r> {
    record: &'r ScenarioRecord,
    options: ScenarioOptions,
    step_observers: Vec<Arc<dyn StepObserver>>,
    cancel: CancellationToken,
    pipeline: StepPipeline,
    state: Option<Value>,
    index: usize,
    finally: Vec<Registered>,
}

/// Way a single step ended.
enum Verdict {
    /// Step passed, the run goes on.
    Continue,

    /// Run is over with the given result.
    Stop(Result<(), ScenarioError>),
}

impl Run<'_> {
    async fn execute(mut self) -> Result<(), ScenarioError> {
        let record = self.record;
        let info = record.info();
        let scenario_observers = record.scenario_observers();
        for o in &scenario_observers {
            observer::notify("scenario_starting", o.scenario_starting(info))
                .await;
        }
        tracing::debug!(steps = self.pipeline.len(), "scenario started");

        let result = loop {
            if self.cancel.is_cancelled() {
                if self.pipeline.is_empty() {
                    break Ok(());
                }
                tracing::warn!(
                    remaining = self.pipeline.len(),
                    "scenario cancelled between steps",
                );
                break Err(ScenarioError::Cancelled { step: None });
            }
            if self.pipeline.is_empty() {
                break Ok(());
            }
            if let Verdict::Stop(res) = self.next_step().await {
                break res;
            }
        };

        let outcomes = record.outcomes();
        for o in &scenario_observers {
            observer::notify(
                "scenario_finished",
                o.scenario_finished(info, &outcomes),
            )
            .await;
        }
        run_finally(self.finally).await;

        match &result {
            Ok(()) => tracing::debug!("scenario passed"),
            Err(e) => tracing::warn!(error = %e, "scenario failed"),
        }
        result
    }

    /// Dequeues and executes the next step.
    async fn next_step(&mut self) -> Verdict {
        let Some(step) = self.pipeline.queue.pop_front() else {
            return Verdict::Stop(Ok(()));
        };
        let info = StepInfo::new(self.index, &step);
        self.index += 1;
        let span = tracing::info_span!(
            "step",
            kind = info.kind,
            title = %info.title,
            index = info.index,
        );

        for o in &self.step_observers {
            observer::notify("step_starting", o.step_starting(&info)).await;
        }

        let input = self.state.take();
        let started = Instant::now();
        let result = match step.body {
            Body::Execute(execute) => {
                execute_step(
                    execute,
                    input.clone(),
                    self.options.step_timeout,
                    &self.cancel,
                )
                .instrument(span.clone())
                .await
            }
            Body::Finally(handler) => {
                self.finally.push((info.title.clone(), handler, input.clone()));
                Ok(input.clone())
            }
        };
        let elapsed = started.elapsed();

        let err = match result {
            Ok(output) => {
                self.state.clone_from(&output);
                self.record.set_current(output.clone());
                tracing::debug!(parent: &span, ?elapsed, "step passed");
                self.finish(&info, elapsed, Ok(()), input, output).await;
                return Verdict::Continue;
            }
            Err(e) => {
                self.state.clone_from(&input);
                Arc::new(e)
            }
        };

        if err.is_cancelled() && self.cancel.is_cancelled() {
            tracing::warn!(parent: &span, "step cancelled");
            self.finish(&info, elapsed, Err((StepStatus::Canceled, err)), input, None)
                .await;
            return Verdict::Stop(Err(ScenarioError::Cancelled {
                step: Some(info.title),
            }));
        }

        tracing::warn!(parent: &span, error = %err, "step failed");
        self.finish(
            &info,
            elapsed,
            Err((StepStatus::Failed, Arc::clone(&err))),
            input,
            None,
        )
        .await;

        let halt_on_assertion =
            err.is_assertion() && self.options.halt_on_failed_assertion;
        if !halt_on_assertion && self.options.continue_on_error {
            return Verdict::Continue;
        }

        if self.options.mark_remaining_as_skipped {
            self.skip_remaining(&info.title);
        }
        let (phase, title) = (info.phase, info.title);
        Verdict::Stop(Err(if halt_on_assertion {
            ScenarioError::AssertionFailed { phase, title, source: err }
        } else {
            ScenarioError::StepFailed { phase, title, source: err }
        }))
    }

    /// Records the executed step and notifies step observers about it.
    async fn finish(
        &mut self,
        info: &StepInfo,
        elapsed: Duration,
        result: Result<(), (StepStatus, Arc<StepError>)>,
        input: Option<Value>,
        output: Option<Value>,
    ) {
        let outcome = StepOutcome::new(info, elapsed, result);
        self.record.record(
            outcome.clone(),
            StepIo { kind: info.kind, title: info.title.clone(), input, output },
        );
        for o in &self.step_observers {
            observer::notify("step_finished", o.step_finished(info, &outcome))
                .await;
        }
    }

    /// Records every pending step as skipped because of the failed `cause`.
    fn skip_remaining(&mut self, cause: &str) {
        let error = Arc::new(StepError::Skipped { cause: cause.to_owned() });
        while let Some(step) = self.pipeline.queue.pop_front() {
            let info = StepInfo::new(self.index, &step);
            self.index += 1;
            tracing::debug!(kind = info.kind, title = %info.title, "step skipped");
            self.record.record(
                StepOutcome::new(
                    &info,
                    Duration::ZERO,
                    Err((StepStatus::Skipped, Arc::clone(&error))),
                ),
                StepIo {
                    kind: info.kind,
                    title: info.title,
                    input: None,
                    output: None,
                },
            );
        }
    }
}

/// Executes the given step body under the optional `timeout`, racing it
/// against the `cancel` token.
async fn execute_step(
    execute: ExecuteFn,
    input: Option<Value>,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<Option<Value>, StepError> {
    let token = cancel.child_token();
    let _guard = token.clone().drop_guard();

    let step_token = token.clone();
    let guarded = caught(move || execute(input, step_token));
    let timed = async {
        let Some(duration) = timeout else {
            return guarded.await;
        };
        tokio::time::timeout(duration, guarded).await.unwrap_or_else(|_| {
            token.cancel();
            Err(StepError::Timeout { duration })
        })
    };

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(StepError::Cancelled),
        res = timed => res,
    }
}

/// Runs the registered finally-handlers in order, swallowing their failures.
async fn run_finally(handlers: Vec<Registered>) {
    for (title, handler, snapshot) in handlers {
        match caught(move || handler(snapshot)).await {
            Ok(()) => tracing::debug!(title = %title, "finally-handler done"),
            Err(e) => tracing::warn!(title = %title, error = %e, "finally-handler failed"),
        }
    }
}

/// Starts and awaits a step future, converting panics on both stages into
/// [`StepError`]s.
async fn caught<T, F>(start: F) -> Result<T, StepError>
where
    F: FnOnce() -> BoxFuture<'static, Result<T, StepError>>,
{
    let fut = panic::catch_unwind(AssertUnwindSafe(start))
        .map_err(|p| StepError::from_panic(&*p))?;
    AssertUnwindSafe(fut)
        .catch_unwind()
        .await
        .unwrap_or_else(|p| Err(StepError::from_panic(&*p)))
}
