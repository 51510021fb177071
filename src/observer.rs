// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Hooks for monitoring scenario runs.
//!
//! Observers are attached to a [`ScenarioRecord`] and notified by its
//! [`StepPipeline`]. Notifications are best-effort: an observer returning an
//! error or panicking is logged and never affects the run.
//!
//! [`ScenarioRecord`]: crate::ScenarioRecord
//! [`StepPipeline`]: crate::StepPipeline

use std::{future::Future, panic::AssertUnwindSafe};

use async_trait::async_trait;
use futures::FutureExt as _;

use crate::{
    error::{BoxError, PanicPayloadExt as _},
    scenario::{ScenarioInfo, StepInfo, StepOutcome},
};

/// Observer of a whole scenario run.
#[async_trait]
pub trait ScenarioObserver: Send + Sync {
    /// Called before the first step of a run is dequeued.
    async fn scenario_starting(
        &self,
        _scenario: &ScenarioInfo,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called once a run is over, before finally-handlers run.
    async fn scenario_finished(
        &self,
        _scenario: &ScenarioInfo,
        _outcomes: &[StepOutcome],
    ) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Observer of single steps.
#[async_trait]
pub trait StepObserver: Send + Sync {
    /// Called right before a step executes.
    async fn step_starting(&self, _step: &StepInfo) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called after a step executed, whatever its outcome.
    ///
    /// Steps recorded as skipped never started, so aren't reported here.
    async fn step_finished(
        &self,
        _step: &StepInfo,
        _outcome: &StepOutcome,
    ) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Awaits the given observer notification, logging its failure.
pub(crate) async fn notify<F>(hook: &'static str, notification: F)
where
    F: Future<Output = Result<(), BoxError>>,
{
    match AssertUnwindSafe(notification).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(hook, error = %e, "observer failed");
        }
        Err(panic) => {
            tracing::warn!(
                hook,
                panic = %(*panic).to_readable_string(),
                "observer panicked",
            );
        }
    }
}
