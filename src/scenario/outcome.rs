// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Per-step records of a scenario run.

use std::{fmt, sync::Arc, time::Duration};

use derive_more::with_trait::Display;

use crate::{
    error::StepError,
    step::{Location, Phase, Step, Word},
    value::{Carried, Value},
};

/// How a step ended.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum StepStatus {
    /// Step completed and advanced the carried state.
    Passed,

    /// Step raised an error.
    Failed,

    /// Step was not executed because a previous one failed.
    Skipped,

    /// Step was aborted by the external cancellation signal.
    Canceled,
}

/// Identification of a step, as passed to [`StepObserver`]s.
///
/// [`StepObserver`]: crate::StepObserver
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StepInfo {
    /// Zero-based position of the step in its chain.
    pub index: usize,

    /// [`Phase`] of the step.
    pub phase: Phase,

    /// [`Word`] the step was declared with.
    pub word: Word,

    /// Display keyword of the step.
    pub kind: &'static str,

    /// Display title of the step.
    pub title: String,

    /// Where the step was declared, if known.
    pub location: Option<Location>,
}

impl StepInfo {
    pub(crate) fn new(index: usize, step: &Step) -> Self {
        Self {
            index,
            phase: step.phase,
            word: step.word,
            kind: step.kind(),
            title: step.display_title(),
            location: step.location,
        }
    }
}

/// Outcome of a single dequeued step.
#[derive(Clone, Debug)]
pub struct StepOutcome {
    /// Display keyword of the step.
    pub kind: &'static str,

    /// Display title of the step.
    pub title: String,

    /// [`Phase`] of the step.
    pub phase: Phase,

    /// [`Word`] the step was declared with.
    pub word: Word,

    /// How the step ended.
    pub status: StepStatus,

    /// Time spent executing the step.
    pub elapsed: Duration,

    /// Failure of the step, if it didn't pass.
    pub error: Option<Arc<StepError>>,

    /// Where the step was declared, if known.
    pub location: Option<Location>,
}

impl StepOutcome {
    pub(crate) fn new(
        info: &StepInfo,
        elapsed: Duration,
        result: Result<(), (StepStatus, Arc<StepError>)>,
    ) -> Self {
        let (status, error) = match result {
            Ok(()) => (StepStatus::Passed, None),
            Err((status, err)) => (status, Some(err)),
        };
        Self {
            kind: info.kind,
            title: info.title.clone(),
            phase: info.phase,
            word: info.word,
            status,
            elapsed,
            error,
            location: info.location,
        }
    }

    /// Indicates whether the step passed.
    #[must_use]
    pub fn is_passed(&self) -> bool {
        self.status == StepStatus::Passed
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}, {}]",
            self.kind,
            self.title,
            self.status,
            humantime::format_duration(self.elapsed),
        )?;
        if let Some(err) = &self.error {
            write!(f, ": {err}")?;
        }
        if let Some(loc) = &self.location {
            write!(f, " --> {loc}")?;
        }
        Ok(())
    }
}

/// Snapshot of the carried state around a single step.
#[derive(Clone)]
pub struct StepIo {
    /// Display keyword of the step.
    pub kind: &'static str,

    /// Display title of the step.
    pub title: String,

    /// Carried state the step received.
    pub input: Option<Value>,

    /// Carried state the step produced, if it passed.
    pub output: Option<Value>,
}

impl StepIo {
    /// Returns the [`StepIo::input`] as a `T`, if it is one.
    #[must_use]
    pub fn input_as<T: Carried>(&self) -> Option<&T> {
        self.input.as_deref()?.downcast_ref()
    }

    /// Returns the [`StepIo::output`] as a `T`, if it is one.
    #[must_use]
    pub fn output_as<T: Carried>(&self) -> Option<&T> {
        self.output.as_deref()?.downcast_ref()
    }
}

impl fmt::Debug for StepIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepIo")
            .field("kind", &self.kind)
            .field("title", &self.title)
            .field("input", &self.input.as_ref().map(|_| ".."))
            .field("output", &self.output.as_ref().map(|_| ".."))
            .finish()
    }
}
