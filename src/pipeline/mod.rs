// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! FIFO queue of deferred [`Step`]s.
//!
//! Nothing runs while steps are enqueued. [`StepPipeline::run()`] drains the
//! queue, threading the carried state from step to step and writing every
//! outcome into a [`ScenarioRecord`].
//!
//! [`ScenarioRecord`]: crate::ScenarioRecord

mod run;

use std::collections::VecDeque;

use crate::{
    error::ConfigError,
    step::{ExecuteFn, FinallyFn, Phase, Step, Word},
};

/// Queue of pending [`Step`]s of one scenario.
#[derive(Debug, Default)]
pub struct StepPipeline {
    /// Pending [`Step`]s, in enqueue order.
    queue: VecDeque<Step>,

    /// [`Phase`] of the last enqueued [`Step`], inherited by `And`/`But`.
    last_phase: Option<Phase>,
}

impl StepPipeline {
    /// Creates a new empty [`StepPipeline`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a [`Step`] of the given [`Phase`] and [`Word`].
    pub fn enqueue(
        &mut self,
        phase: Phase,
        word: Word,
        title: impl Into<String>,
        execute: ExecuteFn,
    ) -> &mut Self {
        self.push(Step::new(phase, word, title, execute))
    }

    /// Appends a [`Step`] inheriting the [`Phase`] of the previous one, or
    /// [`Phase::Given`] if nothing was enqueued yet.
    pub fn enqueue_inherit(
        &mut self,
        title: impl Into<String>,
        execute: ExecuteFn,
        word: Word,
    ) -> &mut Self {
        self.enqueue(self.last_phase(), word, title, execute)
    }

    /// Appends a pass-through `And` step registering the given cleanup
    /// `handler` once reached.
    ///
    /// The handler receives the carried state as it was at that point, after
    /// every other step has finished, whatever the outcome of the run.
    pub fn enqueue_finally(
        &mut self,
        title: impl Into<String>,
        handler: FinallyFn,
    ) -> &mut Self {
        self.push(Step::finally(self.last_phase(), title, handler))
    }

    /// Appends the given [`Step`] as is.
    pub fn push(&mut self, step: Step) -> &mut Self {
        self.last_phase = Some(step.phase);
        self.queue.push_back(step);
        self
    }

    /// Returns the [`Phase`] the next `And`/`But` step inherits.
    ///
    /// [`Phase::Given`] if nothing was enqueued yet.
    #[must_use]
    pub const fn last_phase(&self) -> Phase {
        match self.last_phase {
            Some(phase) => phase,
            None => Phase::Given,
        }
    }

    /// Returns the [`Phase`] the next `And`/`But` step inherits.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MalformedChain`] if nothing was enqueued yet, so there
    /// is no [`Phase`] to inherit.
    pub fn inherited_phase(&self, word: Word) -> Result<Phase, ConfigError> {
        self.last_phase.ok_or_else(|| {
            ConfigError::malformed(format!(
                "`{}` step has no preceding step to inherit its phase from",
                crate::step::keyword(Phase::Given, word),
            ))
        })
    }

    /// Returns the number of pending [`Step`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Indicates whether there are no pending [`Step`]s.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Takes all the pending [`Step`]s out, leaving an empty queue that still
    /// remembers the last [`Phase`].
    #[must_use]
    pub fn take(&mut self) -> Self {
        Self {
            queue: std::mem::take(&mut self.queue),
            last_phase: self.last_phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt as _;

    use super::*;

    fn noop() -> ExecuteFn {
        Box::new(|state, _| async move { Ok(state) }.boxed())
    }

    #[test]
    fn inherits_last_phase() {
        let mut pipeline = StepPipeline::new();
        assert_eq!(pipeline.last_phase(), Phase::Given);

        _ = pipeline
            .enqueue(Phase::When, Word::Primary, "act", noop())
            .enqueue_inherit("act more", noop(), Word::And)
            .enqueue_finally("clean up", Box::new(|_| async { Ok(()) }.boxed()));

        let phases = pipeline.queue.iter().map(|s| (s.phase, s.word)).collect::<Vec<_>>();
        assert_eq!(
            phases,
            [
                (Phase::When, Word::Primary),
                (Phase::When, Word::And),
                (Phase::When, Word::And),
            ],
        );
    }

    #[test]
    fn connectives_need_a_preceding_step() {
        let mut pipeline = StepPipeline::new();

        let err = pipeline.inherited_phase(Word::But).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed chain: `But` step has no preceding step to inherit its \
             phase from",
        );

        _ = pipeline.enqueue(Phase::When, Word::Primary, "act", noop());
        assert_eq!(pipeline.inherited_phase(Word::And).ok(), Some(Phase::When));
    }

    #[test]
    fn take_keeps_phase() {
        let mut pipeline = StepPipeline::new();
        _ = pipeline.enqueue(Phase::Then, Word::Primary, "check", noop());

        let taken = pipeline.take();

        assert_eq!(taken.len(), 1);
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.last_phase(), Phase::Then);
        assert_eq!(pipeline.inherited_phase(Word::And).ok(), Some(Phase::Then));
    }
}
