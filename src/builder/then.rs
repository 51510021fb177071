// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [Then] stage of a chain.
//!
//! [Then]: https://cucumber.io/docs/gherkin/reference#then

use std::marker::PhantomData;

use crate::{
    step::{Phase, Word},
    Scenario, StepOutcome,
};

use super::{common, predicates, transforms};

/// Chain asserting on a carried `T`.
///
/// Predicates evaluating to `false` fail with an assertion naming the step
/// title.
#[must_use = "steps only run once the chain is awaited"]
pub struct ThenBuilder<T> {
    scenario: Scenario,
    _ty: PhantomData<fn() -> T>,
}

common!(ThenBuilder);

predicates!(
    ThenBuilder, Some(Phase::Then), Word::Primary, "a `Then`":
    then, then_async, then_with_cancel, then_try,
);
predicates!(
    ThenBuilder, None, Word::And, "an `And`":
    and, and_async, and_with_cancel, and_try,
);
predicates!(
    ThenBuilder, None, Word::But, "a `But`":
    but, but_async, but_with_cancel, but_try,
);
transforms!(
    ThenBuilder -> ThenBuilder, Some(Phase::Then), Word::Primary, "a `Then`":
    then_map, then_map_async, then_map_with_cancel, then_map_try,
    then_map_try_async,
);
transforms!(
    ThenBuilder -> ThenBuilder, None, Word::And, "an `And`":
    and_map, and_map_async, and_map_with_cancel, and_map_try,
    and_map_try_async,
);

impl<T> ThenBuilder<T> {
    /// Runs the chain and asserts every step of the scenario passed.
    ///
    /// # Panics
    ///
    /// If the run fails, or any recorded step didn't pass. The panic message
    /// lists the whole outcome log.
    pub async fn assert_passed(self) {
        let scenario = self.scenario.clone();
        let result = self.run().await;
        if result.is_err() || !scenario.passed() {
            panic!(
                "Scenario `{}` was expected to pass{}:\n{}",
                scenario.name(),
                result.err().map(|e| format!(", but: {e}")).unwrap_or_default(),
                scenario.report(),
            );
        }
    }

    /// Runs the chain and asserts some step of the scenario failed,
    /// returning the outcomes of the failed steps.
    ///
    /// # Panics
    ///
    /// If every recorded step passed. The panic message lists the whole
    /// outcome log.
    pub async fn assert_failed(self) -> Vec<StepOutcome> {
        let scenario = self.scenario.clone();
        let result = self.run().await;
        let failed = scenario.failed_steps();
        if result.is_ok() && failed.is_empty() {
            panic!(
                "Scenario `{}` was expected to fail, but passed:\n{}",
                scenario.name(),
                scenario.report(),
            );
        }
        failed
    }
}
