// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [Given] stage of a chain.
//!
//! [Given]: https://cucumber.io/docs/gherkin/reference#given

use std::marker::PhantomData;

use crate::{
    step::{Phase, Word},
    Scenario,
};

use super::{common, effects, predicates, transforms, WhenBuilder};

/// Chain arranging the initial state, carrying a `T`.
///
/// Created by [`Scenario::given()`] and its variants.
#[must_use = "steps only run once the chain is awaited"]
pub struct GivenBuilder<T> {
    scenario: Scenario,
    _ty: PhantomData<fn() -> T>,
}

common!(GivenBuilder);

transforms!(
    GivenBuilder -> GivenBuilder, None, Word::And, "an `And`":
    and, and_async, and_with_cancel, and_try, and_try_async,
);
effects!(
    GivenBuilder -> GivenBuilder, None, Word::And, "an `And`":
    and_do, and_do_async,
);
transforms!(
    GivenBuilder -> GivenBuilder, None, Word::But, "a `But`":
    but, but_async, but_with_cancel, but_try, but_try_async,
);
effects!(
    GivenBuilder -> GivenBuilder, None, Word::But, "a `But`":
    but_do, but_do_async,
);
transforms!(
    GivenBuilder -> WhenBuilder, Some(Phase::When), Word::Primary, "a `When`":
    when, when_async, when_with_cancel, when_try, when_try_async,
);
effects!(
    GivenBuilder -> WhenBuilder, Some(Phase::When), Word::Primary, "a `When`":
    when_do, when_do_async,
);
predicates!(
    GivenBuilder, Some(Phase::Then), Word::Primary, "a `Then`":
    then, then_async, then_with_cancel, then_try,
);

#[cfg(test)]
mod tests {
    use crate::{Scenario, StepStatus};

    #[tokio::test]
    async fn inherits_given_phase() {
        let scenario = Scenario::new("Given", "Inherit");

        scenario
            .given("a list", || vec![1])
            .and("with two", |mut v: Vec<i32>| {
                v.push(2);
                v
            })
            .but_do("unsorted", |v: &Vec<i32>| assert!(!v.is_empty()))
            .then("it has two items", |v: &Vec<i32>| v.len() == 2)
            .await
            .unwrap_or_else(|e| panic!("unexpected failure: {e}"));

        let kinds = scenario.outcomes().iter().map(|o| o.kind).collect::<Vec<_>>();
        assert_eq!(kinds, ["Given", "And", "But", "Then"]);
        assert!(scenario
            .outcomes()
            .iter()
            .take(3)
            .all(|o| o.phase == crate::Phase::Given && o.status == StepStatus::Passed));
    }

    #[tokio::test]
    async fn records_call_site() {
        let scenario = Scenario::new("Given", "Location");
        let line = line!() + 1;
        let chain = scenario.given("here", || ());
        chain.await.unwrap_or_else(|e| panic!("unexpected failure: {e}"));

        let loc = scenario.outcomes()[0].location;
        assert_eq!(loc.map(|l| l.line), Some(line));
        assert_eq!(loc.map(|l| l.filename()), Some("given.rs"));
    }
}
