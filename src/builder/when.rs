// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [When] stage of a chain.
//!
//! [When]: https://cucumber.io/docs/gherkin/reference#when

use std::marker::PhantomData;

use crate::{
    step::{Phase, Word},
    Scenario,
};

use super::{common, effects, predicates, transforms};

/// Chain acting on a carried `T`.
#[must_use = "steps only run once the chain is awaited"]
pub struct WhenBuilder<T> {
    scenario: Scenario,
    _ty: PhantomData<fn() -> T>,
}

common!(WhenBuilder);

transforms!(
    WhenBuilder -> WhenBuilder, Some(Phase::When), Word::Primary, "a `When`":
    when, when_async, when_with_cancel, when_try, when_try_async,
);
effects!(
    WhenBuilder -> WhenBuilder, Some(Phase::When), Word::Primary, "a `When`":
    when_do, when_do_async,
);
transforms!(
    WhenBuilder -> WhenBuilder, None, Word::And, "an `And`":
    and, and_async, and_with_cancel, and_try, and_try_async,
);
effects!(
    WhenBuilder -> WhenBuilder, None, Word::And, "an `And`":
    and_do, and_do_async,
);
transforms!(
    WhenBuilder -> WhenBuilder, None, Word::But, "a `But`":
    but, but_async, but_with_cancel, but_try, but_try_async,
);
effects!(
    WhenBuilder -> WhenBuilder, None, Word::But, "a `But`":
    but_do, but_do_async,
);
predicates!(
    WhenBuilder, Some(Phase::Then), Word::Primary, "a `Then`":
    then, then_async, then_with_cancel, then_try,
);
