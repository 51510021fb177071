// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Evaluation of [`TagOperation`]s against the tags of a scenario.

use gherkin::tagexpr::TagOperation;
use sealed::sealed;

/// Extension of a [`TagOperation`] allowing to evaluate it.
#[sealed]
pub trait Ext {
    /// Evaluates this [`TagOperation`] for the given `tags`.
    ///
    /// A leading `@` is insignificant on both sides, so `@smoke` and `smoke`
    /// are the same tag.
    #[must_use]
    fn eval<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone;
}

#[sealed]
impl Ext for TagOperation {
    fn eval<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        match self {
            Self::And(l, r) => l.eval(tags.clone()) && r.eval(tags),
            Self::Or(l, r) => l.eval(tags.clone()) || r.eval(tags),
            Self::Not(t) => !t.eval(tags),
            Self::Tag(t) => {
                let wanted = normalize(t);
                tags.into_iter().any(|tag| normalize(tag.as_ref()) == wanted)
            }
        }
    }
}

/// Strips the optional `@` sigil off the given `tag`.
pub(crate) fn normalize(tag: &str) -> &str {
    let tag = tag.trim();
    tag.strip_prefix('@').unwrap_or(tag)
}
