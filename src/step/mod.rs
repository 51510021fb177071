// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Definitions of deferred [`Step`]s and the ways of resolving them from
//! text.
//!
//! - [`collection`]: [`Regex`]-keyed [`Collection`] resolving step text into
//!   [`ExecuteFn`]s.
//! - [`context`]: captures of a matched step text.
//! - [`error`]: errors of step text matching.
//! - [`location`]: source locations of declared steps.
//! - [`regex`]: hashable [`Regex`] wrapper.
//!
//! [`Regex`]: ::regex::Regex

pub mod collection;
pub mod context;
pub mod error;
pub mod location;
pub mod regex;

use derive_more::with_trait::{Debug, Display};
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::{error::{ConfigError, StepError}, value::Value};

pub use self::{
    collection::Collection,
    context::Context,
    error::AmbiguousMatchError,
    location::Location,
    regex::HashableRegex,
};

/// [`Future`] returned by an [`ExecuteFn`].
pub type StepFuture = BoxFuture<'static, Result<Option<Value>, StepError>>;

/// Canonical body of a [`Step`]: takes the previous carried state and a
/// step-scoped cancellation token, and resolves into the next carried state.
pub type ExecuteFn =
    Box<dyn FnOnce(Option<Value>, CancellationToken) -> StepFuture + Send>;

/// Deferred cleanup callback receiving the carried state snapshot.
pub type FinallyFn = Box<
    dyn FnOnce(Option<Value>) -> BoxFuture<'static, Result<(), StepError>>
        + Send,
>;

/// Coarse-grained role of a [`Step`].
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub enum Phase {
    /// [Given] step, arranging the initial state.
    ///
    /// [Given]: https://cucumber.io/docs/gherkin/reference#given
    #[default]
    Given,

    /// [When] step, acting on the carried state.
    ///
    /// [When]: https://cucumber.io/docs/gherkin/reference#when
    When,

    /// [Then] step, asserting on the carried state.
    ///
    /// [Then]: https://cucumber.io/docs/gherkin/reference#then
    Then,
}

impl From<gherkin::StepType> for Phase {
    fn from(ty: gherkin::StepType) -> Self {
        match ty {
            gherkin::StepType::Given => Self::Given,
            gherkin::StepType::When => Self::When,
            gherkin::StepType::Then => Self::Then,
        }
    }
}

/// Connective a [`Step`] was declared with.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub enum Word {
    /// The phase keyword itself (`Given`, `When` or `Then`).
    #[default]
    Primary,

    /// `And` continuation of the previous phase.
    And,

    /// `But` continuation of the previous phase.
    But,
}

/// Returns the keyword a [`Step`] of the given [`Phase`] and [`Word`] is
/// displayed with.
#[must_use]
pub const fn keyword(phase: Phase, word: Word) -> &'static str {
    match (word, phase) {
        (Word::And, _) => "And",
        (Word::But, _) => "But",
        (Word::Primary, Phase::Given) => "Given",
        (Word::Primary, Phase::When) => "When",
        (Word::Primary, Phase::Then) => "Then",
    }
}

/// Parses a step keyword, returning its explicit [`Phase`] (if any) and
/// [`Word`].
///
/// `And`, `But` and `*` have no phase of their own and inherit the previous
/// one.
///
/// # Errors
///
/// [`ConfigError::UnknownKeyword`] if the `keyword` is none of the above.
pub fn parse_keyword(keyword: &str) -> Result<(Option<Phase>, Word), ConfigError> {
    let trimmed = keyword.trim();
    Ok(match trimmed.to_ascii_lowercase().as_str() {
        "given" => (Some(Phase::Given), Word::Primary),
        "when" => (Some(Phase::When), Word::Primary),
        "then" => (Some(Phase::Then), Word::Primary),
        "and" | "*" => (None, Word::And),
        "but" => (None, Word::But),
        _ => return Err(ConfigError::unknown_keyword(trimmed)),
    })
}

/// What running a [`Step`] does.
pub(crate) enum Body {
    /// Computes the next carried state.
    Execute(ExecuteFn),

    /// Passes the carried state through and registers a cleanup handler
    /// receiving its snapshot.
    Finally(FinallyFn),
}

/// Single deferred step of a chain.
#[derive(Debug)]
pub struct Step {
    /// [`Phase`] of this [`Step`].
    pub phase: Phase,

    /// [`Word`] this [`Step`] was declared with.
    pub word: Word,

    /// Title as declared, possibly blank.
    pub title: String,

    /// Where this [`Step`] was declared, if known.
    pub location: Option<Location>,

    #[debug(ignore)]
    pub(crate) body: Body,
}

impl Step {
    /// Creates a new [`Step`] computing the next carried state with the
    /// given `execute` function.
    #[must_use]
    pub fn new(
        phase: Phase,
        word: Word,
        title: impl Into<String>,
        execute: ExecuteFn,
    ) -> Self {
        Self {
            phase,
            word,
            title: title.into(),
            location: None,
            body: Body::Execute(execute),
        }
    }

    /// Creates a new pass-through [`Step`] registering the given cleanup
    /// `handler`.
    #[must_use]
    pub(crate) fn finally(
        phase: Phase,
        title: impl Into<String>,
        handler: FinallyFn,
    ) -> Self {
        Self {
            phase,
            word: Word::And,
            title: title.into(),
            location: None,
            body: Body::Finally(handler),
        }
    }

    /// Attaches the given [`Location`] to this [`Step`].
    #[must_use]
    pub fn at(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    /// Returns the keyword this [`Step`] is displayed with.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        keyword(self.phase, self.word)
    }

    /// Returns the title this [`Step`] is displayed with, falling back to the
    /// [`Phase`] name when blank.
    #[must_use]
    pub fn display_title(&self) -> String {
        display_title(self.phase, &self.title)
    }
}

/// Returns the given `title`, or the [`Phase`] name if it's blank.
pub(crate) fn display_title(phase: Phase, title: &str) -> String {
    if title.trim().is_empty() {
        phase.to_string()
    } else {
        title.to_owned()
    }
}
