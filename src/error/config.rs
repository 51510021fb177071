// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Misuse errors.
//!
//! These are raised immediately at the call site and never end up in the
//! outcome log.

use derive_more::with_trait::{Display, Error};

use crate::step::AmbiguousMatchError;

/// Misuse of the chain API.
#[derive(Clone, Debug, Display, Error)]
pub enum ConfigError {
    /// No scenario is set in the ambient context.
    #[display(
        "No scenario is set in the ambient context: \
         wrap the test with `ambient::scope()` or call `ambient::set()` \
         inside `ambient::flow()` first"
    )]
    NoAmbientScenario,

    /// Ambient context is modified outside of any ambient flow.
    #[display(
        "Not inside an ambient flow: \
         wrap the code with `ambient::scope()` or `ambient::flow()`"
    )]
    NoAmbientFlow,

    /// No step definition matches the step text.
    #[display("No step definition matches `{keyword} {text}`")]
    UnresolvedStep {
        /// Keyword of the unresolved step.
        #[error(not(source))]
        keyword: String,

        /// Text of the unresolved step.
        text: String,
    },

    /// Step text matches multiple step definitions.
    #[display("Step `{text}` matches multiple step definitions. {source}")]
    AmbiguousStep {
        /// Text of the ambiguous step.
        text: String,

        /// Definitions the text matches.
        source: AmbiguousMatchError,
    },

    /// Step keyword is none of `Given`, `When`, `Then`, `And`, `But` or `*`.
    #[display("Unknown step keyword `{keyword}`")]
    UnknownKeyword {
        /// The unrecognized keyword.
        #[error(not(source))]
        keyword: String,
    },

    /// Chain cannot be built as described.
    #[display("Malformed chain: {reason}")]
    MalformedChain {
        /// What is wrong with the chain.
        #[error(not(source))]
        reason: String,
    },
}

impl ConfigError {
    /// Creates a new [`ConfigError::UnresolvedStep`].
    #[must_use]
    pub fn unresolved(keyword: impl Into<String>, text: impl Into<String>) -> Self {
        Self::UnresolvedStep { keyword: keyword.into(), text: text.into() }
    }

    /// Creates a new [`ConfigError::UnknownKeyword`].
    #[must_use]
    pub fn unknown_keyword(keyword: impl Into<String>) -> Self {
        Self::UnknownKeyword { keyword: keyword.into() }
    }

    /// Creates a new [`ConfigError::MalformedChain`].
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedChain { reason: reason.into() }
    }

    /// Indicates whether this is a [`ConfigError::NoAmbientScenario`].
    #[must_use]
    pub const fn is_no_ambient_scenario(&self) -> bool {
        matches!(self, Self::NoAmbientScenario)
    }

    /// Indicates whether this is a [`ConfigError::NoAmbientFlow`].
    #[must_use]
    pub const fn is_no_ambient_flow(&self) -> bool {
        matches!(self, Self::NoAmbientFlow)
    }

    /// Indicates whether this is a [`ConfigError::MalformedChain`].
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedChain { .. })
    }

    /// Indicates whether this is a [`ConfigError::UnresolvedStep`].
    #[must_use]
    pub const fn is_unresolved(&self) -> bool {
        matches!(self, Self::UnresolvedStep { .. })
    }
}
