// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Source locations of declared [`Step`]s.
//!
//! [`Step`]: super::Step

use std::panic;

use derive_more::with_trait::Display;

/// Location in the source code where a [`Step`] was declared.
///
/// Filled automatically by `#[track_caller]` builder methods.
///
/// [`Step`]: super::Step
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("{path}:{line}:{column}")]
pub struct Location {
    /// Path to the file declaring the [`Step`].
    ///
    /// [`Step`]: super::Step
    pub path: &'static str,

    /// Line of the declaration.
    pub line: u32,

    /// Column of the declaration.
    pub column: u32,
}

impl Location {
    /// Creates a new [`Location`] out of its parts.
    #[must_use]
    pub const fn new(path: &'static str, line: u32, column: u32) -> Self {
        Self { path, line, column }
    }

    /// Returns the [`Location`] of the caller of the current
    /// `#[track_caller]` function.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        let loc = panic::Location::caller();
        Self::new(loc.file(), loc.line(), loc.column())
    }

    /// Returns the file name component of the [`Location::path`].
    #[must_use]
    pub fn filename(&self) -> &'static str {
        self.path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.path)
    }

    /// Returns a short `filename:line:column` representation.
    #[must_use]
    pub fn short(&self) -> String {
        format!("{}:{}:{}", self.filename(), self.line, self.column)
    }
}
