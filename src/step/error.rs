// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors of resolving step text against a [`Collection`].
//!
//! [`Collection`]: super::Collection

use std::fmt;

use derive_more::with_trait::Error;
use itertools::Itertools as _;

use super::{location::Location, regex::HashableRegex};

/// Error of a step text matching multiple [`Regex`]es of a [`Collection`].
///
/// [`Collection`]: super::Collection
/// [`Regex`]: regex::Regex
#[derive(Clone, Debug, Error)]
pub struct AmbiguousMatchError {
    /// Possible [`Regex`]es the step text matches, sorted.
    ///
    /// [`Regex`]: regex::Regex
    pub possible_matches: Vec<(HashableRegex, Option<Location>)>,
}

impl AmbiguousMatchError {
    /// Creates a new [`AmbiguousMatchError`], sorting the `possible_matches`
    /// for a deterministic output.
    #[must_use]
    pub fn new(
        possible_matches: impl IntoIterator<
            Item = (HashableRegex, Option<Location>),
        >,
    ) -> Self {
        Self { possible_matches: possible_matches.into_iter().sorted().collect() }
    }

    /// Returns an iterator over the matched patterns.
    pub fn patterns(&self) -> impl Iterator<Item = &str> + '_ {
        self.possible_matches.iter().map(|(re, _)| re.as_str())
    }
}

impl fmt::Display for AmbiguousMatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Possible matches:")?;
        for (re, loc) in &self.possible_matches {
            write!(f, "\n{re}")?;
            if let Some(loc) = loc {
                write!(f, " --> {loc}")?;
            }
        }
        Ok(())
    }
}
