// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Captures of a step text matched by a [`Collection`].
//!
//! [`Collection`]: super::Collection

use std::{fmt::Display, str::FromStr};

use regex::Regex;

use crate::error::StepError;

/// Name of a capturing group inside a [`Regex`].
pub type CaptureName = Option<String>;

/// Context of a step resolved from text.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Context {
    /// Step text the [`Regex`] was matched against.
    pub text: String,

    /// [`Regex`] matches of the [`Context::text`], the whole match first.
    pub matches: Vec<(CaptureName, String)>,
}

impl Context {
    /// Matches the given `text` against the given [`Regex`], returning
    /// [`None`] if it doesn't match.
    #[must_use]
    pub fn capture(re: &Regex, text: &str) -> Option<Self> {
        let captures = re.captures(text)?;
        let matches = re
            .capture_names()
            .zip(captures.iter())
            .map(|(name, m)| {
                (
                    name.map(str::to_owned),
                    m.map(|m| m.as_str().to_owned()).unwrap_or_default(),
                )
            })
            .collect();
        Some(Self { text: text.to_owned(), matches })
    }

    /// Returns the value of a capture group by its index (`0` is the whole
    /// match).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.matches.get(index).map(|(_, value)| value.as_str())
    }

    /// Returns the value of a named capture group.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<&str> {
        self.matches
            .iter()
            .find(|(n, _)| n.as_deref() == Some(name))
            .map(|(_, value)| value.as_str())
    }

    /// Parses the capture group at the given `index` into a `P`.
    ///
    /// # Errors
    ///
    /// If there is no such capture group, or it fails to parse.
    pub fn parse<P>(&self, index: usize) -> Result<P, StepError>
    where
        P: FromStr,
        P::Err: Display,
    {
        let raw = self.get(index).ok_or_else(|| {
            StepError::failed(format!(
                "no capture group {index} in `{}`",
                self.text,
            ))
        })?;
        raw.parse().map_err(|e| {
            StepError::failed(format!(
                "failed to parse capture `{raw}` of `{}`: {e}",
                self.text,
            ))
        })
    }
}
