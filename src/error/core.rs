// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error a scenario run ends with.

use std::{error::Error, sync::Arc};

use derive_more::with_trait::Display;

use crate::step::Phase;

use super::{ConfigError, StepError};

/// The first fatal failure of a scenario run.
///
/// The outcome log of the [`ScenarioRecord`] holds the full step-by-step
/// detail regardless.
///
/// [`ScenarioRecord`]: crate::ScenarioRecord
#[derive(Clone, Debug, Display)]
pub enum ScenarioError {
    /// Step failed and the scenario doesn't continue on errors.
    #[display("{phase} step `{title}` failed: {source}")]
    StepFailed {
        /// [`Phase`] of the failed step.
        phase: Phase,

        /// Title of the failed step.
        title: String,

        /// The recorded failure.
        source: Arc<StepError>,
    },

    /// Assertion failed and the scenario halts on failed assertions.
    #[display("Assertion failed in {phase} step `{title}`: {source}")]
    AssertionFailed {
        /// [`Phase`] of the failed step.
        phase: Phase,

        /// Title of the failed step.
        title: String,

        /// The recorded failure.
        source: Arc<StepError>,
    },

    /// Run was aborted by the external cancellation signal.
    #[display(
        "Scenario was cancelled{}",
        step.as_ref().map(|t| format!(" during step `{t}`")).unwrap_or_default(),
    )]
    Cancelled {
        /// Title of the step in flight, if any.
        step: Option<String>,
    },

    /// Chain was misused.
    #[display("Configuration error: {_0}")]
    Config(ConfigError),
}

/// Result type alias using [`ScenarioError`].
pub type Result<T> = std::result::Result<T, ScenarioError>;

impl ScenarioError {
    /// Returns the [`StepError`] which caused this one, if any.
    #[must_use]
    pub fn step_error(&self) -> Option<&StepError> {
        match self {
            Self::StepFailed { source, .. }
            | Self::AssertionFailed { source, .. } => Some(&**source),
            Self::Cancelled { .. } | Self::Config(_) => None,
        }
    }

    /// Returns the title of the step this error relates to, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::StepFailed { title, .. }
            | Self::AssertionFailed { title, .. } => Some(title.as_str()),
            Self::Cancelled { step } => step.as_deref(),
            Self::Config(_) => None,
        }
    }

    /// Indicates whether this is a [`ScenarioError::AssertionFailed`], or a
    /// [`ScenarioError::StepFailed`] caused by an assertion.
    #[must_use]
    pub fn is_assertion(&self) -> bool {
        self.step_error().is_some_and(StepError::is_assertion)
    }

    /// Indicates whether this is a [`ScenarioError::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl Error for ScenarioError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StepFailed { source, .. }
            | Self::AssertionFailed { source, .. } => Some(&**source),
            Self::Config(e) => Some(e),
            Self::Cancelled { .. } => None,
        }
    }
}

impl From<ConfigError> for ScenarioError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_phase_and_title() {
        let err = ScenarioError::StepFailed {
            phase: Phase::When,
            title: "I divide by zero".into(),
            source: Arc::new(StepError::Panic { message: "boom".into() }),
        };

        assert_eq!(
            err.to_string(),
            "When step `I divide by zero` failed: Step panicked: boom",
        );
        assert_eq!(err.title(), Some("I divide by zero"));
        assert!(!err.is_assertion());
        assert!(err.source().is_some());
    }

    #[test]
    fn detects_assertions() {
        let err = ScenarioError::AssertionFailed {
            phase: Phase::Then,
            title: "it is four".into(),
            source: Arc::new(StepError::assertion("`it is four` was not met")),
        };

        assert!(err.is_assertion());
        assert!(err.to_string().contains("it is four"));
    }

    #[test]
    fn describes_cancellation() {
        let during = ScenarioError::Cancelled { step: Some("wait".into()) };
        let between = ScenarioError::Cancelled { step: None };

        assert!(during.is_cancelled());
        assert_eq!(during.to_string(), "Scenario was cancelled during step `wait`");
        assert_eq!(between.to_string(), "Scenario was cancelled");
        assert!(between.title().is_none());
    }

    #[test]
    fn wraps_config_errors() {
        let err = ScenarioError::from(ConfigError::NoAmbientScenario);

        assert!(matches!(err, ScenarioError::Config(_)));
        assert!(err.step_error().is_none());
    }
}
