// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Failures of a single step.
//!
//! Every failure a step may end with is recorded as a [`StepError`] in the
//! outcome log, whether or not it ends the whole scenario.

use std::{any::Any, error::Error, sync::Arc, time::Duration};

use derive_more::with_trait::Display;

use super::BoxError;

/// Failure of executing a step.
#[derive(Clone, Debug, Display)]
pub enum StepError {
    /// Expectation of a step was not met.
    ///
    /// Raised by a predicate evaluating to `false`, by a callback returning
    /// [`StepError::assertion()`], or by a panicking `assert!`-family macro.
    #[display("{message}")]
    Assertion {
        /// Description of the failed expectation.
        message: String,
    },

    /// Step panicked.
    #[display("Step panicked: {message}")]
    Panic {
        /// The panic message.
        message: String,
    },

    /// Step callback returned an error.
    #[display("{_0}")]
    Failed(Arc<dyn Error + Send + Sync>),

    /// Step didn't complete within the configured timeout.
    #[display("Step timed out after {}", humantime::format_duration(*duration))]
    Timeout {
        /// The timeout that elapsed.
        duration: Duration,
    },

    /// Step was aborted by the external cancellation signal.
    #[display("Step was cancelled")]
    Cancelled,

    /// Carried value is of a different type than the step declared.
    #[display("Carried value is not of the expected type `{expected}`")]
    StateMismatch {
        /// Name of the declared type.
        expected: &'static str,
    },

    /// Step requires a carried value, but none was produced yet.
    #[display("No carried value of type `{expected}` to operate on")]
    MissingState {
        /// Name of the declared type.
        expected: &'static str,
    },

    /// Step was not executed because a previous one failed.
    #[display("Skipped due to previous failure of `{cause}`")]
    Skipped {
        /// Title of the step whose failure stopped the scenario.
        cause: String,
    },
}

impl StepError {
    /// Creates a new [`StepError::Assertion`].
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion { message: message.into() }
    }

    /// Creates a new [`StepError::Failed`] out of any error.
    #[must_use]
    pub fn failed(err: impl Into<BoxError>) -> Self {
        Self::from_boxed(err.into())
    }

    /// Converts a boxed error returned by a step callback, keeping
    /// [`StepError`]s as they are.
    #[must_use]
    pub fn from_boxed(err: BoxError) -> Self {
        match err.downcast::<Self>() {
            Ok(step) => *step,
            Err(other) => Self::Failed(Arc::from(other)),
        }
    }

    /// Converts a panic payload caught while running a step.
    ///
    /// Panics produced by `assert!`, `assert_eq!` and `assert_ne!` without a
    /// custom message are classified as [`StepError::Assertion`].
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload.to_readable_string();
        if message.starts_with("assertion") {
            Self::Assertion { message }
        } else {
            Self::Panic { message }
        }
    }

    /// Indicates whether this is an [`StepError::Assertion`].
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion { .. })
    }

    /// Indicates whether this is a [`StepError::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Indicates whether this is a [`StepError::Timeout`].
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Failed(e) => Some(&**e),
            Self::Assertion { .. }
            | Self::Panic { .. }
            | Self::Timeout { .. }
            | Self::Cancelled
            | Self::StateMismatch { .. }
            | Self::MissingState { .. }
            | Self::Skipped { .. } => None,
        }
    }
}

/// Conversion of panic payloads into readable messages.
pub trait PanicPayloadExt {
    /// Extracts the panic message, if it's a string.
    fn to_readable_string(&self) -> String;
}

impl PanicPayloadExt for dyn Any + Send {
    fn to_readable_string(&self) -> String {
        if let Some(s) = self.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = self.downcast_ref::<&str>() {
            (*s).to_owned()
        } else {
            "Unknown panic payload".to_owned()
        }
    }
}
