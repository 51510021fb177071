// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error handling types of this crate.
//!
//! - [`step`] - failures of a single step, recorded in the outcome log
//! - [`config`] - misuse errors, raised immediately
//! - [`core`] - the error a whole scenario run ends with
//!
//! # Example
//!
//! ```rust
//! use cucumber_chain::{Scenario, ScenarioError};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let scenario = Scenario::new("Arithmetic", "Wrong expectation");
//! let err = scenario
//!     .given("one", || 1)
//!     .then("it is two", |v: &i32| *v == 2)
//!     .await
//!     .unwrap_err();
//!
//! assert!(matches!(err, ScenarioError::AssertionFailed { .. }));
//! assert!(err.to_string().contains("it is two"));
//! # }
//! ```

pub mod config;
pub mod core;
pub mod step;

pub use self::{
    config::ConfigError,
    core::{Result, ScenarioError},
    step::{PanicPayloadExt, StepError},
};

/// Boxed error any fallible step callback may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
