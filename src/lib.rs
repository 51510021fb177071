// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Deferred, typed [Given/When/Then] step chains.
//!
//! A [`Scenario`] collects steps composed through typed builders, each one
//! transforming or inspecting a value carried from step to step. Nothing
//! runs until the chain is `.await`ed: then the steps execute one by one,
//! every outcome is recorded into the [`ScenarioRecord`], and the run ends
//! with the first fatal failure according to the [`ScenarioOptions`].
//!
//! ```rust
//! use cucumber_chain::{Scenario, StepStatus};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let scenario = Scenario::builder("Arithmetic", "Doubling")
//!     .tag("smoke")
//!     .build();
//!
//! scenario
//!     .given("a number", || 2)
//!     .when("it is doubled", |v: i32| v * 2)
//!     .then("it is four", |v: &i32| *v == 4)
//!     .await
//!     .unwrap();
//!
//! assert_eq!(scenario.current::<i32>(), Some(4));
//! assert!(scenario.outcomes().iter().all(|o| o.status == StepStatus::Passed));
//! # }
//! ```
//!
//! [Given/When/Then]: https://cucumber.io/docs/gherkin/reference#steps

#![deny(nonstandard_style, rustdoc::all, trivial_casts, trivial_numeric_casts)]
#![forbid(non_ascii_idents, unsafe_code)]
#![warn(
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::missing_const_for_fn,
    clippy::mutex_atomic,
    clippy::needless_collect,
    clippy::print_stderr,
    clippy::print_stdout,
    clippy::str_to_string,
    clippy::todo,
    clippy::unwrap_used,
    clippy::use_debug,
    future_incompatible,
    let_underscore_drop,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    unused_results
)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod ambient;
pub mod builder;
pub mod error;
pub mod observer;
pub mod pipeline;
pub mod scenario;
pub mod step;
pub mod tag;
pub mod value;

#[doc(no_inline)]
pub use gherkin;
#[doc(no_inline)]
pub use tokio_util::sync::CancellationToken;

pub use self::{
    builder::{GivenBuilder, ThenBuilder, WhenBuilder},
    error::{BoxError, ConfigError, ScenarioError, StepError},
    observer::{ScenarioObserver, StepObserver},
    pipeline::StepPipeline,
    scenario::{
        Scenario, ScenarioBuilder, ScenarioInfo, ScenarioOptions,
        ScenarioRecord, StepInfo, StepIo, StepOutcome, StepStatus, TraitSink,
    },
    step::{Collection, Context, Location, Phase, Step, Word},
    value::{Carried, Value},
};
