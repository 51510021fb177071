// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Failure policies of a scenario run.

use std::time::Duration;

use smart_default::SmartDefault;

/// Failure policies a [`StepPipeline`] run obeys.
///
/// Can be flattened into a test runner's CLI:
/// ```rust
/// # use clap::Parser;
/// # use cucumber_chain::ScenarioOptions;
/// #[derive(Parser)]
/// struct Cli {
///     #[command(flatten)]
///     scenario: ScenarioOptions,
/// }
///
/// let cli = Cli::parse_from(["test", "--continue-on-error", "--step-timeout", "2s"]);
/// assert!(cli.scenario.continue_on_error);
/// assert!(cli.scenario.halt_on_failed_assertion);
/// ```
///
/// [`StepPipeline`]: crate::StepPipeline
#[derive(Clone, Debug, Eq, PartialEq, SmartDefault, clap::Args)]
#[group(skip)]
pub struct ScenarioOptions {
    /// Keep executing steps after a failed one, leaving the carried value
    /// unchanged.
    #[arg(long, global = true)]
    pub continue_on_error: bool,

    /// Don't stop the scenario on a failed assertion, applying the
    /// `--continue-on-error` policy to it instead.
    #[default(true)]
    #[arg(
        long = "no-halt-on-failed-assertion",
        action = clap::ArgAction::SetFalse,
        global = true,
    )]
    pub halt_on_failed_assertion: bool,

    /// Record every step left after a scenario-ending failure as skipped.
    #[arg(long, global = true)]
    pub mark_remaining_as_skipped: bool,

    /// Maximum duration of a single step.
    ///
    /// Duration is represented in a human-readable format like `1m30s`.
    #[arg(
        long,
        value_name = "duration",
        value_parser = humantime::parse_duration,
        global = true,
    )]
    pub step_timeout: Option<Duration>,
}

impl ScenarioOptions {
    /// Sets [`ScenarioOptions::continue_on_error`].
    #[must_use]
    pub const fn with_continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = enabled;
        self
    }

    /// Sets [`ScenarioOptions::halt_on_failed_assertion`].
    #[must_use]
    pub const fn with_halt_on_failed_assertion(mut self, enabled: bool) -> Self {
        self.halt_on_failed_assertion = enabled;
        self
    }

    /// Sets [`ScenarioOptions::mark_remaining_as_skipped`].
    #[must_use]
    pub const fn with_mark_remaining_as_skipped(mut self, enabled: bool) -> Self {
        self.mark_remaining_as_skipped = enabled;
        self
    }

    /// Sets [`ScenarioOptions::step_timeout`].
    #[must_use]
    pub const fn with_step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.step_timeout = timeout;
        self
    }
}
