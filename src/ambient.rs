// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Ambient "current" [`Scenario`] of an execution flow.
//!
//! The slot is local to the task running a [`scope()`] or a [`flow()`], so
//! scenarios running concurrently never see each other, even on a
//! multi-threaded runtime. Outside of them there is no slot at all: nothing
//! can be set and [`current()`] is always [`None`].
//!
//! ```rust
//! # use cucumber_chain::{ambient, Scenario};
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let scenario = Scenario::new("Ambient", "Implicit handle");
//! ambient::scope(scenario.clone(), async {
//!     ambient::given("one", || 1)
//!         .unwrap()
//!         .then("it is one", |v: &i32| *v == 1)
//!         .await
//!         .unwrap();
//! })
//! .await;
//!
//! assert!(scenario.passed());
//! # }
//! ```

use std::{cell::RefCell, future::Future};

use tokio_util::sync::CancellationToken;

use crate::{
    error::{BoxError, ConfigError},
    value::Carried,
    GivenBuilder, Scenario,
};

tokio::task_local! {
    static FLOW: RefCell<Option<Scenario>>;
}

/// Accesses the slot of the current flow.
fn with_slot<R>(
    f: impl FnOnce(&RefCell<Option<Scenario>>) -> R,
) -> Result<R, ConfigError> {
    FLOW.try_with(f).map_err(|_| ConfigError::NoAmbientFlow)
}

/// Runs the given future as a new flow with the `scenario` as the ambient
/// one.
pub async fn scope<F: Future>(scenario: Scenario, fut: F) -> F::Output {
    FLOW.scope(RefCell::new(Some(scenario)), fut).await
}

/// Runs the given future as a new flow without an ambient [`Scenario`], to be
/// [`set()`] later on.
pub async fn flow<F: Future>(fut: F) -> F::Output {
    FLOW.scope(RefCell::new(None), fut).await
}

/// Sets the ambient [`Scenario`] of the current flow, returning the previous
/// one.
///
/// # Errors
///
/// [`ConfigError::NoAmbientFlow`] if called outside of a [`scope()`] or a
/// [`flow()`].
pub fn set(scenario: Scenario) -> Result<Option<Scenario>, ConfigError> {
    with_slot(|slot| slot.replace(Some(scenario)))
}

/// Clears the ambient [`Scenario`] of the current flow, returning it.
///
/// # Errors
///
/// [`ConfigError::NoAmbientFlow`] if called outside of a [`scope()`] or a
/// [`flow()`].
pub fn clear() -> Result<Option<Scenario>, ConfigError> {
    with_slot(|slot| slot.borrow_mut().take())
}

/// Returns the ambient [`Scenario`], if any.
#[must_use]
pub fn current() -> Option<Scenario> {
    with_slot(|slot| slot.borrow().clone()).ok().flatten()
}

/// Returns the ambient [`Scenario`].
///
/// # Errors
///
/// [`ConfigError::NoAmbientScenario`] if none is set, or if called outside of
/// any flow.
pub fn require() -> Result<Scenario, ConfigError> {
    current().ok_or(ConfigError::NoAmbientScenario)
}

/// Sets the ambient [`Scenario`] of the current flow until the returned
/// [`AmbientGuard`] is dropped.
///
/// # Errors
///
/// [`ConfigError::NoAmbientFlow`] if called outside of a [`scope()`] or a
/// [`flow()`].
pub fn enter(scenario: Scenario) -> Result<AmbientGuard, ConfigError> {
    set(scenario).map(|previous| AmbientGuard { previous })
}

/// Guard restoring the previous ambient [`Scenario`] on drop.
#[derive(Debug)]
#[must_use = "the ambient scenario is restored once the guard is dropped"]
pub struct AmbientGuard {
    previous: Option<Scenario>,
}

impl Drop for AmbientGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        // The flow may be gone already if the guard outlived it.
        _ = with_slot(|slot| slot.replace(previous));
    }
}

/// Starts a chain on the ambient [`Scenario`].
///
/// # Errors
///
/// [`ConfigError::NoAmbientScenario`] if none is set.
#[track_caller]
pub fn given<U, F>(
    title: impl Into<String>,
    f: F,
) -> Result<GivenBuilder<U>, ConfigError>
where
    U: Carried,
    F: FnOnce() -> U + Send + 'static,
{
    Ok(require()?.given(title, f))
}

/// Starts a chain with an async step on the ambient [`Scenario`].
///
/// # Errors
///
/// [`ConfigError::NoAmbientScenario`] if none is set.
#[track_caller]
pub fn given_async<U, F, Fut>(
    title: impl Into<String>,
    f: F,
) -> Result<GivenBuilder<U>, ConfigError>
where
    U: Carried,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = U> + Send + 'static,
{
    Ok(require()?.given_async(title, f))
}

/// Starts a chain with a cancellation-aware step on the ambient
/// [`Scenario`].
///
/// # Errors
///
/// [`ConfigError::NoAmbientScenario`] if none is set.
#[track_caller]
pub fn given_with_cancel<U, F, Fut>(
    title: impl Into<String>,
    f: F,
) -> Result<GivenBuilder<U>, ConfigError>
where
    U: Carried,
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = U> + Send + 'static,
{
    Ok(require()?.given_with_cancel(title, f))
}

/// Starts a chain with a fallible step on the ambient [`Scenario`].
///
/// # Errors
///
/// [`ConfigError::NoAmbientScenario`] if none is set.
#[track_caller]
pub fn given_try<U, E, F>(
    title: impl Into<String>,
    f: F,
) -> Result<GivenBuilder<U>, ConfigError>
where
    U: Carried,
    E: Into<BoxError> + Send + 'static,
    F: FnOnce() -> Result<U, E> + Send + 'static,
{
    Ok(require()?.given_try(title, f))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name() -> Option<String> {
        current().map(|s| s.name().to_owned())
    }

    #[test]
    fn requires_a_flow() {
        let err = set(Scenario::new("Ambient", "Nowhere")).unwrap_err();

        assert!(err.is_no_ambient_flow());
        assert!(clear().unwrap_err().is_no_ambient_flow());
        assert!(enter(Scenario::new("Ambient", "Nowhere")).is_err());
        assert!(current().is_none());
        assert!(require().unwrap_err().is_no_ambient_scenario());
        assert!(given("x", || 1).is_err());
    }

    #[tokio::test]
    async fn guard_restores_previous() {
        flow(async {
            assert!(require().unwrap_err().is_no_ambient_scenario());
            _ = set(Scenario::new("Ambient", "Outer")).unwrap();

            {
                let _guard = enter(Scenario::new("Ambient", "Inner")).unwrap();
                assert_eq!(name().as_deref(), Some("Inner"));
            }

            assert_eq!(name().as_deref(), Some("Outer"));
            let cleared = clear().unwrap().map(|s| s.name().to_owned());
            assert_eq!(cleared.as_deref(), Some("Outer"));
            assert!(current().is_none());
        })
        .await;
    }

    #[tokio::test]
    async fn nested_scope_shadows_outer() {
        scope(Scenario::new("Ambient", "Outer"), async {
            let inner =
                scope(Scenario::new("Ambient", "Inner"), async { name() }).await;

            assert_eq!(inner.as_deref(), Some("Inner"));
            assert_eq!(name().as_deref(), Some("Outer"));
        })
        .await;

        assert!(current().is_none());
    }
}
