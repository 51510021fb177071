// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Adapters of typed callbacks into type-erased step bodies.
//!
//! Every callback shape collapses into [`transform()`], which restores the
//! carried value right before calling user code and erases the result right
//! after it.

use std::{convert::Infallible, future::Future};

use futures::{future, FutureExt as _};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{BoxError, StepError},
    step::{ExecuteFn, FinallyFn},
    value::{self, Carried},
};

/// Canonical adapter: `(T, CancellationToken) -> Future<Result<U, E>>`.
pub(crate) fn transform<T, U, E, F, Fut>(f: F) -> ExecuteFn
where
    T: Carried,
    U: Carried,
    E: Into<BoxError>,
    F: FnOnce(T, CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<U, E>> + Send + 'static,
{
    Box::new(move |state, token| {
        async move {
            let input = value::restore::<T>(state)?;
            let output = f(input, token).await.map_err(StepError::failed)?;
            Ok(Some(value::erase(output)))
        }
        .boxed()
    })
}

/// Adapter of a step producing the first carried value, ignoring the
/// previous one.
pub(crate) fn seed<U, E, F, Fut>(f: F) -> ExecuteFn
where
    U: Carried,
    E: Into<BoxError>,
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<U, E>> + Send + 'static,
{
    Box::new(move |_, token| {
        async move {
            let output = f(token).await.map_err(StepError::failed)?;
            Ok(Some(value::erase(output)))
        }
        .boxed()
    })
}

pub(crate) fn sync<T, U, F>(f: F) -> ExecuteFn
where
    T: Carried,
    U: Carried,
    F: FnOnce(T) -> U + Send + 'static,
{
    transform(move |v, _| future::ready(Ok::<_, Infallible>(f(v))))
}

pub(crate) fn fallible<T, U, E, F>(f: F) -> ExecuteFn
where
    T: Carried,
    U: Carried,
    E: Into<BoxError> + Send + 'static,
    F: FnOnce(T) -> Result<U, E> + Send + 'static,
{
    transform(move |v, _| future::ready(f(v)))
}

pub(crate) fn infallible<T, U, F, Fut>(f: F) -> ExecuteFn
where
    T: Carried,
    U: Carried,
    F: FnOnce(T, CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = U> + Send + 'static,
{
    transform(move |v, token| f(v, token).map(Ok::<_, Infallible>))
}

/// Adapter of a step inspecting the carried value, passing it through as is.
pub(crate) fn effect<T, F>(f: F) -> ExecuteFn
where
    T: Carried,
    F: FnOnce(&T) + Send + 'static,
{
    Box::new(move |state, _| {
        async move {
            value::borrow::<T>(state.as_ref()).map(f)?;
            Ok(state)
        }
        .boxed()
    })
}

/// Async version of [`effect()`], receiving an owned copy of the carried
/// value.
pub(crate) fn effect_async<T, E, F, Fut>(f: F) -> ExecuteFn
where
    T: Carried,
    E: Into<BoxError>,
    F: FnOnce(T, CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
{
    Box::new(move |state, token| {
        async move {
            let input = value::restore::<T>(state.clone())?;
            f(input, token).await.map_err(StepError::failed)?;
            Ok(state)
        }
        .boxed()
    })
}

/// Adapter of a predicate step, failing with an assertion naming the
/// `title` when it evaluates to `false`.
pub(crate) fn predicate<T, F>(title: String, f: F) -> ExecuteFn
where
    T: Carried,
    F: FnOnce(&T) -> bool + Send + 'static,
{
    Box::new(move |state, _| {
        async move {
            if value::borrow::<T>(state.as_ref()).map(f)? {
                Ok(state)
            } else {
                Err(unmet(&title))
            }
        }
        .boxed()
    })
}

pub(crate) fn predicate_async<T, F, Fut>(title: String, f: F) -> ExecuteFn
where
    T: Carried,
    F: FnOnce(T, CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    Box::new(move |state, token| {
        async move {
            let input = value::restore::<T>(state.clone())?;
            if f(input, token).await {
                Ok(state)
            } else {
                Err(unmet(&title))
            }
        }
        .boxed()
    })
}

/// Adapter of a fallible check, whose every error is an assertion failure.
pub(crate) fn check<T, E, F>(f: F) -> ExecuteFn
where
    T: Carried,
    E: Into<BoxError>,
    F: FnOnce(&T) -> Result<(), E> + Send + 'static,
{
    Box::new(move |state, _| {
        async move {
            value::borrow::<T>(state.as_ref())
                .and_then(|v| f(v).map_err(|e| into_assertion(e.into())))?;
            Ok(state)
        }
        .boxed()
    })
}

/// Adapter of a cleanup handler receiving the carried value snapshot.
pub(crate) fn finally<T, F, Fut>(f: F) -> FinallyFn
where
    T: Carried,
    F: FnOnce(T) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Box::new(move |state| {
        async move {
            f(value::restore::<T>(state)?).await;
            Ok(())
        }
        .boxed()
    })
}

/// Error of a predicate step evaluating to `false`.
pub(crate) fn unmet(title: &str) -> StepError {
    StepError::assertion(format!("Expectation `{title}` was not met"))
}

fn into_assertion(err: BoxError) -> StepError {
    match StepError::from_boxed(err) {
        StepError::Failed(e) => StepError::assertion(e.to_string()),
        other => other,
    }
}
