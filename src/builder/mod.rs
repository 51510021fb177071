// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Typed front-ends of a [`StepPipeline`].
//!
//! Each builder is parameterized with the type `T` of the value carried at
//! its point of the chain. Every method enqueues a single step and returns
//! a builder of the type the step produces. Nothing runs until the chain is
//! `.await`ed or [`run()`][GivenBuilder::run] explicitly.
//!
//! ```rust
//! # use cucumber_chain::Scenario;
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let scenario = Scenario::new("Arithmetic", "Doubling");
//! scenario
//!     .given("a number", || 2)
//!     .when("it is doubled", |v: i32| v * 2)
//!     .and("it is printed", |v: i32| v.to_string())
//!     .then("it reads `4`", |s: &String| s == "4")
//!     .await
//!     .unwrap();
//!
//! assert_eq!(scenario.current::<String>().as_deref(), Some("4"));
//! # }
//! ```
//!
//! [`StepPipeline`]: crate::StepPipeline

pub(crate) mod adapt;
mod given;
mod then;
mod when;

pub use self::{given::GivenBuilder, then::ThenBuilder, when::WhenBuilder};

/// Implements the methods every builder shares.
macro_rules! common {
    ($builder:ident) => {
        impl<T> $builder<T> {
            pub(crate) const fn new(scenario: $crate::Scenario) -> Self {
                Self { scenario, _ty: ::std::marker::PhantomData }
            }

            /// Returns the [`Scenario`] this chain belongs to.
            ///
            /// [`Scenario`]: crate::Scenario
            #[must_use]
            pub const fn scenario(&self) -> &$crate::Scenario {
                &self.scenario
            }

            /// Runs every pending step of the chain.
            ///
            /// # Errors
            ///
            /// See [`StepPipeline::run()`].
            ///
            /// [`StepPipeline::run()`]: crate::StepPipeline::run
            pub async fn run(self) -> $crate::error::Result<()> {
                self.scenario.run().await
            }

            /// Runs every pending step of the chain, aborting once the given
            /// `cancel` token is triggered.
            ///
            /// # Errors
            ///
            /// See [`StepPipeline::run()`].
            ///
            /// [`StepPipeline::run()`]: crate::StepPipeline::run
            pub async fn run_with_cancel(
                self,
                cancel: ::tokio_util::sync::CancellationToken,
            ) -> $crate::error::Result<()> {
                self.scenario.run_with_cancel(cancel).await
            }
        }

        impl<T: $crate::Carried> $builder<T> {
            /// Registers a cleanup handler receiving the value carried at this
            /// point, once the whole chain is over, whatever its outcome.
            #[track_caller]
            pub fn finally<F>(self, title: impl Into<String>, f: F) -> Self
            where
                F: FnOnce(T) + Send + 'static,
            {
                self.finally_async(title, move |v| {
                    f(v);
                    ::futures::future::ready(())
                })
            }

            /// Registers an async cleanup handler receiving the value carried
            /// at this point, once the whole chain is over, whatever its
            /// outcome.
            #[track_caller]
            pub fn finally_async<F, Fut>(
                self,
                title: impl Into<String>,
                f: F,
            ) -> Self
            where
                F: FnOnce(T) -> Fut + Send + 'static,
                Fut: ::std::future::Future<Output = ()> + Send + 'static,
            {
                self.scenario
                    .push_finally(title.into(), $crate::builder::adapt::finally(f));
                self
            }
        }

        impl<T: 'static> ::std::future::IntoFuture for $builder<T> {
            type Output = $crate::error::Result<()>;
            type IntoFuture =
                ::futures::future::BoxFuture<'static, Self::Output>;

            fn into_future(self) -> Self::IntoFuture {
                ::futures::FutureExt::boxed(self.run())
            }
        }

        impl<T> ::std::fmt::Debug for $builder<T> {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(stringify!($builder))
                    .field("carried", &::std::any::type_name::<T>())
                    .field("scenario", &self.scenario.name())
                    .field("pending", &self.scenario.pending())
                    .finish()
            }
        }
    };
}

/// Implements a family of transform methods for a single connective.
macro_rules! transforms {
    (
        $builder:ident -> $next:ident,
        $phase:expr, $word:expr, $keyword:literal:
        $sync:ident, $async_:ident, $cancel:ident, $try_:ident, $try_async:ident $(,)?
    ) => {
        impl<T: $crate::Carried> $builder<T> {
            #[doc = concat!("Enqueues ", $keyword, " step transforming the carried value.")]
            #[track_caller]
            pub fn $sync<U, F>(self, title: impl Into<String>, f: F) -> $next<U>
            where
                U: $crate::Carried,
                F: FnOnce(T) -> U + Send + 'static,
            {
                self.scenario.push_step($phase, $word, title.into(), |_| {
                    $crate::builder::adapt::sync(f)
                });
                $next::new(self.scenario)
            }

            #[doc = concat!("Enqueues ", $keyword, " step transforming the carried value asynchronously.")]
            #[track_caller]
            pub fn $async_<U, F, Fut>(self, title: impl Into<String>, f: F) -> $next<U>
            where
                U: $crate::Carried,
                F: FnOnce(T) -> Fut + Send + 'static,
                Fut: ::std::future::Future<Output = U> + Send + 'static,
            {
                self.scenario.push_step($phase, $word, title.into(), |_| {
                    $crate::builder::adapt::infallible(move |v, _| f(v))
                });
                $next::new(self.scenario)
            }

            #[doc = concat!("Enqueues ", $keyword, " step transforming the carried value asynchronously, observing cancellation.")]
            #[track_caller]
            pub fn $cancel<U, F, Fut>(self, title: impl Into<String>, f: F) -> $next<U>
            where
                U: $crate::Carried,
                F: FnOnce(T, ::tokio_util::sync::CancellationToken) -> Fut + Send + 'static,
                Fut: ::std::future::Future<Output = U> + Send + 'static,
            {
                self.scenario.push_step($phase, $word, title.into(), |_| {
                    $crate::builder::adapt::infallible(f)
                });
                $next::new(self.scenario)
            }

            #[doc = concat!("Enqueues ", $keyword, " step fallibly transforming the carried value.")]
            #[track_caller]
            pub fn $try_<U, E, F>(self, title: impl Into<String>, f: F) -> $next<U>
            where
                U: $crate::Carried,
                E: Into<$crate::error::BoxError> + Send + 'static,
                F: FnOnce(T) -> Result<U, E> + Send + 'static,
            {
                self.scenario.push_step($phase, $word, title.into(), |_| {
                    $crate::builder::adapt::fallible(f)
                });
                $next::new(self.scenario)
            }

            #[doc = concat!("Enqueues ", $keyword, " step fallibly transforming the carried value asynchronously, observing cancellation.")]
            #[track_caller]
            pub fn $try_async<U, E, F, Fut>(self, title: impl Into<String>, f: F) -> $next<U>
            where
                U: $crate::Carried,
                E: Into<$crate::error::BoxError>,
                F: FnOnce(T, ::tokio_util::sync::CancellationToken) -> Fut + Send + 'static,
                Fut: ::std::future::Future<Output = Result<U, E>> + Send + 'static,
            {
                self.scenario.push_step($phase, $word, title.into(), |_| {
                    $crate::builder::adapt::transform(f)
                });
                $next::new(self.scenario)
            }
        }

    };
}

/// Implements a pair of effect methods for a single connective.
macro_rules! effects {
    (
        $builder:ident -> $next:ident,
        $phase:expr, $word:expr, $keyword:literal:
        $sync:ident, $async_:ident $(,)?
    ) => {
        impl<T: $crate::Carried> $builder<T> {
            #[doc = concat!("Enqueues ", $keyword, " step inspecting the carried value, passing it through.")]
            #[track_caller]
            pub fn $sync<F>(self, title: impl Into<String>, f: F) -> $next<T>
            where
                F: FnOnce(&T) + Send + 'static,
            {
                self.scenario.push_step($phase, $word, title.into(), |_| {
                    $crate::builder::adapt::effect(f)
                });
                $next::new(self.scenario)
            }

            #[doc = concat!("Enqueues ", $keyword, " step acting asynchronously on a copy of the carried value, passing it through.")]
            #[track_caller]
            pub fn $async_<E, F, Fut>(self, title: impl Into<String>, f: F) -> $next<T>
            where
                E: Into<$crate::error::BoxError>,
                F: FnOnce(T, ::tokio_util::sync::CancellationToken) -> Fut + Send + 'static,
                Fut: ::std::future::Future<Output = Result<(), E>> + Send + 'static,
            {
                self.scenario.push_step($phase, $word, title.into(), |_| {
                    $crate::builder::adapt::effect_async(f)
                });
                $next::new(self.scenario)
            }
        }
    };
}

/// Implements a family of predicate methods for a single connective.
macro_rules! predicates {
    (
        $builder:ident, $phase:expr, $word:expr, $keyword:literal:
        $sync:ident, $async_:ident, $cancel:ident, $try_:ident $(,)?
    ) => {
        impl<T: $crate::Carried> $builder<T> {
            #[doc = concat!("Enqueues ", $keyword, " step asserting the predicate holds for the carried value.")]
            #[track_caller]
            pub fn $sync<F>(self, title: impl Into<String>, f: F) -> $crate::ThenBuilder<T>
            where
                F: FnOnce(&T) -> bool + Send + 'static,
            {
                self.scenario.push_step($phase, $word, title.into(), |t| {
                    $crate::builder::adapt::predicate(t.to_owned(), f)
                });
                $crate::ThenBuilder::new(self.scenario)
            }

            #[doc = concat!("Enqueues ", $keyword, " step asserting the async predicate holds for the carried value.")]
            #[track_caller]
            pub fn $async_<F, Fut>(self, title: impl Into<String>, f: F) -> $crate::ThenBuilder<T>
            where
                F: FnOnce(T) -> Fut + Send + 'static,
                Fut: ::std::future::Future<Output = bool> + Send + 'static,
            {
                self.scenario.push_step($phase, $word, title.into(), |t| {
                    $crate::builder::adapt::predicate_async(t.to_owned(), move |v, _| f(v))
                });
                $crate::ThenBuilder::new(self.scenario)
            }

            #[doc = concat!("Enqueues ", $keyword, " step asserting the async predicate holds for the carried value, observing cancellation.")]
            #[track_caller]
            pub fn $cancel<F, Fut>(self, title: impl Into<String>, f: F) -> $crate::ThenBuilder<T>
            where
                F: FnOnce(T, ::tokio_util::sync::CancellationToken) -> Fut + Send + 'static,
                Fut: ::std::future::Future<Output = bool> + Send + 'static,
            {
                self.scenario.push_step($phase, $word, title.into(), |t| {
                    $crate::builder::adapt::predicate_async(t.to_owned(), f)
                });
                $crate::ThenBuilder::new(self.scenario)
            }

            #[doc = concat!("Enqueues ", $keyword, " step running a fallible check of the carried value. Every error it returns is an assertion failure.")]
            #[track_caller]
            pub fn $try_<E, F>(self, title: impl Into<String>, f: F) -> $crate::ThenBuilder<T>
            where
                E: Into<$crate::error::BoxError>,
                F: FnOnce(&T) -> Result<(), E> + Send + 'static,
            {
                self.scenario.push_step($phase, $word, title.into(), |_| {
                    $crate::builder::adapt::check(f)
                });
                $crate::ThenBuilder::new(self.scenario)
            }
        }
    };
}

pub(crate) use {common, effects, predicates, transforms};
