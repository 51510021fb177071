// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Registry of step definitions resolving step text into step bodies.

use std::{collections::HashMap, sync::Arc};

use derive_more::with_trait::Debug;
use futures::future;
use regex::Regex;

use crate::{
    builder::adapt,
    error::{BoxError, ConfigError},
    value::Carried,
};

use super::{
    context::Context, error::AmbiguousMatchError, keyword, location::Location,
    regex::HashableRegex, ExecuteFn, Phase, Word,
};

/// Factory of an [`ExecuteFn`] out of the [`Context`] of a matched step
/// text.
pub type Factory = Arc<dyn Fn(Context) -> ExecuteFn + Send + Sync>;

/// Key of a step definition.
type Key = (HashableRegex, Option<Location>);

/// Step definition matched by [`Collection::find()`].
pub type Found<'me> = (&'me Factory, Option<Location>, Context);

/// Collection of step definitions.
///
/// Every step text has to match with exactly 1 [`Regex`] of its [`Phase`].
#[derive(Clone, Debug, Default)]
pub struct Collection {
    /// Collection of [Given] step definitions.
    ///
    /// [Given]: https://cucumber.io/docs/gherkin/reference#given
    #[debug("{:?}", given.keys().collect::<Vec<_>>())]
    given: HashMap<Key, Factory>,

    /// Collection of [When] step definitions.
    ///
    /// [When]: https://cucumber.io/docs/gherkin/reference#when
    #[debug("{:?}", when.keys().collect::<Vec<_>>())]
    when: HashMap<Key, Factory>,

    /// Collection of [Then] step definitions.
    ///
    /// [Then]: https://cucumber.io/docs/gherkin/reference#then
    #[debug("{:?}", then.keys().collect::<Vec<_>>())]
    then: HashMap<Key, Factory>,
}

impl Collection {
    /// Creates a new empty [`Collection`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a [Given] step definition matching the given `regex`.
    ///
    /// [Given]: https://cucumber.io/docs/gherkin/reference#given
    #[must_use]
    #[track_caller]
    pub fn given<F>(self, regex: Regex, factory: F) -> Self
    where
        F: Fn(Context) -> ExecuteFn + Send + Sync + 'static,
    {
        self.define(Phase::Given, regex, Arc::new(factory), Location::caller())
    }

    /// Adds a [When] step definition matching the given `regex`.
    ///
    /// [When]: https://cucumber.io/docs/gherkin/reference#when
    #[must_use]
    #[track_caller]
    pub fn when<F>(self, regex: Regex, factory: F) -> Self
    where
        F: Fn(Context) -> ExecuteFn + Send + Sync + 'static,
    {
        self.define(Phase::When, regex, Arc::new(factory), Location::caller())
    }

    /// Adds a [Then] step definition matching the given `regex`.
    ///
    /// [Then]: https://cucumber.io/docs/gherkin/reference#then
    #[must_use]
    #[track_caller]
    pub fn then<F>(self, regex: Regex, factory: F) -> Self
    where
        F: Fn(Context) -> ExecuteFn + Send + Sync + 'static,
    {
        self.define(Phase::Then, regex, Arc::new(factory), Location::caller())
    }

    /// Adds a [Given] step definition producing the first carried value out
    /// of the matched text.
    ///
    /// [Given]: https://cucumber.io/docs/gherkin/reference#given
    #[must_use]
    #[track_caller]
    pub fn seed<U, E, F>(self, regex: Regex, f: F) -> Self
    where
        U: Carried,
        E: Into<BoxError> + Send + 'static,
        F: Fn(&Context) -> Result<U, E> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let factory: Factory = Arc::new(move |ctx: Context| {
            let f = Arc::clone(&f);
            adapt::seed(move |_| future::ready(f(&ctx)))
        });
        self.define(Phase::Given, regex, factory, Location::caller())
    }

    /// Adds a step definition of the given [`Phase`] transforming the carried
    /// `T` into a `U`.
    #[must_use]
    #[track_caller]
    pub fn transform<T, U, E, F>(self, phase: Phase, regex: Regex, f: F) -> Self
    where
        T: Carried,
        U: Carried,
        E: Into<BoxError> + Send + 'static,
        F: Fn(T, &Context) -> Result<U, E> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let factory: Factory = Arc::new(move |ctx: Context| {
            let f = Arc::clone(&f);
            adapt::fallible(move |v: T| f(v, &ctx))
        });
        self.define(phase, regex, factory, Location::caller())
    }

    /// Adds a [Then] step definition asserting on the carried `T`.
    ///
    /// The step fails with an assertion naming the matched text when the
    /// predicate evaluates to `false`.
    ///
    /// [Then]: https://cucumber.io/docs/gherkin/reference#then
    #[must_use]
    #[track_caller]
    pub fn assertion<T, F>(self, regex: Regex, f: F) -> Self
    where
        T: Carried,
        F: Fn(&T, &Context) -> bool + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let factory: Factory = Arc::new(move |ctx: Context| {
            let f = Arc::clone(&f);
            let title = ctx.text.clone();
            adapt::predicate(title, move |v: &T| f(v, &ctx))
        });
        self.define(Phase::Then, regex, factory, Location::caller())
    }

    fn define(
        mut self,
        phase: Phase,
        regex: Regex,
        factory: Factory,
        loc: Location,
    ) -> Self {
        _ = self.by_phase_mut(phase).insert((regex.into(), Some(loc)), factory);
        self
    }

    const fn by_phase(&self, phase: Phase) -> &HashMap<Key, Factory> {
        match phase {
            Phase::Given => &self.given,
            Phase::When => &self.when,
            Phase::Then => &self.then,
        }
    }

    fn by_phase_mut(&mut self, phase: Phase) -> &mut HashMap<Key, Factory> {
        match phase {
            Phase::Given => &mut self.given,
            Phase::When => &mut self.when,
            Phase::Then => &mut self.then,
        }
    }

    /// Returns the number of step definitions of the given [`Phase`].
    #[must_use]
    pub fn len(&self, phase: Phase) -> usize {
        self.by_phase(phase).len()
    }

    /// Returns the step definition of the given [`Phase`] matching the given
    /// `text`, if any.
    ///
    /// # Errors
    ///
    /// If the `text` matches multiple [`Regex`]es.
    pub fn find(
        &self,
        phase: Phase,
        text: &str,
    ) -> Result<Option<Found<'_>>, AmbiguousMatchError> {
        let mut matched = self
            .by_phase(phase)
            .iter()
            .filter_map(|((re, loc), factory)| {
                Context::capture(re, text).map(|ctx| (re, *loc, factory, ctx))
            })
            .collect::<Vec<_>>();

        match matched.len() {
            0 => Ok(None),
            1 => Ok(matched.pop().map(|(_, loc, factory, ctx)| (factory, loc, ctx))),
            _ => Err(AmbiguousMatchError::new(
                matched.into_iter().map(|(re, loc, ..)| (re.clone(), loc)),
            )),
        }
    }

    /// Resolves the given step `text` of the given [`Phase`] into a step body.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnresolvedStep`] if no step definition matches.
    /// - [`ConfigError::AmbiguousStep`] if many step definitions match.
    pub fn resolve(
        &self,
        phase: Phase,
        text: &str,
    ) -> Result<ExecuteFn, ConfigError> {
        self.lookup(phase, text).map(|(execute, _)| execute)
    }

    /// Same as [`Collection::resolve()`], also returning where the matched
    /// step definition was registered.
    pub(crate) fn lookup(
        &self,
        phase: Phase,
        text: &str,
    ) -> Result<(ExecuteFn, Option<Location>), ConfigError> {
        let found = self.find(phase, text).map_err(|source| {
            ConfigError::AmbiguousStep { text: text.to_owned(), source }
        })?;
        let (factory, loc, ctx) = found.ok_or_else(|| {
            ConfigError::unresolved(keyword(phase, Word::Primary), text)
        })?;
        tracing::trace!(%phase, text, "resolved step definition");
        Ok((factory(ctx), loc))
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt as _;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::{error::StepError, value};

    fn re(pattern: &str) -> Regex {
        Regex::new(pattern).unwrap_or_else(|e| panic!("invalid regex: {e}"))
    }

    fn collection() -> Collection {
        Collection::new()
            .seed(re(r"^a number (\d+)$"), |ctx| ctx.parse::<i64>(1))
            .transform(Phase::When, re(r"^it is multiplied by (\d+)$"), |v: i64, ctx| {
                ctx.parse::<i64>(1).map(|k| v * k)
            })
            .assertion(re(r"^it equals (\d+)$"), |v: &i64, ctx| {
                ctx.parse::<i64>(1).is_ok_and(|want| *v == want)
            })
    }

    #[tokio::test]
    async fn resolves_typed_definitions() {
        let steps = collection();

        let given = steps.resolve(Phase::Given, "a number 6").unwrap_or_else(|e| panic!("{e}"));
        let when = steps
            .resolve(Phase::When, "it is multiplied by 7")
            .unwrap_or_else(|e| panic!("{e}"));
        let then = steps.resolve(Phase::Then, "it equals 41").unwrap_or_else(|e| panic!("{e}"));

        let token = CancellationToken::new();
        let state = given(None, token.clone()).await.unwrap_or_else(|e| panic!("{e}"));
        let state = when(state, token.clone()).await.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(value::restore::<i64>(state.clone()).ok(), Some(42));

        let err = then(state, token).await.unwrap_err();
        assert_eq!(err.to_string(), "Expectation `it equals 41` was not met");
    }

    #[test]
    fn reports_unresolved_steps() {
        let err = collection().resolve(Phase::When, "a number 6").err();

        assert!(matches!(
            err,
            Some(ConfigError::UnresolvedStep { keyword, text })
                if keyword == "When" && text == "a number 6",
        ));
    }

    #[test]
    fn detects_ambiguity() {
        let steps = collection().given(re(r"^a number .+$"), |_| {
            Box::new(|s, _| async move { Ok(s) }.boxed())
        });

        let err = steps.resolve(Phase::Given, "a number 1").err();

        let Some(ConfigError::AmbiguousStep { source, .. }) = err else {
            panic!("expected ambiguity, got: {err:?}");
        };
        assert_eq!(
            source.patterns().collect::<Vec<_>>(),
            [r"^a number (\d+)$", r"^a number .+$"],
        );
    }

    #[test]
    fn keys_definitions_by_location() {
        let steps = collection().seed(re(r"^a number (\d+)$"), |_| Ok::<_, StepError>(0_i64));

        assert_eq!(steps.len(Phase::Given), 2);
    }
}
