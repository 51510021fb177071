// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Type-erased carried values.
//!
//! A [`StepPipeline`] threads one opaque [`Value`] from step to step. Typed
//! builders are the only place converting it back into a concrete type, right
//! where a step receives its input.
//!
//! [`StepPipeline`]: crate::StepPipeline

use std::{any::{self, Any}, sync::Arc};

use crate::error::StepError;

/// Opaque value carried between steps.
///
/// Cloning is cheap and yields a snapshot of the same value, which is what
/// the current-value pointer, the IO log and finally-handlers hold.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Type able to be carried between steps of a chain.
pub trait Carried: Any + Clone + Send + Sync {}

impl<T: Any + Clone + Send + Sync> Carried for T {}

/// Erases the given `value` into a [`Value`].
#[must_use]
pub fn erase<T: Carried>(value: T) -> Value {
    Arc::new(value)
}

/// Borrows the given carried `state` as a `T`.
///
/// # Errors
///
/// - [`StepError::MissingState`] if there is no carried value yet.
/// - [`StepError::StateMismatch`] if the carried value is not a `T`.
pub fn borrow<T: Carried>(state: Option<&Value>) -> Result<&T, StepError> {
    let value = state.ok_or(StepError::MissingState {
        expected: any::type_name::<T>(),
    })?;
    (**value).downcast_ref::<T>().ok_or(StepError::StateMismatch {
        expected: any::type_name::<T>(),
    })
}

/// Restores an owned `T` out of the given carried `state`.
///
/// Clones the value unless this is its last reference. Inside a run that is
/// the usual case, as the IO log keeps a snapshot of every carried value.
///
/// # Errors
///
/// Same as [`borrow()`].
pub fn restore<T: Carried>(state: Option<Value>) -> Result<T, StepError> {
    let value = state.ok_or(StepError::MissingState {
        expected: any::type_name::<T>(),
    })?;
    value
        .downcast::<T>()
        .map(Arc::unwrap_or_clone)
        .map_err(|_| StepError::StateMismatch {
            expected: any::type_name::<T>(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_erasure() {
        let state = Some(erase(vec![1, 2, 3]));

        assert_eq!(borrow::<Vec<i32>>(state.as_ref()).ok(), Some(&vec![1, 2, 3]));
        assert_eq!(restore::<Vec<i32>>(state).ok(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn restoring_leaves_snapshots_intact() {
        let snapshot = erase(vec![1]);

        let mut owned = restore::<Vec<i32>>(Some(Arc::clone(&snapshot))).unwrap();
        owned.push(2);

        assert_eq!(borrow::<Vec<i32>>(Some(&snapshot)).ok(), Some(&vec![1]));
        assert_eq!(owned, [1, 2]);
    }

    #[test]
    fn reports_missing_state() {
        let err = restore::<u8>(None).unwrap_err();

        assert!(matches!(err, StepError::MissingState { expected: "u8" }));
    }

    #[test]
    fn reports_mismatched_type() {
        let err = borrow::<String>(Some(&erase(42_u32))).unwrap_err();

        assert!(
            matches!(err, StepError::StateMismatch { expected } if expected.contains("String")),
        );
    }
}
