// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::Any;
use std::error::Error;
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

use crate::ExecutionCanceled;

/// The result of an execution: either a produced value or a captured failure.
///
/// Strategies inspect outcomes without unwinding or re-wrapping them, so the identity of a
/// captured [`Failure`] survives any number of strategies unchanged.
///
/// # Examples
///
/// ```rust
/// use airbag::Outcome;
///
/// let outcome = Outcome::from_value(42);
/// assert!(outcome.is_success());
/// assert_eq!(outcome.value(), Some(&42));
///
/// let outcome = Outcome::<u32>::from_error(std::io::Error::other("boom"));
/// assert!(outcome.is_failure());
/// assert_eq!(outcome.failure().map(ToString::to_string).as_deref(), Some("boom"));
/// ```
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    /// A value was produced.
    Value(T),

    /// The execution failed.
    Failure(Failure),
}

impl<T> Outcome<T> {
    /// Creates an outcome holding `value`.
    pub fn from_value(value: T) -> Self {
        Self::Value(value)
    }

    /// Creates an outcome holding an already captured failure.
    pub fn from_failure(failure: Failure) -> Self {
        Self::Failure(failure)
    }

    /// Captures `error` as a failed outcome.
    pub fn from_error(error: impl Error + Send + Sync + 'static) -> Self {
        Self::Failure(Failure::new(error))
    }

    /// Converts a `Result` into an outcome, capturing the error side.
    pub fn from_result<E>(result: Result<T, E>) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        match result {
            Ok(value) => Self::Value(value),
            Err(error) => Self::from_error(error),
        }
    }

    /// Returns `true` when the outcome holds a value.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Returns `true` when the outcome holds a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Returns the value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Returns the failure, if any.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Value(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    /// Consumes the outcome and returns the value, if any.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Consumes the outcome and converts it into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the captured [`Failure`] when the outcome is not a success.
    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Failure(failure) => Err(failure),
        }
    }

    /// Returns a borrowed view of this outcome.
    ///
    /// The failure side is shared, not copied.
    pub fn as_ref(&self) -> Outcome<&T> {
        match self {
            Self::Value(value) => Outcome::Value(value),
            Self::Failure(failure) => Outcome::Failure(failure.clone()),
        }
    }

    /// Maps the value with `f`, leaving a failure untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Value(value) => Outcome::Value(f(value)),
            Self::Failure(failure) => Outcome::Failure(failure),
        }
    }
}

impl<T: Any> Outcome<T> {
    /// Returns an untyped view of this outcome where the value is up-cast to [`Any`].
    pub fn as_untyped(&self) -> Outcome<&dyn Any> {
        match self {
            Self::Value(value) => Outcome::Value(value as &dyn Any),
            Self::Failure(failure) => Outcome::Failure(failure.clone()),
        }
    }
}

impl<T> From<Failure> for Outcome<T> {
    fn from(failure: Failure) -> Self {
        Self::Failure(failure)
    }
}

impl<T> From<Outcome<T>> for Result<T, Failure> {
    fn from(outcome: Outcome<T>) -> Self {
        outcome.into_result()
    }
}

/// A captured failure.
///
/// `Failure` is a cheaply cloneable handle to a shared error. Clones refer to the same
/// underlying error, which can be observed with [`Failure::ptr_eq`].
#[derive(Clone)]
pub struct Failure(Arc<dyn Error + Send + Sync + 'static>);

impl Failure {
    /// Captures `error`.
    pub fn new(error: impl Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(error))
    }

    /// Returns `true` when both handles refer to the same captured error.
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.0, &other.0)
    }

    /// Returns `true` when the captured error is of type `E`.
    #[must_use]
    pub fn is<E: Error + 'static>(&self) -> bool {
        self.0.is::<E>()
    }

    /// Returns the captured error as `E`, if it is of that type.
    #[must_use]
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    /// Returns `true` when this failure represents a cancelled execution.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        self.is::<ExecutionCanceled>()
    }

    /// Returns the captured error.
    #[must_use]
    pub fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.0
    }
}

impl Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Error for Failure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

/// A type-erased value produced by a user callback.
///
/// Strategies carry outcomes of `AnyResult` so that one strategy instance can serve callbacks of
/// any result type. Only the pipeline creates these values; it recovers the original type once
/// the execution completes.
pub struct AnyResult(Box<dyn Any + Send>);

impl AnyResult {
    pub(crate) fn new<T: Send + 'static>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Returns the value as `T`, if it is of that type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Returns `true` when the value is of type `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }

    /// Returns the value up-cast to [`Any`].
    #[must_use]
    pub fn as_any(&self) -> &dyn Any {
        &*self.0
    }

    pub(crate) fn downcast<T: Any>(self) -> Result<T, Self> {
        self.0.downcast::<T>().map(|value| *value).map_err(Self)
    }
}

impl Debug for AnyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyResult").finish_non_exhaustive()
    }
}

impl Outcome<AnyResult> {
    /// Returns the untyped view of a type-erased outcome.
    pub fn erased_view(&self) -> Outcome<&dyn Any> {
        match self {
            Self::Value(value) => Outcome::Value(value.as_any()),
            Self::Failure(failure) => Outcome::Failure(failure.clone()),
        }
    }

    /// Returns a typed view of a type-erased outcome, or `None` when the value is not a `T`.
    pub fn typed_view<T: Any>(&self) -> Option<Outcome<&T>> {
        match self {
            Self::Value(value) => value.downcast_ref::<T>().map(Outcome::Value),
            Self::Failure(failure) => Some(Outcome::Failure(failure.clone())),
        }
    }

    pub(crate) fn cancelled() -> Self {
        Self::Failure(Failure::new(ExecutionCanceled))
    }
}
