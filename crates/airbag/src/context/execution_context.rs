// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;

use tick::Clock;
use tokio_util::sync::CancellationToken;

use super::ResilienceProperties;

/// Per-call state threaded through every strategy of a pipeline.
///
/// A context carries the cancellation signal, the clock used for all timing, a bag of custom
/// properties and an optional operation key used to correlate telemetry. Contexts are usually
/// rented from a [`ContextPool`][crate::ContextPool] and returned once the call completes.
///
/// # Examples
///
/// ```rust
/// use airbag::ExecutionContext;
/// use tick::Clock;
///
/// let clock = Clock::new_frozen();
/// let mut context = ExecutionContext::new(&clock);
/// context.set_operation_key("get_user");
///
/// assert_eq!(context.operation_key(), Some("get_user"));
/// assert!(!context.is_cancelled());
/// ```
#[derive(Debug)]
pub struct ExecutionContext {
    cancellation_token: CancellationToken,
    is_synchronous: bool,
    continue_on_captured_context: bool,
    operation_key: Option<Cow<'static, str>>,
    properties: ResilienceProperties,
    clock: Clock,
}

impl ExecutionContext {
    /// Creates a context with a fresh cancellation token.
    #[must_use]
    pub fn new(clock: &Clock) -> Self {
        Self {
            cancellation_token: CancellationToken::new(),
            is_synchronous: false,
            continue_on_captured_context: false,
            operation_key: None,
            properties: ResilienceProperties::default(),
            clock: clock.clone(),
        }
    }

    /// The cancellation token observed by strategies and the user callback.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    /// Replaces the cancellation token.
    pub fn set_cancellation_token(&mut self, token: CancellationToken) {
        self.cancellation_token = token;
    }

    /// Returns `true` when cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    /// Returns `true` when the execution was started from a blocking call site.
    #[must_use]
    pub fn is_synchronous(&self) -> bool {
        self.is_synchronous
    }

    /// Marks the execution as started from a blocking call site.
    pub fn set_synchronous(&mut self, is_synchronous: bool) {
        self.is_synchronous = is_synchronous;
    }

    /// Returns whether continuations should resume on the captured execution context.
    #[must_use]
    pub fn continue_on_captured_context(&self) -> bool {
        self.continue_on_captured_context
    }

    /// Sets whether continuations should resume on the captured execution context.
    pub fn set_continue_on_captured_context(&mut self, value: bool) {
        self.continue_on_captured_context = value;
    }

    /// The key of the operation, used for correlation in telemetry.
    #[must_use]
    pub fn operation_key(&self) -> Option<&str> {
        self.operation_key.as_deref()
    }

    /// Sets the key of the operation.
    pub fn set_operation_key(&mut self, key: impl Into<Cow<'static, str>>) {
        self.operation_key = Some(key.into());
    }

    /// The custom properties of this execution.
    #[must_use]
    pub fn properties(&self) -> &ResilienceProperties {
        &self.properties
    }

    /// The custom properties of this execution, mutably.
    pub fn properties_mut(&mut self) -> &mut ResilienceProperties {
        &mut self.properties
    }

    /// The clock used for all timing within this execution.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub(crate) fn replace_cancellation_token(&mut self, token: CancellationToken) -> CancellationToken {
        std::mem::replace(&mut self.cancellation_token, token)
    }

    /// Creates an independently cancellable copy whose token is a child of this one.
    pub(crate) fn fork(&self) -> Self {
        Self {
            cancellation_token: self.cancellation_token.child_token(),
            is_synchronous: self.is_synchronous,
            continue_on_captured_context: self.continue_on_captured_context,
            operation_key: self.operation_key.clone(),
            properties: self.properties.clone(),
            clock: self.clock.clone(),
        }
    }

    pub(crate) fn reset(&mut self, token: CancellationToken) {
        self.cancellation_token = token;
        self.is_synchronous = false;
        self.continue_on_captured_context = false;
        self.operation_key = None;
        self.properties.clear();
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResiliencePropertyKey;

    const KEY: ResiliencePropertyKey<u32> = ResiliencePropertyKey::new("key");

    #[test]
    fn new_context_defaults() {
        let context = ExecutionContext::new(&Clock::new_frozen());

        assert!(!context.is_cancelled());
        assert!(!context.is_synchronous());
        assert!(!context.continue_on_captured_context());
        assert!(context.operation_key().is_none());
        assert!(context.properties().is_empty());
    }

    #[test]
    fn fork_is_independently_cancellable() {
        let mut parent = ExecutionContext::new(&Clock::new_frozen());
        parent.set_operation_key("op");
        parent.properties_mut().set(&KEY, 5);

        let first = parent.fork();
        let second = parent.fork();

        assert_eq!(first.operation_key(), Some("op"));
        assert_eq!(first.properties().get(&KEY), Some(&5));

        first.cancellation_token().cancel();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn fork_observes_parent_cancellation() {
        let parent = ExecutionContext::new(&Clock::new_frozen());
        let child = parent.fork();

        parent.cancellation_token().cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn reset_clears_state() {
        let mut context = ExecutionContext::new(&Clock::new_frozen());
        context.set_operation_key("op");
        context.set_synchronous(true);
        context.set_continue_on_captured_context(true);
        context.properties_mut().set(&KEY, 1);
        context.cancellation_token().cancel();

        context.reset(CancellationToken::new());

        assert!(!context.is_cancelled());
        assert!(!context.is_synchronous());
        assert!(!context.continue_on_captured_context());
        assert!(context.operation_key().is_none());
        assert!(context.properties().is_empty());
    }

    #[test]
    fn replace_cancellation_token_returns_previous() {
        let mut context = ExecutionContext::new(&Clock::new_frozen());
        let original = context.cancellation_token().clone();
        let replacement = CancellationToken::new();

        let previous = context.replace_cancellation_token(replacement.clone());
        previous.cancel();

        assert!(original.is_cancelled());
        assert!(!context.is_cancelled());
    }
}
