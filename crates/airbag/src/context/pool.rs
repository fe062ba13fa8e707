// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Mutex;

use tick::Clock;
use tokio_util::sync::CancellationToken;

use crate::ExecutionContext;
use crate::constants::ERR_POISONED_LOCK;

/// Default number of idle contexts kept by a [`ContextPool`].
pub(crate) const DEFAULT_POOL_CAPACITY: usize = 64;

/// A pool of reusable [`ExecutionContext`] instances.
///
/// Contexts returned with [`ContextPool::put`] are fully reset, so no state leaks between
/// unrelated executions.
///
/// # Examples
///
/// ```rust
/// use airbag::ContextPool;
/// use tick::Clock;
///
/// let pool = ContextPool::new(&Clock::new_frozen());
///
/// let mut context = pool.get();
/// context.set_operation_key("first");
/// pool.put(context);
///
/// let context = pool.get();
/// assert!(context.operation_key().is_none());
/// ```
#[derive(Debug)]
pub struct ContextPool {
    clock: Clock,
    idle: Mutex<Vec<ExecutionContext>>,
    capacity: usize,
}

impl ContextPool {
    /// Creates a pool producing contexts bound to `clock`.
    #[must_use]
    pub fn new(clock: &Clock) -> Self {
        Self::with_capacity(clock, DEFAULT_POOL_CAPACITY)
    }

    /// Creates a pool that keeps at most `capacity` idle contexts.
    #[must_use]
    pub fn with_capacity(clock: &Clock, capacity: usize) -> Self {
        Self {
            clock: clock.clone(),
            idle: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Rents a context with a fresh cancellation token.
    #[must_use]
    pub fn get(&self) -> ExecutionContext {
        self.get_with(CancellationToken::new())
    }

    /// Rents a context observing `token`.
    #[must_use]
    pub fn get_with(&self, token: CancellationToken) -> ExecutionContext {
        let pooled = self.idle.lock().expect(ERR_POISONED_LOCK).pop();

        let mut context = pooled.unwrap_or_else(|| ExecutionContext::new(&self.clock));
        context.set_cancellation_token(token);
        context
    }

    /// Resets `context` and returns it to the pool.
    pub fn put(&self, mut context: ExecutionContext) {
        context.reset(CancellationToken::new());

        let mut idle = self.idle.lock().expect(ERR_POISONED_LOCK);
        if idle.len() < self.capacity {
            idle.push(context);
        }
    }

    #[cfg(test)]
    pub(crate) fn idle_count(&self) -> usize {
        self.idle.lock().expect(ERR_POISONED_LOCK).len()
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResiliencePropertyKey;

    const KEY: ResiliencePropertyKey<&'static str> = ResiliencePropertyKey::new("key");

    #[test]
    fn returned_context_is_reused_and_reset() {
        let pool = ContextPool::new(&Clock::new_frozen());

        let mut context = pool.get();
        context.set_operation_key("op");
        context.set_synchronous(true);
        context.properties_mut().set(&KEY, "value");
        context.cancellation_token().cancel();
        pool.put(context);
        assert_eq!(pool.idle_count(), 1);

        let context = pool.get();
        assert_eq!(pool.idle_count(), 0);
        assert!(context.operation_key().is_none());
        assert!(!context.is_synchronous());
        assert!(context.properties().is_empty());
        assert!(!context.is_cancelled());
    }

    #[test]
    fn get_with_installs_token() {
        let pool = ContextPool::new(&Clock::new_frozen());
        let token = CancellationToken::new();

        let context = pool.get_with(token.clone());
        token.cancel();

        assert!(context.is_cancelled());
    }

    #[test]
    fn capacity_bounds_idle_contexts() {
        let pool = ContextPool::with_capacity(&Clock::new_frozen(), 1);

        let first = pool.get();
        let second = pool.get();
        pool.put(first);
        pool.put(second);

        assert_eq!(pool.idle_count(), 1);
    }
}
