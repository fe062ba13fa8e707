// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::Any;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::marker::PhantomData;
use std::sync::Arc;

/// A typed key into [`ResilienceProperties`].
///
/// # Examples
///
/// ```rust
/// use airbag::{ResilienceProperties, ResiliencePropertyKey};
///
/// const TENANT: ResiliencePropertyKey<String> = ResiliencePropertyKey::new("tenant");
///
/// let mut properties = ResilienceProperties::default();
/// properties.set(&TENANT, "contoso".to_string());
/// assert_eq!(properties.get(&TENANT).map(String::as_str), Some("contoso"));
/// ```
pub struct ResiliencePropertyKey<T> {
    key: &'static str,
    _value: PhantomData<fn() -> T>,
}

impl<T> ResiliencePropertyKey<T> {
    /// Creates a key with the given name.
    #[must_use]
    pub const fn new(key: &'static str) -> Self {
        Self { key, _value: PhantomData }
    }

    /// The name of the key.
    #[must_use]
    pub fn key(&self) -> &'static str {
        self.key
    }
}

impl<T> Clone for ResiliencePropertyKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ResiliencePropertyKey<T> {}

impl<T> Debug for ResiliencePropertyKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResiliencePropertyKey").field(&self.key).finish()
    }
}

/// A bag of custom values carried by an [`ExecutionContext`][crate::ExecutionContext].
///
/// Values are stored behind `Arc`, so cloning the bag is shallow.
#[derive(Debug, Clone, Default)]
pub struct ResilienceProperties {
    items: HashMap<&'static str, Arc<dyn Any + Send + Sync>>,
}

impl ResilienceProperties {
    /// Returns the value stored under `key`, if present and of type `T`.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, key: &ResiliencePropertyKey<T>) -> Option<&T> {
        self.items.get(key.key).and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns the value stored under `key`, or `default` when missing.
    #[must_use]
    pub fn get_or<'a, T: Any + Send + Sync>(&'a self, key: &ResiliencePropertyKey<T>, default: &'a T) -> &'a T {
        self.get(key).unwrap_or(default)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set<T: Any + Send + Sync>(&mut self, key: &ResiliencePropertyKey<T>, value: T) {
        self.items.insert(key.key, Arc::new(value));
    }

    /// Removes the value stored under `key`, returning whether one was present.
    pub fn remove<T>(&mut self, key: &ResiliencePropertyKey<T>) -> bool {
        self.items.remove(key.key).is_some()
    }

    /// Returns `true` when a value is stored under `key`.
    #[must_use]
    pub fn contains<T>(&self, key: &ResiliencePropertyKey<T>) -> bool {
        self.items.contains_key(key.key)
    }

    /// The number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when the bag holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Removes all values.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replaces the contents of this bag with a shallow copy of `other`.
    pub fn replace_with(&mut self, other: &Self) {
        self.items.clone_from(&other.items);
    }
}
