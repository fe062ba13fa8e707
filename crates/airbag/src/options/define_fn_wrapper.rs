// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Generates an `Fn` wrapper type stored as `Arc<dyn Fn ...>`, with `Clone` and `Debug`.
///
/// Strategies keep user callbacks (predicates, generators, event handlers) in these wrappers so
/// that options stay cheap to clone and safe to share across threads.
///
/// ```rust,ignore
/// define_fn_wrapper!(OnRetry(Fn(&OnRetryArgs<'_>)));
/// define_fn_wrapper!(DelayGenerator(Fn(&RetryDelayArgs<'_>) -> Option<Duration>));
/// ```
macro_rules! define_fn_wrapper {
    ($name:ident(Fn($($param_name:ident: $param_ty:ty),*) -> $return_ty:ty)) => {
        pub(crate) struct $name(std::sync::Arc<dyn Fn($($param_ty),*) -> $return_ty + Send + Sync>);

        impl $name {
            pub(crate) fn new<F>(f: F) -> Self
            where
                F: Fn($($param_ty),*) -> $return_ty + Send + Sync + 'static,
            {
                Self(std::sync::Arc::new(f))
            }

            pub(crate) fn call(&self, $($param_name: $param_ty),*) -> $return_ty {
                (self.0)($($param_name),*)
            }
        }

        impl Clone for $name {
            fn clone(&self) -> Self {
                Self(std::sync::Arc::clone(&self.0))
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name)).finish()
            }
        }
    };

    ($name:ident(Fn($($param_name:ident: $param_ty:ty),*))) => {
        $crate::options::define_fn_wrapper!($name(Fn($($param_name: $param_ty),*) -> ()));
    };

    ($name:ident(Fn($param1:ty) -> $return_ty:ty)) => {
        $crate::options::define_fn_wrapper!($name(Fn(arg1: $param1) -> $return_ty));
    };

    ($name:ident(Fn($param1:ty))) => {
        $crate::options::define_fn_wrapper!($name(Fn(arg1: $param1) -> ()));
    };
}

pub(crate) use define_fn_wrapper;
