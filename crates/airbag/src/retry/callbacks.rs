// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use super::{OnRetryArgs, RetryDelayArgs};
use crate::options::define_fn_wrapper;

define_fn_wrapper!(DelayGenerator(Fn(&RetryDelayArgs<'_>) -> Option<Duration>));
define_fn_wrapper!(OnRetry(Fn(&OnRetryArgs<'_>)));
