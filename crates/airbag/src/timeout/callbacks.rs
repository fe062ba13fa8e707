// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use super::{OnTimeoutArgs, TimeoutGeneratorArgs};
use crate::options::define_fn_wrapper;

define_fn_wrapper!(TimeoutGenerator(Fn(&TimeoutGeneratorArgs<'_>) -> Duration));
define_fn_wrapper!(OnTimeout(Fn(&OnTimeoutArgs<'_>)));
