// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Composition of strategies into pipelines.

mod builder;
mod composite;
mod descriptor;
mod execution;

pub use builder::PipelineBuilder;
pub use descriptor::{PipelineDescriptor, StrategyDescriptor};
pub use execution::Pipeline;
