// orderflow/src/core/context.rs

//! The boxed handler type stored by a pipeline for each step phase.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// A pipeline step handler.
///
/// Receives a clone of the run's `ContextData<TData>` and resolves to the control
/// signal for the pipeline, or to the pipeline's error type `Err`.
///
/// Lock guards taken from the context must be released before the handler awaits.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;
