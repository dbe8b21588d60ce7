// orderflow/src/lib.rs

//! orderflow: a small async engine for running ordered, named steps over a shared context.
//!
//! A use case such as "create an order" is declared as a `Pipeline<TData, Err>`:
//!  - each step has a name, can be optional, and can carry a `skip_if` predicate;
//!  - every step has `before`, `on` and `after` phases holding async handlers;
//!  - a handler either continues, stops the run early, or fails it with `Err`.
//!
//! Handlers share state through `ContextData<TData>`, a cloneable lock around the
//! caller's data. The caller keeps one clone and reads the outcome after `run` returns.

pub mod core;
pub mod error;
pub mod pipeline;

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};
