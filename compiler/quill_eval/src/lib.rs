//! Quill Eval - embedded evaluation engine for Quill scripts.
//!
//! This crate walks the flat syntax trees produced by `quill_ir` and
//! evaluates them against a host-supplied [`Context`].
//!
//! # Architecture
//!
//! - [`Interpreter`]: tree-walking evaluation over one activation
//! - [`Frame`]: slot storage of a script or lambda activation; closures
//!   capture it by reference
//! - `scope`: block-level declaration tracking on top of frame slots
//! - `dispatch`: operator and call resolution, cached per call site in a
//!   [`MemoTable`](dispatch::MemoTable) keyed by tree and node
//! - `suspension`: per-node resume records that let a [`Generator`]
//!   suspend at a `yield` and resume where it left off
//! - [`ArithmeticPolicy`](policy::ArithmeticPolicy) and
//!   [`ValueIntrospector`](introspect::ValueIntrospector): pluggable
//!   operator semantics and member access
//!
//! # Example
//!
//! ```text
//! let tree = quill_ir::lower(&script, interner)?;
//! let mut interpreter = InterpreterBuilder::new(Arc::new(tree))
//!     .context(Arc::new(MapContext::new().with_var("x", 41)))
//!     .build();
//! let value = interpreter.execute(&[])?;
//! ```

mod closure;
mod context;
mod control;
pub mod diagnostics;
pub mod dispatch;
pub mod errors;
mod frame;
mod generator;
pub mod interpreter;
pub mod introspect;
mod options;
pub mod policy;
mod runtime;
pub mod scope;
pub mod suspension;
mod tracing_setup;
mod value;

#[cfg(test)]
mod tests;

pub use closure::Closure;
pub use context::{Context, MapContext};
pub use control::{ControlAction, EvalResult};
pub use errors::{EvalError, EvalErrorKind};
pub use frame::{Frame, FrameRef};
pub use generator::Generator;
pub use interpreter::{Interpreter, InterpreterBuilder, ScopedInterpreter};
pub use options::{CancelToken, Options, DEFAULT_MAX_DEPTH};
pub use runtime::Runtime;
pub use tracing_setup::init_tracing;
pub use value::{
    map_get, map_put, set_add, HostObject, NativeFunction, Shared, SharedMap, SharedSeq, Value,
    ValueIter, ValueIterator, ValueKind,
};
