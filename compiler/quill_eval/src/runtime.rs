//! Collaborators shared by every interpreter of one evaluation.
//!
//! A `Runtime` is cloned into child interpreters, closures and generators;
//! every field is either a plain value or an `Arc`, so cloning is cheap.

use std::sync::Arc;

use crate::dispatch::MemoTable;
use crate::introspect::{DefaultIntrospector, ValueIntrospector};
use crate::policy::{ArithmeticPolicy, DefaultArithmetic};
use crate::{Context, MapContext, Options};

#[derive(Clone)]
pub struct Runtime {
    pub context: Arc<dyn Context>,
    pub options: Options,
    pub policy: Arc<dyn ArithmeticPolicy>,
    pub introspector: Arc<dyn ValueIntrospector>,
    pub memo: Arc<MemoTable>,
}

impl Runtime {
    /// Runtime with default collaborators around `context`.
    pub fn new(context: Arc<dyn Context>, options: Options) -> Self {
        let policy = Arc::new(DefaultArithmetic::new(options.strict_arithmetic));
        Runtime {
            context,
            options,
            policy,
            introspector: Arc::new(DefaultIntrospector::new()),
            memo: Arc::new(MemoTable::new()),
        }
    }

    /// Whether cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.options.cancel.is_cancelled()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new(Arc::new(MapContext::new()), Options::default())
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("options", &self.options)
            .field("memo", &self.memo)
            .finish_non_exhaustive()
    }
}
