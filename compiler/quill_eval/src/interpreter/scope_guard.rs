//! RAII-style scope guards for block scope management.
//!
//! The [`ScopedInterpreter`] guard pushes a block onto the interpreter's
//! [`LexicalScope`](crate::scope::LexicalScope) and removes it again when
//! dropped, whichever way evaluation leaves the block: normally, through a
//! control signal, with an error, or by panicking.
//!
//! # Design
//!
//! The guard holds `&mut Interpreter` and implements `Deref`/`DerefMut`, so
//! the block body is evaluated through the guard itself. It records the
//! scope depth on entry and truncates back to it, which also discards any
//! deeper block a failed evaluation left behind.
//!
//! # Usage
//!
//! ```text
//! let mut scoped = interpreter.scoped();
//! scoped.define_variable(&decl);
//! scoped.eval(body)?;
//! // block removed here
//! ```
//!
//! A construct suspended by `yield` takes a [`snapshot`](Interpreter::scope_snapshot)
//! of its block before the guard drops and re-enters it with
//! [`scoped_with`](Interpreter::scoped_with) on resume.

use std::ops::{Deref, DerefMut};

use super::Interpreter;
use crate::scope::BlockScope;

/// RAII guard that removes a block scope on drop.
pub struct ScopedInterpreter<'guard> {
    interpreter: &'guard mut Interpreter,
    depth: usize,
}

impl Drop for ScopedInterpreter<'_> {
    fn drop(&mut self) {
        self.interpreter.scopes.truncate(self.depth);
    }
}

impl Deref for ScopedInterpreter<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for ScopedInterpreter<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl Interpreter {
    /// Enter a fresh block scope, left when the guard drops.
    pub fn scoped(&mut self) -> ScopedInterpreter<'_> {
        self.scoped_with(BlockScope::new())
    }

    /// Re-enter a block scope saved at suspension.
    pub fn scoped_with(&mut self, block: BlockScope) -> ScopedInterpreter<'_> {
        let depth = self.scopes.depth();
        self.scopes.push_block(block);
        ScopedInterpreter {
            interpreter: self,
            depth,
        }
    }

    /// Run `f` inside a fresh block scope.
    pub fn with_block_scope<T, F>(&mut self, f: F) -> T
    where
        F: FnOnce(&mut ScopedInterpreter<'_>) -> T,
    {
        let mut scoped = self.scoped();
        f(&mut scoped)
    }

    /// Copy of the innermost block, kept in a suspension record.
    pub(crate) fn scope_snapshot(&self) -> BlockScope {
        self.scopes.innermost().clone()
    }
}
