//! Error types for evaluation.
//!
//! # Structured Error Categories
//!
//! `EvalErrorKind` provides typed error categories. Factory functions
//! (e.g., `undefined_variable()`) are the public API for creating errors;
//! they are `#[cold]` so the hot evaluation paths stay small.
//!
//! Non-local exits (`return`, `break`, `yield`, ...) are not errors; they
//! travel as [`ControlAction`](crate::ControlAction) variants.


use std::fmt;

use quill_ir::{NodeId, Span};

use crate::Value;

/// What went wrong with a variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VariableIssue {
    /// No declaration, context entry or type resolves the name.
    Undefined,
    /// A null value was assigned to a variable that requires a value.
    Null,
    /// The name is already declared in the same block.
    Redefined,
    /// Assignment to a `const`.
    Final,
}

impl fmt::Display for VariableIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableIssue::Undefined => write!(f, "undefined variable"),
            VariableIssue::Null => write!(f, "null value for variable"),
            VariableIssue::Redefined => write!(f, "variable already defined"),
            VariableIssue::Final => write!(f, "cannot assign final variable"),
        }
    }
}

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalErrorKind {
    // Access
    #[error("{issue} `{name}`")]
    Variable { name: String, issue: VariableIssue },
    #[error("undefined property `{property}`")]
    UndefinedProperty { property: String },
    #[error("unsolvable method `{method}`")]
    UndefinedMethod { method: String },

    // Operators
    #[error("operator `{op}` failed: {cause}")]
    Operator { op: &'static str, cause: String },
    #[error("{message}")]
    Arithmetic { message: String },

    // Calls
    #[error("maximum recursion depth exceeded (limit: {depth})")]
    StackOverflow { depth: usize },
    #[error("`{type_name}` is not callable")]
    NotCallable { type_name: String },
    #[error("return type mismatch: expected {expected}, got {got}")]
    ReturnType { expected: String, got: String },

    // Statements
    #[error("{message}")]
    Thrown { message: String },
    #[error("assertion failed: {message}")]
    Assertion { message: String },
    #[error("`{signal}` outside of an enclosing construct")]
    Signal { signal: &'static str },

    // Execution
    #[error("execution cancelled")]
    Cancelled,

    /// Catch-all for errors without a structured kind.
    #[error("{message}")]
    Custom { message: String },
}

impl EvalErrorKind {
    /// Errors that lenient evaluation turns into a null, zero or false result.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            EvalErrorKind::Variable {
                issue: VariableIssue::Undefined,
                ..
            } | EvalErrorKind::UndefinedProperty { .. }
                | EvalErrorKind::UndefinedMethod { .. }
                | EvalErrorKind::Operator { .. }
        )
    }
}

/// Additional context note attached to an error.
#[derive(Clone, Debug)]
pub struct EvalNote {
    pub message: String,
    pub span: Option<Span>,
}

impl EvalNote {
    /// Create a note with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }

    /// Create a note with a message and source location.
    pub fn with_span(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span: Some(span),
        }
    }
}

/// A single frame in an evaluation backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    /// Callee name (`<lambda>` for anonymous closures).
    pub name: String,
    /// Source location of the call site.
    pub span: Option<Span>,
}

/// Immutable snapshot of the call stack at an error site.
#[derive(Clone, Debug, Default)]
pub struct EvalBacktrace {
    frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    /// Most recent call first.
    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "stack backtrace:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            write!(f, "  {i}: {}", frame.name)?;
            if let Some(span) = frame.span {
                write!(f, " at {span}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Evaluation error.
#[derive(Clone, Debug)]
pub struct EvalError {
    /// Structured error category.
    pub kind: EvalErrorKind,
    /// Node being evaluated when the error was raised.
    pub node: Option<NodeId>,
    /// Source location of that node.
    pub span: Option<Span>,
    /// Value carried by a user `throw`.
    pub thrown: Option<Value>,
    /// Call stack backtrace at the error site.
    pub backtrace: Option<EvalBacktrace>,
    /// Additional context notes.
    pub notes: Vec<EvalNote>,
}

impl EvalError {
    /// Create an error with just a message.
    ///
    /// Uses `Custom` kind. Prefer the factory functions when a structured
    /// kind is available.
    pub fn new(message: impl Into<String>) -> Self {
        Self::from_kind(EvalErrorKind::Custom {
            message: message.into(),
        })
    }

    /// Create an error from a structured kind.
    pub fn from_kind(kind: EvalErrorKind) -> Self {
        Self {
            kind,
            node: None,
            span: None,
            thrown: None,
            backtrace: None,
            notes: Vec::new(),
        }
    }

    /// Rendered message, without location or notes.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Attach a source span to this error.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Record the offending node, keeping the innermost one if already set.
    #[must_use]
    pub fn at(mut self, node: NodeId, span: Span) -> Self {
        if self.node.is_none() {
            self.node = Some(node);
            self.span = Some(span);
        }
        self
    }

    /// Attach a backtrace to this error.
    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        self.backtrace = Some(backtrace);
        self
    }

    /// Add a context note to this error.
    #[must_use]
    pub fn with_note(mut self, note: EvalNote) -> Self {
        self.notes.push(note);
        self
    }

    /// Whether lenient evaluation may replace this error with a default.
    #[inline]
    pub fn is_degradable(&self) -> bool {
        self.kind.is_degradable()
    }

    /// Whether a script-level `try` may catch this error.
    #[inline]
    pub fn is_catchable(&self) -> bool {
        !matches!(
            self.kind,
            EvalErrorKind::Cancelled | EvalErrorKind::StackOverflow { .. }
        )
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(span) = self.span {
            write!(f, " at {span}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

// Variable Errors

/// No declaration, context entry or type resolves `name`.
#[cold]
pub fn undefined_variable(name: &str) -> EvalError {
    variable_error(name, VariableIssue::Undefined)
}

/// Null assigned to a variable that requires a value.
#[cold]
pub fn null_variable(name: &str) -> EvalError {
    variable_error(name, VariableIssue::Null)
}

/// `name` is declared twice in the same block.
#[cold]
pub fn redefined_variable(name: &str) -> EvalError {
    variable_error(name, VariableIssue::Redefined)
}

/// Assignment to a `const`.
#[cold]
pub fn final_variable(name: &str) -> EvalError {
    variable_error(name, VariableIssue::Final)
}

#[cold]
fn variable_error(name: &str, issue: VariableIssue) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Variable {
        name: name.to_string(),
        issue,
    })
}

// Property and Method Errors

#[cold]
pub fn undefined_property(property: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedProperty {
        property: property.to_string(),
    })
}

#[cold]
pub fn undefined_method(method: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedMethod {
        method: method.to_string(),
    })
}

#[cold]
pub fn not_callable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        type_name: type_name.to_string(),
    })
}

/// Wrong number of arguments to a built-in.
#[cold]
pub fn wrong_arg_count(method: &str, expected: usize, got: usize) -> EvalError {
    EvalError::new(format!(
        "{method} expects {expected} argument(s), got {got}"
    ))
}

// Operator Errors

/// An operator could not be applied; `cause` describes why.
#[cold]
pub fn operator_error(op: &'static str, cause: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Operator {
        op,
        cause: cause.into(),
    })
}

/// No dispatch tier handles `op` for these operand kinds.
#[cold]
pub fn unsupported_operands(op: &'static str, left: &str, right: &str) -> EvalError {
    operator_error(op, format!("unsupported operand kinds {left} and {right}"))
}

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::Arithmetic {
        message: "division by zero".to_string(),
    })
}

#[cold]
pub fn modulo_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::Arithmetic {
        message: "modulo by zero".to_string(),
    })
}

/// A value cannot be converted to a declared type.
#[cold]
pub fn cannot_coerce(from: &str, to: &str) -> EvalError {
    EvalError::new(format!("cannot convert {from} to {to}"))
}

// Call Errors

/// Maximum recursion depth exceeded.
#[cold]
pub fn recursion_limit_exceeded(limit: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StackOverflow { depth: limit })
}

#[cold]
pub fn return_type_mismatch(expected: &str, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ReturnType {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

// Statement Errors

/// User `throw`; the thrown value travels with the error.
#[cold]
pub fn thrown(value: Value) -> EvalError {
    let mut err = EvalError::from_kind(EvalErrorKind::Thrown {
        message: value.to_string(),
    });
    err.thrown = Some(value);
    err
}

#[cold]
pub fn assertion_failed(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Assertion {
        message: message.into(),
    })
}

/// A `break`, `continue`, `remove` or `yield` escaped every construct.
#[cold]
pub fn escaped_signal(signal: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Signal { signal })
}

#[cold]
pub fn cancelled() -> EvalError {
    EvalError::from_kind(EvalErrorKind::Cancelled)
}

// Container Errors

#[cold]
pub fn immutable_container(type_name: &str) -> EvalError {
    EvalError::new(format!("cannot modify immutable {type_name}"))
}

#[cold]
pub fn remove_unsupported(type_name: &str) -> EvalError {
    EvalError::new(format!("cannot remove while iterating {type_name}"))
}

#[cold]
pub fn not_iterable(type_name: &str) -> EvalError {
    EvalError::new(format!("`{type_name}` is not iterable"))
}

#[cold]
pub fn generator_running() -> EvalError {
    EvalError::new("generator is already running")
}
