//! Engine options.
//!
//! `Options` is a plain value: it is cloned into every child interpreter,
//! closure and generator. The only shared piece is the [`CancelToken`],
//! which all clones observe.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default limit on nested closure calls.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Cooperative cancellation flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; running evaluations stop at their next check.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Evaluation options.
#[derive(Clone, Debug)]
pub struct Options {
    /// Unresolved variables, properties, methods and operators raise errors.
    pub strict: bool,
    /// With `strict`, log unresolved references and degrade instead of raising.
    pub silent: bool,
    /// Every property access and method call is null-safe.
    pub safe: bool,
    /// Observed cancellation raises `Cancelled` instead of returning null.
    pub cancellable: bool,
    /// `var` declarations are block scoped.
    pub lexical: bool,
    /// Reading a local outside its declaring block is an error.
    pub lexical_shade: bool,
    /// `assert` statements are checked.
    pub assertions: bool,
    /// Null is not treated as zero by arithmetic.
    pub strict_arithmetic: bool,
    /// Limit on nested closure calls; `None` is unlimited.
    pub max_depth: Option<usize>,
    pub cancel: CancelToken,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            strict: false,
            silent: false,
            safe: false,
            cancellable: false,
            lexical: false,
            lexical_shade: false,
            assertions: false,
            strict_arithmetic: false,
            max_depth: Some(DEFAULT_MAX_DEPTH),
            cancel: CancelToken::new(),
        }
    }
}

impl Options {
    /// Raise on every unresolved reference, check assertions, honour cancellation.
    pub fn strict() -> Self {
        Options {
            strict: true,
            cancellable: true,
            assertions: true,
            strict_arithmetic: true,
            ..Options::default()
        }
    }

    /// Degrade unresolved references to null and navigate nulls safely.
    pub fn lenient() -> Self {
        Options {
            safe: true,
            ..Options::default()
        }
    }

    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    #[must_use]
    pub fn with_safe(mut self, safe: bool) -> Self {
        self.safe = safe;
        self
    }

    #[must_use]
    pub fn with_cancellable(mut self, cancellable: bool) -> Self {
        self.cancellable = cancellable;
        self
    }

    #[must_use]
    pub fn with_lexical(mut self, lexical: bool) -> Self {
        self.lexical = lexical;
        self
    }

    #[must_use]
    pub fn with_lexical_shade(mut self, lexical_shade: bool) -> Self {
        self.lexical_shade = lexical_shade;
        self
    }

    #[must_use]
    pub fn with_assertions(mut self, assertions: bool) -> Self {
        self.assertions = assertions;
        self
    }

    #[must_use]
    pub fn with_strict_arithmetic(mut self, strict_arithmetic: bool) -> Self {
        self.strict_arithmetic = strict_arithmetic;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Block scoping applies to every declaration; shading implies it.
    #[inline]
    pub(crate) fn is_lexical(&self) -> bool {
        self.lexical || self.lexical_shade
    }

    /// Unresolved references raise instead of degrading.
    #[inline]
    pub(crate) fn raises_unsolvable(&self) -> bool {
        self.strict && !self.silent
    }
}
