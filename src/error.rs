use crate::types::Position;
use std::fmt;
use std::path::{Path, PathBuf};

/// Possible errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
#[allow(missing_docs)]
pub enum Error {
    /// Malformed directive, expression or macro invocation.
    #[error("syntax error: {message}")]
    Syntax { message: String, position: Position },

    /// No include search root contains the requested file.
    #[error("cannot resolve include {target:?} (searched {searched:?})")]
    UnresolvedInclude {
        target: String,
        position: Position,
        searched: Vec<PathBuf>,
    },

    /// The resolved include target is already on the active include chain.
    #[error("cyclic include of {path:?} (chain: {})", format_chain(.chain))]
    CyclicInclude { path: PathBuf, chain: Vec<PathBuf> },

    /// Include target or entry file could not be read.
    #[error("cannot read file {path:?}: {source}")]
    ReadFile {
        source: std::io::Error,
        path: PathBuf,
    },

    /// A macro was redefined with an incompatible definition.
    #[error(
        "macro {name:?} redefined with a different body \
         (previous definition at {previous_path:?}:{previous})"
    )]
    MacroRedefinition {
        name: String,
        previous: Position,
        previous_path: PathBuf,
        redefined: Position,
    },

    /// Macro invocation arity does not match the definition.
    #[error("macro {name:?} expects {expected} argument(s), found {found}")]
    MacroArgsMismatched {
        name: String,
        expected: usize,
        found: usize,
        position: Position,
    },

    /// Stray `#endif`/`#elif` or an unterminated conditional.
    #[error("unbalanced conditional: {message}")]
    UnbalancedConditional { message: String, position: Position },

    /// `#elif` or `#else` after `#else` at the same nesting level.
    #[error("`#{directive}` after `#else` (opened at {opened_at})")]
    DanglingElse {
        directive: &'static str,
        position: Position,
        opened_at: Position,
    },

    /// Author-inserted `#error` directive.
    #[error("#error: {message}")]
    UserError { message: String, position: Position },

    /// Non UTF-8 path.
    #[error("cannot convert a path {path:?} to a UTF-8 string")]
    NonUtf8Path { path: PathBuf },

    /// Glob pattern error.
    #[error(transparent)]
    GlobPatternError(#[from] glob::PatternError),

    /// Glob error.
    #[error(transparent)]
    GlobError(#[from] glob::GlobError),

    /// Invariant violation; never expected in correct operation.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl Error {
    pub(crate) fn syntax(message: impl Into<String>, position: Position) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
        }
    }

    pub(crate) fn unresolved_include(
        target: impl Into<String>,
        position: Position,
        searched: Vec<PathBuf>,
    ) -> Self {
        Self::UnresolvedInclude {
            target: target.into(),
            position,
            searched,
        }
    }

    pub(crate) fn cyclic_include(path: impl Into<PathBuf>, chain: Vec<PathBuf>) -> Self {
        Self::CyclicInclude {
            path: path.into(),
            chain,
        }
    }

    pub(crate) fn read_file(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::ReadFile {
            source,
            path: path.as_ref().to_path_buf(),
        }
    }

    pub(crate) fn macro_args_mismatched(
        name: impl Into<String>,
        expected: usize,
        found: usize,
        position: Position,
    ) -> Self {
        Self::MacroArgsMismatched {
            name: name.into(),
            expected,
            found,
            position,
        }
    }

    pub(crate) fn unbalanced_conditional(message: impl Into<String>, position: Position) -> Self {
        Self::UnbalancedConditional {
            message: message.into(),
            position,
        }
    }

    pub(crate) fn dangling_else(
        directive: &'static str,
        position: Position,
        opened_at: Position,
    ) -> Self {
        Self::DanglingElse {
            directive,
            position,
            opened_at,
        }
    }

    pub(crate) fn user_error(message: impl Into<String>, position: Position) -> Self {
        Self::UserError {
            message: message.into(),
            position,
        }
    }

    pub(crate) fn non_utf8_path(path: impl AsRef<Path>) -> Self {
        Self::NonUtf8Path {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the source position this error points at, if it has one.
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::Syntax { position, .. }
            | Error::UnresolvedInclude { position, .. }
            | Error::MacroArgsMismatched { position, .. }
            | Error::UnbalancedConditional { position, .. }
            | Error::DanglingElse { position, .. }
            | Error::UserError { position, .. } => Some(*position),
            Error::MacroRedefinition { redefined, .. } => Some(*redefined),
            _ => None,
        }
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// This crate specific `Result` type.
pub type Result<T> = std::result::Result<T, Error>;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Severity {
    Warning,
    Error,
}
impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One entry of the ordered diagnostic list produced by a resolution pass.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct Diagnostic {
    pub severity: Severity,
    pub path: PathBuf,
    pub position: Position,
    pub message: String,
}
impl Diagnostic {
    pub(crate) fn warning(
        path: impl Into<PathBuf>,
        position: Position,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            path: path.into(),
            position,
            message: message.into(),
        }
    }

    pub(crate) fn error(
        path: impl Into<PathBuf>,
        position: Position,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            severity: Severity::Error,
            path: path.into(),
            position,
            message: message.into(),
        }
    }
}
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {}",
            self.path.display(),
            self.position.line,
            self.position.column,
            self.severity,
            self.message
        )
    }
}
