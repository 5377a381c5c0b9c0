use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    InvalidRequest,
    UnknownPool,
    InvalidHopClassification,
    EmptyRoute,
    Encoding,
    Internal,
}

/// Compilation failure. No partial result accompanies an error: the compile
/// either fully succeeds or aborts.
#[derive(Debug)]
pub struct CompileError {
    kind: CompileErrorKind,
    message: String,
}

impl CompileError {
    pub fn invalid<T: Into<String>>(message: T) -> Self {
        Self {
            kind: CompileErrorKind::InvalidRequest,
            message: message.into(),
        }
    }

    pub fn unknown_pool<T: Into<String>>(message: T) -> Self {
        Self {
            kind: CompileErrorKind::UnknownPool,
            message: message.into(),
        }
    }

    pub fn invalid_hop<T: Into<String>>(message: T) -> Self {
        Self {
            kind: CompileErrorKind::InvalidHopClassification,
            message: message.into(),
        }
    }

    pub fn empty_route<T: Into<String>>(message: T) -> Self {
        Self {
            kind: CompileErrorKind::EmptyRoute,
            message: message.into(),
        }
    }

    pub fn encoding<T: Into<String>>(message: T) -> Self {
        Self {
            kind: CompileErrorKind::Encoding,
            message: message.into(),
        }
    }

    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self {
            kind: CompileErrorKind::Internal,
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> CompileErrorKind {
        self.kind
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for CompileError {}
