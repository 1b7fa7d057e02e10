//! Error taxonomy for the inference engine.
//!
//! - **`StatError`**     : the single error type every fallible operation returns
//! - **`StatErrorKind`** : a `Copy` discriminant so callers can branch on the
//!   category without matching on payloads
//!
//! Numerically degenerate inputs (zero variance, all-tied data) are *not*
//! errors; they resolve to documented sentinel results. Only contract
//! violations and unknown identifiers end up here.

use std::fmt;

use thiserror::Error;

/// Coarse error category.
///
/// Names are CamelCase while `Display` renders the snake_case tag used in
/// log lines and by downstream exporters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StatErrorKind {
    LengthMismatch,
    InsufficientData,
    InvalidArgument,
    UnknownIdentifier,
}

impl fmt::Display for StatErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LengthMismatch => "length_mismatch",
            Self::InsufficientData => "insufficient_data",
            Self::InvalidArgument => "invalid_argument",
            Self::UnknownIdentifier => "unknown_identifier",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatError {
    /// Paired or linked samples differ in length.
    #[error("{context}: samples must have equal length (got {left} and {right})")]
    LengthMismatch {
        context: &'static str,
        left: usize,
        right: usize,
    },

    /// Fewer observations (or groups) than the procedure needs.
    #[error("{context}: requires at least {required}, got {actual}")]
    InsufficientData {
        context: &'static str,
        required: usize,
        actual: usize,
    },

    /// An option or argument is outside its domain.
    #[error("invalid {name} = {value}: {reason}")]
    InvalidArgument {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    /// A textual identifier (test, method, effect-size type, …) was not recognised.
    #[error("unknown {kind} '{value}'")]
    UnknownIdentifier { kind: &'static str, value: String },
}

pub type StatResult<T> = Result<T, StatError>;

/* ───────────────────── Constructors & helpers ─────────────────────── */

impl StatError {
    pub fn kind(&self) -> StatErrorKind {
        match self {
            Self::LengthMismatch { .. } => StatErrorKind::LengthMismatch,
            Self::InsufficientData { .. } => StatErrorKind::InsufficientData,
            Self::InvalidArgument { .. } => StatErrorKind::InvalidArgument,
            Self::UnknownIdentifier { .. } => StatErrorKind::UnknownIdentifier,
        }
    }

    pub fn length_mismatch(context: &'static str, left: usize, right: usize) -> Self {
        Self::LengthMismatch {
            context,
            left,
            right,
        }
    }

    pub fn insufficient(context: &'static str, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            context,
            required,
            actual,
        }
    }

    pub fn invalid<V: fmt::Display>(name: &'static str, value: V, reason: &'static str) -> Self {
        Self::InvalidArgument {
            name,
            value: value.to_string(),
            reason,
        }
    }

    pub fn unknown<S: Into<String>>(kind: &'static str, value: S) -> Self {
        Self::UnknownIdentifier {
            kind,
            value: value.into(),
        }
    }
}

impl From<StatError> for String {
    fn from(error: StatError) -> Self {
        format!("{error}")
    }
}

impl PartialEq<StatErrorKind> for StatError {
    fn eq(&self, other: &StatErrorKind) -> bool {
        self.kind() == *other
    }
}

/// Fail with `InvalidArgument` unless `p` lies strictly inside (0, 1).
pub fn ensure_open_unit(name: &'static str, p: f64) -> StatResult<()> {
    if p.is_finite() && p > 0.0 && p < 1.0 {
        Ok(())
    } else {
        Err(StatError::invalid(name, p, "must lie strictly between 0 and 1"))
    }
}

/// Fail with `InvalidArgument` unless every value is finite.
pub fn ensure_finite(name: &'static str, data: &[f64]) -> StatResult<()> {
    match data.iter().find(|v| !v.is_finite()) {
        Some(bad) => Err(StatError::invalid(name, bad, "samples must be finite")),
        None => Ok(()),
    }
}
