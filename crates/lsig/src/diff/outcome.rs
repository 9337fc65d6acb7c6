use std::fmt;

use lsig_eval::EvalError;

/// A panic caught at the guarded call boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanicInfo {
    pub message: String,
    /// `file:line:col` of the panic, when the hook saw it.
    pub location: Option<String>,
}

impl fmt::Display for PanicInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} at {location}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Error classification of a single engine call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Failure {
    /// The engine rejected the program.
    Ordinary(EvalError),
    /// The engine itself broke.
    Panic(PanicInfo),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordinary(e) => write!(f, "{e}"),
            Self::Panic(info) => write!(f, "panic: {info}"),
        }
    }
}

/// Result of one checker or evaluator invocation.
///
/// `value` is the cost or pass flag; it is only meaningful when `failure`
/// is `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome<T> {
    pub value: T,
    pub failure: Option<Failure>,
}

impl<T: Default> Outcome<T> {
    pub fn from_result(result: Result<T, EvalError>) -> Self {
        match result {
            Ok(value) => Self {
                value,
                failure: None,
            },
            Err(e) => Self {
                value: T::default(),
                failure: Some(Failure::Ordinary(e)),
            },
        }
    }

    pub fn panicked(info: PanicInfo) -> Self {
        Self {
            value: T::default(),
            failure: Some(Failure::Panic(info)),
        }
    }
}

impl<T> Outcome<T> {
    pub const fn is_err(&self) -> bool {
        self.failure.is_some()
    }

    pub const fn panic(&self) -> Option<&PanicInfo> {
        match &self.failure {
            Some(Failure::Panic(info)) => Some(info),
            _ => None,
        }
    }

    /// Failure text, or `None` on success.
    pub fn error_text(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }
}
