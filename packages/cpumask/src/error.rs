use std::io;

use thiserror::Error;

/// Errors that can occur when working with CPU sets, CPU lists and task affinity.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller provided a supposed CPU list string but it did not match the expected format.
    #[error("invalid CPU list syntax: '{invalid_value}' is invalid: {problem}")]
    InvalidSyntax {
        /// The specific value that was invalid. This is the remainder of the input starting at
        /// the position where the problem was detected.
        invalid_value: String,

        /// A human-readable description of the problem.
        problem: String,
    },

    /// An operation was called in a way that breaks its documented contract, such as adding a
    /// reversed range to a set or removing a CPU from an empty list.
    #[error("precondition violated: {problem}")]
    PreconditionViolated {
        /// A human-readable description of the violated precondition.
        problem: String,
    },

    /// The request was refused before reaching the operating system.
    #[error("invalid argument: {problem}")]
    InvalidArgument {
        /// A human-readable description of why the argument was refused.
        problem: String,
    },

    /// The operating system rejected the request. The OS error is passed through unchanged.
    #[error(transparent)]
    Os(#[from] io::Error),
}

impl Error {
    pub(crate) fn syntax(invalid_value: &[u8], problem: &str) -> Self {
        Self::InvalidSyntax {
            invalid_value: String::from_utf8_lossy(invalid_value).into_owned(),
            problem: problem.to_string(),
        }
    }

    pub(crate) fn precondition(problem: String) -> Self {
        Self::PreconditionViolated { problem }
    }

    /// The raw OS error code, if this error originates from the operating system.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Os(inner) => inner.raw_os_error(),
            _ => None,
        }
    }
}

/// A specialized `Result` type for this crate, returning the crate's [`Error`] type as the
/// error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn syntax_error_keeps_offending_input() {
        let error = Error::syntax(b"0abc", "expected '-' or ','");

        assert_eq!(
            error.to_string(),
            "invalid CPU list syntax: '0abc' is invalid: expected '-' or ','"
        );
        assert_eq!(error.raw_os_error(), None);
    }

    #[test]
    fn os_error_is_transparent() {
        let error = Error::from(io::Error::from_raw_os_error(22));

        assert_eq!(error.raw_os_error(), Some(22));
        assert_eq!(
            error.to_string(),
            io::Error::from_raw_os_error(22).to_string()
        );
    }
}
