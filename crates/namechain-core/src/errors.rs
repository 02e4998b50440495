//! Error types for namechain-core.
//!
//! Errors are structured, explicit, and stable. Messages are intended to be
//! human-readable while preserving machine-level categorization.

use std::fmt::{self, Display};

/// Result type used throughout namechain-core.
pub type CoreResult<T> = Result<T, CoreError>;

/// Top-level error type for namechain-core.
#[derive(Debug)]
pub enum CoreError {
    /// Invalid or unsupported argument.
    InvalidArgument {
        message: String,
    },

    /// A name that does not satisfy the naming rules.
    InvalidName {
        message: String,
    },

    /// Zonefile parse or shape failure.
    Zonefile {
        message: String,
    },

    /// Hashing failure.
    Hashing {
        message: String,
    },

    /// Serialization or deserialization failure.
    Serialization {
        message: String,
    },

    /// Internal invariant violation.
    Invariant {
        message: String,
    },
}

impl CoreError {
    /// Construct an invalid argument error.
    pub fn invalid_argument<M: Into<String>>(message: M) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Construct an invalid name error.
    pub fn invalid_name<M: Into<String>>(message: M) -> Self {
        Self::InvalidName {
            message: message.into(),
        }
    }

    /// Construct a zonefile error.
    pub fn zonefile<M: Into<String>>(message: M) -> Self {
        Self::Zonefile {
            message: message.into(),
        }
    }

    /// Construct a hashing error.
    pub fn hashing<M: Into<String>>(message: M) -> Self {
        Self::Hashing {
            message: message.into(),
        }
    }

    /// Construct a serialization error.
    pub fn serialization<M: Into<String>>(message: M) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Construct an invariant violation error.
    pub fn invariant<M: Into<String>>(message: M) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { message } => {
                write!(f, "invalid argument: {message}")
            }
            Self::InvalidName { message } => {
                write!(f, "invalid name: {message}")
            }
            Self::Zonefile { message } => {
                write!(f, "zonefile error: {message}")
            }
            Self::Hashing { message } => {
                write!(f, "hashing error: {message}")
            }
            Self::Serialization { message } => {
                write!(f, "serialization error: {message}")
            }
            Self::Invariant { message } => {
                write!(f, "invariant violation: {message}")
            }
        }
    }
}

impl std::error::Error for CoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_name() {
        let e = CoreError::invalid_name("no namespace");
        assert_eq!(format!("{e}"), "invalid name: no namespace");
    }

    #[test]
    fn display_zonefile_error() {
        let e = CoreError::zonefile("missing $ttl");
        assert_eq!(format!("{e}"), "zonefile error: missing $ttl");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CoreError>();
    }
}
