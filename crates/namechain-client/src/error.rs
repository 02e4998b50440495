use namechain_core::CoreError;

/// Error taxonomy for client operations.
///
/// The variants matter as much as the messages: connectivity problems are
/// retryable and must never be mistaken for a failed verification, and
/// precondition failures are caller-fixable and guarantee no side effects
/// were performed.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transient network failure, surfaced after bounded retry.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A fail-fast check rejected the operation before any side effect.
    #[error("{0}")]
    Precondition(String),

    /// A requested name, namespace, or record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The reconstructed hash chain does not reproduce the trust anchor.
    /// Security-relevant: "couldn't verify" is never reported as success.
    #[error("verification failed: {0}")]
    Verification(String),

    /// Malformed zonefile or profile data.
    #[error("invalid data: {0}")]
    DataFormat(String),

    /// A supposedly-successful reply was missing required fields, or some
    /// other condition that indicates a bug rather than an environment
    /// problem.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl ClientError {
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::Connection(_) => "connection",
            ClientError::Precondition(_) => "precondition",
            ClientError::NotFound(_) => "not_found",
            ClientError::Verification(_) => "verification",
            ClientError::DataFormat(_) => "data_format",
            ClientError::Fatal(_) => "fatal",
        }
    }

    /// Only connection errors are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Connection(_))
    }
}

impl From<CoreError> for ClientError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidName { .. } | CoreError::InvalidArgument { .. } => {
                ClientError::Precondition(e.to_string())
            }
            CoreError::Zonefile { .. } | CoreError::Serialization { .. } => {
                ClientError::DataFormat(e.to_string())
            }
            CoreError::Hashing { .. } | CoreError::Invariant { .. } => {
                ClientError::Fatal(e.to_string())
            }
        }
    }
}

impl From<anyhow::Error> for ClientError {
    fn from(e: anyhow::Error) -> Self {
        ClientError::Fatal(format!("{e:#}"))
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let errors = [
            ClientError::Connection("x".into()),
            ClientError::Precondition("x".into()),
            ClientError::NotFound("x".into()),
            ClientError::Verification("x".into()),
            ClientError::DataFormat("x".into()),
            ClientError::Fatal("x".into()),
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn only_connection_is_transient() {
        assert!(ClientError::Connection("x".into()).is_transient());
        assert!(!ClientError::Verification("x".into()).is_transient());
    }

    #[test]
    fn core_errors_map_to_kinds() {
        let e: ClientError = CoreError::invalid_name("bad").into();
        assert_eq!(e.code(), "precondition");
        let e: ClientError = CoreError::zonefile("bad").into();
        assert_eq!(e.code(), "data_format");
    }
}
