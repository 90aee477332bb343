use thiserror::Error;

/// Failure kinds surfaced by the token cache, the API clients and the
/// scenario assertions.
#[derive(Debug, Error)]
pub enum SuiteError {
    /// The identity provider rejected the refresh or could not be reached.
    #[error("token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("unexpected status code: expected {expected}, got {actual} => {body}")]
    UnexpectedStatusCode {
        expected: u16,
        actual: u16,
        body: String,
    },

    #[error("assertion mismatch on `{field}`: expected {expected:?}, got {actual:?}")]
    AssertionMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },

    /// A scenario needs a fixture id that is not configured.
    #[error("missing fixture: {0}")]
    MissingFixture(&'static str),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SuiteError {
    /// True for failures caused by the auth infrastructure rather than the
    /// behaviour of the playlist endpoints.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, SuiteError::TokenRefreshFailed(_))
    }

    pub(crate) fn mismatch(
        field: &'static str,
        expected: impl std::fmt::Debug,
        actual: impl std::fmt::Debug,
    ) -> Self {
        SuiteError::AssertionMismatch {
            field,
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        }
    }
}

pub type Result<T> = std::result::Result<T, SuiteError>;
