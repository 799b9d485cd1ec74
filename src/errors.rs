use serde_json::Value;
use thiserror::Error;

/// Defines errors that can occur when interacting with the Contract Management API.
///
/// HTTP failures are split by status: 401 is [`ContractError::Authentication`],
/// 400 is [`ContractError::Validation`], and every other non-2xx status is
/// [`ContractError::Api`]. Failures where no HTTP response was obtained at all
/// (connection refused, DNS, timeout) are [`ContractError::Network`].
///
/// # Example: Handling API Errors
///
/// ```ignore
/// match client.create_contract(&contract).await {
///     Err(ContractError::Validation { code, message, .. }) => {
///         tracing::warn!("Rejected payload ({:?}): {}", code, message);
///     }
///     Err(e) if e.is_retryable() => {
///         // Transport retries are exhausted; schedule a later attempt
///     }
///     Err(e) => return Err(e.into()),
///     Ok(created) => println!("{}", created["id"]),
/// }
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContractError {
    /// HTTP 401, or a refresh attempted without a refresh token.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Error message from the API response body
        message: String,
        /// Machine-readable error code (e.g., `TOKEN_EXPIRED`)
        code: Option<String>,
        /// HTTP status code; `None` when no request was made
        status_code: Option<u16>,
        /// Structured `details` payload from the error body
        details: Option<Value>,
    },
    /// HTTP 400: the server rejected the request payload.
    #[error("Validation failed (HTTP 400): {message}")]
    Validation {
        /// Error message from the API response body
        message: String,
        /// Machine-readable error code (e.g., `INVALID_TITLE`)
        code: Option<String>,
        /// HTTP status code
        status_code: Option<u16>,
        /// Structured `details` payload from the error body
        details: Option<Value>,
    },
    /// No HTTP response was obtained: connection failure, DNS failure, or timeout.
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: reqwest::Error,
    },
    /// Any other non-2xx response.
    #[error("API error (HTTP {status_code}): {message}")]
    Api {
        /// Error message from the API response body
        message: String,
        /// Machine-readable error code, or `HTTP_<status>` when the body had none
        code: Option<String>,
        /// HTTP status code (e.g., 403, 404, 500)
        status_code: u16,
        /// Structured `details` payload from the error body
        details: Option<Value>,
    },
    /// A local precondition failed before any request was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("HTTP request error: {0}")]
    Http(reqwest::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// API returned a successful response but with unexpected or invalid content.
    #[error("Malformed API response: {0}")]
    MalformedResponse(String),
    /// Failed to build the HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl ContractError {
    /// Classifies a transport-level `reqwest` failure.
    ///
    /// Connection, DNS and timeout failures become [`ContractError::Network`];
    /// anything else (redirect loops, body encoding, builder errors) stays a
    /// generic [`ContractError::Http`].
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network {
                message: format!("Request timeout: {err}"),
                source: err,
            }
        } else if err.is_connect() {
            Self::Network {
                message: format!("Connection error: {err}"),
                source: err,
            }
        } else if err.is_request() && err.status().is_none() {
            // Failed while sending: reset connection, broken pipe
            Self::Network {
                message: format!("Connection error: {err}"),
                source: err,
            }
        } else {
            Self::Http(err)
        }
    }

    /// Builds the error for an HTTP failure status.
    pub(crate) fn from_status(
        status_code: u16,
        message: String,
        code: Option<String>,
        details: Option<Value>,
    ) -> Self {
        match status_code {
            401 => Self::Authentication {
                message,
                code,
                status_code: Some(status_code),
                details,
            },
            400 => Self::Validation {
                message,
                code,
                status_code: Some(status_code),
                details,
            },
            _ => Self::Api {
                message,
                code,
                status_code,
                details,
            },
        }
    }

    /// Returns the human-readable message without the variant prefix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Authentication { message, .. }
            | Self::Validation { message, .. }
            | Self::Network { message, .. }
            | Self::Api { message, .. } => message.clone(),
            Self::InvalidInput(message)
            | Self::MalformedResponse(message)
            | Self::ClientBuild(message) => message.clone(),
            Self::Http(e) => e.to_string(),
            Self::Json(e) => e.to_string(),
            Self::Io(e) => e.to_string(),
        }
    }

    /// Returns the machine-readable error code, if the error carries one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Authentication { code, .. }
            | Self::Validation { code, .. }
            | Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Returns the HTTP status code when the error came from an HTTP response.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Authentication { status_code, .. } | Self::Validation { status_code, .. } => {
                *status_code
            }
            Self::Api { status_code, .. } => Some(*status_code),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns the structured `details` payload of the error body, if any.
    #[must_use]
    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::Authentication { details, .. }
            | Self::Validation { details, .. }
            | Self::Api { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Returns `true` if this error is likely transient and the call may succeed later.
    ///
    /// The client already retries these internally according to its
    /// [`RetryPolicy`](crate::RetryPolicy); this helper is for callers that
    /// schedule their own, coarser retries after the budget is spent.
    ///
    /// - **Network errors**: connection failures and timeouts
    /// - **Rate limits (429)** and **server errors (500, 502, 503, 504)**
    ///
    /// Everything else (4xx, local input errors, decode failures) is permanent.
    ///
    /// ```rust
    /// use contract_sdk::ContractError;
    ///
    /// let throttled = ContractError::Api {
    ///     message: "Too many requests".to_string(),
    ///     code: Some("RATE_LIMITED".to_string()),
    ///     status_code: 429,
    ///     details: None,
    /// };
    /// assert!(throttled.is_retryable());
    ///
    /// let missing = ContractError::InvalidInput("File not found: a.pdf".to_string());
    /// assert!(!missing.is_retryable());
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Api { status_code, .. } => {
                crate::retry::DEFAULT_RETRY_STATUSES.contains(status_code)
            }
            Self::Authentication { .. }
            | Self::Validation { .. }
            | Self::InvalidInput(_)
            | Self::Http(_)
            | Self::Json(_)
            | Self::Io(_)
            | Self::MalformedResponse(_)
            | Self::ClientBuild(_) => false,
        }
    }
}
