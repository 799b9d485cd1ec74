use crate::errors::ContractError;
use std::borrow::Cow;

/// Header name for API key authentication.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("contract-sdk-rust/", env!("CARGO_PKG_VERSION"));

/// Represents the API endpoints consumed by the client.
///
/// Caller-supplied identifiers are percent-encoded when the path is built.
/// Ids that URL resolution would collapse (empty, `.` and `..`) are rejected,
/// so an id can never escape its path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint<'a> {
    Login,
    Logout,
    RefreshToken,
    CurrentUser,
    Contracts,
    Contract { id: &'a str },
    ContractVersions { id: &'a str },
    CompareVersions { id: &'a str },
    SubmitApproval { id: &'a str },
    Approve { id: &'a str },
    Reject { id: &'a str },
    Sign { id: &'a str },
    SearchContracts,
    BulkUpdateContracts,
    Comments { contract_id: &'a str },
    Comment {
        contract_id: &'a str,
        comment_id: &'a str,
    },
    Attachments { contract_id: &'a str },
    Attachment {
        contract_id: &'a str,
        attachment_id: &'a str,
    },
    Export { contract_id: &'a str },
    Templates,
    Template { id: &'a str },
    DashboardAnalytics,
    ContractAnalytics { id: &'a str },
}

fn segment(value: &str) -> Result<Cow<'_, str>, ContractError> {
    match value {
        "" => Err(ContractError::InvalidInput(
            "Resource id must not be empty".to_string(),
        )),
        "." | ".." => Err(ContractError::InvalidInput(format!(
            "Resource id '{value}' is not a valid path segment"
        ))),
        _ => Ok(urlencoding::encode(value)),
    }
}

impl Endpoint<'_> {
    /// Constructs the absolute-rooted path for this endpoint.
    ///
    /// Paths always start with `/`, so joining them onto the base URL
    /// replaces the base URL's own path.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::InvalidInput`] if an id is empty, `.` or `..`.
    pub fn to_path(&self) -> Result<String, ContractError> {
        let path = match self {
            Self::Login => "/auth/login".to_string(),
            Self::Logout => "/auth/logout".to_string(),
            Self::RefreshToken => "/auth/refresh".to_string(),
            Self::CurrentUser => "/users/me".to_string(),
            Self::Contracts => "/contracts".to_string(),
            Self::Contract { id } => format!("/contracts/{}", segment(id)?),
            Self::ContractVersions { id } => format!("/contracts/{}/versions", segment(id)?),
            Self::CompareVersions { id } => format!("/contracts/{}/compare", segment(id)?),
            Self::SubmitApproval { id } => format!("/contracts/{}/submit-approval", segment(id)?),
            Self::Approve { id } => format!("/contracts/{}/approve", segment(id)?),
            Self::Reject { id } => format!("/contracts/{}/reject", segment(id)?),
            Self::Sign { id } => format!("/contracts/{}/sign", segment(id)?),
            Self::SearchContracts => "/contracts/search".to_string(),
            Self::BulkUpdateContracts => "/contracts/bulk-update".to_string(),
            Self::Comments { contract_id } => {
                format!("/contracts/{}/comments", segment(contract_id)?)
            }
            Self::Comment {
                contract_id,
                comment_id,
            } => format!(
                "/contracts/{}/comments/{}",
                segment(contract_id)?,
                segment(comment_id)?
            ),
            Self::Attachments { contract_id } => {
                format!("/contracts/{}/attachments", segment(contract_id)?)
            }
            Self::Attachment {
                contract_id,
                attachment_id,
            } => format!(
                "/contracts/{}/attachments/{}",
                segment(contract_id)?,
                segment(attachment_id)?
            ),
            Self::Export { contract_id } => format!("/contracts/{}/export", segment(contract_id)?),
            Self::Templates => "/templates".to_string(),
            Self::Template { id } => format!("/templates/{}", segment(id)?),
            Self::DashboardAnalytics => "/analytics/dashboard".to_string(),
            Self::ContractAnalytics { id } => format!("/analytics/contracts/{}", segment(id)?),
        };
        Ok(path)
    }

    /// Auth endpoints whose 401 means "bad credentials", never "expired token".
    ///
    /// A 401 from these must not trigger the refresh-and-resend cycle.
    #[must_use]
    pub const fn refreshes_on_unauthorized(&self) -> bool {
        !matches!(self, Self::Login | Self::RefreshToken)
    }
}
