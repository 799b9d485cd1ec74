//! Contract resources: CRUD, versions, the approval workflow and bulk operations.

use crate::client::Client;
use crate::errors::ContractError;
use crate::http::common::Endpoint;
use crate::request::ApiRequest;
use crate::types::{Patch, SortOrder};
use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value, json};

/// Pagination, sorting and filters for [`Client::list_contracts`].
///
/// # Example
///
/// ```
/// use contract_sdk::{ContractListParams, SortOrder};
///
/// let params = ContractListParams {
///     status: Some("pending_approval".to_string()),
///     sort_order: SortOrder::Asc,
///     ..Default::default()
/// };
/// assert_eq!(params.page, 1);
/// assert_eq!(params.limit, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractListParams {
    pub page: u32,
    pub limit: u32,
    pub sort_by: String,
    pub sort_order: SortOrder,
    pub status: Option<String>,
    /// Sent as the `type` query parameter.
    pub contract_type: Option<String>,
    pub search: Option<String>,
}

impl Default for ContractListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            sort_by: "createdAt".to_string(),
            sort_order: SortOrder::Desc,
            status: None,
            contract_type: None,
            search: None,
        }
    }
}

impl ContractListParams {
    fn apply(&self, request: ApiRequest) -> ApiRequest {
        request
            .with_query("page", self.page)
            .with_query("limit", self.limit)
            .with_query("sortBy", &self.sort_by)
            .with_query("sortOrder", self.sort_order)
            .with_query_opt("status", self.status.as_deref())
            .with_query_opt("type", self.contract_type.as_deref())
            .with_query_opt("search", self.search.as_deref())
    }
}

/// Payload of [`Client::create_contract`]. Unset optional fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContract {
    pub title: String,
    #[serde(rename = "type")]
    pub contract_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// ISO 8601 date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// ISO 8601 date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parties: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl NewContract {
    /// Creates a payload with the two required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, contract_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            contract_type: contract_type.into(),
            ..Default::default()
        }
    }
}

/// Partial update of a contract.
///
/// Only fields that are not [`Patch::Unchanged`] are sent. Fields this type
/// does not name can be passed through `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractUpdate {
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub title: Patch<String>,
    #[serde(rename = "type", skip_serializing_if = "Patch::is_unchanged")]
    pub contract_type: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub status: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub description: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub value: Patch<f64>,
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub currency: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub start_date: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub end_date: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub content: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub parties: Patch<Vec<Value>>,
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub metadata: Patch<Value>,
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub tags: Patch<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BulkUpdate<'a> {
    contract_ids: &'a [&'a str],
    updates: &'a ContractUpdate,
}

#[derive(Serialize)]
struct ApprovalSubmission<'a> {
    approvers: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

impl Client {
    /// Lists contracts. Returns the server's page object as is.
    pub async fn list_contracts(&self, params: &ContractListParams) -> Result<Value, ContractError> {
        tracing::debug!("Listing contracts: page={}, limit={}", params.page, params.limit);
        let request = params.apply(ApiRequest::for_endpoint(Method::GET, &Endpoint::Contracts)?);
        self.send_json(request).await
    }

    pub async fn get_contract(&self, contract_id: &str) -> Result<Value, ContractError> {
        self.send_json(ApiRequest::for_endpoint(
            Method::GET,
            &Endpoint::Contract { id: contract_id },
        )?)
        .await
    }

    /// Creates a contract.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use contract_sdk::{Client, NewContract};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), contract_sdk::ContractError> {
    /// # let client = Client::new("https://contracts.example.com")?;
    /// let contract = NewContract {
    ///     value: Some(25_000.0),
    ///     currency: Some("EUR".to_string()),
    ///     ..NewContract::new("Supplier Agreement", "purchase")
    /// };
    /// let created = client.create_contract(&contract).await?;
    /// println!("Created {}", created["id"]);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_contract(&self, contract: &NewContract) -> Result<Value, ContractError> {
        tracing::debug!("Creating contract: title={}", contract.title);
        let request =
            ApiRequest::for_endpoint(Method::POST, &Endpoint::Contracts)?.with_json(contract)?;
        self.send_json(request).await
    }

    /// Updates the fields set in `update`, leaving the rest untouched.
    pub async fn update_contract(
        &self,
        contract_id: &str,
        update: &ContractUpdate,
    ) -> Result<Value, ContractError> {
        let request = ApiRequest::for_endpoint(Method::PUT, &Endpoint::Contract { id: contract_id })?
            .with_json(update)?;
        self.send_json(request).await
    }

    pub async fn delete_contract(&self, contract_id: &str) -> Result<(), ContractError> {
        tracing::debug!("Deleting contract: ID={}", contract_id);
        self.execute(ApiRequest::for_endpoint(
            Method::DELETE,
            &Endpoint::Contract { id: contract_id },
        )?)
        .await?;
        Ok(())
    }

    /// Returns the version history of a contract.
    pub async fn contract_versions(&self, contract_id: &str) -> Result<Value, ContractError> {
        self.send_json(ApiRequest::for_endpoint(
            Method::GET,
            &Endpoint::ContractVersions { id: contract_id },
        )?)
        .await
    }

    /// Diffs two versions of a contract on the server.
    pub async fn compare_contract_versions(
        &self,
        contract_id: &str,
        version1: u32,
        version2: u32,
    ) -> Result<Value, ContractError> {
        let request =
            ApiRequest::for_endpoint(Method::POST, &Endpoint::CompareVersions { id: contract_id })?
                .with_body(json!({ "version1": version1, "version2": version2 }));
        self.send_json(request).await
    }

    /// Starts the approval workflow with the given approver ids.
    pub async fn submit_for_approval(
        &self,
        contract_id: &str,
        approvers: &[&str],
        message: Option<&str>,
    ) -> Result<Value, ContractError> {
        let request =
            ApiRequest::for_endpoint(Method::POST, &Endpoint::SubmitApproval { id: contract_id })?
                .with_json(&ApprovalSubmission { approvers, message })?;
        self.send_json(request).await
    }

    pub async fn approve_contract(
        &self,
        contract_id: &str,
        comments: Option<&str>,
    ) -> Result<Value, ContractError> {
        let body = match comments {
            Some(comments) => json!({ "comments": comments }),
            None => json!({}),
        };
        let request = ApiRequest::for_endpoint(Method::POST, &Endpoint::Approve { id: contract_id })?
            .with_body(body);
        self.send_json(request).await
    }

    pub async fn reject_contract(
        &self,
        contract_id: &str,
        reason: &str,
    ) -> Result<Value, ContractError> {
        let request = ApiRequest::for_endpoint(Method::POST, &Endpoint::Reject { id: contract_id })?
            .with_body(json!({ "reason": reason }));
        self.send_json(request).await
    }

    /// Signs a contract. `signature_data` is sent exactly as given.
    pub async fn sign_contract(
        &self,
        contract_id: &str,
        signature_data: &Value,
    ) -> Result<Value, ContractError> {
        let request = ApiRequest::for_endpoint(Method::POST, &Endpoint::Sign { id: contract_id })?
            .with_body(signature_data.clone());
        self.send_json(request).await
    }

    /// Full-text search over contracts.
    pub async fn search_contracts(&self, query: &str) -> Result<Value, ContractError> {
        let request = ApiRequest::for_endpoint(Method::GET, &Endpoint::SearchContracts)?
            .with_query("q", query);
        self.send_json(request).await
    }

    /// Applies the same update to several contracts in one call.
    pub async fn bulk_update_contracts(
        &self,
        contract_ids: &[&str],
        updates: &ContractUpdate,
    ) -> Result<Value, ContractError> {
        tracing::debug!("Bulk updating {} contracts", contract_ids.len());
        let request = ApiRequest::for_endpoint(Method::POST, &Endpoint::BulkUpdateContracts)?
            .with_json(&BulkUpdate {
                contract_ids,
                updates,
            })?;
        self.send_json(request).await
    }
}
