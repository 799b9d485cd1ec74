//! Contract templates.

use crate::client::Client;
use crate::errors::ContractError;
use crate::http::common::Endpoint;
use crate::request::ApiRequest;
use crate::types::Patch;
use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};

/// Pagination and filters for [`Client::list_templates`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateListParams {
    pub page: u32,
    pub limit: u32,
    pub category: Option<String>,
    /// Sent as `isPublic=true|false` when set.
    pub is_public: Option<bool>,
    pub search: Option<String>,
}

impl Default for TemplateListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            category: None,
            is_public: None,
            search: None,
        }
    }
}

impl TemplateListParams {
    fn apply(&self, request: ApiRequest) -> ApiRequest {
        request
            .with_query("page", self.page)
            .with_query("limit", self.limit)
            .with_query_opt("category", self.category.as_deref())
            .with_query_opt("isPublic", self.is_public)
            .with_query_opt("search", self.search.as_deref())
    }
}

/// Payload of [`Client::create_template`].
///
/// `name`, `category`, `content` and `isPublic` are always sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    pub name: String,
    pub category: String,
    pub content: String,
    pub is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Placeholder definitions, in the server's format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl NewTemplate {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Partial update of a template; see [`Patch`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateUpdate {
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub name: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub category: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub content: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub is_public: Patch<bool>,
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub description: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub variables: Patch<Vec<Value>>,
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub tags: Patch<Vec<String>>,
    #[serde(skip_serializing_if = "Patch::is_unchanged")]
    pub price: Patch<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Client {
    pub async fn list_templates(&self, params: &TemplateListParams) -> Result<Value, ContractError> {
        let request = params.apply(ApiRequest::for_endpoint(Method::GET, &Endpoint::Templates)?);
        self.send_json(request).await
    }

    pub async fn get_template(&self, template_id: &str) -> Result<Value, ContractError> {
        self.send_json(ApiRequest::for_endpoint(
            Method::GET,
            &Endpoint::Template { id: template_id },
        )?)
        .await
    }

    pub async fn create_template(&self, template: &NewTemplate) -> Result<Value, ContractError> {
        tracing::debug!("Creating template: name={}", template.name);
        let request =
            ApiRequest::for_endpoint(Method::POST, &Endpoint::Templates)?.with_json(template)?;
        self.send_json(request).await
    }

    pub async fn update_template(
        &self,
        template_id: &str,
        update: &TemplateUpdate,
    ) -> Result<Value, ContractError> {
        let request =
            ApiRequest::for_endpoint(Method::PUT, &Endpoint::Template { id: template_id })?
                .with_json(update)?;
        self.send_json(request).await
    }

    pub async fn delete_template(&self, template_id: &str) -> Result<(), ContractError> {
        self.execute(ApiRequest::for_endpoint(
            Method::DELETE,
            &Endpoint::Template { id: template_id },
        )?)
        .await?;
        Ok(())
    }
}
