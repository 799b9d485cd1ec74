use crate::client::Client;
use crate::errors::ContractError;
use crate::http::common::Endpoint;
use crate::request::ApiRequest;
use reqwest::Method;
use serde::Serialize;
use serde_json::{Value, json};

/// A comment to post on a contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    /// Id of the comment being replied to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Anchor of the comment within the document, in the server's format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentions: Option<Vec<String>>,
}

impl NewComment {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

impl Client {
    pub async fn list_comments(&self, contract_id: &str) -> Result<Value, ContractError> {
        self.send_json(ApiRequest::for_endpoint(
            Method::GET,
            &Endpoint::Comments { contract_id },
        )?)
        .await
    }

    pub async fn add_comment(
        &self,
        contract_id: &str,
        comment: &NewComment,
    ) -> Result<Value, ContractError> {
        let request = ApiRequest::for_endpoint(Method::POST, &Endpoint::Comments { contract_id })?
            .with_json(comment)?;
        self.send_json(request).await
    }

    pub async fn update_comment(
        &self,
        contract_id: &str,
        comment_id: &str,
        content: &str,
    ) -> Result<Value, ContractError> {
        let request = ApiRequest::for_endpoint(
            Method::PUT,
            &Endpoint::Comment {
                contract_id,
                comment_id,
            },
        )?
        .with_body(json!({ "content": content }));
        self.send_json(request).await
    }

    pub async fn delete_comment(
        &self,
        contract_id: &str,
        comment_id: &str,
    ) -> Result<(), ContractError> {
        self.execute(ApiRequest::for_endpoint(
            Method::DELETE,
            &Endpoint::Comment {
                contract_id,
                comment_id,
            },
        )?)
        .await?;
        Ok(())
    }
}
