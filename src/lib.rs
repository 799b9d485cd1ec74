//! # contract-sdk
//!
//! An async Rust client for the Contract Management REST API.
//!
//! Every method maps one call to one HTTP request through a shared pipeline
//! that attaches credentials, retries transient failures, refreshes an
//! expired access token once, and turns error responses into
//! [`ContractError`] values. Resource payloads are passed through as
//! [`serde_json::Value`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use contract_sdk::{Client, ContractListParams, NewContract};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), contract_sdk::ContractError> {
//!     let client = Client::new("https://contracts.example.com")?;
//!     client.login("legal@example.com", "s3cret", None).await?;
//!
//!     let created = client
//!         .create_contract(&NewContract::new("Mutual NDA", "nda"))
//!         .await?;
//!     let id = created["id"].as_str().unwrap_or_default();
//!
//!     client.submit_for_approval(id, &["u-cfo"], Some("Please review")).await?;
//!
//!     let page = client.list_contracts(&ContractListParams::default()).await?;
//!     println!("{} contracts", page["total"]);
//!
//!     client.export_contract(id, "pdf", None).await?;
//!     client.logout().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Use [`Client::builder`] for API keys, timeouts and retry settings, or
//! [`ClientBuilder::from_env`] to read them from `CONTRACT_API_*` variables.
//!
//! ## Debugging
//!
//! Set `LOUD_WIRE=1` to print every request and response to stderr, with
//! passwords and tokens redacted. Regular diagnostics go through `tracing`.

mod analytics_api;
mod attachments_api;
mod auth_api;
mod client;
mod comments_api;
mod contracts_api;
mod errors;
mod http;
mod request;
mod response;
mod retry;
mod templates_api;
mod types;

pub use analytics_api::DateRange;
pub use client::{Client, ClientBuilder};
pub use comments_api::NewComment;
pub use contracts_api::{ContractListParams, ContractUpdate, NewContract};
pub use errors::ContractError;
pub use request::{ApiRequest, Upload, UploadProgress};
pub use response::{ApiResponse, ByteStream};
pub use retry::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_STATUSES, RetryPolicy};
pub use templates_api::{NewTemplate, TemplateListParams, TemplateUpdate};
pub use types::{Patch, SortOrder};
