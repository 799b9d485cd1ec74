//! Transport-level request description passed to [`Client::execute`](crate::Client::execute).

use crate::errors::ContractError;
use crate::http::common::Endpoint;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Callback receiving the cumulative number of bytes streamed for an upload.
pub type UploadProgress = Arc<dyn Fn(u64) + Send + Sync>;

/// One HTTP call against the API, before credentials are attached.
///
/// Requests are cheap to clone. The client may send the same request more
/// than once (transport retries, resend after a token refresh).
///
/// # Example
///
/// ```
/// use contract_sdk::ApiRequest;
/// use serde_json::json;
///
/// let request = ApiRequest::post("/contracts/c-1/approve")
///     .with_body(json!({"comments": "LGTM"}));
/// assert_eq!(request.path(), "/contracts/c-1/approve");
///
/// let request = ApiRequest::get("/contracts")
///     .with_query("page", 2)
///     .with_query_opt("status", None::<&str>);
/// assert_eq!(request.query(), &[("page".to_string(), "2".to_string())]);
/// ```
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    upload: Option<Upload>,
    stream: bool,
    refresh_on_unauthorized: bool,
}

impl ApiRequest {
    /// Creates a request for `path`, which should start with `/`.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            upload: None,
            stream: false,
            refresh_on_unauthorized: true,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub(crate) fn for_endpoint(
        method: Method,
        endpoint: &Endpoint<'_>,
    ) -> Result<Self, ContractError> {
        let mut request = Self::new(method, endpoint.to_path()?);
        request.refresh_on_unauthorized = endpoint.refreshes_on_unauthorized();
        Ok(request)
    }

    /// Appends a query parameter. Parameters keep their insertion order.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Appends a query parameter only when `value` is present.
    #[must_use]
    pub fn with_query_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.with_query(key, value),
            None => self,
        }
    }

    /// Sets the JSON body. Ignored when an upload is attached.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes `body` and sets it as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be represented as JSON.
    pub fn with_json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self, ContractError> {
        Ok(self.with_body(serde_json::to_value(body)?))
    }

    /// Attaches a file, turning the request into a multipart upload.
    #[must_use]
    pub fn with_upload(mut self, upload: Upload) -> Self {
        self.upload = Some(upload);
        self
    }

    /// Requests the raw byte stream instead of a parsed JSON body.
    #[must_use]
    pub const fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    #[must_use]
    pub const fn upload(&self) -> Option<&Upload> {
        self.upload.as_ref()
    }

    #[must_use]
    pub const fn is_stream(&self) -> bool {
        self.stream
    }

    pub(crate) const fn refreshes_on_unauthorized(&self) -> bool {
        self.refresh_on_unauthorized
    }
}

/// A local file sent as the `file` part of a multipart form.
///
/// The file is opened and streamed from disk each time the request is sent,
/// so it is never held in memory as a whole.
#[derive(Clone)]
pub struct Upload {
    path: PathBuf,
    file_name: String,
    field_name: String,
    mime_type: Option<String>,
    progress: Option<UploadProgress>,
}

impl Upload {
    /// Describes an upload of `path`; the remote file name defaults to its basename.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Self {
            path,
            file_name,
            field_name: "file".to_string(),
            mime_type: None,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Registers a hook called with the cumulative bytes streamed so far.
    ///
    /// If the upload is resent (transport retry or token refresh) the count
    /// restarts from zero.
    #[must_use]
    pub fn with_progress(mut self, progress: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub(crate) fn progress(&self) -> Option<&UploadProgress> {
        self.progress.as_ref()
    }
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("path", &self.path)
            .field("file_name", &self.file_name)
            .field("field_name", &self.field_name)
            .field("mime_type", &self.mime_type)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_keeps_order_and_skips_absent() {
        let request = ApiRequest::get("/contracts")
            .with_query("page", 1)
            .with_query("limit", 20)
            .with_query_opt("status", Some("draft"))
            .with_query_opt("type", None::<String>)
            .with_query("sortBy", "createdAt");

        let keys: Vec<&str> = request.query().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["page", "limit", "status", "sortBy"]);
        assert_eq!(request.query()[2].1, "draft");
    }

    #[test]
    fn test_bool_query_values_are_lowercase() {
        let request = ApiRequest::get("/templates").with_query("isPublic", true);
        assert_eq!(request.query()[0].1, "true");
    }

    #[test]
    fn test_with_json_serializes() {
        #[derive(Serialize)]
        struct Body<'a> {
            reason: &'a str,
        }
        let request = ApiRequest::post("/contracts/c-1/reject")
            .with_json(&Body { reason: "Terms" })
            .unwrap();
        assert_eq!(request.body(), Some(&json!({"reason": "Terms"})));
    }

    #[test]
    fn test_streaming_flag() {
        let request = ApiRequest::get("/contracts/c-1/export");
        assert!(!request.is_stream());
        assert!(request.streaming().is_stream());
    }

    #[test]
    fn test_for_endpoint_refresh_flag() {
        let login = ApiRequest::for_endpoint(Method::POST, &Endpoint::Login).unwrap();
        assert!(!login.refreshes_on_unauthorized());

        let me = ApiRequest::for_endpoint(Method::GET, &Endpoint::CurrentUser).unwrap();
        assert!(me.refreshes_on_unauthorized());
        assert_eq!(me.path(), "/users/me");
    }

    #[test]
    fn test_upload_defaults_to_basename() {
        let upload = Upload::new("/tmp/docs/nda-final.pdf");
        assert_eq!(upload.file_name(), "nda-final.pdf");
        assert_eq!(upload.field_name(), "file");
        assert_eq!(upload.mime_type(), None);
    }

    #[test]
    fn test_upload_overrides() {
        let upload = Upload::new("/tmp/a.bin")
            .with_file_name("contract.pdf")
            .with_mime_type("application/pdf")
            .with_progress(|_| {});
        assert_eq!(upload.file_name(), "contract.pdf");
        assert_eq!(upload.mime_type(), Some("application/pdf"));
        assert!(upload.progress().is_some());
        assert!(format!("{upload:?}").contains("progress: true"));
    }
}
