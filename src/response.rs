//! Results returned by the request pipeline.

use crate::errors::ContractError;
use crate::http::files;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};
use reqwest::{Response, StatusCode};
use serde_json::Value;
use std::path::Path;

/// Outcome of [`Client::execute`](crate::Client::execute).
#[derive(Debug)]
pub enum ApiResponse {
    /// A parsed JSON body.
    Json(Value),
    /// A successful response with an empty body.
    NoContent,
    /// A live body stream, returned for streaming requests.
    Stream(ByteStream),
}

impl ApiResponse {
    /// Returns the JSON body, or `None` for `NoContent` and streams.
    #[must_use]
    pub fn json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_no_content(&self) -> bool {
        matches!(self, Self::NoContent)
    }

    /// Converts to `Option<Value>`, where `None` means no content.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::MalformedResponse`] for a stream.
    pub fn into_json(self) -> Result<Option<Value>, ContractError> {
        match self {
            Self::Json(value) => Ok(Some(value)),
            Self::NoContent => Ok(None),
            Self::Stream(_) => Err(ContractError::MalformedResponse(
                "Expected a JSON body but the request was streamed".to_string(),
            )),
        }
    }

    /// Like [`into_json`](Self::into_json) but maps no content to `Value::Null`.
    pub(crate) fn into_value(self) -> Result<Value, ContractError> {
        self.into_json().map(Option::unwrap_or_default)
    }

    /// Returns the byte stream of a streaming response.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::MalformedResponse`] if the response was buffered.
    pub fn into_byte_stream(self) -> Result<ByteStream, ContractError> {
        match self {
            Self::Stream(stream) => Ok(stream),
            _ => Err(ContractError::MalformedResponse(
                "Expected a byte stream but the response was buffered".to_string(),
            )),
        }
    }
}

/// An open response body with its status and headers.
///
/// The connection stays checked out until the stream is drained or the value
/// is dropped; dropping it early releases the connection.
#[derive(Debug)]
pub struct ByteStream {
    status: StatusCode,
    headers: HeaderMap,
    response: Response,
}

impl ByteStream {
    pub(crate) fn new(response: Response) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            response,
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// File name suggested by the `Content-Disposition` header, if any.
    #[must_use]
    pub fn suggested_filename(&self) -> Option<String> {
        self.headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(files::filename_from_content_disposition)
    }

    /// Consumes the response into a stream of body chunks.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, ContractError>> + Send {
        self.response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ContractError::from_transport))
    }

    /// Writes the body to `path` in fixed-size chunks and returns the byte count.
    ///
    /// The body is written to a temporary file that replaces `path` only on
    /// success, so a failed transfer leaves an existing file untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written, or the
    /// connection fails mid-transfer.
    pub async fn write_to(self, path: impl AsRef<Path>) -> Result<u64, ContractError> {
        files::write_stream_to_file(self.into_stream(), path.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_json() {
        let response = ApiResponse::Json(json!({"id": "c-1"}));
        assert_eq!(response.json(), Some(&json!({"id": "c-1"})));
        assert_eq!(response.into_json().unwrap(), Some(json!({"id": "c-1"})));
    }

    #[test]
    fn test_no_content() {
        let response = ApiResponse::NoContent;
        assert!(response.is_no_content());
        assert!(response.json().is_none());
        assert_eq!(ApiResponse::NoContent.into_json().unwrap(), None);
        assert_eq!(ApiResponse::NoContent.into_value().unwrap(), Value::Null);
    }

    #[test]
    fn test_buffered_response_is_not_a_stream() {
        let err = ApiResponse::NoContent.into_byte_stream().unwrap_err();
        assert!(matches!(err, ContractError::MalformedResponse(_)));
    }
}
