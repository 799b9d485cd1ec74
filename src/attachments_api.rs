//! File transfer: attachment upload and download, contract export.
//!
//! Transfers stream between disk and network in bounded chunks; see
//! [`ByteStream::write_to`] for the download side.

use crate::client::Client;
use crate::errors::ContractError;
use crate::http::common::Endpoint;
use crate::http::files;
use crate::request::{ApiRequest, Upload};
use crate::response::ByteStream;
use reqwest::Method;
use serde_json::Value;
use std::path::{Path, PathBuf};

impl Client {
    /// Uploads a local file as an attachment of a contract.
    ///
    /// The remote file name defaults to the local basename. The file is
    /// streamed from disk, never read into memory as a whole.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::InvalidInput`] without sending anything if
    /// `path` does not exist or is not a regular file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use contract_sdk::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), contract_sdk::ContractError> {
    /// # let client = Client::new("https://contracts.example.com")?;
    /// let attachment = client
    ///     .upload_attachment("c-42", "scans/signed-page-3.pdf", None)
    ///     .await?;
    /// println!("Stored as {}", attachment["id"]);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn upload_attachment(
        &self,
        contract_id: &str,
        path: impl AsRef<Path>,
        file_name: Option<&str>,
    ) -> Result<Value, ContractError> {
        let mut upload = Upload::new(path);
        if let Some(name) = file_name {
            upload = upload.with_file_name(name);
        }
        self.send_upload(contract_id, upload).await
    }

    /// Like [`upload_attachment`](Self::upload_attachment), calling `progress`
    /// with the cumulative number of bytes streamed so far.
    pub async fn upload_attachment_with_progress(
        &self,
        contract_id: &str,
        path: impl AsRef<Path>,
        file_name: Option<&str>,
        progress: impl Fn(u64) + Send + Sync + 'static,
    ) -> Result<Value, ContractError> {
        let mut upload = Upload::new(path).with_progress(progress);
        if let Some(name) = file_name {
            upload = upload.with_file_name(name);
        }
        self.send_upload(contract_id, upload).await
    }

    async fn send_upload(&self, contract_id: &str, upload: Upload) -> Result<Value, ContractError> {
        let size = files::check_upload(&upload).await?;
        tracing::debug!(
            "Uploading attachment: contract={}, file_name={}, size={} bytes",
            contract_id,
            upload.file_name(),
            size
        );

        let request = ApiRequest::for_endpoint(Method::POST, &Endpoint::Attachments { contract_id })?
            .with_upload(upload);
        self.send_json(request).await
    }

    /// Downloads an attachment and returns the path it was written to.
    ///
    /// `output` may be a file path (used as is) or an existing directory. For
    /// a directory, or `None` for the current directory, the file name comes
    /// from the `Content-Disposition` header, falling back to
    /// `attachment_{attachment_id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the file cannot be written.
    /// An existing file at the target is only replaced once the download
    /// completes; a failed transfer leaves no partial file behind.
    pub async fn download_attachment(
        &self,
        contract_id: &str,
        attachment_id: &str,
        output: Option<&Path>,
    ) -> Result<PathBuf, ContractError> {
        let request = ApiRequest::for_endpoint(
            Method::GET,
            &Endpoint::Attachment {
                contract_id,
                attachment_id,
            },
        )?;
        let stream = self.execute_stream(request).await?;
        save(stream, output, format!("attachment_{attachment_id}")).await
    }

    /// Exports a contract document (e.g. `pdf`, `docx`) to disk.
    ///
    /// Output path resolution follows
    /// [`download_attachment`](Self::download_attachment), with
    /// `contract_{contract_id}.{format}` as the fallback name.
    pub async fn export_contract(
        &self,
        contract_id: &str,
        format: &str,
        output: Option<&Path>,
    ) -> Result<PathBuf, ContractError> {
        let request = ApiRequest::for_endpoint(Method::GET, &Endpoint::Export { contract_id })?
            .with_query("format", format);
        let stream = self.execute_stream(request).await?;
        save(stream, output, format!("contract_{contract_id}.{format}")).await
    }
}

async fn save(
    stream: ByteStream,
    output: Option<&Path>,
    fallback: String,
) -> Result<PathBuf, ContractError> {
    let path = files::resolve_output_path(output, stream.suggested_filename(), fallback);
    let written = stream.write_to(&path).await?;
    tracing::debug!("Downloaded {} bytes to {}", written, path.display());
    Ok(path)
}
