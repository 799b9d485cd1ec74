//! File transfer helpers: streaming multipart uploads and chunked downloads.
//!
//! # Memory Usage
//!
//! Uploads are read from disk through a [`ReaderStream`] with a fixed buffer,
//! and downloads are written in [`DOWNLOAD_CHUNK_SIZE`] blocks. Neither side
//! ever holds the whole file, so a 2 GB transfer uses the same memory as a
//! 10 KB one.

use super::loud_wire;
use crate::errors::ContractError;
use crate::request::Upload;
use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use regex::Regex;
use reqwest::Body;
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::io::ReaderStream;

/// Buffer size used when streaming an upload from disk (64 KB).
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Size of each write when saving a download (8 KB).
pub const DOWNLOAD_CHUNK_SIZE: usize = 8 * 1024;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

static FILENAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*filename\s*=\s*(?:"([^"]*)"|([^;]*))"#)
        .expect("filename pattern is valid")
});

static EXTENDED_FILENAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|;)\s*filename\*\s*=\s*[^']*'[^']*'([^;]+)")
        .expect("extended filename pattern is valid")
});

/// Checks that `upload` points at a readable regular file and returns its size.
///
/// This runs before anything is sent, so a missing file never costs a
/// round trip.
///
/// # Errors
///
/// Returns [`ContractError::InvalidInput`] if the path is missing or not a file.
pub async fn check_upload(upload: &Upload) -> Result<u64, ContractError> {
    let path = upload.path();
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        tracing::warn!("Failed to access upload '{}': {}", path.display(), e);
        ContractError::InvalidInput(format!("File not found: {} ({e})", path.display()))
    })?;

    if !metadata.is_file() {
        return Err(ContractError::InvalidInput(format!(
            "Not a regular file: {}",
            path.display()
        )));
    }

    Ok(metadata.len())
}

/// Builds a multipart form that streams `upload` from disk.
///
/// A fresh form (and file handle) is built for every send attempt.
///
/// # Errors
///
/// Returns [`ContractError::InvalidInput`] if the file cannot be opened or the
/// MIME type is malformed.
pub async fn multipart_form(upload: &Upload) -> Result<Form, ContractError> {
    let size = check_upload(upload).await?;
    let path = upload.path();

    let file = tokio::fs::File::open(path).await.map_err(|e| {
        tracing::warn!("Failed to open upload '{}': {}", path.display(), e);
        ContractError::InvalidInput(format!("Failed to open file '{}': {e}", path.display()))
    })?;

    let request_id = loud_wire::next_request_id();
    loud_wire::log_upload_start(request_id, upload.file_name(), size);
    tracing::debug!(
        "Streaming upload: path={}, file_name={}, size={} bytes",
        path.display(),
        upload.file_name(),
        size
    );

    let stream = ReaderStream::with_capacity(file, UPLOAD_CHUNK_SIZE);
    let body = match upload.progress().cloned() {
        Some(progress) => {
            let mut sent = 0u64;
            Body::wrap_stream(stream.map(move |chunk| {
                if let Ok(bytes) = &chunk {
                    sent += bytes.len() as u64;
                    progress(sent);
                }
                chunk
            }))
        }
        None => Body::wrap_stream(stream),
    };

    let part = Part::stream_with_length(body, size)
        .file_name(upload.file_name().to_string())
        .mime_str(upload.mime_type().unwrap_or(DEFAULT_MIME_TYPE))
        .map_err(|e| ContractError::InvalidInput(format!("Invalid MIME type: {e}")))?;

    Ok(Form::new().part(upload.field_name().to_string(), part))
}

/// Extracts the file name from a `Content-Disposition` header value.
///
/// Accepts `filename="quoted"`, unquoted `filename=plain`, and RFC 5987
/// `filename*=UTF-8''percent%20encoded` (preferred when present). The result
/// is reduced to its final path component; names that reduce to nothing
/// (`..`, `/`) are rejected.
#[must_use]
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    let extended = EXTENDED_FILENAME_PATTERN
        .captures(header)
        .and_then(|caps| caps.get(1))
        .and_then(|m| urlencoding::decode(m.as_str().trim()).ok())
        .map(|decoded| decoded.into_owned());

    let raw = extended.or_else(|| {
        FILENAME_PATTERN.captures(header).and_then(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().trim().to_string())
        })
    })?;

    let name = raw.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

/// Decides where a download is written.
///
/// An explicit path that is an existing directory receives the suggested
/// name (or `fallback`); any other explicit path is used as is; with no
/// path the name is resolved against the current directory.
#[must_use]
pub fn resolve_output_path(
    output: Option<&Path>,
    suggested: Option<String>,
    fallback: String,
) -> PathBuf {
    match output {
        Some(path) if !path.is_dir() => path.to_path_buf(),
        Some(dir) => dir.join(suggested.unwrap_or(fallback)),
        None => PathBuf::from(suggested.unwrap_or(fallback)),
    }
}

/// Copies `stream` into `writer` in [`DOWNLOAD_CHUNK_SIZE`] writes.
///
/// Every write except possibly the last is exactly one chunk long, regardless
/// of how the network delivered the bytes.
pub async fn write_chunks<S, W>(stream: S, writer: &mut W) -> Result<u64, ContractError>
where
    S: Stream<Item = Result<Bytes, ContractError>>,
    W: AsyncWrite + Unpin,
{
    futures_util::pin_mut!(stream);

    let mut pending = BytesMut::with_capacity(DOWNLOAD_CHUNK_SIZE);
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let mut chunk = chunk?;
        while !chunk.is_empty() {
            let take = (DOWNLOAD_CHUNK_SIZE - pending.len()).min(chunk.len());
            pending.extend_from_slice(&chunk.split_to(take));
            if pending.len() == DOWNLOAD_CHUNK_SIZE {
                writer.write_all(&pending).await?;
                written += pending.len() as u64;
                pending.clear();
            }
        }
    }

    if !pending.is_empty() {
        writer.write_all(&pending).await?;
        written += pending.len() as u64;
    }
    writer.flush().await?;

    Ok(written)
}

/// Writes `stream` to `path`, replacing any existing file only on success.
///
/// Bytes go to a temporary file in the target directory, which is renamed
/// over `path` once the stream completes. On failure the temporary file is
/// removed and an existing file at `path` is left as it was.
pub async fn write_stream_to_file<S>(stream: S, path: &Path) -> Result<u64, ContractError>
where
    S: Stream<Item = Result<Bytes, ContractError>>,
{
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    // Deleted on drop unless persisted.
    let temp = tempfile::Builder::new()
        .prefix(".download-")
        .suffix(".part")
        .tempfile_in(parent)?;
    let mut file = tokio::fs::File::from_std(temp.reopen()?);

    let written = match write_chunks(stream, &mut file).await {
        Ok(written) => written,
        Err(e) => {
            tracing::debug!("Download to '{}' failed: {}", path.display(), e);
            return Err(e);
        }
    };
    file.sync_all().await?;
    drop(file);

    temp.persist(path).map_err(|e| e.error)?;

    tracing::debug!("Wrote {} bytes to {}", written, path.display());
    loud_wire::log_download_complete(&path.display().to_string(), written);
    Ok(written)
}
