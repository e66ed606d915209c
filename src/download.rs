//! Streaming Report Downloader
//!
//! Fetches a binary resource, reads it chunk by chunk while reporting
//! progress, and reassembles it into one contiguous buffer.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use tracing::{debug, info};

use crate::blob::Blob;
use crate::errors::{ApiError, Result};
use crate::protocol::{
    content_length_from_headers, content_type_from_headers, filename_from_headers,
    progress_percent,
};
use crate::transport::Transport;

/// Upper bound on the buffer reserved up front from `Content-Length`
const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

/// A fully assembled download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// Assembled payload
    pub blob: Blob,
    /// Filename suggested by the server, or the fallback
    pub filename: String,
}

/// Reads a chunk stream to completion
///
/// Chunks are appended in arrival order. When `total` is known, `on_progress`
/// is called after every chunk with the rounded percentage; when it is not,
/// `on_progress` is never called. A read error aborts the loop and is
/// returned as is; nothing read so far is exposed.
pub async fn assemble_chunks<S, E, F>(stream: S, total: Option<u64>, mut on_progress: F) -> Result<Bytes>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Into<ApiError>,
    F: FnMut(u8),
{
    let mut stream = std::pin::pin!(stream);
    let capacity = total.map(|t| t.min(MAX_PREALLOCATION)).unwrap_or(0) as usize;
    let mut buffer = BytesMut::with_capacity(capacity);
    let mut received: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Into::into)?;
        received += chunk.len() as u64;
        buffer.extend_from_slice(&chunk);

        if let Some(total) = total {
            on_progress(progress_percent(received, total));
        }
    }

    debug!(received, ?total, "stream exhausted");
    Ok(buffer.freeze())
}

/// Downloads report bodies through a [`Transport`]
#[derive(Clone)]
pub(crate) struct Downloader {
    transport: Arc<Transport>,
    fallback_filename: String,
    default_content_type: String,
}

impl Downloader {
    /// Creates a downloader with the given fallbacks
    pub(crate) fn new(
        transport: Arc<Transport>,
        fallback_filename: impl Into<String>,
        default_content_type: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            fallback_filename: fallback_filename.into(),
            default_content_type: default_content_type.into(),
        }
    }

    /// Downloads the resource at `segments`, relative to the API origin
    pub(crate) async fn fetch<F>(&self, segments: &[&str], on_progress: F) -> Result<DownloadResult>
    where
        F: FnMut(u8),
    {
        let url = self.transport.endpoint(segments)?;
        let response = self.transport.open_stream(url.clone()).await?;

        let headers = response.headers();
        let filename = filename_from_headers(headers, &self.fallback_filename);
        let total = content_length_from_headers(headers);
        let content_type = content_type_from_headers(headers, &self.default_content_type);
        debug!(url = %url, %filename, ?total, %content_type, "report stream opened");

        let data = assemble_chunks(response.bytes_stream(), total, on_progress).await?;
        info!(url = %url, %filename, size = data.len(), "report downloaded");

        Ok(DownloadResult {
            blob: Blob::new(data, content_type),
            filename,
        })
    }
}
