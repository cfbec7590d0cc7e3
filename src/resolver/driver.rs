//! Chunked fetch driver: transport bytes in, validated target out.
//!
//! One request is a straight line with a single suspension point per
//! iteration (the next chunk read). Parsing and validation run
//! synchronously between reads. Cancellation is observed at every
//! suspension point and ends the request without validating anything.

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};
use url::Url;

use crate::error::MetalinkError;
use crate::metalink::{MetalinkParser, MetalinkTarget, ResolvedTarget};
use crate::transport::{ByteStream, Transport, TransportError};

/// Maps transport failures, folding transport-side cancellation into
/// [`MetalinkError::Cancelled`].
fn transport_failure(error: TransportError) -> MetalinkError {
    match error {
        TransportError::Cancelled { .. } => MetalinkError::Cancelled,
        other => MetalinkError::Transport(other),
    }
}

/// Opens a bounded stream, giving up as soon as `cancel` fires.
pub(crate) async fn open_stream(
    transport: &dyn Transport,
    uri: &Url,
    max_size: u64,
    cancel: &CancellationToken,
) -> Result<Box<dyn ByteStream>, MetalinkError> {
    if cancel.is_cancelled() {
        return Err(MetalinkError::Cancelled);
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(MetalinkError::Cancelled),
        opened = transport.open_stream(uri, max_size, cancel) => opened.map_err(transport_failure),
    }
}

/// Reads the next chunk; empty means end of stream.
pub(crate) async fn read_next_chunk(
    stream: &mut dyn ByteStream,
    cancel: &CancellationToken,
) -> Result<Bytes, MetalinkError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(MetalinkError::Cancelled),
        chunk = stream.read_chunk(cancel) => chunk.map_err(transport_failure),
    }
}

/// Fetches the document for `target`, parses it incrementally and runs
/// the validation gate once the stream ends.
pub(crate) async fn fetch_and_parse(
    transport: &dyn Transport,
    target: &MetalinkTarget,
    cancel: &CancellationToken,
) -> Result<ResolvedTarget, MetalinkError> {
    debug!("opening metalink stream");
    let mut stream = open_stream(transport, &target.uri, target.max_size, cancel).await?;

    let mut parser = MetalinkParser::new(target.requested_file.as_str());
    let mut received: u64 = 0;
    loop {
        let chunk = read_next_chunk(stream.as_mut(), cancel).await.inspect_err(|error| {
            if matches!(error, MetalinkError::Cancelled) {
                debug!(received, "metalink fetch cancelled");
            }
        })?;
        if chunk.is_empty() {
            break;
        }
        received += chunk.len() as u64;
        trace!(len = chunk.len(), received, "feeding chunk");
        parser.feed(&chunk)?;
    }
    drop(stream);

    debug!(received, "end of stream, validating");
    let resolved = parser.finish()?.finalize(&target.requested_file)?;
    info!(
        file = %target.requested_file,
        mirror = %resolved.selected_uri,
        mirrors = resolved.mirrors.len(),
        size = resolved.declared_size,
        algorithm = %resolved.digest.algorithm,
        "metalink resolved"
    );
    Ok(resolved)
}
