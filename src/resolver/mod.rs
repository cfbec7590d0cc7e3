//! Resolves a metalink document URI to one trusted mirror target.
//!
//! [`MetalinkResolver`] owns a [`Transport`] and drives a single request per
//! call: open the document, feed chunks to the push parser, validate at end
//! of stream. Each call gets its own parser and record, so one resolver can
//! serve any number of concurrent requests.
//!
//! # Architecture
//!
//! - [`MetalinkResolver::resolve_async`] - Cancellable async entry point
//! - [`MetalinkResolver::resolve_sync`] - Same request on a private runtime
//!   (see [`crate::blocking`])
//! - [`MetalinkResolver::fetch_verified`] - Downloads the selected mirror
//!   and checks it against the declared size and digest
//! - [`resolve_async`] / [`resolve_sync`] - One-shot helpers using
//!   [`DefaultTransport`]
//!
//! # Example
//!
//! ```no_run
//! use metalink_core::metalink::MetalinkTarget;
//! use metalink_core::resolver::MetalinkResolver;
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = MetalinkResolver::with_default_transport();
//! let target = MetalinkTarget::new(
//!     Url::parse("https://mirrors.example/metalink?repo=updates")?,
//!     "repomd.xml",
//!     10 * 1024 * 1024,
//! );
//! let resolved = resolver.resolve_async(&target, &CancellationToken::new()).await?;
//! println!("{} ({} bytes, {})", resolved.selected_uri, resolved.declared_size, resolved.digest);
//! # Ok(())
//! # }
//! ```

mod driver;

pub(crate) use driver::{open_stream, read_next_chunk};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::instrument;
use url::Url;

use crate::blocking;
use crate::error::MetalinkError;
use crate::metalink::{MetalinkTarget, ResolvedTarget};
use crate::transport::{DefaultTransport, Transport};
use crate::verify::{self, VerifiedPayload};

/// Resolves metalink documents through a shared transport.
#[derive(Clone)]
pub struct MetalinkResolver {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for MetalinkResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetalinkResolver").finish_non_exhaustive()
    }
}

impl Default for MetalinkResolver {
    fn default() -> Self {
        Self::with_default_transport()
    }
}

impl MetalinkResolver {
    /// Creates a resolver that fetches through `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Creates a resolver using [`DefaultTransport`] (`http`, `https`, `file`).
    #[must_use]
    pub fn with_default_transport() -> Self {
        Self::new(Arc::new(DefaultTransport::new()))
    }

    /// Returns the transport this resolver fetches through.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Fetches and parses the metalink document, then validates it.
    ///
    /// Cancelling `cancel` at any point ends the request with
    /// [`MetalinkError::Cancelled`]; validation never runs on a cancelled
    /// request.
    ///
    /// # Errors
    ///
    /// - [`MetalinkError::Transport`] if the document cannot be fetched
    /// - [`MetalinkError::Parse`] on the first grammar or XML error
    /// - [`MetalinkError::Validation`] if the parsed document is not trusted
    /// - [`MetalinkError::Cancelled`] if `cancel` fired first
    #[instrument(skip(self, target, cancel), fields(uri = %target.uri, file = %target.requested_file))]
    pub async fn resolve_async(
        &self,
        target: &MetalinkTarget,
        cancel: &CancellationToken,
    ) -> Result<ResolvedTarget, MetalinkError> {
        driver::fetch_and_parse(self.transport.as_ref(), target, cancel).await
    }

    /// Blocking form of [`resolve_async`](Self::resolve_async).
    ///
    /// Safe to call from inside an async runtime: the request runs on a
    /// private runtime on its own thread.
    ///
    /// # Errors
    ///
    /// Same as [`resolve_async`](Self::resolve_async), plus
    /// [`MetalinkError::Runtime`] if the private runtime cannot start.
    pub fn resolve_sync(
        &self,
        target: &MetalinkTarget,
        cancel: &CancellationToken,
    ) -> Result<ResolvedTarget, MetalinkError> {
        blocking::block_on_isolated(self.resolve_async(target, cancel))?
    }

    /// Downloads the selected mirror of `resolved` and checks it.
    ///
    /// # Errors
    ///
    /// - [`MetalinkError::Transport`] if the payload cannot be fetched
    /// - [`MetalinkError::SizeMismatch`] / [`MetalinkError::DigestMismatch`]
    ///   if the payload does not match the document
    /// - [`MetalinkError::Cancelled`] if `cancel` fired first
    pub async fn fetch_verified(
        &self,
        resolved: ResolvedTarget,
        cancel: &CancellationToken,
    ) -> Result<VerifiedPayload, MetalinkError> {
        verify::fetch_verified(self.transport.as_ref(), resolved, cancel).await
    }

    /// Blocking form of [`fetch_verified`](Self::fetch_verified).
    ///
    /// # Errors
    ///
    /// Same as [`fetch_verified`](Self::fetch_verified), plus
    /// [`MetalinkError::Runtime`].
    pub fn fetch_verified_sync(
        &self,
        resolved: ResolvedTarget,
        cancel: &CancellationToken,
    ) -> Result<VerifiedPayload, MetalinkError> {
        blocking::block_on_isolated(self.fetch_verified(resolved, cancel))?
    }
}

/// Resolves `requested_file_name` from the document at `document_uri` using
/// the default transport.
///
/// # Errors
///
/// See [`MetalinkResolver::resolve_async`].
pub async fn resolve_async(
    document_uri: &Url,
    requested_file_name: &str,
    max_document_size: u64,
    cancel: &CancellationToken,
) -> Result<ResolvedTarget, MetalinkError> {
    let target = MetalinkTarget::new(document_uri.clone(), requested_file_name, max_document_size);
    MetalinkResolver::with_default_transport()
        .resolve_async(&target, cancel)
        .await
}

/// Blocking form of [`resolve_async`].
///
/// # Errors
///
/// See [`MetalinkResolver::resolve_sync`].
pub fn resolve_sync(
    document_uri: &Url,
    requested_file_name: &str,
    max_document_size: u64,
    cancel: &CancellationToken,
) -> Result<ResolvedTarget, MetalinkError> {
    let target = MetalinkTarget::new(document_uri.clone(), requested_file_name, max_document_size);
    MetalinkResolver::with_default_transport().resolve_sync(&target, cancel)
}
