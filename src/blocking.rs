//! Synchronous bridge over the async resolver.
//!
//! Every call gets a fresh current-thread runtime that lives only for that
//! call. When the caller is itself inside a tokio runtime, the private
//! runtime runs on a scoped helper thread, since nesting `block_on` on a
//! runtime thread panics. The caller's runtime is never used to drive the
//! request.

use std::future::Future;

use tokio::runtime::{Builder, Handle};
use tracing::debug;

use crate::error::MetalinkError;

fn run_on_private_runtime<F: Future>(future: F) -> Result<F::Output, MetalinkError> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| MetalinkError::Runtime { source })?;
    Ok(runtime.block_on(future))
}

/// Runs `future` to completion on a private runtime and returns its output.
///
/// Blocks the calling thread until the future finishes.
///
/// # Errors
///
/// Returns [`MetalinkError::Runtime`] if the runtime cannot be built.
///
/// # Panics
///
/// Re-raises a panic from `future` on the calling thread.
pub fn block_on_isolated<F>(future: F) -> Result<F::Output, MetalinkError>
where
    F: Future + Send,
    F::Output: Send,
{
    if Handle::try_current().is_err() {
        return run_on_private_runtime(future);
    }

    debug!("called from inside a runtime, bridging on a helper thread");
    std::thread::scope(|scope| {
        scope
            .spawn(|| run_on_private_runtime(future))
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
    })
}
