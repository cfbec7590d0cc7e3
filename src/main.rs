//! CLI entry point for metalink resolution.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use metalink_core::metalink::MetalinkTarget;
use metalink_core::resolver::MetalinkResolver;
use metalink_core::transport::DefaultTransport;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            ctrl_c_token.cancel();
        }
    });

    let transport = DefaultTransport::with_timeouts(args.connect_timeout, args.read_timeout)
        .context("failed to set up HTTP transport")?;
    let resolver = MetalinkResolver::new(Arc::new(transport));
    let target = MetalinkTarget::new(args.metalink_uri.clone(), args.file.as_str(), args.max_size);

    let resolved = resolver
        .resolve_async(&target, &cancel)
        .await
        .with_context(|| format!("cannot resolve {} from {}", args.file, args.metalink_uri))?;

    println!("{}", resolved.selected_uri);
    println!("size   {}", resolved.declared_size);
    println!("digest {}", resolved.digest);
    for mirror in resolved.mirrors.iter().skip(1) {
        println!("mirror {mirror}");
    }

    let Some(output) = args.output else {
        return Ok(());
    };

    let payload = resolver
        .fetch_verified(resolved, &cancel)
        .await
        .context("mirror download failed verification")?;
    tokio::fs::write(&output, &payload.data)
        .await
        .with_context(|| format!("cannot write {}", output.display()))?;
    info!(
        path = %output.display(),
        bytes = payload.data.len(),
        "verified payload written"
    );

    Ok(())
}
