//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;
use url::Url;

use metalink_core::transport::{CONNECT_TIMEOUT_SECS, DEFAULT_MAX_DOCUMENT_SIZE, READ_TIMEOUT_SECS};

/// Resolve a file from a metalink document to a verified mirror.
///
/// Fetches the metalink, picks the first HTTP(S) mirror for the requested
/// file and prints it with the declared size and digest. With `--output`,
/// also downloads that mirror and checks it before writing.
#[derive(Parser, Debug)]
#[command(name = "metalink-resolve")]
#[command(author, version, about)]
pub struct Args {
    /// Metalink document URI (http, https or file)
    #[arg(value_name = "METALINK_URI")]
    pub metalink_uri: Url,

    /// Name of the `<file>` entry to resolve
    #[arg(short, long, value_name = "NAME")]
    pub file: String,

    /// Maximum metalink document size in bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_DOCUMENT_SIZE, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_size: u64,

    /// Download the selected mirror, verify it and write it here
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Connection timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = CONNECT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub connect_timeout: u64,

    /// Overall request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = READ_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub read_timeout: u64,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
