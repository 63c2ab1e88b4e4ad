use std::io;
use std::net::SocketAddr;

use logomark::background::ENV_REMOVE_BG_API_KEY;

use crate::cli::Cli;

pub fn report_startup_error(bind: SocketAddr, err: &io::Error) {
    match err.kind() {
        io::ErrorKind::AddrInUse => {
            eprintln!("Address {bind} is already in use.");
            eprintln!();
            eprintln!("Please choose another address:");
            eprintln!("  - Use --bind <addr>");
            eprintln!("  - Or set environment variable LOGOMARK_BIND");
        }
        io::ErrorKind::PermissionDenied => {
            eprintln!("Not allowed to listen on {bind}: {err}");
            eprintln!();
            eprintln!("Ports below 1024 usually need elevated privileges; try --bind 0.0.0.0:3000.");
        }
        _ => {
            eprintln!("Server failed: {err}");
        }
    }
}

/// Warn about credentials that will make some requests fail. Startup continues either way.
pub fn warn_missing_credentials(cli: &Cli) {
    if cli.remove_bg.removebg_api_key.as_deref().is_none_or(str::is_empty) {
        tracing::warn!(
            variable = ENV_REMOVE_BG_API_KEY,
            "background removal key is not set; every processing request will fail"
        );
    }
    if let Err(err) = logomark::RemoteVectorizer::ensure_configured(&cli.vectorizer.client()) {
        tracing::warn!(scheme = %cli.vectorizer.vectorizer_auth, error = %err, "vector-service mode is unavailable");
    }
}
