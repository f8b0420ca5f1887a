//! Logging setup shared by the `docent` and `docent-mcp` binaries.
//!
//! Logs go to stderr; stdout carries command output and, for the MCP server,
//! the protocol itself.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install the global subscriber. `RUST_LOG` takes precedence over
/// `default_level`. Only the first call has an effect.
pub fn init(default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    });
}
