pub mod config;
pub mod db;
pub mod intake;
pub mod models;
pub mod pipeline;
pub mod review;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for embedding binaries. Reads `RUST_LOG` when set,
/// defaulting to info-level output for this crate. Safe to call more than
/// once — later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("claimlens=info")),
        )
        .try_init();
}
