//! bgcutout CLI
//!
//! Removes photo backgrounds through the remove.bg API, falling back to a
//! mock result when no API key is configured.

#[cfg(feature = "cli")]
use bgcutout::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
