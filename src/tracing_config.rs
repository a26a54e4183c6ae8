//! Log output for the binary
//!
//! Library code only emits events and spans. [`TracingConfig::init`] installs
//! the stderr subscriber used by the CLI.

use tracing::Level;
#[cfg(feature = "cli")]
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// How log lines are rendered on stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Colored lines for an interactive terminal
    #[default]
    Console,
    /// The same layout without ANSI escapes
    Compact,
}

/// Subscriber settings collected from the command line
#[derive(Debug, Default)]
pub struct TracingConfig {
    verbosity: u8,
    format: TracingFormat,
    env_filter: Option<String>,
    session_id: Option<String>,
}

impl TracingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `-v` flags given
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Explicit filter directive, takes precedence over the verbosity
    #[must_use]
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    #[must_use]
    pub fn with_session_id<S: Into<String>>(mut self, session_id: S) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Most detailed level enabled by the verbosity count
    #[must_use]
    pub fn level(&self) -> Level {
        match self.verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// Filter directive the subscriber is built from
    #[must_use]
    pub fn directive(&self) -> String {
        self.env_filter
            .clone()
            .unwrap_or_else(|| self.level().as_str().to_ascii_lowercase())
    }

    /// Install the global subscriber
    ///
    /// Fails if the directive does not parse or a subscriber is already set.
    #[cfg(feature = "cli")]
    pub fn init(self) -> anyhow::Result<()> {
        let filter = EnvFilter::try_new(self.directive())?;
        let output = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(self.format == TracingFormat::Console)
            .with_target(false)
            .compact();
        Registry::default().with(filter).with(output).try_init()?;

        if let Some(session_id) = &self.session_id {
            tracing::debug!(%session_id, "Cutout session started");
        }
        Ok(())
    }
}

/// Spans shared by the pipeline and the client
pub mod spans {
    use tracing::Span;

    /// One `handle_upload` call
    #[must_use]
    pub fn upload(file_name: &str, mime: &str, size: u64) -> Span {
        tracing::info_span!("upload", file = %file_name, %mime, size)
    }

    /// One request to the removal endpoint
    #[must_use]
    pub fn removal(endpoint: &str, payload_bytes: usize) -> Span {
        tracing::debug_span!("removal", %endpoint, payload_bytes)
    }
}
