#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # bgcutout
//!
//! Upload a photo, have its background removed by the remove.bg API, and
//! publish both the original and the result.
//!
//! The pipeline is `validate -> decode -> publish original -> remove background
//! -> publish processed`. Results and busy flags go to an injected
//! [`ImageSink`]; alerts and the fallback question go to an injected
//! [`Prompter`]. Without an API key the remote call is replaced by a mock that
//! returns the original image after a short delay.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bgcutout::{
//!     ConsolePrompter, CutoutConfig, FallbackPolicy, MemoryStore, Messages, RawFile,
//!     RemoveBgClient, UploadOrchestrator,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = CutoutConfig::from_env();
//! let messages = Messages::new(config.locale);
//! let prompter = Arc::new(ConsolePrompter::new(messages, FallbackPolicy::Ask));
//! let client = Arc::new(RemoveBgClient::new(config, prompter.clone())?);
//! let store = Arc::new(MemoryStore::new());
//!
//! let orchestrator =
//!     UploadOrchestrator::from_config(client.config(), client.clone(), store.clone(), prompter);
//! orchestrator.handle_upload(RawFile::from_path("portrait.jpg").await?).await?;
//!
//! let cutout = store.snapshot().processed.expect("published on success");
//! std::fs::write("portrait.cutout.png", cutout.bytes())?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): the `bgcutout` command-line frontend

#[cfg(feature = "cli")]
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod messages;
pub mod orchestrator;
pub mod prompt;
pub mod services;
pub mod store;
pub mod tracing_config;
pub mod types;

pub use client::{BackgroundRemover, MockRemover, RemoveBgClient};
pub use config::{CutoutConfig, CutoutConfigBuilder};
pub use error::{CutoutError, DecodeError, RemovalError, Result, ValidationError};
pub use messages::{Locale, Messages};
pub use orchestrator::UploadOrchestrator;
pub use prompt::{ConsolePrompter, FallbackPolicy, Prompter, ScriptedPrompter, TerminalOverlay};
pub use services::{FileValidator, ImageDecoder};
pub use store::{ImageSink, MemoryStore, StoreEvent, StoreSnapshot};
pub use tracing_config::{TracingConfig, TracingFormat};
pub use types::{FileContent, ImageRepresentation, ProcessingState, RawFile};
