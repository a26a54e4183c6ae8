//! File-backed sink for the CLI
//!
//! Writes `<stem>.original.<ext>` and `<stem>.cutout.<ext>` into the output
//! directory and shows a spinner while an upload is in progress.

use crate::{prompt::TerminalOverlay, store::ImageSink, types::ImageRepresentation};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Default)]
struct SinkState {
    stem: String,
    spinner: Option<ProgressBar>,
}

/// [`ImageSink`] that saves published images to disk
#[derive(Debug)]
pub struct FileSink {
    output_dir: PathBuf,
    state: Mutex<SinkState>,
}

impl FileSink {
    /// Create a sink writing into `output_dir`, creating it if needed
    pub fn new<P: AsRef<Path>>(output_dir: P) -> std::io::Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            state: Mutex::new(SinkState {
                stem: "image".to_string(),
                spinner: None,
            }),
        })
    }

    /// Name prefix for the next published images
    pub fn set_target(&self, stem: &str) {
        self.lock().stem = stem.to_string();
    }

    /// Where an image of the given kind would be written
    #[must_use]
    pub fn path_for(&self, kind: &str, image: &ImageRepresentation) -> PathBuf {
        let stem = self.lock().stem.clone();
        self.output_dir
            .join(format!("{}.{}.{}", stem, kind, image.extension()))
    }

    fn write(&self, kind: &str, image: &ImageRepresentation) {
        let path = self.path_for(kind, image);
        match std::fs::write(&path, image.bytes()) {
            Ok(()) => info!("Saved {} image to {}", kind, path.display()),
            Err(e) => warn!("Failed to write {}: {}", path.display(), e),
        }
    }

    fn spin(&self, message: String) {
        let mut state = self.lock();
        let spinner = state.spinner.get_or_insert_with(|| {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        spinner.set_message(message);
    }

    fn stop(&self) {
        if let Some(spinner) = self.lock().spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ImageSink for FileSink {
    fn publish_original(&self, image: ImageRepresentation) {
        self.write("original", &image);
    }

    fn publish_processed(&self, image: ImageRepresentation) {
        self.write("cutout", &image);
    }

    fn set_uploading(&self, uploading: bool) {
        if uploading {
            let stem = self.lock().stem.clone();
            self.spin(format!("Reading {stem}"));
        } else {
            self.stop();
        }
    }

    fn set_processing(&self, processing: bool) {
        if processing {
            self.spin("Removing background...".to_string());
        } else {
            self.stop();
        }
    }
}

impl TerminalOverlay for FileSink {
    fn suspend(&self, f: &mut dyn FnMut()) {
        // Not held across `f`: the prompt may block on stdin
        let spinner = self.lock().spinner.clone();
        match spinner {
            Some(spinner) => spinner.suspend(f),
            None => f(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_publishes_to_named_files() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path().join("out")).unwrap();
        sink.set_target("beach");

        let original = ImageRepresentation::new("image/jpeg", b"orig".to_vec());
        let processed = ImageRepresentation::new("image/png", b"cut".to_vec());
        sink.publish_original(original);
        sink.publish_processed(processed);

        let out = dir.path().join("out");
        assert_eq!(std::fs::read(out.join("beach.original.jpg")).unwrap(), b"orig");
        assert_eq!(std::fs::read(out.join("beach.cutout.png")).unwrap(), b"cut");
    }

    #[test]
    fn test_flags_toggle_spinner() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path()).unwrap();

        sink.set_processing(true);
        assert!(sink.lock().spinner.is_some());
        sink.set_processing(false);
        assert!(sink.lock().spinner.is_none());
    }

    #[test]
    fn test_suspend_runs_prompt_beside_active_spinner() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path()).unwrap();
        sink.set_processing(true);

        let mut ran = 0;
        sink.suspend(&mut || {
            // The sink stays usable while the prompt is on screen
            assert!(sink.lock().spinner.is_some());
            ran += 1;
        });
        assert_eq!(ran, 1);
        assert!(sink.lock().spinner.is_some());

        sink.set_processing(false);
        let mut ran_without_spinner = false;
        sink.suspend(&mut || ran_without_spinner = true);
        assert!(ran_without_spinner);
    }
}
