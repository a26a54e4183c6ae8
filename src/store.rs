//! Capability through which the pipeline publishes its results
//!
//! The orchestrator never reaches into global state; it is handed an
//! [`ImageSink`] and calls its four setters as fire-and-forget notifications.

use crate::types::ImageRepresentation;
use std::sync::{Mutex, PoisonError};

/// Receiver of pipeline results and busy flags
pub trait ImageSink: Send + Sync {
    /// Publish the decoded input image
    fn publish_original(&self, image: ImageRepresentation);

    /// Publish the background-free result
    fn publish_processed(&self, image: ImageRepresentation);

    /// Toggle the "reading file" indicator
    fn set_uploading(&self, uploading: bool);

    /// Toggle the "removing background" indicator
    fn set_processing(&self, processing: bool);
}

/// Everything a UI would render, read in one piece
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub original: Option<ImageRepresentation>,
    pub processed: Option<ImageRepresentation>,
    pub is_uploading: bool,
    pub is_processing: bool,
}

/// One setter call, in the order it arrived
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Original,
    Processed,
    Uploading(bool),
    Processing(bool),
}

#[derive(Debug, Default)]
struct StoreInner {
    snapshot: StoreSnapshot,
    events: Vec<StoreEvent>,
}

/// In-memory store
///
/// All fields sit behind a single lock, so a [`snapshot`](Self::snapshot)
/// never mixes values from before and after a setter call.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        self.lock().snapshot.clone()
    }

    /// Setter calls received so far
    #[must_use]
    pub fn events(&self) -> Vec<StoreEvent> {
        self.lock().events.clone()
    }

    /// Clear published images, flags and history
    pub fn reset(&self) {
        *self.lock() = StoreInner::default();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ImageSink for MemoryStore {
    fn publish_original(&self, image: ImageRepresentation) {
        let mut inner = self.lock();
        inner.snapshot.original = Some(image);
        inner.events.push(StoreEvent::Original);
    }

    fn publish_processed(&self, image: ImageRepresentation) {
        let mut inner = self.lock();
        inner.snapshot.processed = Some(image);
        inner.events.push(StoreEvent::Processed);
    }

    fn set_uploading(&self, uploading: bool) {
        let mut inner = self.lock();
        inner.snapshot.is_uploading = uploading;
        inner.events.push(StoreEvent::Uploading(uploading));
    }

    fn set_processing(&self, processing: bool) {
        let mut inner = self.lock();
        inner.snapshot.is_processing = processing;
        inner.events.push(StoreEvent::Processing(processing));
    }
}
