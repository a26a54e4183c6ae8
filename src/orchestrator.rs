//! Upload orchestration: validate, decode, publish, remove background, publish
//!
//! One upload runs at a time. A call made while another is in flight is
//! rejected with [`CutoutError::Busy`] without touching any state.
//!
//! State machine for a single call:
//!
//! ```text
//! Idle -> (validation fails) -> Idle
//! Idle -> Uploading -> (decode fails) -> Failed
//! Idle -> Uploading -> Processing -> Done | Failed
//! ```

use crate::{
    client::BackgroundRemover,
    config::CutoutConfig,
    error::{CutoutError, Result},
    messages::Messages,
    prompt::Prompter,
    services::{FileValidator, ImageDecoder},
    store::ImageSink,
    tracing_config::spans,
    types::{ProcessingState, RawFile},
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn, Instrument};

/// Reason recorded when an upload ends without reaching a terminal state
const INTERRUPTED: &str = "upload interrupted";

/// Sequences one upload from raw file to published result
pub struct UploadOrchestrator {
    validator: FileValidator,
    decoder: ImageDecoder,
    remover: Arc<dyn BackgroundRemover>,
    sink: Arc<dyn ImageSink>,
    prompter: Arc<dyn Prompter>,
    messages: Messages,
    state: Mutex<ProcessingState>,
    in_flight: AtomicBool,
}

impl std::fmt::Debug for UploadOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOrchestrator")
            .field("validator", &self.validator)
            .field("remover", &self.remover.name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl UploadOrchestrator {
    pub fn new(
        remover: Arc<dyn BackgroundRemover>,
        sink: Arc<dyn ImageSink>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self {
            validator: FileValidator::default(),
            decoder: ImageDecoder::new(),
            remover,
            sink,
            prompter,
            messages: Messages::default(),
            state: Mutex::new(ProcessingState::Idle),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Orchestrator honoring the upload limit and locale of `config`
    pub fn from_config(
        config: &CutoutConfig,
        remover: Arc<dyn BackgroundRemover>,
        sink: Arc<dyn ImageSink>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self::new(remover, sink, prompter)
            .with_validator(FileValidator::new(config.max_upload_bytes))
            .with_messages(Messages::new(config.locale))
    }

    #[must_use]
    pub fn with_validator(mut self, validator: FileValidator) -> Self {
        self.validator = validator;
        self
    }

    #[must_use]
    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    /// Current state of the pipeline
    #[must_use]
    pub fn state(&self) -> ProcessingState {
        self.lock_state().clone()
    }

    /// Whether an upload currently owns the pipeline
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one file through the pipeline
    ///
    /// Every failure is reported to the user through the prompter before it is
    /// returned. Whatever was published before a failure stays published.
    ///
    /// # Errors
    /// - `Busy` if another upload is in flight (no state change)
    /// - `Validation` if the file is refused (state stays `Idle`)
    /// - `Decode` if the file cannot be read (state `Failed`)
    /// - `Removal` if background removal fails and no fallback was accepted (state `Failed`)
    pub async fn handle_upload(&self, file: RawFile) -> Result<()> {
        let Some(_flight) = FlightGuard::acquire(&self.in_flight) else {
            warn!(file = %file.name, "Upload rejected, another upload is in progress");
            self.prompter.alert(&self.messages.busy()).await;
            return Err(CutoutError::Busy);
        };

        let span = spans::upload(&file.name, &file.mime, file.size);
        self.run(file).instrument(span).await
    }

    async fn run(&self, file: RawFile) -> Result<()> {
        self.set_state(ProcessingState::Idle);

        if let Err(e) = self.validator.validate(&file) {
            warn!(error = %e, "File rejected");
            self.prompter.alert(&self.messages.validation(&e)).await;
            return Err(e.into());
        }

        let _transitions = TransitionGuard { orchestrator: self };

        self.set_state(ProcessingState::Uploading);
        self.sink.set_uploading(true);

        let original = match self.decoder.decode(&file).await {
            Ok(image) => image,
            Err(e) => {
                error!(error = %e, "Failed to read upload");
                self.fail(e.to_string());
                self.prompter.alert(&self.messages.upload_failed()).await;
                return Err(e.into());
            },
        };

        self.sink.publish_original(original.clone());
        self.sink.set_uploading(false);
        self.set_state(ProcessingState::Processing);
        self.sink.set_processing(true);

        info!(remover = self.remover.name(), bytes = original.len(), "Removing background");
        match self.remover.remove_background(&original).await {
            Ok(processed) => {
                self.sink.publish_processed(processed);
                self.sink.set_processing(false);
                self.set_state(ProcessingState::Done);
                info!("Upload complete");
                Ok(())
            },
            Err(e) => {
                error!(error = %e, "Upload failed");
                self.fail(e.to_string());
                self.prompter.alert(&self.messages.upload_failed()).await;
                Err(e.into())
            },
        }
    }

    /// Leave any in-flight state, clearing the matching sink flag
    fn fail(&self, reason: String) {
        let mut state = self.lock_state();
        match *state {
            ProcessingState::Uploading => self.sink.set_uploading(false),
            ProcessingState::Processing => self.sink.set_processing(false),
            _ => {},
        }
        *state = ProcessingState::Failed(reason);
    }

    fn set_state(&self, next: ProcessingState) {
        let mut state = self.lock_state();
        debug!("State transition: {} -> {}", *state, next);
        *state = next;
    }

    fn lock_state(&self) -> MutexGuard<'_, ProcessingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the single-flight slot when the upload ends
struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Moves a state stuck in `Uploading`/`Processing` to `Failed`
///
/// Covers panics in collaborators and a caller dropping the future mid-way.
struct TransitionGuard<'a> {
    orchestrator: &'a UploadOrchestrator,
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        if self.orchestrator.lock_state().is_in_flight() {
            warn!("Upload ended while in flight, marking as failed");
            self.orchestrator.fail(INTERRUPTED.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockRemover;
    use crate::error::{RemovalError, ValidationError};
    use crate::messages::Locale;
    use crate::prompt::ScriptedPrompter;
    use crate::store::{MemoryStore, StoreEvent};
    use crate::types::ImageRepresentation;
    use async_trait::async_trait;
    use std::time::Duration;

    struct FailingRemover;

    #[async_trait]
    impl BackgroundRemover for FailingRemover {
        async fn remove_background(
            &self,
            _image: &ImageRepresentation,
        ) -> std::result::Result<ImageRepresentation, RemovalError> {
            Err(RemovalError::service(500, "API Error: 500"))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct PanickingRemover;

    #[async_trait]
    impl BackgroundRemover for PanickingRemover {
        async fn remove_background(
            &self,
            _image: &ImageRepresentation,
        ) -> std::result::Result<ImageRepresentation, RemovalError> {
            panic!("remover blew up");
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    fn jpeg() -> RawFile {
        RawFile::from_bytes("photo.jpg", "image/jpeg", b"jpeg-data".to_vec())
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_upload_publishes_in_order() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = UploadOrchestrator::new(
            Arc::new(MockRemover::new(Duration::from_millis(1500))),
            store.clone(),
            Arc::new(ScriptedPrompter::default()),
        );

        orchestrator.handle_upload(jpeg()).await.unwrap();

        assert_eq!(orchestrator.state(), ProcessingState::Done);
        assert_eq!(
            store.events(),
            vec![
                StoreEvent::Uploading(true),
                StoreEvent::Original,
                StoreEvent::Uploading(false),
                StoreEvent::Processing(true),
                StoreEvent::Processed,
                StoreEvent::Processing(false),
            ]
        );
        assert!(!orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_removal_failure_keeps_original() {
        let store = Arc::new(MemoryStore::new());
        let prompter = Arc::new(ScriptedPrompter::default());
        let orchestrator =
            UploadOrchestrator::new(Arc::new(FailingRemover), store.clone(), prompter.clone());

        let err = orchestrator.handle_upload(jpeg()).await.unwrap_err();

        assert!(matches!(err, CutoutError::Removal(_)));
        assert_eq!(
            orchestrator.state(),
            ProcessingState::Failed("API Error: 500".to_string())
        );
        let snapshot = store.snapshot();
        assert!(snapshot.original.is_some());
        assert!(snapshot.processed.is_none());
        assert!(!snapshot.is_processing);
        assert!(!snapshot.is_uploading);
        assert_eq!(prompter.alerts(), vec![Messages::default().upload_failed()]);
    }

    #[tokio::test]
    async fn test_panic_in_remover_does_not_leave_processing() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = Arc::new(UploadOrchestrator::new(
            Arc::new(PanickingRemover),
            store.clone(),
            Arc::new(ScriptedPrompter::default()),
        ));

        let task = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.handle_upload(jpeg()).await }
        });
        assert!(task.await.unwrap_err().is_panic());

        assert_eq!(
            orchestrator.state(),
            ProcessingState::Failed(INTERRUPTED.to_string())
        );
        assert!(!store.snapshot().is_processing);
        assert!(!orchestrator.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_upload_is_marked_failed() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = UploadOrchestrator::new(
            Arc::new(MockRemover::new(Duration::from_secs(60))),
            store.clone(),
            Arc::new(ScriptedPrompter::default()),
        );

        let result =
            tokio::time::timeout(Duration::from_secs(1), orchestrator.handle_upload(jpeg())).await;
        assert!(result.is_err());

        assert_eq!(
            orchestrator.state(),
            ProcessingState::Failed(INTERRUPTED.to_string())
        );
        assert!(!store.snapshot().is_processing);
        assert!(!orchestrator.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_from_config_applies_limit_and_locale() {
        let config = CutoutConfig::builder()
            .max_upload_bytes(4)
            .locale(Locale::ZhCn)
            .build()
            .unwrap();
        let store = Arc::new(MemoryStore::new());
        let prompter = Arc::new(ScriptedPrompter::default());
        let orchestrator = UploadOrchestrator::from_config(
            &config,
            Arc::new(MockRemover::new(config.mock_delay())),
            store.clone(),
            prompter.clone(),
        );

        let err = orchestrator.handle_upload(jpeg()).await.unwrap_err();

        assert!(matches!(
            err,
            CutoutError::Validation(ValidationError::TooLarge { limit: 4, .. })
        ));
        assert_eq!(
            prompter.alerts(),
            vec![Messages::new(Locale::ZhCn).too_large(4)]
        );
        assert!(store.events().is_empty());
    }
}
