//! Selection and submit flow of the upload client.
//!
//! A [`Session`] owns the selected image and the [`ProcessingState`]. Every
//! submit takes a new generation number; a response or animation tick that
//! belongs to an older generation is dropped without touching the state, so
//! choosing another file mid-flight cancels the visible effects of the old one.

use super::error::ClientError;
use super::selection::SelectedImage;
use super::state::{ProcessingState, STEPS};
use super::uploader::Uploader;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Timing of the cosmetic progress animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// How long step 1 stays visible before a quick stop is shown
    pub quick_stop_hold: Duration,
    /// Time each of steps 2-5 stays active
    pub step_interval: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            quick_stop_hold: Duration::from_millis(1200),
            step_interval: Duration::from_millis(600),
        }
    }
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            quick_stop_hold: Duration::ZERO,
            step_interval: Duration::ZERO,
        }
    }
}

/// Notified with a snapshot after every state transition
pub trait ProgressObserver: Send + Sync {
    fn on_update(&self, state: &ProcessingState);
}

impl ProgressObserver for () {
    fn on_update(&self, _state: &ProcessingState) {}
}

/// How a call to [`Session::submit`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The state reached a terminal value for this submit
    Settled,
    /// A newer selection or submit took over; nothing more was applied
    Superseded,
    /// Nothing was sent: no file, or a request already in flight
    Refused,
}

#[derive(Default)]
struct Inner {
    selected: Option<SelectedImage>,
    state: ProcessingState,
    generation: u64,
}

/// Shared handle to the client state; clones see the same session
#[derive(Clone, Default)]
pub struct Session {
    inner: Arc<Mutex<Inner>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ProcessingState {
        self.lock().state.clone()
    }

    pub fn selected(&self) -> Option<SelectedImage> {
        self.lock().selected.clone()
    }

    /// Submit is only possible with a file and no request in flight
    pub fn can_submit(&self) -> bool {
        let inner = self.lock();
        inner.selected.is_some() && !inner.state.is_processing()
    }

    /// Validate and select an image.
    ///
    /// A valid selection replaces the previous one, resets the state and
    /// invalidates any submit still running. A rejected one leaves everything
    /// as it was apart from the inline error.
    pub fn select(&self, image: SelectedImage) -> Result<(), ClientError> {
        let mut inner = self.lock();
        if let Err(e) = image.validate() {
            tracing::debug!("Rejected selection {}: {}", image.file_name(), e);
            inner.state.reject(e.to_string());
            return Err(e);
        }
        inner.generation += 1;
        inner.selected = Some(image);
        inner.state.select();
        Ok(())
    }

    pub fn remove(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.selected = None;
        inner.state.clear();
    }

    /// Upload the selected image and play the progress animation.
    ///
    /// Step 1 is active while the request is in flight. A quick stop holds it
    /// for `quick_stop_hold` and then marks steps 2-5 skipped; otherwise steps
    /// 2-5 are activated one per `step_interval` before the final state.
    pub async fn submit<U>(
        &self,
        uploader: &U,
        pacing: Pacing,
        observer: &dyn ProgressObserver,
    ) -> SubmitOutcome
    where
        U: Uploader + ?Sized,
    {
        let (image, generation, snapshot) = {
            let mut inner = self.lock();
            if inner.state.is_processing() {
                return SubmitOutcome::Refused;
            }
            let Some(image) = inner.selected.clone() else {
                inner.state.reject(ClientError::NothingSelected.to_string());
                let snapshot = inner.state.clone();
                drop(inner);
                observer.on_update(&snapshot);
                return SubmitOutcome::Refused;
            };
            inner.generation += 1;
            inner.state.start_upload();
            (image, inner.generation, inner.state.clone())
        };
        observer.on_update(&snapshot);

        let response = match uploader.upload(&image).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Upload of {} failed: {}", image.file_name(), e);
                return self.apply(generation, observer, |s| s.fail(e.to_string()));
            }
        };

        if response.no_text_found && response.quick_stop {
            pause(pacing.quick_stop_hold).await;
            return self.apply(generation, observer, |s| s.no_text(true));
        }

        for step in STEPS.iter().skip(1) {
            let outcome = self.apply(generation, observer, |s| s.advance(step.id));
            if outcome == SubmitOutcome::Superseded {
                return outcome;
            }
            pause(pacing.step_interval).await;
        }

        if response.no_text_found {
            return self.apply(generation, observer, |s| s.no_text(false));
        }

        match response.data {
            Some(result) => self.apply(generation, observer, |s| s.finish(result)),
            None => self.apply(generation, observer, |s| {
                s.fail(ClientError::InvalidResponse("missing data".to_string()).to_string())
            }),
        }
    }

    /// Apply a transition if `generation` is still current, then notify
    fn apply<F>(&self, generation: u64, observer: &dyn ProgressObserver, f: F) -> SubmitOutcome
    where
        F: FnOnce(&mut ProcessingState),
    {
        let snapshot = {
            let mut inner = self.lock();
            if inner.generation != generation {
                tracing::debug!(
                    "Dropping update for submit {} (current {})",
                    generation,
                    inner.generation
                );
                return SubmitOutcome::Superseded;
            }
            f(&mut inner.state);
            inner.state.clone()
        };
        observer.on_update(&snapshot);
        SubmitOutcome::Settled
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UploadResponse;
    use crate::client::state::{StepStatus, UiState};
    use crate::parser::ParsedResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeUploader {
        response: Box<dyn Fn() -> Result<UploadResponse, ClientError> + Send + Sync>,
        calls: AtomicUsize,
    }

    impl FakeUploader {
        fn new(
            response: impl Fn() -> Result<UploadResponse, ClientError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                response: Box::new(response),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Uploader for FakeUploader {
        async fn upload(&self, _image: &SelectedImage) -> Result<UploadResponse, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.response)()
        }
    }

    #[derive(Default)]
    struct Recorder {
        states: Mutex<Vec<ProcessingState>>,
    }

    impl Recorder {
        fn steps(&self) -> Vec<u8> {
            self.states
                .lock()
                .unwrap()
                .iter()
                .map(|s| s.current_step())
                .collect()
        }
    }

    impl ProgressObserver for Recorder {
        fn on_update(&self, state: &ProcessingState) {
            self.states.lock().unwrap().push(state.clone());
        }
    }

    fn png(size: usize) -> SelectedImage {
        SelectedImage::new("photo.png", "image/png", vec![0; size])
    }

    fn parsed() -> ParsedResult {
        ParsedResult {
            original_text: "Hola".to_string(),
            detected_language: "Spanish".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_oversized_selection_never_uploads() {
        let session = Session::new();
        let uploader = FakeUploader::new(|| Ok(UploadResponse::no_text()));

        let err = session.select(png(12 * 1024 * 1024)).unwrap_err();
        assert!(matches!(err, ClientError::FileTooLarge { .. }));
        assert!(!session.can_submit());
        assert_eq!(
            session.snapshot().error(),
            Some("File size too large. Please select an image under 10MB.")
        );
        assert_eq!(session.snapshot().ui(), &UiState::Idle);

        let outcome =
            tokio_test::block_on(session.submit(&uploader, Pacing::none(), &()));
        assert_eq!(outcome, SubmitOutcome::Refused);
        assert_eq!(uploader.calls(), 0);
        assert_eq!(
            session.snapshot().error(),
            Some("Please select an image file first")
        );
    }

    #[test]
    fn test_valid_selection_enables_submit() {
        let session = Session::new();
        session.select(png(2 * 1024 * 1024)).unwrap();
        assert!(session.can_submit());
        assert_eq!(session.snapshot().ui(), &UiState::FileSelected);
        assert_eq!(session.snapshot().error(), None);

        session.remove();
        assert!(!session.can_submit());
        assert_eq!(session.snapshot().ui(), &UiState::Idle);
    }

    #[test]
    fn test_invalid_selection_keeps_previous_file() {
        let session = Session::new();
        session.select(png(1024)).unwrap();
        assert!(session
            .select(SelectedImage::new("notes.txt", "text/plain", vec![1, 2, 3]))
            .is_err());

        assert_eq!(session.selected().unwrap().file_name(), "photo.png");
        assert!(session.can_submit());
        assert_eq!(
            session.snapshot().error(),
            Some("Please select a valid image file (JPG, PNG, GIF, WEBP)")
        );
    }

    #[test]
    fn test_full_analysis_walks_every_step() {
        let session = Session::new();
        session.select(png(1024)).unwrap();
        let uploader = FakeUploader::new(|| Ok(UploadResponse::analysis(parsed())));
        let recorder = Recorder::default();

        let outcome =
            tokio_test::block_on(session.submit(&uploader, Pacing::none(), &recorder));

        assert_eq!(outcome, SubmitOutcome::Settled);
        assert_eq!(recorder.steps(), vec![1, 2, 3, 4, 5, 0]);
        let state = session.snapshot();
        assert_eq!(state.processed_data().unwrap().original_text, "Hola");
        assert_eq!(state.error(), None);
        for step in STEPS {
            assert_eq!(state.step_status(step.id), StepStatus::Completed);
        }
        assert_eq!(uploader.calls(), 1);
    }

    #[test]
    fn test_quick_stop_skips_steps_without_completing_them() {
        let session = Session::new();
        session.select(png(1024)).unwrap();
        let uploader = FakeUploader::new(|| Ok(UploadResponse::no_text()));
        let recorder = Recorder::default();

        tokio_test::block_on(session.submit(&uploader, Pacing::none(), &recorder));

        assert_eq!(recorder.steps(), vec![1, 0]);
        for state in recorder.states.lock().unwrap().iter() {
            for id in 2..=5 {
                assert_ne!(state.step_status(id), StepStatus::Completed);
            }
        }
        let state = session.snapshot();
        assert!(state.no_text_found());
        assert!(state.quick_stop());
        assert!(state.processed_data().is_none());
        for id in 2..=5 {
            assert_eq!(state.step_status(id), StepStatus::Skipped);
        }
    }

    #[test]
    fn test_no_text_without_quick_stop_animates_first() {
        let session = Session::new();
        session.select(png(1024)).unwrap();
        let uploader = FakeUploader::new(|| {
            Ok(UploadResponse {
                quick_stop: false,
                ..UploadResponse::no_text()
            })
        });
        let recorder = Recorder::default();

        tokio_test::block_on(session.submit(&uploader, Pacing::none(), &recorder));

        assert_eq!(recorder.steps(), vec![1, 2, 3, 4, 5, 0]);
        let state = session.snapshot();
        assert!(state.no_text_found());
        assert!(!state.quick_stop());
        assert_eq!(state.step_status(5), StepStatus::Completed);
    }

    #[test]
    fn test_network_failure_sets_error_and_resets_step() {
        let session = Session::new();
        session.select(png(1024)).unwrap();
        let uploader = FakeUploader::new(|| {
            Err(ClientError::Server {
                status: 500,
                message: "Upload failed".to_string(),
            })
        });

        tokio_test::block_on(session.submit(&uploader, Pacing::none(), &()));

        let state = session.snapshot();
        assert!(state.processed_data().is_none());
        assert_eq!(state.current_step(), 0);
        assert_eq!(state.error(), Some("Upload failed"));
        assert!(session.can_submit());
    }

    #[test]
    fn test_success_without_data_is_failure() {
        let session = Session::new();
        session.select(png(1024)).unwrap();
        let uploader = FakeUploader::new(|| {
            Ok(UploadResponse {
                success: true,
                no_text_found: false,
                message: None,
                quick_stop: false,
                data: None,
            })
        });

        tokio_test::block_on(session.submit(&uploader, Pacing::none(), &()));

        let state = session.snapshot();
        assert!(state.processed_data().is_none());
        assert!(state.error().unwrap().starts_with("Invalid response from server"));
    }

    /// Selects a new file while its own upload is in flight
    struct ReselectingUploader {
        session: Session,
    }

    #[async_trait]
    impl Uploader for ReselectingUploader {
        async fn upload(&self, _image: &SelectedImage) -> Result<UploadResponse, ClientError> {
            self.session
                .select(SelectedImage::new("second.jpg", "image/jpeg", vec![0; 64]))
                .unwrap();
            Ok(UploadResponse::analysis(parsed()))
        }
    }

    #[test]
    fn test_new_selection_cancels_in_flight_submit() {
        let session = Session::new();
        session.select(png(1024)).unwrap();
        let uploader = ReselectingUploader {
            session: session.clone(),
        };
        let recorder = Recorder::default();

        let outcome =
            tokio_test::block_on(session.submit(&uploader, Pacing::none(), &recorder));

        assert_eq!(outcome, SubmitOutcome::Superseded);
        assert_eq!(recorder.steps(), vec![1]);
        let state = session.snapshot();
        assert_eq!(state.ui(), &UiState::FileSelected);
        assert!(state.processed_data().is_none());
        assert_eq!(session.selected().unwrap().file_name(), "second.jpg");
    }

    #[test]
    fn test_default_pacing() {
        let pacing = Pacing::default();
        assert_eq!(pacing.quick_stop_hold, Duration::from_millis(1200));
        assert_eq!(pacing.step_interval, Duration::from_millis(600));
    }
}
