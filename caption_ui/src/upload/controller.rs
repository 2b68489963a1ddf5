use crate::{
    error::UploadError,
    prediction::{CaptionBackend, PredictionOutcome},
    upload::{
        file::ImageFile,
        preview::PreviewStore,
        session::SessionId,
        state::{transition, Effect, Event, PreviewHandle, SessionState, SessionView},
    },
};
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::instrument;

/// Owns the session state of the upload page and carries out the effects of
/// every transition. Nothing else mutates the state.
pub struct UploadController<B: CaptionBackend> {
    session: SessionId,
    state: Mutex<SessionState>,
    previews: PreviewStore,
    backend: Arc<B>,
}

impl<B: CaptionBackend> UploadController<B> {
    pub fn new(backend: B) -> Self {
        Self::with_session(SessionId::generate(), Arc::new(backend))
    }

    /// A controller for one page session. The backend is shared with every
    /// other session.
    pub fn with_session(session: SessionId, backend: Arc<B>) -> Self {
        Self {
            session,
            state: Mutex::new(SessionState::default()),
            previews: PreviewStore::new(),
            backend,
        }
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.lock().clone()
    }

    pub fn view(&self) -> SessionView {
        SessionView::new(&self.state.lock(), &self.session)
    }

    /// Releases the live preview. Called when the page session ends.
    pub fn close(&self) {
        let state = self.state.lock();
        if let Some(handle) = &state.preview {
            self.previews.release(handle);
        }
    }

    pub fn preview(&self, generation: u64) -> Option<(PreviewHandle, Bytes)> {
        self.previews.resolve(generation)
    }

    pub fn is_preview_live(&self, handle: &PreviewHandle) -> bool {
        self.previews.is_live(handle)
    }

    /// Only the first dropped file is considered.
    pub fn accept_dropped_file(
        &self,
        files: Vec<ImageFile>,
    ) -> Result<PreviewHandle, UploadError> {
        tracing::debug!(files = files.len(), "File dropped");
        self.validate_and_accept(files.into_iter().next())
    }

    pub fn accept_browsed_file(
        &self,
        files: Vec<ImageFile>,
    ) -> Result<PreviewHandle, UploadError> {
        tracing::debug!(files = files.len(), "File browsed");
        self.validate_and_accept(files.into_iter().next())
    }

    pub fn validate_and_accept(
        &self,
        file: Option<ImageFile>,
    ) -> Result<PreviewHandle, UploadError> {
        // Previews are swapped under the state lock so the live preview always
        // matches the handle recorded in the state.
        let mut state = self.state.lock();
        let next = transition(&state, Event::FileOffered(file));
        *state = next.state;

        let mut accepted = Err(UploadError::InvalidImage);
        for effect in next.effects {
            match effect {
                Effect::ReleasePreview(stale) => {
                    self.previews.release(&stale);
                }
                Effect::PublishPreview(handle, file) => {
                    self.previews.publish(handle.clone(), &file);
                    tracing::info!(file = %file.name, mime_type = %file.mime_type, "Image accepted");
                    accepted = Ok(handle);
                }
                Effect::Notify(err) => {
                    tracing::warn!(kind = err.kind(), "{}", err);
                    accepted = Err(err);
                }
                other => tracing::debug!("Ignoring effect on upload: {:?}", other),
            }
        }

        accepted
    }

    /// Sends the selected file to the prediction endpoint and returns the new
    /// caption. A second call while one is running is rejected with
    /// [`UploadError::SubmissionInFlight`] without touching the network.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<String, UploadError> {
        let file = self.begin_submission()?;

        let guard = InFlightGuard::new(&self.state);
        let outcome = self.backend.predict(file).await;
        let effects = guard.finish(outcome);

        let mut result = Err(UploadError::Transport);
        for effect in effects {
            match effect {
                Effect::ShowCaption(caption) => {
                    tracing::info!(caption = %caption, "Caption updated");
                    result = Ok(caption);
                }
                Effect::Notify(err) => {
                    tracing::warn!(kind = err.kind(), "{}", err);
                    result = Err(err);
                }
                other => tracing::debug!("Ignoring effect on submission: {:?}", other),
            }
        }

        result
    }

    fn begin_submission(&self) -> Result<ImageFile, UploadError> {
        let mut state = self.state.lock();
        let next = transition(&state, Event::SubmitRequested);
        *state = next.state;

        let mut file = None;
        for effect in next.effects {
            match effect {
                Effect::SendPrediction(selected) => file = Some(selected),
                Effect::Notify(err) => {
                    tracing::warn!(kind = err.kind(), "{}", err);
                    return Err(err);
                }
                other => tracing::debug!("Ignoring effect on submit: {:?}", other),
            }
        }

        file.ok_or(UploadError::MissingImage)
    }
}

/// Clears the in-flight flag when the submission ends, including when the
/// submitting future is dropped before the endpoint answers.
struct InFlightGuard<'a> {
    state: &'a Mutex<SessionState>,
    armed: bool,
}

impl<'a> InFlightGuard<'a> {
    fn new(state: &'a Mutex<SessionState>) -> Self {
        Self { state, armed: true }
    }

    fn finish(mut self, outcome: PredictionOutcome) -> Vec<Effect> {
        self.armed = false;
        let mut state = self.state.lock();
        let next = transition(&state, Event::SubmissionFinished(outcome));
        *state = next.state;
        next.effects
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("Submission abandoned before the endpoint answered");
            let mut state = self.state.lock();
            let next = transition(
                &state,
                Event::SubmissionFinished(PredictionOutcome::TransportFailure),
            );
            *state = next.state;
        }
    }
}
