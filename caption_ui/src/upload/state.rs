//! Session state of the upload page and the pure transitions over it.
//!
//! [`transition`] never touches the outside world: it returns the next state
//! together with the [`Effect`]s the controller has to carry out (publishing or
//! releasing a preview, calling the prediction endpoint, notifying the user).

use crate::{
    error::UploadError,
    prediction::PredictionOutcome,
    upload::{file::ImageFile, session::SessionId},
};
use serde::{Deserialize, Serialize};

pub const SUBMIT_LABEL_IDLE: &str = "Submit for Prediction";
pub const SUBMIT_LABEL_BUSY: &str = "Submitting...";

/// Opaque display reference for the selected image. A handle is only valid
/// while the preview store holds it; accepting a new file releases it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreviewHandle {
    pub generation: u64,
    pub mime_type: String,
}

impl PreviewHandle {
    pub fn url(&self, session: &SessionId) -> String {
        format!("/api/sessions/{}/preview/{}", session, self.generation)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub selected_file: Option<ImageFile>,
    pub preview: Option<PreviewHandle>,
    pub caption: Option<String>,
    pub submission_in_flight: bool,
    pub preview_generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting,
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        if self.submission_in_flight {
            Phase::Submitting
        } else {
            Phase::Idle
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match self.phase() {
            Phase::Idle => SUBMIT_LABEL_IDLE,
            Phase::Submitting => SUBMIT_LABEL_BUSY,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    /// First file of a drop or picker change, if there was one.
    FileOffered(Option<ImageFile>),
    SubmitRequested,
    SubmissionFinished(PredictionOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ReleasePreview(PreviewHandle),
    PublishPreview(PreviewHandle, ImageFile),
    SendPrediction(ImageFile),
    ShowCaption(String),
    Notify(UploadError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: &SessionState, effects: Vec<Effect>) -> Self {
        Self {
            state: state.clone(),
            effects,
        }
    }

    pub fn notice(&self) -> Option<&UploadError> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::Notify(err) => Some(err),
            _ => None,
        })
    }
}

pub fn transition(state: &SessionState, event: Event) -> Transition {
    match event {
        Event::FileOffered(file) => offer_file(state, file),
        Event::SubmitRequested => request_submit(state),
        Event::SubmissionFinished(outcome) => finish_submission(state, outcome),
    }
}

fn offer_file(state: &SessionState, file: Option<ImageFile>) -> Transition {
    let file = match file {
        Some(file) if file.is_image() => file,
        _ => {
            return Transition::unchanged(state, vec![Effect::Notify(UploadError::InvalidImage)])
        }
    };

    let generation = state.preview_generation + 1;
    let handle = PreviewHandle {
        generation,
        mime_type: file.mime_type.clone(),
    };

    let mut effects = Vec::with_capacity(2);
    if let Some(stale) = state.preview.clone() {
        effects.push(Effect::ReleasePreview(stale));
    }
    effects.push(Effect::PublishPreview(handle.clone(), file.clone()));

    Transition {
        state: SessionState {
            selected_file: Some(file),
            preview: Some(handle),
            preview_generation: generation,
            ..state.clone()
        },
        effects,
    }
}

fn request_submit(state: &SessionState) -> Transition {
    if state.submission_in_flight {
        return Transition::unchanged(
            state,
            vec![Effect::Notify(UploadError::SubmissionInFlight)],
        );
    }

    let Some(file) = state.selected_file.clone() else {
        return Transition::unchanged(state, vec![Effect::Notify(UploadError::MissingImage)]);
    };

    Transition {
        state: SessionState {
            submission_in_flight: true,
            ..state.clone()
        },
        effects: vec![Effect::SendPrediction(file)],
    }
}

fn finish_submission(state: &SessionState, outcome: PredictionOutcome) -> Transition {
    let mut next = SessionState {
        submission_in_flight: false,
        ..state.clone()
    };

    let effect = match outcome {
        PredictionOutcome::Success(caption) => {
            next.caption = Some(caption.clone());
            Effect::ShowCaption(caption)
        }
        PredictionOutcome::EndpointFailure(message) => {
            Effect::Notify(UploadError::Endpoint(message))
        }
        PredictionOutcome::TransportFailure => Effect::Notify(UploadError::Transport),
    };

    Transition {
        state: next,
        effects: vec![effect],
    }
}

/// What the page renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub session: SessionId,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub size: Option<usize>,
    pub preview_url: Option<String>,
    pub caption: Option<String>,
    pub submission_in_flight: bool,
    pub submit_label: String,
}

impl SessionView {
    pub fn new(state: &SessionState, session: &SessionId) -> Self {
        Self {
            session: session.clone(),
            file_name: state.selected_file.as_ref().map(|f| f.name.clone()),
            mime_type: state.selected_file.as_ref().map(|f| f.mime_type.clone()),
            size: state.selected_file.as_ref().map(|f| f.size),
            preview_url: state.preview.as_ref().map(|handle| handle.url(session)),
            caption: state.caption.clone(),
            submission_in_flight: state.submission_in_flight,
            submit_label: state.submit_label().to_string(),
        }
    }
}
