/// Upload -> generate -> result state machine
///
/// `Flow` owns everything the user has entered plus the current phase.
/// It performs no IO: `begin_generation` hands back the request to send,
/// and `finish_generation` takes the outcome when it arrives.

use thiserror::Error;

use super::data::{GeneratedImage, SelectedFile};
use crate::client::RequestError;

/// Shown for every failed request, whatever the cause
pub const GENERIC_FAILURE: &str =
    "Something went wrong while talking to the AI. Please try again.";

/// Input problems caught before any request is made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please choose a photo of your pet first.")]
    MissingFile,
    #[error("Please describe the change you want.")]
    EmptyInstruction,
}

/// A prepared request: the photo plus the wrapped instruction
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    pub file: SelectedFile,
    pub prompt: String,
}

/// Which phase of the cycle the application is in
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FlowState {
    #[default]
    Idle,
    /// One request is in flight
    Processing(EditRequest),
    Success(GeneratedImage),
    /// Holds the user-facing message, never the raw error
    Error(String),
}

/// Wrap the user's instruction in the fixed prompt template
pub fn wrap_instruction(instruction: &str) -> String {
    format!(
        "This is a photo of a pet.\n\
         Task: apply the following cosmetic change to the pet in the image while preserving realism: \"{}\".\n\
         Make sure the final photo looks natural and that only the requested part \
         (such as the colour of the tail or ears) changes.\n\
         Return the edited image directly.",
        instruction
    )
}

/// Controller state for the whole application
#[derive(Debug, Default)]
pub struct Flow {
    state: FlowState,
    selected: Option<SelectedFile>,
    instruction: String,
    validation: Option<ValidationError>,
}

impl Flow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Inline message from the last rejected generate attempt
    pub fn validation(&self) -> Option<ValidationError> {
        self.validation
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.state, FlowState::Processing(_))
    }

    /// The edited image, present only in `Success`
    pub fn result(&self) -> Option<&GeneratedImage> {
        match &self.state {
            FlowState::Success(image) => Some(image),
            _ => None,
        }
    }

    /// The failure message, present only in `Error`
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            FlowState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Whether a generate attempt would currently be accepted as input
    /// (a whitespace-only instruction still counts so it can be reported)
    pub fn has_inputs(&self) -> bool {
        self.selected.is_some() && !self.instruction.is_empty()
    }

    /// Replace the selected file. Ignored while a request is in flight.
    pub fn select_file(&mut self, file: SelectedFile) -> bool {
        if self.is_processing() {
            tracing::debug!("Ignoring file selection while processing");
            return false;
        }

        tracing::info!(file = %file.name, mime_type = %file.mime_type, bytes = file.len(), "📸 Photo selected");
        self.selected = Some(file);
        if self.validation == Some(ValidationError::MissingFile) {
            self.validation = None;
        }
        true
    }

    /// Update the instruction text. Ignored while a request is in flight.
    pub fn set_instruction(&mut self, text: String) {
        if self.is_processing() {
            return;
        }
        self.instruction = text;
    }

    /// Try to start a generation.
    ///
    /// Returns the request to send when the flow moved to `Processing`.
    /// Returns `None` when generating is unavailable in the current state or
    /// the inputs are invalid; in the latter case the validation message is
    /// stored and the state is left as it was.
    pub fn begin_generation(&mut self) -> Option<EditRequest> {
        if !matches!(self.state, FlowState::Idle | FlowState::Error(_)) {
            return None;
        }

        let Some(file) = self.selected.clone() else {
            self.validation = Some(ValidationError::MissingFile);
            return None;
        };

        let instruction = self.instruction.trim();
        if instruction.is_empty() {
            self.validation = Some(ValidationError::EmptyInstruction);
            return None;
        }

        let request = EditRequest {
            file,
            prompt: wrap_instruction(instruction),
        };
        self.validation = None;
        self.state = FlowState::Processing(request.clone());
        Some(request)
    }

    /// Record the outcome of the in-flight request
    pub fn finish_generation(&mut self, outcome: Result<GeneratedImage, RequestError>) {
        if !self.is_processing() {
            tracing::warn!("Dropping a request outcome that arrived outside of processing");
            return;
        }

        self.state = match outcome {
            Ok(image) => FlowState::Success(image),
            Err(err) => {
                tracing::error!(error = %err, "Generation failed");
                FlowState::Error(GENERIC_FAILURE.to_string())
            }
        };
    }

    /// Start over, keeping the selected photo for convenience.
    /// Not available while a request is in flight.
    pub fn reset(&mut self) -> bool {
        if self.is_processing() {
            return false;
        }

        self.state = FlowState::Idle;
        self.instruction.clear();
        self.validation = None;
        true
    }
}
