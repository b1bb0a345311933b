//! Image-editing request client.
//!
//! The flow controller only sees the [`EditRequestClient`] trait; the
//! production implementation talks to Gemini, tests use a mock.

pub mod gemini;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::state::data::{GeneratedImage, SelectedFile};
use crate::state::flow::EditRequest;

pub use gemini::GeminiClient;

/// Ways an edit request can fail.
///
/// The variants exist for diagnostics only; the UI treats them all the same.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// No API key was configured
    #[error("no API key configured (set GEMINI_API_KEY)")]
    MissingCredential,
    /// The request never got a response
    #[error("network error: {0}")]
    Network(String),
    /// The service answered with a non-success status
    #[error("service returned status {status}: {message}")]
    Status { status: u16, message: String },
    /// The response body could not be parsed
    #[error("malformed response: {0}")]
    Decode(String),
    /// The response parsed but carried no image
    #[error("response contained no image")]
    NoImage,
}

/// One outbound call to an image-editing service.
#[async_trait]
pub trait EditRequestClient: Send + Sync {
    /// Send the image and instruction, returning the edited image.
    ///
    /// Issues exactly one request and never retries.
    async fn submit(
        &self,
        file: &SelectedFile,
        instruction: &str,
    ) -> Result<GeneratedImage, RequestError>;
}

/// Run a prepared edit request against a client.
///
/// Logs the outcome with the underlying failure detail; the caller decides
/// what the user gets to see.
pub async fn run(
    client: Arc<dyn EditRequestClient>,
    request: EditRequest,
) -> Result<GeneratedImage, RequestError> {
    tracing::info!(
        file = %request.file.name,
        mime_type = %request.file.mime_type,
        bytes = request.file.len(),
        "🎨 Sending edit request"
    );

    let outcome = client.submit(&request.file, &request.prompt).await;

    match &outcome {
        Ok(image) => tracing::info!(mime_type = %image.mime_type, "✅ Edited image received"),
        Err(err) => tracing::error!(error = %err, "❌ Edit request failed"),
    }

    outcome
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Client that records every call and replies with a canned outcome
    pub(crate) struct MockClient {
        outcome: Result<GeneratedImage, RequestError>,
        pub calls: Mutex<Vec<(String, String)>>,
    }

    impl MockClient {
        pub(crate) fn replying(outcome: Result<GeneratedImage, RequestError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl EditRequestClient for MockClient {
        async fn submit(
            &self,
            file: &SelectedFile,
            instruction: &str,
        ) -> Result<GeneratedImage, RequestError> {
            self.calls
                .lock()
                .unwrap()
                .push((file.name.clone(), instruction.to_string()));
            self.outcome.clone()
        }
    }
}
