//! Gemini `generateContent` client.
//!
//! Sends the photo as an inline base64 part followed by the instruction
//! text, and picks the first inline image out of the reply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{EditRequestClient, RequestError};
use crate::config::Config;
use crate::state::data::{GeneratedImage, SelectedFile};

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum RequestPart<'a> {
    InlineData(Blob<'a>),
    Text(&'a str),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: [&'static str; 2],
}

impl<'a> GenerateRequest<'a> {
    fn new(file: &'a SelectedFile, instruction: &'a str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![
                    RequestPart::InlineData(Blob {
                        mime_type: &file.mime_type,
                        data: file.to_base64(),
                    }),
                    RequestPart::Text(instruction),
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: ["IMAGE", "TEXT"],
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    inline_data: Option<InlineBlob>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineBlob {
    mime_type: String,
    data: String,
}

/// Pull the first inline image out of a response, leaving the data untouched
fn extract_image(response: GenerateResponse) -> Option<GeneratedImage> {
    let parts = response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts);

    for part in parts {
        if let Some(text) = part.text {
            tracing::debug!(%text, "Model commentary");
        }
        if let Some(blob) = part.inline_data {
            return Some(GeneratedImage {
                mime_type: blob.mime_type,
                data: blob.data,
            });
        }
    }

    None
}

/// Production client for the Gemini image model
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    api_base: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_base: config.api_base.clone(),
        }
    }

    /// Full URL of the generateContent endpoint for the configured model
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl EditRequestClient for GeminiClient {
    async fn submit(
        &self,
        file: &SelectedFile,
        instruction: &str,
    ) -> Result<GeneratedImage, RequestError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(RequestError::MissingCredential)?;

        let body = GenerateRequest::new(file, instruction);

        let response = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RequestError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RequestError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| RequestError::Decode(e.to_string()))?;

        extract_image(parsed).ok_or(RequestError::NoImage)
    }
}

// Never print the key
impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "gemini-2.5-flash-image";

    fn client_for(server: &MockServer, api_key: Option<&str>) -> GeminiClient {
        let config = Config {
            api_key: api_key.map(str::to_string),
            api_base: server.uri(),
            ..Config::default()
        };
        GeminiClient::new(&config)
    }

    fn dog() -> SelectedFile {
        SelectedFile::new("dog.jpg", vec![0xFF, 0xD8, 0xFF, 0xE0])
    }

    fn generate_path() -> String {
        format!("/models/{}:generateContent", MODEL)
    }

    #[test]
    fn test_request_wire_format() {
        let file = dog();
        let body = serde_json::to_value(GenerateRequest::new(&file, "pink tail")).unwrap();

        assert_eq!(
            body,
            json!({
                "contents": [{
                    "parts": [
                        {"inlineData": {"mimeType": "image/jpeg", "data": "/9j/4A=="}},
                        {"text": "pink tail"}
                    ]
                }],
                "generationConfig": {"responseModalities": ["IMAGE", "TEXT"]}
            })
        );
    }

    #[test]
    fn test_extract_skips_text_parts() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "Here is your dog"},
                    {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
                ]}
            }]
        }))
        .unwrap();

        let image = extract_image(response).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw0KGgo=");
    }

    #[test]
    fn test_extract_without_candidates() {
        let response: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(extract_image(response).is_none());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = Config {
            api_base: "https://example.test/v1beta/".to_string(),
            ..Config::default()
        };
        let client = GeminiClient::new(&config);
        assert_eq!(
            client.endpoint(),
            format!("https://example.test/v1beta/models/{}:generateContent", MODEL)
        );
    }

    #[tokio::test]
    async fn test_submit_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(generate_path()))
            .and(header(API_KEY_HEADER, "test-key"))
            .and(body_partial_json(json!({
                "generationConfig": {"responseModalities": ["IMAGE", "TEXT"]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"parts": [
                        {"inlineData": {"mimeType": "image/png", "data": "UElOSw=="}}
                    ]}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        let image = client.submit(&dog(), "make the tail pink").await.unwrap();

        assert_eq!(
            image,
            GeneratedImage {
                mime_type: "image/png".to_string(),
                data: "UElOSw==".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_submit_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(generate_path()))
            .respond_with(ResponseTemplate::new(500).set_body_string("quota exceeded"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        let err = client.submit(&dog(), "x").await.unwrap_err();

        assert_eq!(
            err,
            RequestError::Status {
                status: 500,
                message: "quota exceeded".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_submit_without_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(generate_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "I can't do that"}]}}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        let err = client.submit(&dog(), "x").await.unwrap_err();

        assert_eq!(err, RequestError::NoImage);
    }

    #[tokio::test]
    async fn test_submit_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(generate_path()))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        let err = client.submit(&dog(), "x").await.unwrap_err();

        assert!(matches!(err, RequestError::Decode(_)));
    }

    #[tokio::test]
    async fn test_submit_without_key_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let err = client.submit(&dog(), "x").await.unwrap_err();

        assert_eq!(err, RequestError::MissingCredential);
    }

    #[test]
    fn test_debug_hides_key() {
        let config = Config {
            api_key: Some("super-secret".to_string()),
            ..Config::default()
        };
        let printed = format!("{:?}", GeminiClient::new(&config));
        assert!(!printed.contains("super-secret"));
    }
}
