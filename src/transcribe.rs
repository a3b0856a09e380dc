//! Speech-to-text client.
//!
//! Uploads captured audio to an OpenAI-compatible `/audio/transcriptions`
//! endpoint. "Nothing intelligible was said" is kept apart from "the service
//! failed" so the HTTP layer can answer each differently.

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use thiserror::Error;

use crate::ai::endpoint;

/// Why a transcription attempt produced no text.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RecognitionError {
    /// The audio reached the recognizer but contained no recognizable speech.
    #[error("speech was not recognized")]
    Unrecognized,
    /// The recognizer could not be reached or answered with an error.
    #[error("{0}")]
    Service(String),
}

/// Converts recorded audio into text.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribes a complete WAV file.
    ///
    /// # Errors
    /// [`RecognitionError::Unrecognized`] when no words were found,
    /// [`RecognitionError::Service`] for transport or API failures.
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String, RecognitionError>;
}

/// Whisper-style transcription API client.
#[derive(Clone)]
pub struct WhisperApi {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

impl WhisperApi {
    pub fn new(
        client: reqwest::Client,
        api_base: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint(api_base, "audio/transcriptions"),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for WhisperApi {
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String, RecognitionError> {
        let file = multipart::Part::bytes(wav)
            .file_name("speech.wav")
            .mime_str("audio/wav")
            .map_err(service_error)?;
        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .part("file", file);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(service_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecognitionError::Service(format!(
                "{}: {}",
                status,
                body.trim()
            )));
        }
        let parsed: TranscriptionResponse = response.json().await.map_err(service_error)?;
        transcript_text(&parsed.text)
    }
}

fn service_error(err: impl std::fmt::Display) -> RecognitionError {
    RecognitionError::Service(err.to_string())
}

/// Normalizes recognizer output; blank output means nothing was understood.
fn transcript_text(raw: &str) -> Result<String, RecognitionError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(RecognitionError::Unrecognized);
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_transcript_is_unrecognized() {
        assert_eq!(transcript_text(" \n"), Err(RecognitionError::Unrecognized));
    }

    #[test]
    fn transcript_is_trimmed() {
        assert_eq!(
            transcript_text("  what's the weather\n").unwrap(),
            "what's the weather"
        );
    }

    #[test]
    fn response_without_text_is_unrecognized() {
        let parsed: TranscriptionResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(
            transcript_text(&parsed.text),
            Err(RecognitionError::Unrecognized)
        );
    }

    #[test]
    fn service_error_keeps_message() {
        let err = service_error("connection refused");
        assert_eq!(err.to_string(), "connection refused");
    }

    #[tokio::test]
    async fn unreachable_service_is_a_service_error() {
        let api = WhisperApi::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            "key",
            "whisper-1",
        );
        let result = api.transcribe(vec![0u8; 44]).await;
        assert!(matches!(result, Err(RecognitionError::Service(_))));
    }
}
