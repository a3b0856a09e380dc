/*
 * @file assistant.rs
 * @brief Implementation of the mirror agent's conversational runtime
 * @author Kevin Thomas
 * @date 2025
 *
 * MIT License
 *
 * Copyright (c) 2025 Kevin Thomas
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! Mirror assistant orchestration module.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;

use crate::affirmation::AffirmationCache;
use crate::ai::{ChatCompletion, OpenAiChat};
use crate::audio::{contains_speech, encode_wav, AudioSource, Microphone};
use crate::config::AppConfig;
use crate::error::MirrorError;
use crate::server;
use crate::speech::{Speaker, SystemSpeaker};
use crate::transcribe::{SpeechRecognizer, WhisperApi};
use crate::transcript::{Transcript, Turn};

/// Spoken once the server is about to accept requests.
const GREETING: &str = "Your smart mirror is alive and listening.";

/// Spoken after the conversation has been wiped.
const RESET_ANNOUNCEMENT: &str = "Conversation history cleared.";

/// Loads configuration, builds the assistant and serves HTTP until shutdown.
///
/// # Errors
/// Returns an error if the API key is missing, the HTTP client cannot be
/// built, or the listener cannot bind.
pub async fn run_mirror_agent(config: AppConfig) -> Result<()> {
    let assistant = Arc::new(MirrorAssistant::from_config(&config)?);
    tracing::info!("🪞 Mirror agent is alive and listening...");
    assistant.greet().await;
    server::serve(assistant, &config.bind_addr).await
}

/// External services the assistant talks to.
pub struct Collaborators {
    pub chat: Arc<dyn ChatCompletion>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub audio: Arc<dyn AudioSource>,
    pub speaker: Arc<dyn Speaker>,
}

/// Runtime container that owns the conversation state and its collaborators.
///
/// # Details
/// Shared between HTTP handlers behind an [`Arc`]. The transcript mutex is
/// held for a whole exchange (append, complete, append), so concurrent
/// requests see each other's turns in a consistent order.
pub struct MirrorAssistant {
    transcript: Mutex<Transcript>,
    affirmations: AffirmationCache,
    chat: Arc<dyn ChatCompletion>,
    recognizer: Arc<dyn SpeechRecognizer>,
    audio: Arc<dyn AudioSource>,
    speaker: Arc<dyn Speaker>,
}

impl MirrorAssistant {
    pub fn new(
        transcript: Transcript,
        affirmations: AffirmationCache,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            transcript: Mutex::new(transcript),
            affirmations,
            chat: collaborators.chat,
            recognizer: collaborators.recognizer,
            audio: collaborators.audio,
            speaker: collaborators.speaker,
        }
    }

    /// Builds the production assistant from configuration.
    ///
    /// # Details
    /// Loads the persisted transcript, wires an OpenAI-compatible chat and
    /// transcription client sharing one HTTP connection pool, the default
    /// microphone, and the configured speaker.
    ///
    /// # Errors
    /// Returns an error if the API key is missing or the HTTP client cannot
    /// be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = config.require_api_key()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .with_context(|| "Failed to build HTTP client")?;
        let chat = OpenAiChat::new(
            client.clone(),
            &config.api_base,
            api_key,
            config.chat_model.as_str(),
        );
        let recognizer = WhisperApi::new(
            client,
            &config.api_base,
            api_key,
            config.transcription_model.as_str(),
        );
        let speaker = SystemSpeaker::from_config(config.tts_command.as_deref());
        tracing::info!(
            model = %chat.model(),
            memory = %config.memory_path.display(),
            speaker = speaker.command().unwrap_or("log"),
            "assistant configured"
        );
        Ok(Self::new(
            Transcript::load(&config.memory_path, config.system_prompt.as_str()),
            AffirmationCache::new(&config.affirmation_path),
            Collaborators {
                chat: Arc::new(chat),
                recognizer: Arc::new(recognizer),
                audio: Arc::new(Microphone::new(config.record_duration())),
                speaker: Arc::new(speaker),
            },
        ))
    }

    /// Sends one user message through the conversation and speaks the reply.
    ///
    /// # Details
    /// The user turn is appended before the completion call and stays in the
    /// transcript if that call fails. The assistant turn is persisted as soon
    /// as it is appended.
    ///
    /// # Errors
    /// Forwards completion and persistence failures.
    pub async fn ask(&self, text: impl Into<String>) -> Result<String> {
        let reply = {
            let mut transcript = self.transcript.lock().await;
            transcript.append_user(text);
            let reply = self.chat.complete(transcript.turns()).await?;
            transcript.append_assistant(reply.as_str())?;
            reply
        };
        self.speak_response(&reply).await;
        Ok(reply)
    }

    /// Records from the microphone, transcribes, then answers like [`ask`].
    ///
    /// # Errors
    /// * [`MirrorError::UnrecognizedSpeech`] for silence or unintelligible audio.
    /// * [`MirrorError::Recognition`] when the recognizer fails.
    /// * [`MirrorError::Unexpected`] for capture, completion or storage failures.
    ///
    /// [`ask`]: MirrorAssistant::ask
    pub async fn listen(&self) -> Result<String, MirrorError> {
        tracing::info!("🎤 Listening...");
        let samples = self
            .capture_samples()
            .await
            .map_err(MirrorError::Unexpected)?;
        if !contains_speech(&samples) {
            return Err(MirrorError::UnrecognizedSpeech);
        }
        let wav = encode_wav(&samples).map_err(MirrorError::Unexpected)?;
        let transcript = self.recognizer.transcribe(wav).await?;
        tracing::info!("🗣️ You said: {}", transcript);
        self.ask(transcript).await.map_err(MirrorError::Unexpected)
    }

    /// Starts a new conversation and announces it.
    ///
    /// # Errors
    /// Returns an error if the fresh transcript cannot be persisted.
    pub async fn reset(&self) -> Result<()> {
        self.transcript.lock().await.reset()?;
        tracing::info!("Conversation reset");
        self.speak_response(RESET_ANNOUNCEMENT).await;
        Ok(())
    }

    /// Returns today's affirmation, generating it on the first call of the day.
    pub async fn affirmation(&self) -> Result<String> {
        self.affirmations.get_or_refresh(self.chat.as_ref()).await
    }

    pub async fn greet(&self) {
        self.speak_response(GREETING).await;
    }

    /// Snapshot of the current conversation.
    pub async fn transcript(&self) -> Vec<Turn> {
        self.transcript.lock().await.turns().to_vec()
    }

    /// Runs the blocking microphone capture off the async runtime.
    async fn capture_samples(&self) -> Result<Vec<i16>> {
        let audio = Arc::clone(&self.audio);
        tokio::task::spawn_blocking(move || audio.capture())
            .await
            .with_context(|| "Audio capture task failed")?
            .with_context(|| "Microphone error")
    }

    /// Speaks text on a blocking thread, logging failures.
    ///
    /// # Details
    /// Playback problems never fail the request that produced the text.
    async fn speak_response(&self, text: &str) {
        let speaker = Arc::clone(&self.speaker);
        let text = text.to_string();
        match tokio::task::spawn_blocking(move || speaker.speak(&text)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!("TTS error: {:#}", err),
            Err(err) => tracing::warn!("TTS task failed: {}", err),
        }
    }
}
