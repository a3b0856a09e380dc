//! Scripted collaborators shared by the unit tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use crate::affirmation::AffirmationCache;
use crate::ai::ChatCompletion;
use crate::assistant::{Collaborators, MirrorAssistant};
use crate::audio::AudioSource;
use crate::speech::Speaker;
use crate::transcribe::{RecognitionError, SpeechRecognizer};
use crate::transcript::{Transcript, Turn};

pub(crate) const TEST_PROMPT: &str = "You are a test mirror.";

/// Chat service that answers every request the same way and counts calls.
pub(crate) struct ScriptedChat {
    outcome: Result<String, String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedChat {
    pub(crate) fn replying(reply: &str) -> Self {
        Self::with_outcome(Ok(reply.to_string()))
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self::with_outcome(Err(message.to_string()))
    }

    fn with_outcome(outcome: Result<String, String>) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<Vec<Turn>> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatCompletion for ScriptedChat {
    async fn complete(&self, turns: &[Turn]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(turns.to_vec());
        self.outcome.clone().map_err(anyhow::Error::msg)
    }
}

pub(crate) struct ScriptedRecognizer {
    outcome: Result<String, RecognitionError>,
    calls: AtomicUsize,
}

impl ScriptedRecognizer {
    pub(crate) fn hearing(text: &str) -> Self {
        Self::with_outcome(Ok(text.to_string()))
    }

    pub(crate) fn failing(err: RecognitionError) -> Self {
        Self::with_outcome(Err(err))
    }

    fn with_outcome(outcome: Result<String, RecognitionError>) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String, RecognitionError> {
        assert_eq!(&wav[..4], b"RIFF");
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Microphone stand-in returning canned samples.
pub(crate) struct CannedAudio(Vec<i16>);

impl CannedAudio {
    pub(crate) fn speech() -> Self {
        Self(vec![i16::MAX / 2; 1600])
    }

    pub(crate) fn silence() -> Self {
        Self(vec![0; 1600])
    }
}

impl AudioSource for CannedAudio {
    fn capture(&self) -> Result<Vec<i16>> {
        Ok(self.0.clone())
    }
}

/// Speaker that remembers what it was asked to say.
#[derive(Default)]
pub(crate) struct RecordingSpeaker {
    spoken: Mutex<Vec<String>>,
}

impl RecordingSpeaker {
    pub(crate) fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Handles onto every fake wired into a test assistant.
pub(crate) struct Rig {
    pub(crate) assistant: MirrorAssistant,
    pub(crate) chat: Arc<ScriptedChat>,
    pub(crate) recognizer: Arc<ScriptedRecognizer>,
    pub(crate) speaker: Arc<RecordingSpeaker>,
}

/// Builds an assistant whose state lives under `dir`.
pub(crate) fn rig(
    dir: &Path,
    chat: ScriptedChat,
    recognizer: ScriptedRecognizer,
    audio: CannedAudio,
) -> Rig {
    let chat = Arc::new(chat);
    let recognizer = Arc::new(recognizer);
    let speaker = Arc::new(RecordingSpeaker::default());
    let assistant = MirrorAssistant::new(
        Transcript::load(dir.join("chat_memory.json"), TEST_PROMPT),
        AffirmationCache::new(dir.join("daily_affirmation.txt")),
        Collaborators {
            chat: chat.clone(),
            recognizer: recognizer.clone(),
            audio: Arc::new(audio),
            speaker: speaker.clone(),
        },
    );
    Rig {
        assistant,
        chat,
        recognizer,
        speaker,
    }
}
