/*
 * @file transcript.rs
 * @brief Persistent conversation transcript for the mirror agent
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

//! Conversation transcript that survives restarts.
//!
//! The transcript is the literal history replayed to the completion service on
//! every request. It always starts with a single system turn and is mirrored to
//! a JSON file whenever an assistant reply lands or the conversation is reset.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// System prompt used when no persisted transcript is available.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful smart mirror assistant. Keep responses short and conversational.";

/// Role designation for transcript turns.
///
/// # Details
/// Serialized in lowercase so the persisted record can be sent verbatim to an
/// OpenAI-compatible chat endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in the conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    /// Creates a turn with the specified role and content.
    ///
    /// # Arguments
    /// * `role` - The speaker role.
    /// * `content` - The message text; accepts any type convertible to String.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Ordered conversation history backed by a JSON file.
///
/// # Details
/// Never empty: the first element is the system turn established at load or
/// reset. Appends are not validated; the completion service decides what
/// content is acceptable.
#[derive(Debug)]
pub struct Transcript {
    path: PathBuf,
    system_prompt: String,
    turns: Vec<Turn>,
}

impl Transcript {
    /// Loads the transcript from `path`, falling back to a fresh conversation.
    ///
    /// # Details
    /// A missing or empty file starts a new conversation. An unreadable or
    /// malformed file is reported as a warning and also starts fresh; the bad
    /// record is left on disk until the next save overwrites it. A record that
    /// does not open with a system turn gets one prepended.
    ///
    /// # Arguments
    /// * `path` - Location of the JSON record.
    /// * `system_prompt` - Content of the default system turn.
    ///
    /// # Returns
    /// * `Self` - A transcript holding at least the system turn.
    pub fn load(path: impl Into<PathBuf>, system_prompt: impl Into<String>) -> Self {
        let path = path.into();
        let system_prompt = system_prompt.into();
        let turns = match read_turns(&path) {
            Ok(Some(turns)) => with_system_turn(turns, &system_prompt),
            Ok(None) => vec![Turn::system(system_prompt.as_str())],
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    "Transcript load error, starting a new conversation: {:#}",
                    err
                );
                vec![Turn::system(system_prompt.as_str())]
            }
        };
        tracing::debug!(path = %path.display(), turns = turns.len(), "transcript ready");
        Self {
            path,
            system_prompt,
            turns,
        }
    }

    /// Full ordered history, system turn first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Appends a user turn without persisting it.
    ///
    /// # Arguments
    /// * `text` - The user's message, passed through unchanged.
    pub fn append_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::user(text));
    }

    /// Appends an assistant turn and immediately persists the transcript.
    ///
    /// # Arguments
    /// * `text` - The assistant's reply.
    ///
    /// # Errors
    /// Returns an error if the record cannot be written. The turn stays in
    /// memory either way.
    pub fn append_assistant(&mut self, text: impl Into<String>) -> Result<()> {
        self.turns.push(Turn::assistant(text));
        self.save()
    }

    /// Drops every turn except a fresh system turn and persists the result.
    ///
    /// # Errors
    /// Returns an error if the record cannot be written.
    pub fn reset(&mut self) -> Result<()> {
        self.turns = vec![Turn::system(self.system_prompt.as_str())];
        self.save()
    }

    /// Writes the full transcript to disk, overwriting the previous record.
    ///
    /// # Details
    /// Serializes to pretty-printed JSON and writes in place. The write is not
    /// atomic; a crash mid-write leaves a record the next [`Transcript::load`]
    /// will reject.
    ///
    /// # Errors
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.turns)
            .with_context(|| format!("Failed to serialize {}", self.path.display()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

/// Reads persisted turns from disk.
///
/// # Returns
/// * `Ok(Some(turns))` - The record parsed successfully.
/// * `Ok(None)` - No record exists or the file is blank.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
fn read_turns(path: &Path) -> Result<Option<Vec<Turn>>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(None);
    }
    let turns: Vec<Turn> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(turns))
}

/// Prepends the default system turn when the record lacks one.
fn with_system_turn(mut turns: Vec<Turn>, system_prompt: &str) -> Vec<Turn> {
    if turns.first().map(|turn| turn.role) != Some(Role::System) {
        turns.insert(0, Turn::system(system_prompt));
    }
    turns
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPT: &str = "S";

    fn record_in(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("chat_memory.json")
    }

    fn read_record(path: &Path) -> Vec<Turn> {
        let raw = fs::read_to_string(path).expect("read record");
        serde_json::from_str(&raw).expect("parse record")
    }

    #[test]
    fn load_without_record_starts_with_system_turn() {
        let dir = tempfile::tempdir().unwrap();
        let transcript = Transcript::load(record_in(&dir), PROMPT);
        assert_eq!(transcript.turns(), &[Turn::system(PROMPT)]);
        assert!(!record_in(&dir).exists());
    }

    #[test]
    fn exchange_is_appended_in_order_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = record_in(&dir);
        let mut transcript = Transcript::load(&path, PROMPT);
        transcript.append_user("hello");
        transcript.append_assistant("hi there").unwrap();

        let expected = vec![
            Turn::system(PROMPT),
            Turn::user("hello"),
            Turn::assistant("hi there"),
        ];
        assert_eq!(transcript.turns(), expected.as_slice());
        assert_eq!(read_record(&path), expected);
    }

    #[test]
    fn user_turn_alone_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = record_in(&dir);
        let mut transcript = Transcript::load(&path, PROMPT);
        transcript.append_user("");
        assert_eq!(transcript.last(), Some(&Turn::user("")));
        assert!(!path.exists());
    }

    #[test]
    fn reset_collapses_to_system_turn() {
        let dir = tempfile::tempdir().unwrap();
        let path = record_in(&dir);
        let mut transcript = Transcript::load(&path, PROMPT);
        for i in 0..4 {
            transcript.append_user(format!("question {i}"));
            transcript.append_assistant(format!("answer {i}")).unwrap();
        }
        assert_eq!(transcript.len(), 9);

        transcript.reset().unwrap();
        assert_eq!(transcript.turns(), &[Turn::system(PROMPT)]);
        assert_eq!(read_record(&path), vec![Turn::system(PROMPT)]);
    }

    #[test]
    fn reload_replays_persisted_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = record_in(&dir);
        {
            let mut transcript = Transcript::load(&path, PROMPT);
            transcript.append_user("what time is it");
            transcript.append_assistant("time to shine").unwrap();
        }
        let reloaded = Transcript::load(&path, "a different prompt");
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.turns()[0], Turn::system(PROMPT));
        assert_eq!(reloaded.last(), Some(&Turn::assistant("time to shine")));
    }

    #[test]
    fn malformed_record_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = record_in(&dir);
        fs::write(&path, "[{\"role\": \"user\", \"content\": ").unwrap();
        let transcript = Transcript::load(&path, PROMPT);
        assert_eq!(transcript.turns(), &[Turn::system(PROMPT)]);
    }

    #[test]
    fn unknown_role_is_treated_as_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = record_in(&dir);
        fs::write(&path, r#"[{"role": "narrator", "content": "once upon"}]"#).unwrap();
        let transcript = Transcript::load(&path, PROMPT);
        assert_eq!(transcript.turns(), &[Turn::system(PROMPT)]);
    }

    #[test]
    fn blank_record_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = record_in(&dir);
        fs::write(&path, "  \n").unwrap();
        assert_eq!(Transcript::load(&path, PROMPT).len(), 1);
    }

    #[test]
    fn record_without_system_turn_is_repaired() {
        let dir = tempfile::tempdir().unwrap();
        let path = record_in(&dir);
        fs::write(&path, r#"[{"role": "user", "content": "hey"}]"#).unwrap();
        let transcript = Transcript::load(&path, PROMPT);
        assert_eq!(
            transcript.turns(),
            &[Turn::system(PROMPT), Turn::user("hey")]
        );

        fs::write(&path, "[]").unwrap();
        assert_eq!(
            Transcript::load(&path, PROMPT).turns(),
            &[Turn::system(PROMPT)]
        );
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&Turn::assistant("ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);
    }

    #[test]
    fn save_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("chat_memory.json");
        let transcript = Transcript::load(&path, PROMPT);
        transcript.save().unwrap();
        assert_eq!(read_record(&path), vec![Turn::system(PROMPT)]);
    }

    #[test]
    fn save_failure_surfaces_to_caller() {
        let dir = tempfile::tempdir().unwrap();
        let mut transcript = Transcript::load(dir.path(), PROMPT);
        let err = transcript.append_assistant("reply").unwrap_err();
        assert!(format!("{err:#}").contains("Failed to write"));
        assert_eq!(transcript.len(), 2);
    }
}
