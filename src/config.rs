/*
 * @file config.rs
 * @brief Runtime configuration for the mirror agent
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

//! Runtime configuration.
//!
//! Defaults are baked in, `config.json` may override any of them, and a few
//! environment variables override the file. The API key only ever comes from
//! the environment (or `.env`).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

use crate::transcript::DEFAULT_SYSTEM_PROMPT;

/// Path to the JSON configuration file when `MIRROR_CONFIG` is unset.
pub const CONFIG_PATH: &str = "config.json";

/// Environment variable holding the completion/transcription API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Longest microphone window: five seconds to start talking plus ten of phrase.
pub const MAX_RECORD_SECONDS: u64 = 15;

/// Strongly typed representation of `config.json`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Socket address the HTTP server binds.
    pub bind_addr: String,
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    pub chat_model: String,
    pub transcription_model: String,
    /// Where the conversation transcript is persisted.
    pub memory_path: PathBuf,
    /// Where the daily affirmation is cached.
    pub affirmation_path: PathBuf,
    /// Content of the system turn for new conversations.
    pub system_prompt: String,
    /// Synthesizer command; `None` picks `say` on macOS and logging elsewhere.
    pub tts_command: Option<String>,
    /// Length of each microphone recording, clamped to 1..=15 seconds.
    ///
    /// Capture is a fixed window with no end-of-phrase detection, so speech
    /// running past it is cut off.
    pub record_seconds: u64,
    /// Timeout applied to every outbound API request.
    pub request_timeout_secs: u64,
    #[serde(skip)]
    pub api_key: Option<String>,
}

/// Returns the baked-in configuration.
///
/// # Details
/// Matches the historical file names so an existing `chat_memory.json` and
/// `daily_affirmation.txt` are picked up without any configuration.
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o".to_string(),
            transcription_model: "whisper-1".to_string(),
            memory_path: PathBuf::from("chat_memory.json"),
            affirmation_path: PathBuf::from("daily_affirmation.txt"),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            tts_command: None,
            record_seconds: 5,
            request_timeout_secs: 60,
            api_key: None,
        }
    }
}

impl AppConfig {
    /// Loads the configuration file named by `MIRROR_CONFIG` (or `config.json`)
    /// and applies environment overrides.
    pub fn from_env() -> Self {
        let path = env::var("MIRROR_CONFIG").unwrap_or_else(|_| CONFIG_PATH.to_string());
        let mut config = load_app_config(Path::new(&path));
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    /// Applies overrides from a key lookup (normally the process environment).
    ///
    /// # Details
    /// Recognized keys: `OPENAI_API_KEY`, `MIRROR_BIND`, `MIRROR_API_BASE`,
    /// `MIRROR_CHAT_MODEL`, `MIRROR_TTS_COMMAND`. Blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(key) = get(API_KEY_VAR) {
            self.api_key = Some(key);
        }
        if let Some(bind) = get("MIRROR_BIND") {
            self.bind_addr = bind;
        }
        if let Some(base) = get("MIRROR_API_BASE") {
            self.api_base = base;
        }
        if let Some(model) = get("MIRROR_CHAT_MODEL") {
            self.chat_model = model;
        }
        if let Some(command) = get("MIRROR_TTS_COMMAND") {
            self.tts_command = Some(command);
        }
    }

    /// Returns the API key or explains how to provide one.
    ///
    /// # Errors
    /// Returns an error when `OPENAI_API_KEY` was not set.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            anyhow::anyhow!("{} is not set (export it or add it to .env)", API_KEY_VAR)
        })
    }

    pub fn record_duration(&self) -> Duration {
        Duration::from_secs(self.record_seconds.clamp(1, MAX_RECORD_SECONDS))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Loads configuration from `path`, falling back to baked defaults when missing.
///
/// # Details
/// A missing file is normal and logged at debug level; an unreadable or
/// invalid file is logged as a warning. Either way the defaults are used.
pub fn load_app_config(path: &Path) -> AppConfig {
    match fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!("Config parse error ({}): {}", path.display(), err);
                AppConfig::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            AppConfig::default()
        }
        Err(err) => {
            tracing::warn!("Config load error ({}): {}", path.display(), err);
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_app_config(&dir.path().join("config.json"));
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.chat_model, "gpt-4o");
        assert_eq!(config.memory_path, PathBuf::from("chat_memory.json"));
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"chat_model": "gpt-4o-mini", "record_seconds": 8, "tts_command": "espeak"}"#,
        )
        .unwrap();
        let config = load_app_config(&path);
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.record_duration(), Duration::from_secs(8));
        assert_eq!(config.tts_command.as_deref(), Some("espeak"));
        assert_eq!(config.transcription_model, "whisper-1");
    }

    #[test]
    fn invalid_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_app_config(&path).api_base, "https://api.openai.com/v1");
    }

    #[test]
    fn api_key_is_never_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_key": "leaked"}"#).unwrap();
        assert!(load_app_config(&path).require_api_key().is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        let vars: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-test"),
            ("MIRROR_BIND", "127.0.0.1:8080"),
            ("MIRROR_CHAT_MODEL", ""),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.require_api_key().unwrap(), "sk-test");
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.chat_model, "gpt-4o");
    }

    #[test]
    fn long_recordings_are_capped() {
        let config = AppConfig {
            record_seconds: 60,
            ..AppConfig::default()
        };
        assert_eq!(config.record_duration(), Duration::from_secs(MAX_RECORD_SECONDS));
    }

    #[test]
    fn zero_durations_are_clamped() {
        let config = AppConfig {
            record_seconds: 0,
            request_timeout_secs: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.record_duration(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }
}
