//! Text-to-speech functionality module.

use std::process::Command;

use anyhow::{Context, Result};

/// Anything that can say a line of text out loud.
pub trait Speaker: Send + Sync {
    /// Speaks `text`, blocking until playback finishes.
    ///
    /// # Errors
    /// Returns an error if the text is blank or playback fails.
    fn speak(&self, text: &str) -> Result<()>;
}

/// Speaker backed by a command-line synthesizer such as macOS `say`.
///
/// # Details
/// The text is passed as the single argument of the command. Without a
/// command the utterance is only written to the log, which keeps the agent
/// usable on hosts with no synthesizer installed.
#[derive(Clone, Debug)]
pub struct SystemSpeaker {
    command: Option<String>,
}

impl SystemSpeaker {
    /// Uses `say` on macOS and log-only output elsewhere.
    pub fn platform_default() -> Self {
        Self {
            command: cfg!(target_os = "macos").then(|| "say".to_string()),
        }
    }

    /// Uses the given synthesizer command, e.g. `espeak`.
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
        }
    }

    #[cfg(test)]
    pub(crate) fn log_only() -> Self {
        Self { command: None }
    }

    /// Picks a configured command, falling back to the platform default.
    pub fn from_config(command: Option<&str>) -> Self {
        match command.map(str::trim).filter(|cmd| !cmd.is_empty()) {
            Some(cmd) => Self::with_command(cmd),
            None => Self::platform_default(),
        }
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }
}

impl Speaker for SystemSpeaker {
    fn speak(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            anyhow::bail!("Cannot speak empty text");
        }
        match &self.command {
            Some(program) => run_synthesizer(program, text),
            None => {
                tracing::info!("🗣️ {}", text);
                Ok(())
            }
        }
    }
}

fn run_synthesizer(program: &str, text: &str) -> Result<()> {
    let status = Command::new(program)
        .arg(text)
        .status()
        .with_context(|| format!("Failed to run {}", program))?;
    if !status.success() {
        anyhow::bail!("{} exited with {}", program, status);
    }
    Ok(())
}
