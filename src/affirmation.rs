/*
 * @file affirmation.rs
 * @brief Once-a-day affirmation cache for the mirror agent
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

//! Daily affirmation cache.
//!
//! A single plain-text file holds the most recent affirmation. Its own
//! last-modified time is the cache timestamp: the text is reused for the rest
//! of the local calendar day and regenerated on the first read after that.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use tokio::sync::Mutex;

use crate::ai::ChatCompletion;
use crate::transcript::Turn;

/// Persona used when asking for a new affirmation.
const AFFIRMATION_PERSONA: &str = "You are a motivational assistant.";

/// Request sent alongside the persona.
const AFFIRMATION_REQUEST: &str =
    "Give me a short, uplifting daily affirmation. Keep it under 20 words.";

/// File-backed cache that regenerates its value at most once per day.
///
/// # Details
/// Refreshes are serialized by an async mutex so two requests that both find
/// the file stale produce a single generation call.
#[derive(Debug)]
pub struct AffirmationCache {
    path: PathBuf,
    refresh: Mutex<()>,
}

impl AffirmationCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            refresh: Mutex::new(()),
        }
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Returns today's affirmation, generating one if the cache is stale.
    ///
    /// # Arguments
    /// * `generator` - Completion service used when a new affirmation is needed.
    ///
    /// # Returns
    /// The cached text verbatim when it was written today, otherwise the newly
    /// generated text.
    ///
    /// # Errors
    /// Returns an error if generation fails or the new text cannot be written.
    /// A stale value is never served as a fallback.
    pub async fn get_or_refresh(&self, generator: &dyn ChatCompletion) -> Result<String> {
        self.get_or_refresh_on(generator, Local::now().date_naive()).await
    }

    /// Same as [`AffirmationCache::get_or_refresh`] with an explicit reference date.
    pub(crate) async fn get_or_refresh_on(
        &self,
        generator: &dyn ChatCompletion,
        today: NaiveDate,
    ) -> Result<String> {
        let _guard = self.refresh.lock().await;
        if let Some(cached) = self.cached_on(today) {
            tracing::debug!(path = %self.path.display(), "serving cached affirmation");
            return Ok(cached);
        }
        tracing::info!("Generating a new daily affirmation");
        let affirmation = generator
            .complete(&affirmation_prompt())
            .await
            .with_context(|| "Failed to generate affirmation")?;
        self.store(&affirmation)?;
        Ok(affirmation)
    }

    /// Reads the cached text if it was written on `today`.
    fn cached_on(&self, today: NaiveDate) -> Option<String> {
        if !is_fresh(&self.path, today) {
            return None;
        }
        match fs::read_to_string(&self.path) {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "Affirmation read error: {}", err);
                None
            }
        }
    }

    /// Overwrites the cache file; the write itself stamps the new date.
    fn store(&self, affirmation: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, affirmation)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

/// Conversation sent to the generator for a fresh affirmation.
pub fn affirmation_prompt() -> Vec<Turn> {
    vec![
        Turn::system(AFFIRMATION_PERSONA),
        Turn::user(AFFIRMATION_REQUEST),
    ]
}

/// Checks whether `path` was last modified on `today` in local time.
///
/// # Details
/// Only the calendar date is compared. A missing file or a filesystem that
/// cannot report modification times counts as stale.
pub fn is_fresh(path: &Path, today: NaiveDate) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    let Ok(modified) = metadata.modified() else {
        return false;
    };
    DateTime::<Local>::from(modified).date_naive() == today
}
