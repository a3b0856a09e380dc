/*
 * @file lib.rs
 * @brief Mirror agent library root
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

//! Mirror Agent - a talking smart-mirror assistant.
//!
//! This library provides a small HTTP service that:
//! - forwards typed or spoken questions to an OpenAI-compatible chat model
//! - keeps the conversation in a transcript persisted across restarts
//! - caches one motivational affirmation per calendar day
//! - reads every reply aloud through a command-line synthesizer
//!
//! # Example
//! ```no_run
//! use anyhow::Result;
//! use mirror_agent::{assistant, config::AppConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     dotenv::dotenv().ok();
//!     assistant::run_mirror_agent(AppConfig::from_env()).await
//! }
//! ```

pub mod affirmation;
pub mod ai;
pub mod assistant;
pub mod audio;
pub mod config;
pub mod error;
pub mod server;
pub mod speech;
pub mod transcribe;
pub mod transcript;

#[cfg(test)]
mod testing;
