/*
 * @file audio.rs
 * @brief Microphone capture and WAV helpers for the mirror agent
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

//! Microphone capture and WAV encoding.
//!
//! This module records speech from the default input device using CPAL and
//! packs it into an in-memory WAV file ready for upload.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig, StreamError};
use hound::{WavSpec, WavWriter};

/// Sample rate for audio recording (16kHz).
///
/// Value is expressed in Hertz and matches what speech recognizers prefer.
const SAMPLE_RATE: u32 = 16000;

/// Number of audio channels (mono).
const CHANNELS: u16 = 1;

/// Bits per sample for WAV encoding.
const BITS_PER_SAMPLE: u16 = 16;

/// Minimum RMS amplitude considered speech.
///
/// Values much above ~300 miss normal speaking levels on some microphones, so
/// we bias toward a lower threshold and let the recognizer filter noise.
const SILENCE_RMS_THRESHOLD: f32 = 150.0;

/// Source of raw PCM speech samples.
pub trait AudioSource: Send + Sync {
    /// Records one utterance, blocking until capture completes.
    ///
    /// # Returns
    /// Mono 16 kHz signed 16-bit PCM samples.
    ///
    /// # Errors
    /// Returns an error if no input device is available or the stream fails.
    fn capture(&self) -> Result<Vec<i16>>;
}

/// The system default microphone, recorded for a fixed window.
#[derive(Clone, Debug)]
pub struct Microphone {
    duration: Duration,
}

impl Microphone {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl AudioSource for Microphone {
    fn capture(&self) -> Result<Vec<i16>> {
        record_audio(self.duration)
    }
}

/// Records audio from the default input device for `duration`.
///
/// # Returns
/// A vector of 16-bit PCM audio samples.
///
/// # Errors
/// Returns an error if:
/// - No input device is available
/// - The audio stream cannot be created
/// - Recording fails
pub fn record_audio(duration: Duration) -> Result<Vec<i16>> {
    let device = default_input_device()?;
    let config = input_config();
    let samples = shared_samples();
    let stream = build_input_stream(&device, &config, samples.clone())?;
    stream.play()?;
    std::thread::sleep(duration);
    drop(stream);
    let captured = samples
        .lock()
        .map_err(|_| anyhow!("Audio sample buffer poisoned"))?
        .clone();
    tracing::debug!(samples = captured.len(), "microphone capture finished");
    Ok(captured)
}

/// Encodes samples as a mono 16 kHz 16-bit WAV file held in memory.
///
/// # Parameters
/// * `samples` - Slice of signed 16-bit PCM audio frames.
///
/// # Errors
/// Returns an error if the WAV writer rejects the data.
pub fn encode_wav(samples: &[i16]) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, wav_spec())?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Detects whether audio samples contain meaningful speech content.
///
/// # Details
/// Calculates the root mean square (RMS) energy of the audio signal and compares
/// it against a threshold, so silent recordings never reach the recognizer.
///
/// # Returns
/// * `bool` - `true` when the RMS energy exceeds the silence threshold.
pub fn contains_speech(samples: &[i16]) -> bool {
    if samples.is_empty() {
        return false;
    }
    let energy = samples
        .iter()
        .map(|sample| (*sample as f32).powi(2))
        .sum::<f32>()
        / samples.len() as f32;
    energy.sqrt() >= SILENCE_RMS_THRESHOLD
}

fn wav_spec() -> WavSpec {
    WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Locates the system default input device.
///
/// # Errors
/// Returns an error when the host has no available microphone.
fn default_input_device() -> Result<Device> {
    cpal::default_host()
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device"))
}

/// Builds the CPAL stream configuration used by the recorder.
fn input_config() -> StreamConfig {
    StreamConfig {
        channels: CHANNELS,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Default,
    }
}

/// Creates the shared buffer that accumulates captured samples.
fn shared_samples() -> Arc<Mutex<Vec<i16>>> {
    Arc::new(Mutex::new(Vec::new()))
}

/// Builds and configures the CPAL input stream.
///
/// # Parameters
/// * `device` - The input device to capture from.
/// * `config` - The stream configuration (channels/rate/buffer).
/// * `samples` - Shared buffer that receives converted samples.
///
/// # Errors
/// Returns any stream-construction issues wrapped in [`anyhow::Error`].
fn build_input_stream(
    device: &Device,
    config: &StreamConfig,
    samples: Arc<Mutex<Vec<i16>>>,
) -> Result<Stream> {
    device
        .build_input_stream(
            config,
            move |data: &[f32], _: &_| push_samples(&samples, data),
            log_stream_error,
            None,
        )
        .map_err(|err| anyhow!(err))
}

/// Converts floating-point frames into 16-bit PCM and appends them to the buffer.
fn push_samples(buffer: &Arc<Mutex<Vec<i16>>>, data: &[f32]) {
    let Ok(mut guard) = buffer.lock() else {
        return;
    };
    for &sample in data {
        guard.push((sample * i16::MAX as f32) as i16);
    }
}

fn log_stream_error(error: StreamError) {
    tracing::warn!("Audio stream error: {}", error);
}
