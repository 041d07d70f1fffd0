//! Audio playback to speakers

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};

use crate::{Error, Result};

/// Decoded mono audio
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

/// Plays audio to the default output device
pub struct AudioPlayback {
    device: Device,
}

impl AudioPlayback {
    /// Open the default output device
    ///
    /// # Errors
    ///
    /// Returns error if no output device is available
    pub fn new() -> Result<Self> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            "audio playback initialized"
        );

        Ok(Self { device })
    }

    /// Decode MP3 bytes and play them, blocking until done
    ///
    /// # Errors
    ///
    /// Returns error if decoding or playback fails
    pub fn play_mp3_blocking(&self, mp3_data: &[u8]) -> Result<()> {
        let audio = decode_mp3(mp3_data)?;
        self.play_blocking(&audio)
    }

    /// Play decoded audio, blocking until done
    ///
    /// # Errors
    ///
    /// Returns error if no suitable output config exists or the stream fails
    pub fn play_blocking(&self, audio: &DecodedAudio) -> Result<()> {
        if audio.samples.is_empty() {
            return Ok(());
        }

        let config = self.output_config(audio.sample_rate)?;
        let channels = usize::from(config.channels);

        let samples = Arc::new(audio.samples.clone());
        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let stream = {
            let samples = Arc::clone(&samples);
            let position = Arc::clone(&position);
            let finished = Arc::clone(&finished);

            self.device
                .build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        for frame in data.chunks_mut(channels) {
                            let pos = position.load(Ordering::Relaxed);
                            let sample = samples.get(pos).copied().unwrap_or_else(|| {
                                finished.store(true, Ordering::Relaxed);
                                0.0
                            });

                            frame.fill(sample);

                            if pos < samples.len() {
                                position.store(pos + 1, Ordering::Relaxed);
                            }
                        }
                    },
                    |err| {
                        tracing::error!(error = %err, "audio playback error");
                    },
                    None,
                )
                .map_err(|e| Error::Audio(e.to_string()))?
        };

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        let duration_ms = (samples.len() as u64 * 1000) / u64::from(audio.sample_rate.max(1));
        let timeout = Duration::from_millis(duration_ms + 500);
        let start = Instant::now();

        while !finished.load(Ordering::Relaxed) {
            if start.elapsed() > timeout {
                tracing::warn!("playback timed out");
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        // Let the device drain its last buffer
        std::thread::sleep(Duration::from_millis(100));

        drop(stream);
        tracing::debug!(samples = samples.len(), "playback complete");

        Ok(())
    }

    /// Find a mono or stereo config at `sample_rate`
    fn output_config(&self, sample_rate: u32) -> Result<StreamConfig> {
        let rate = SampleRate(sample_rate);
        let supports = |channels: u16| {
            self.device.supported_output_configs().ok().and_then(|mut configs| {
                configs.find(|c| {
                    c.channels() == channels
                        && c.sample_format() == cpal::SampleFormat::F32
                        && c.min_sample_rate() <= rate
                        && c.max_sample_rate() >= rate
                })
            })
        };

        let supported = supports(1)
            .or_else(|| supports(2))
            .ok_or_else(|| {
                Error::Audio(format!("no output config for {sample_rate} Hz"))
            })?;

        Ok(supported.with_sample_rate(rate).config())
    }
}

/// Decode MP3 bytes to mono f32 samples
///
/// # Errors
///
/// Returns error if the data is not valid MP3
pub fn decode_mp3(mp3_data: &[u8]) -> Result<DecodedAudio> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();
    let mut sample_rate = 0;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if sample_rate == 0 {
                    sample_rate = u32::try_from(frame.sample_rate).unwrap_or(0);
                }

                if frame.channels == 2 {
                    // Stereo: average channels
                    samples.extend(frame.data.chunks(2).map(|chunk| {
                        let left = f32::from(chunk[0]) / 32768.0;
                        let right = f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                        f32::midpoint(left, right)
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    if sample_rate == 0 {
        return Err(Error::Audio("no MP3 frames found".to_string()));
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rejects_non_mp3() {
        let err = decode_mp3(b"definitely not an mp3 stream").unwrap_err();
        assert!(matches!(err, Error::Audio(_)));
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode_mp3(&[]).is_err());
    }
}
