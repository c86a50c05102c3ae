//! Audio output managing the cpal stream and click playback.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::fs::File;
use std::io::BufWriter;
use std::sync::{Arc, Mutex};

use super::tone::{mix_voices, ToneVoice};
use crate::errors::AudioError;
use crate::params::{audio_constants::OUTPUT_LIMIT, RecordingConfig, SoundKind};

type WavRecorder = Arc<Mutex<hound::WavWriter<BufWriter<File>>>>;

/// Something that can sound a metronome click
pub trait TonePlayer {
    /// Play one click; never fails from the caller's point of view
    fn play(&mut self, kind: SoundKind);

    /// Let the output idle while the metronome is stopped
    fn suspend(&mut self) {}
}

/// Audio system owning the output stream
pub struct AudioSystem {
    /// Voices currently sounding (shared with the stream callback)
    voices: Arc<Mutex<Vec<ToneVoice>>>,

    /// Device sample rate (Hz)
    sample_rate_hz: u32,

    /// Audio output stream (kept alive)
    stream: cpal::Stream,

    /// Stream paused by `suspend`, resumed before the next click
    suspended: bool,
}

impl AudioSystem {
    /// Open the default output device, optionally recording to WAV
    pub fn new(recording: Option<&RecordingConfig>) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;

        let supported = device.default_output_config()?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let sample_rate_hz = config.sample_rate.0;

        log::info!(
            "Audio: {} @ {}Hz ({} ch, {:?})",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate_hz,
            config.channels,
            sample_format
        );

        let recorder = match recording {
            Some(rec) => {
                let spec = hound::WavSpec {
                    channels: 1,
                    sample_rate: sample_rate_hz,
                    bits_per_sample: 32,
                    sample_format: hound::SampleFormat::Float,
                };
                let writer = hound::WavWriter::create(&rec.wav_path, spec)?;
                log::info!("Recording audio to {}", rec.wav_path.display());
                Some(Arc::new(Mutex::new(writer)))
            }
            None => None,
        };

        let voices = Arc::new(Mutex::new(Vec::new()));

        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &config, Arc::clone(&voices), recorder)?
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&device, &config, Arc::clone(&voices), recorder)?
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&device, &config, Arc::clone(&voices), recorder)?
            }
            other => return Err(AudioError::UnsupportedSampleFormat(other)),
        };

        stream.play()?;

        Ok(Self {
            voices,
            sample_rate_hz,
            stream,
            suspended: false,
        })
    }

    /// Resume the stream if it was suspended
    fn ensure_running(&mut self) -> Result<(), AudioError> {
        if self.suspended {
            self.stream.play()?;
            self.suspended = false;
            log::debug!("Audio stream resumed");
        }
        Ok(())
    }

    /// Queue one click on the stream
    fn trigger(&self, kind: SoundKind) {
        let voice = ToneVoice::new(kind.tone(), self.sample_rate_hz);
        if let Ok(mut voices) = self.voices.lock() {
            voices.push(voice);
        }
    }
}

impl TonePlayer for AudioSystem {
    fn play(&mut self, kind: SoundKind) {
        if let Err(e) = self.ensure_running() {
            log::warn!("{}", e);
            return;
        }
        self.trigger(kind);
    }

    fn suspend(&mut self) {
        if self.suspended {
            return;
        }
        match self.stream.pause() {
            Ok(()) => {
                self.suspended = true;
                log::debug!("Audio stream suspended");
            }
            Err(e) => log::debug!("Could not suspend audio stream: {}", e),
        }
    }
}

/// Click output chosen once at startup
pub enum ToneOutput {
    Audio(AudioSystem),

    /// Audio is unavailable; clicks are silent no-ops
    Silent,
}

impl ToneOutput {
    /// Open the audio system, degrading to `Silent` with a warning on failure
    pub fn open(recording: Option<&RecordingConfig>) -> Self {
        match AudioSystem::new(recording) {
            Ok(audio) => ToneOutput::Audio(audio),
            Err(e) => {
                log::warn!("Audio is unavailable, the metronome will be silent: {}", e);
                ToneOutput::Silent
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ToneOutput::Audio(_))
    }
}

impl TonePlayer for ToneOutput {
    fn play(&mut self, kind: SoundKind) {
        if let ToneOutput::Audio(audio) = self {
            audio.play(kind);
        }
    }

    fn suspend(&mut self) {
        if let ToneOutput::Audio(audio) = self {
            audio.suspend();
        }
    }
}

/// Build an output stream for sample type `T`
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    voices: Arc<Mutex<Vec<ToneVoice>>>,
    recorder: Option<WavRecorder>,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            write_frames(data, channels, &voices, recorder.as_ref());
        },
        |err| log::error!("Audio stream error: {}", err),
        None,
    )?;

    Ok(stream)
}

/// Fill an interleaved output buffer from the active voices
fn write_frames<T>(
    data: &mut [T],
    channels: usize,
    voices: &Mutex<Vec<ToneVoice>>,
    recorder: Option<&WavRecorder>,
) where
    T: Sample + FromSample<f32>,
{
    let Ok(mut voices) = voices.lock() else {
        data.fill(T::EQUILIBRIUM);
        return;
    };
    let mut writer = recorder.and_then(|r| r.lock().ok());

    for frame in data.chunks_mut(channels.max(1)) {
        // Safety limiter: hard clip to prevent ear damage
        let value = mix_voices(&mut voices).clamp(-OUTPUT_LIMIT, OUTPUT_LIMIT);

        if let Some(w) = writer.as_mut() {
            let _ = w.write_sample(value);
        }

        for sample in frame.iter_mut() {
            *sample = T::from_sample(value);
        }
    }
}
