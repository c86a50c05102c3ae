//! Tone timbres and audio output constants.

use std::fmt;

use clap::ValueEnum;

/// Selectable metronome timbre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SoundKind {
    /// Sine at A4, flat envelope
    #[default]
    Beep,
    /// Square wave with a short exponential decay
    Woodblock,
    /// Triangle wave with a longer exponential decay
    Cowbell,
}

impl SoundKind {
    pub const ALL: [SoundKind; 3] = [SoundKind::Beep, SoundKind::Woodblock, SoundKind::Cowbell];

    /// Oscillator and envelope settings for this timbre
    pub fn tone(self) -> ToneParams {
        use audio_constants::*;

        match self {
            SoundKind::Beep => ToneParams {
                waveform: Waveform::Sine,
                frequency_hz: 440.0, // A4
                start_gain: START_GAIN,
                envelope: Envelope::Flat,
                duration_s: OSCILLATOR_DURATION_S,
            },
            SoundKind::Woodblock => ToneParams {
                waveform: Waveform::Square,
                frequency_hz: 800.0,
                start_gain: START_GAIN,
                envelope: Envelope::ExponentialDecay {
                    target_gain: DECAY_TARGET_GAIN,
                    ramp_s: 0.1,
                },
                duration_s: OSCILLATOR_DURATION_S,
            },
            SoundKind::Cowbell => ToneParams {
                waveform: Waveform::Triangle,
                frequency_hz: 600.0,
                start_gain: START_GAIN,
                envelope: Envelope::ExponentialDecay {
                    target_gain: DECAY_TARGET_GAIN,
                    ramp_s: 0.2,
                },
                duration_s: OSCILLATOR_DURATION_S,
            },
        }
    }

    /// Next timbre in selector order (wraps)
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for SoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SoundKind::Beep => "beep",
            SoundKind::Woodblock => "woodblock",
            SoundKind::Cowbell => "cowbell",
        };
        f.write_str(name)
    }
}

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
}

/// Gain envelope applied over the life of a tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Envelope {
    /// Gain stays at the start value
    Flat,

    /// Exponential ramp from the start gain to `target_gain` over `ramp_s`
    /// seconds, then holds `target_gain`
    ExponentialDecay { target_gain: f32, ramp_s: f32 },
}

/// Full description of one metronome click
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneParams {
    pub waveform: Waveform,

    /// Oscillator frequency (Hz)
    pub frequency_hz: f32,

    /// Gain at the start of the click (linear)
    pub start_gain: f32,

    pub envelope: Envelope,

    /// Time until the oscillator stops (seconds)
    pub duration_s: f32,
}

/// Audio constants
pub mod audio_constants {
    /// Initial gain of every click
    pub const START_GAIN: f32 = 0.5;

    /// Gain the decaying envelopes ramp down to
    pub const DECAY_TARGET_GAIN: f32 = 0.01;

    /// Every oscillator is stopped this long after it starts (seconds)
    pub const OSCILLATOR_DURATION_S: f32 = 0.1;

    /// Hard output limit (±) applied in the stream callback
    pub const OUTPUT_LIMIT: f32 = 0.5;

    /// Beat indicator flash length (milliseconds)
    pub const INDICATOR_FLASH_MS: u64 = 100;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_table_matches_timbres() {
        let beep = SoundKind::Beep.tone();
        assert_eq!(beep.waveform, Waveform::Sine);
        assert_eq!(beep.frequency_hz, 440.0);
        assert_eq!(beep.envelope, Envelope::Flat);

        let wood = SoundKind::Woodblock.tone();
        assert_eq!(wood.waveform, Waveform::Square);
        assert_eq!(wood.frequency_hz, 800.0);

        let bell = SoundKind::Cowbell.tone();
        assert_eq!(bell.waveform, Waveform::Triangle);
        assert_eq!(bell.frequency_hz, 600.0);
        match bell.envelope {
            Envelope::ExponentialDecay { target_gain, ramp_s } => {
                assert!((target_gain - 0.01).abs() < f32::EPSILON);
                assert!((ramp_s - 0.2).abs() < f32::EPSILON);
            }
            Envelope::Flat => panic!("cowbell should decay"),
        }
    }

    #[test]
    fn test_all_clicks_are_short() {
        for kind in SoundKind::ALL {
            assert!(kind.tone().duration_s <= 0.2, "{} too long", kind);
        }
    }

    #[test]
    fn test_sound_kind_cycles() {
        assert_eq!(SoundKind::Beep.next(), SoundKind::Woodblock);
        assert_eq!(SoundKind::Woodblock.next(), SoundKind::Cowbell);
        assert_eq!(SoundKind::Cowbell.next(), SoundKind::Beep);
    }
}
