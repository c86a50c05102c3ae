//! Click synthesis: oscillators, envelopes and playing voices.

use std::f32::consts::PI;

use crate::params::{Envelope, ToneParams, Waveform};

/// Oscillator value at `phase` in `[0, 1)`
pub fn oscillator(waveform: Waveform, phase: f32) -> f32 {
    match waveform {
        Waveform::Sine => (2.0 * PI * phase).sin(),
        Waveform::Square => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        // Starts at zero and rises, like the sine
        Waveform::Triangle => {
            if phase < 0.25 {
                4.0 * phase
            } else if phase < 0.75 {
                2.0 - 4.0 * phase
            } else {
                4.0 * phase - 4.0
            }
        }
    }
}

/// Gain at `t_s` seconds after the click starts
///
/// Exponential ramps follow `g0 * (g1 / g0)^(t / T)` and then hold `g1`.
pub fn envelope_gain(start_gain: f32, envelope: Envelope, t_s: f32) -> f32 {
    match envelope {
        Envelope::Flat => start_gain,
        Envelope::ExponentialDecay {
            target_gain,
            ramp_s,
        } => {
            if t_s >= ramp_s || ramp_s <= 0.0 {
                target_gain
            } else {
                start_gain * (target_gain / start_gain).powf(t_s / ramp_s)
            }
        }
    }
}

/// One click being rendered by the output stream
#[derive(Debug, Clone)]
pub struct ToneVoice {
    params: ToneParams,
    sample_rate_hz: f32,
    phase: f32,
    position: usize,
    total_samples: usize,
}

impl ToneVoice {
    pub fn new(params: ToneParams, sample_rate_hz: u32) -> Self {
        let total_samples = (params.duration_s * sample_rate_hz as f32).round() as usize;
        Self {
            params,
            sample_rate_hz: sample_rate_hz as f32,
            phase: 0.0,
            position: 0,
            total_samples,
        }
    }

    /// Next mono sample, or silence once the oscillator has stopped
    pub fn next_sample(&mut self) -> f32 {
        if self.is_finished() {
            return 0.0;
        }

        let t_s = self.position as f32 / self.sample_rate_hz;
        let gain = envelope_gain(self.params.start_gain, self.params.envelope, t_s);
        let value = oscillator(self.params.waveform, self.phase) * gain;

        self.phase += self.params.frequency_hz / self.sample_rate_hz;
        self.phase -= self.phase.floor();
        self.position += 1;

        value
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.total_samples
    }
}

/// Render a whole click into a mono buffer
pub fn render_tone(params: ToneParams, sample_rate_hz: u32) -> Vec<f32> {
    let mut voice = ToneVoice::new(params, sample_rate_hz);
    let mut samples = Vec::with_capacity(voice.total_samples);
    while !voice.is_finished() {
        samples.push(voice.next_sample());
    }
    samples
}

/// Mix every active voice into one sample and drop the finished ones
pub fn mix_voices(voices: &mut Vec<ToneVoice>) -> f32 {
    let sum = voices.iter_mut().map(ToneVoice::next_sample).sum();
    voices.retain(|v| !v.is_finished());
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SoundKind;

    const SR: u32 = 44_100;

    #[test]
    fn test_oscillator_shapes() {
        assert!(oscillator(Waveform::Sine, 0.0).abs() < 1e-6);
        assert!((oscillator(Waveform::Sine, 0.25) - 1.0).abs() < 1e-6);

        assert_eq!(oscillator(Waveform::Square, 0.1), 1.0);
        assert_eq!(oscillator(Waveform::Square, 0.6), -1.0);

        assert!(oscillator(Waveform::Triangle, 0.0).abs() < 1e-6);
        assert!((oscillator(Waveform::Triangle, 0.25) - 1.0).abs() < 1e-6);
        assert!(oscillator(Waveform::Triangle, 0.5).abs() < 1e-6);
        assert!((oscillator(Waveform::Triangle, 0.75) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_exponential_ramp_endpoints() {
        let env = Envelope::ExponentialDecay {
            target_gain: 0.01,
            ramp_s: 0.1,
        };

        assert!((envelope_gain(0.5, env, 0.0) - 0.5).abs() < 1e-6);
        // Halfway through an exponential ramp is the geometric mean
        let mid = envelope_gain(0.5, env, 0.05);
        assert!((mid - (0.5f32 * 0.01).sqrt()).abs() < 1e-4);
        assert!((envelope_gain(0.5, env, 0.1) - 0.01).abs() < 1e-6);
        assert!((envelope_gain(0.5, env, 1.0) - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_flat_envelope() {
        assert_eq!(envelope_gain(0.5, Envelope::Flat, 0.0), 0.5);
        assert_eq!(envelope_gain(0.5, Envelope::Flat, 0.09), 0.5);
    }

    #[test]
    fn test_click_lengths() {
        // Every oscillator stops after 0.1 s, including the cowbell
        for kind in SoundKind::ALL {
            let samples = render_tone(kind.tone(), SR);
            assert_eq!(samples.len(), 4410, "{}", kind);
        }
    }

    #[test]
    fn test_woodblock_decays() {
        let samples = render_tone(SoundKind::Woodblock.tone(), SR);
        let head = samples[..100].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        let tail = samples[samples.len() - 100..]
            .iter()
            .fold(0.0f32, |m, s| m.max(s.abs()));
        assert!((head - 0.5).abs() < 0.01);
        assert!(tail < 0.02);
    }

    #[test]
    fn test_cowbell_cut_mid_decay() {
        // Cut at 0.1 s of a 0.2 s ramp, so the tail sits near sqrt(0.5 * 0.01)
        let samples = render_tone(SoundKind::Cowbell.tone(), SR);
        let tail = samples[samples.len() - 200..]
            .iter()
            .fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(tail > 0.05 && tail < 0.08, "tail peak {}", tail);
    }

    #[test]
    fn test_beep_peak_is_start_gain() {
        let samples = render_tone(SoundKind::Beep.tone(), SR);
        let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!((peak - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_mix_voices_drops_finished() {
        let mut voices = vec![
            ToneVoice::new(SoundKind::Beep.tone(), SR),
            ToneVoice::new(SoundKind::Woodblock.tone(), SR),
        ];
        for _ in 0..4410 {
            mix_voices(&mut voices);
        }
        assert!(voices.is_empty());
        assert_eq!(mix_voices(&mut voices), 0.0);
    }
}
