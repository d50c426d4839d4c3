use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;
const TONE_FREQ: f32 = 880.0;
const PULSE_SECS: f32 = 0.15;
const GAP_SECS: f32 = 0.1;

/// Synthesized posture alert: two short pulses. Finite, mono.
/// Used when no pre-rendered alert clip is configured.
pub struct AlertTone {
    num_sample: usize,
    total_samples: usize,
}

impl AlertTone {
    pub fn new() -> Self {
        let total_secs = PULSE_SECS * 2.0 + GAP_SECS;
        Self {
            num_sample: 0,
            total_samples: (total_secs * SAMPLE_RATE as f32) as usize,
        }
    }
}

impl Default for AlertTone {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for AlertTone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }

        let t = self.num_sample as f32 / SAMPLE_RATE as f32;
        self.num_sample += 1;

        let in_pulse = t < PULSE_SECS || (t >= PULSE_SECS + GAP_SECS);
        if !in_pulse {
            return Some(0.0);
        }

        // Lower amplitude to prevent clipping
        Some((2.0 * PI * TONE_FREQ * t).sin() * 0.25)
    }
}

impl Source for AlertTone {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(PULSE_SECS * 2.0 + GAP_SECS))
    }
}
