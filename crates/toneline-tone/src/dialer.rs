use crate::keypad::{key_freqs, EncodeError};
use crate::sine_oscillator::DualTone;

/// Synthesizes 16-bit PCM DTMF audio for digit strings.
pub struct DtmfDialer {
    sample_rate_hz: f32,
    tone_samples: usize,
    gap_samples: usize,
    row_level: f32,
    col_level: f32,
}

impl DtmfDialer {
    /// Create a dialer. `level` is the peak amplitude of each of the two tones.
    pub fn new(sample_rate_hz: f32, tone_ms: f32, gap_ms: f32, level: f32) -> Self {
        Self {
            sample_rate_hz,
            tone_samples: ms_to_samples(tone_ms, sample_rate_hz),
            gap_samples: ms_to_samples(gap_ms, sample_rate_hz),
            row_level: level,
            col_level: level,
        }
    }

    /// Attenuate the column tone by `twist_db` relative to the row tone.
    /// Negative values attenuate the row tone instead.
    pub fn with_twist_db(mut self, twist_db: f32) -> Self {
        let level = self.row_level.max(self.col_level);
        let ratio = 10.0_f32.powf(-twist_db.abs() / 20.0);
        if twist_db >= 0.0 {
            self.row_level = level;
            self.col_level = level * ratio;
        } else {
            self.row_level = level * ratio;
            self.col_level = level;
        }
        self
    }

    /// Render `samples` samples of a single key.
    pub fn tone(&self, key: char, samples: usize) -> Result<Vec<i16>, EncodeError> {
        self.check_levels()?;
        let freqs = key_freqs(key).ok_or(EncodeError::UnknownKey { key, pos: 0 })?;
        let mut out = Vec::with_capacity(samples);
        self.render(freqs, samples, &mut out);
        Ok(out)
    }

    /// Render a digit string: every key is a tone followed by a gap.
    /// Whitespace adds one more gap.
    pub fn dial(&self, digits: &str) -> Result<Vec<i16>, EncodeError> {
        self.check_levels()?;
        let mut out = Vec::new();
        for (pos, key) in digits.char_indices() {
            if key.is_whitespace() {
                out.resize(out.len() + self.gap_samples, 0);
                continue;
            }
            let freqs = key_freqs(key).ok_or(EncodeError::UnknownKey { key, pos })?;
            self.render(freqs, self.tone_samples, &mut out);
            out.resize(out.len() + self.gap_samples, 0);
        }
        Ok(out)
    }

    pub fn tone_samples(&self) -> usize {
        self.tone_samples
    }

    pub fn gap_samples(&self) -> usize {
        self.gap_samples
    }

    fn render(&self, freqs: (f32, f32), samples: usize, out: &mut Vec<i16>) {
        let mut tone = DualTone::new(self.sample_rate_hz, freqs, (self.row_level, self.col_level));
        out.extend((0..samples).map(|_| tone.next_sample()));
    }

    fn check_levels(&self) -> Result<(), EncodeError> {
        for level in [self.row_level, self.col_level] {
            if !level.is_finite() || level < 0.0 {
                return Err(EncodeError::InvalidLevel(level));
            }
        }
        Ok(())
    }
}

fn ms_to_samples(ms: f32, sample_rate_hz: f32) -> usize {
    (sample_rate_hz * (ms / 1000.0)).round().max(0.0) as usize
}
