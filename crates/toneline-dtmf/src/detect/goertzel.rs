use crate::{Error, Result};

/// Largest magnitude the recurrence history may hold before rescaling.
const HISTORY_LIMIT: i32 = 1 << 15;

/// Fixed-point Goertzel resonator tuned to a single frequency.
///
/// The two most recent recurrence values are kept as plain integers together
/// with a power-of-two exponent (`chunky`). Whenever the newest value grows
/// past 2^15 the history is halved and the exponent bumped, so a whole block
/// runs in integer arithmetic regardless of input amplitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resonator {
    v2: i32,
    v3: i32,
    chunky: i32,
    /// `2 * cos(2 * pi * f / fs)` with 15 fractional bits.
    coeff: i32,
}

impl Resonator {
    /// Tune a resonator to `freq_hz` at `sample_rate_hz`.
    pub fn new(freq_hz: f32, sample_rate_hz: u32) -> Result<Self> {
        if sample_rate_hz == 0 {
            return Err(Error::InvalidSampleRate(sample_rate_hz));
        }
        let invalid = Error::InvalidFrequency {
            freq_hz,
            sample_rate_hz,
        };
        if !freq_hz.is_finite() || freq_hz <= 0.0 || 2.0 * freq_hz as f64 >= sample_rate_hz as f64
        {
            return Err(invalid);
        }

        let omega = 2.0 * std::f64::consts::PI * freq_hz as f64 / sample_rate_hz as f64;
        let coeff = (32768.0 * 2.0 * omega.cos()).round();
        if !coeff.is_finite() {
            return Err(invalid);
        }

        Ok(Self {
            v2: 0,
            v3: 0,
            chunky: 0,
            coeff: coeff as i32,
        })
    }

    /// Run one sample through the recurrence.
    #[inline]
    pub fn feed(&mut self, sample: i16) {
        let v1 = self.v2;
        self.v2 = self.v3;

        // Drop the binary fraction introduced by the coefficient, then bring
        // the sample to the history's scale.
        let scaled = ((self.coeff as i64 * self.v2 as i64) >> 15) as i32;
        self.v3 = scaled - v1 + ((sample as i32) >> self.chunky.min(31));

        while self.v3.abs() > HISTORY_LIMIT {
            self.chunky += 1;
            self.v3 >>= 1;
            self.v2 >>= 1;
        }
    }

    /// Energy at the tuned frequency over the samples fed since the last reset.
    pub fn result(&self) -> f32 {
        let v2 = self.v2 as i64;
        let v3 = self.v3 as i64;
        let value = v3 * v3 + v2 * v2 - ((v2 * v3) >> 15) * self.coeff as i64;

        // Both factors carried the exponent, so it counts twice.
        value as f32 * 2.0f32.powi(self.chunky * 2)
    }

    /// Clear the history for a new block, keeping the tuning.
    pub fn reset(&mut self) {
        self.v2 = 0;
        self.v3 = 0;
        self.chunky = 0;
    }

    pub fn coeff(&self) -> i32 {
        self.coeff
    }

    pub fn chunky(&self) -> i32 {
        self.chunky
    }

    /// The two most recent recurrence values, oldest first.
    pub fn history(&self) -> (i32, i32) {
        (self.v2, self.v3)
    }
}
