use std::sync::OnceLock;

const TABLE_LEN: usize = 4096;

static SINE_TABLE: OnceLock<Vec<f32>> = OnceLock::new();

fn sine_table() -> &'static [f32] {
    SINE_TABLE.get_or_init(|| {
        (0..TABLE_LEN)
            .map(|i| (i as f64 * std::f64::consts::TAU / TABLE_LEN as f64).sin() as f32)
            .collect()
    })
}

/// Table-driven sine source. Phase is kept in table positions.
pub(crate) struct SineOscillator {
    phase: f64,
    phase_inc: f64,
}

impl SineOscillator {
    pub(crate) fn new(sample_rate_hz: f32, tone_freq_hz: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: tone_freq_hz as f64 * TABLE_LEN as f64 / sample_rate_hz as f64,
        }
    }

    pub(crate) fn next(&mut self) -> f32 {
        let table = sine_table();
        let idx = self.phase.floor() as usize % TABLE_LEN;
        let frac = (self.phase - self.phase.floor()) as f32;
        let value = table[idx] * (1.0 - frac) + table[(idx + 1) % TABLE_LEN] * frac;

        self.phase = (self.phase + self.phase_inc) % TABLE_LEN as f64;
        value
    }
}

/// Sum of a row and a column oscillator, each with its own amplitude.
pub(crate) struct DualTone {
    row: SineOscillator,
    col: SineOscillator,
    row_level: f32,
    col_level: f32,
}

impl DualTone {
    pub(crate) fn new(sample_rate_hz: f32, freqs: (f32, f32), levels: (f32, f32)) -> Self {
        Self {
            row: SineOscillator::new(sample_rate_hz, freqs.0),
            col: SineOscillator::new(sample_rate_hz, freqs.1),
            row_level: levels.0,
            col_level: levels.1,
        }
    }

    pub(crate) fn next_sample(&mut self) -> i16 {
        let value = self.row.next() * self.row_level + self.col.next() * self.col_level;
        value.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_period() {
        // 2 kHz at 8 kHz: four samples per cycle
        let mut osc = SineOscillator::new(8000.0, 2000.0);
        let values: Vec<f32> = (0..4).map(|_| osc.next()).collect();
        assert!(values[0].abs() < 1e-6);
        assert!((values[1] - 1.0).abs() < 1e-6);
        assert!(values[2].abs() < 1e-6);
        assert!((values[3] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dual_tone_clamps() {
        let mut tone = DualTone::new(8000.0, (2000.0, 2000.0), (30000.0, 30000.0));
        tone.next_sample();
        assert_eq!(tone.next_sample(), i16::MAX);
    }
}
