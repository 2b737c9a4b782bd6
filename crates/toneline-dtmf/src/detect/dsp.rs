use super::goertzel::Resonator;
use crate::config::TwistLimits;
use crate::Result;

pub const ROW_FREQS: [f32; 4] = [697.0, 770.0, 852.0, 941.0];
pub const COL_FREQS: [f32; 4] = [1209.0, 1336.0, 1477.0, 1633.0];

pub const DTMF_KEYS: [[char; 4]; 4] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

/// Minimum energy of both the row and the column peak.
pub const THRESHOLD: f32 = 8.0e7;
/// 8 dB
pub const RELATIVE_PEAK_ROW: f32 = 6.3;
/// 8 dB
pub const RELATIVE_PEAK_COL: f32 = 6.3;
/// Scale between the peak resonator energies and the raw block energy.
///
/// Calibrated for 102-sample blocks and [`THRESHOLD`]; changing either
/// requires recalibrating this and the relative peak ratios.
pub const TO_TOTAL_ENERGY: f32 = 42.0;

/// Eight resonators, one per DTMF frequency, fed in lockstep.
#[derive(Debug, Clone)]
pub struct ToneBank {
    rows: [Resonator; 4],
    cols: [Resonator; 4],
}

impl ToneBank {
    pub fn new(sample_rate_hz: u32) -> Result<Self> {
        let rows = tune(ROW_FREQS, sample_rate_hz)?;
        let cols = tune(COL_FREQS, sample_rate_hz)?;
        Ok(Self { rows, cols })
    }

    #[inline]
    pub fn feed(&mut self, sample: i16) {
        // Unrolled on purpose, this runs eight times per input sample.
        self.rows[0].feed(sample);
        self.cols[0].feed(sample);
        self.rows[1].feed(sample);
        self.cols[1].feed(sample);
        self.rows[2].feed(sample);
        self.cols[2].feed(sample);
        self.rows[3].feed(sample);
        self.cols[3].feed(sample);
    }

    pub fn row_energies(&self) -> [f32; 4] {
        std::array::from_fn(|i| self.rows[i].result())
    }

    pub fn col_energies(&self) -> [f32; 4] {
        std::array::from_fn(|i| self.cols[i].result())
    }

    /// Reset all eight resonators together.
    pub fn reset(&mut self) {
        for r in self.rows.iter_mut().chain(self.cols.iter_mut()) {
            r.reset();
        }
    }

    pub fn resonators(&self) -> impl Iterator<Item = &Resonator> {
        self.rows.iter().chain(self.cols.iter())
    }
}

fn tune(freqs: [f32; 4], sample_rate_hz: u32) -> Result<[Resonator; 4]> {
    Ok([
        Resonator::new(freqs[0], sample_rate_hz)?,
        Resonator::new(freqs[1], sample_rate_hz)?,
        Resonator::new(freqs[2], sample_rate_hz)?,
        Resonator::new(freqs[3], sample_rate_hz)?,
    ])
}

/// Decide whether one block carries a DTMF digit.
///
/// `energy` is the sum of squared samples over the block. Returns the keypad
/// symbol when the signal level, twist, relative peak and total energy tests
/// all pass.
pub fn evaluate_block(
    rows: &[f32; 4],
    cols: &[f32; 4],
    energy: f32,
    twist: TwistLimits,
) -> Option<char> {
    let best_row = peak_index(rows);
    let best_col = peak_index(cols);
    let row_peak = rows[best_row];
    let col_peak = cols[best_col];

    if row_peak < THRESHOLD
        || col_peak < THRESHOLD
        || col_peak >= row_peak * twist.reverse
        || row_peak >= col_peak * twist.normal
    {
        return None;
    }

    let shadowed = (0..4).any(|i| {
        (i != best_col && cols[i] * RELATIVE_PEAK_COL > col_peak)
            || (i != best_row && rows[i] * RELATIVE_PEAK_ROW > row_peak)
    });
    if shadowed {
        return None;
    }

    if row_peak + col_peak <= TO_TOTAL_ENERGY * energy {
        return None;
    }

    Some(DTMF_KEYS[best_row][best_col])
}

/// Index of the largest value; the first one wins ties.
fn peak_index(values: &[f32; 4]) -> usize {
    let mut best = 0;
    for i in 1..values.len() {
        if values[i] > values[best] {
            best = i;
        }
    }
    best
}
