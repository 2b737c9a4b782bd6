//! Destinations for recognized digits.

use tracing::warn;

use crate::config::DEFAULT_DIGIT_CAPACITY;

/// Receives digit begin and continuation events from a detector.
pub trait DigitSink {
    /// A new digit began; `duration` is the number of samples it has already lasted.
    fn begin_digit(&mut self, digit: char, duration: usize);

    /// The most recently begun digit lasted `samples` more samples.
    fn extend_digit(&mut self, samples: usize);
}

impl<S: DigitSink + ?Sized> DigitSink for &mut S {
    fn begin_digit(&mut self, digit: char, duration: usize) {
        (**self).begin_digit(digit, duration);
    }

    fn extend_digit(&mut self, samples: usize) {
        (**self).extend_digit(samples);
    }
}

/// Unbounded sink of `(digit, duration)` pairs.
impl DigitSink for Vec<(char, usize)> {
    fn begin_digit(&mut self, digit: char, duration: usize) {
        self.push((digit, duration));
    }

    fn extend_digit(&mut self, samples: usize) {
        if let Some((_, duration)) = self.last_mut() {
            *duration += samples;
        }
    }
}

/// A recognized digit and how long it has lasted, in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitEntry {
    pub digit: char,
    pub duration: usize,
}

/// Bounded log of recognized digits.
///
/// When the log is full a new digit is dropped and counted as lost; the
/// entries already stored are never evicted or modified on its behalf.
#[derive(Debug, Clone)]
pub struct DigitLog {
    entries: Vec<DigitEntry>,
    capacity: usize,
    detected: usize,
    lost: usize,
    // False while the last begun digit was dropped, so its continuation is ignored.
    tracking: bool,
}

impl Default for DigitLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_DIGIT_CAPACITY)
    }
}

impl DigitLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            detected: 0,
            lost: 0,
            tracking: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Every digit that began, stored or not.
    pub fn detected(&self) -> usize {
        self.detected
    }

    /// Digits dropped because the log was full.
    pub fn lost(&self) -> usize {
        self.lost
    }

    pub fn entries(&self) -> &[DigitEntry] {
        &self.entries
    }

    /// The stored digits in order of recognition.
    pub fn digits(&self) -> String {
        self.entries.iter().map(|e| e.digit).collect()
    }

    /// Remove and return the stored entries, keeping the counters.
    pub fn drain(&mut self) -> Vec<DigitEntry> {
        self.tracking = false;
        std::mem::take(&mut self.entries)
    }

    /// Forget all entries and reset both counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.detected = 0;
        self.lost = 0;
        self.tracking = false;
    }
}

impl DigitSink for DigitLog {
    fn begin_digit(&mut self, digit: char, duration: usize) {
        self.detected += 1;
        if self.is_full() {
            self.lost += 1;
            self.tracking = false;
            warn!(
                digit = %digit,
                lost = self.lost,
                capacity = self.capacity,
                "digit lost due to full buffer"
            );
            return;
        }
        self.entries.push(DigitEntry { digit, duration });
        self.tracking = true;
    }

    fn extend_digit(&mut self, samples: usize) {
        if !self.tracking {
            return;
        }
        if let Some(last) = self.entries.last_mut() {
            last.duration += samples;
        }
    }
}
