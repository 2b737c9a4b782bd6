use tracing::debug;

use crate::digits::DigitSink;

/// Turns per-block hits into debounced digit begin/end transitions.
///
/// Ending the current digit and beginning a new one are evaluated
/// independently every block, so with `hits_to_begin < misses_to_end` a new
/// digit can begin while the previous one is still counting misses.
///
/// Example with `hits_to_begin = 2`, `misses_to_end = 3`:
///
/// ```text
/// block hit  current
///   1    A    -       last=A hits=1
///   2    A    A       hits=2           BEGIN A
///   3    -    A       misses=1
///   4    -    A       misses=2
///   5    -    -       misses=3         END A
///   6    B    -       last=B hits=1
///   7    C    -       last=C hits=1
///   8    C    C       hits=2           BEGIN C
/// ```
#[derive(Debug, Clone)]
pub struct Debouncer {
    hits_to_begin: usize,
    misses_to_end: usize,
    hits: usize,
    misses: usize,
    last_hit: Option<char>,
    current: Option<char>,
}

impl Debouncer {
    pub fn new(hits_to_begin: usize, misses_to_end: usize) -> Self {
        Self {
            hits_to_begin,
            misses_to_end,
            hits: 0,
            misses: 0,
            last_hit: None,
            current: None,
        }
    }

    /// Feed one block's instantaneous hit and return the debounced digit.
    ///
    /// `block_len` is the number of samples in a block, used for the digit
    /// durations reported to `sink`.
    pub fn step<S: DigitSink + ?Sized>(
        &mut self,
        hit: Option<char>,
        block_len: usize,
        sink: &mut S,
    ) -> Option<char> {
        if let Some(current) = self.current {
            if hit != Some(current) {
                self.misses += 1;
                if self.misses == self.misses_to_end {
                    debug!(digit = %current, "digit end");
                    self.current = None;
                }
            } else {
                self.misses = 0;
                sink.extend_digit(block_len);
            }
        }

        if hit != self.last_hit {
            self.last_hit = hit;
            self.hits = 0;
        }

        if let Some(digit) = hit {
            if hit != self.current {
                self.hits += 1;
                if self.hits == self.hits_to_begin {
                    debug!(digit = %digit, "digit begin");
                    sink.begin_digit(digit, self.hits_to_begin * block_len);
                    self.current = Some(digit);
                    self.misses = 0;
                }
            }
        }

        self.current
    }

    /// The debounced digit, if one is active.
    pub fn current(&self) -> Option<char> {
        self.current
    }

    pub fn reset(&mut self) {
        self.hits = 0;
        self.misses = 0;
        self.last_hit = None;
        self.current = None;
    }
}
