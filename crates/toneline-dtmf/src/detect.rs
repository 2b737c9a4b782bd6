pub mod debounce;
pub mod dsp;
pub mod goertzel;

use tracing::trace;

use crate::config::DetectorConfig;
use crate::digits::{DigitLog, DigitSink};
use crate::Result;
use debounce::Debouncer;
use dsp::{evaluate_block, ToneBank};

/// Samples per detection block, about 12.75 ms at 8 kHz.
pub const BLOCK_SIZE: usize = 102;

pub const DEFAULT_SAMPLE_RATE: u32 = 8000;

/// Per-call switches for [`DtmfDetector::process`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Use the relaxed twist limits.
    pub relax: bool,
    /// Reserved for muting logic around the detector; detection ignores it.
    pub squelch: bool,
}

impl ProcessOptions {
    pub fn relaxed() -> Self {
        Self {
            relax: true,
            ..Self::default()
        }
    }
}

/// Stateful DTMF detector for one audio stream.
///
/// Samples are gathered into blocks of [`BLOCK_SIZE`]; each completed block
/// is scored by the tone bank and fed to the debouncer. Partial blocks carry
/// over between calls, so the way a stream is split into `process` calls
/// does not affect the result.
pub struct DtmfDetector<S = DigitLog> {
    config: DetectorConfig,
    sample_rate_hz: u32,
    bank: ToneBank,
    debouncer: Debouncer,
    energy: f32,
    samples_in_block: usize,
    samples_processed: u64,
    blocks_evaluated: u64,
    sink: S,
}

impl DtmfDetector<DigitLog> {
    /// Start building a detector that logs digits into a [`DigitLog`].
    pub fn builder(sample_rate_hz: u32) -> DtmfDetectorBuilder<DigitLog> {
        DtmfDetectorBuilder::new(sample_rate_hz)
    }

    /// Create a detector logging digits into a [`DigitLog`] sized by `config`.
    pub fn new(sample_rate_hz: u32, config: DetectorConfig) -> Result<Self> {
        Self::builder(sample_rate_hz).config(config).build()
    }
}

impl<S: DigitSink> DtmfDetector<S> {
    /// Feed samples and return the currently debounced digit.
    ///
    /// Digit begin and continuation events produced along the way go to the
    /// sink; only the state after the last sample is returned.
    pub fn process(&mut self, samples: &[i16], opts: ProcessOptions) -> Option<char> {
        let twist = self.config.twist(opts.relax);

        let mut pos = 0usize;
        while pos < samples.len() {
            let to_block_end = BLOCK_SIZE - self.samples_in_block;
            let take = to_block_end.min(samples.len() - pos);
            for &sample in &samples[pos..pos + take] {
                self.energy += (sample as i32 * sample as i32) as f32;
                self.bank.feed(sample);
            }
            self.samples_in_block += take;
            pos += take;

            if self.samples_in_block < BLOCK_SIZE {
                continue;
            }

            let rows = self.bank.row_energies();
            let cols = self.bank.col_energies();
            let hit = evaluate_block(&rows, &cols, self.energy, twist);
            trace!(
                block = self.blocks_evaluated,
                hit = ?hit,
                energy = self.energy,
                "block evaluated"
            );
            self.debouncer.step(hit, BLOCK_SIZE, &mut self.sink);

            self.bank.reset();
            self.energy = 0.0;
            self.samples_in_block = 0;
            self.blocks_evaluated += 1;
        }
        self.samples_processed += samples.len() as u64;

        self.debouncer.current()
    }

    /// Drop any partial block and debounce state. The sink is left untouched.
    pub fn reset(&mut self) {
        self.bank.reset();
        self.debouncer.reset();
        self.energy = 0.0;
        self.samples_in_block = 0;
        self.samples_processed = 0;
        self.blocks_evaluated = 0;
    }
}

impl<S> DtmfDetector<S> {
    pub fn current_digit(&self) -> Option<char> {
        self.debouncer.current()
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn samples_processed(&self) -> u64 {
        self.samples_processed
    }

    pub fn blocks_evaluated(&self) -> u64 {
        self.blocks_evaluated
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Builder for configuring a DtmfDetector.
pub struct DtmfDetectorBuilder<S> {
    sample_rate_hz: u32,
    config: DetectorConfig,
    sink: SinkSource<S>,
}

enum SinkSource<S> {
    FromConfig(fn(&DetectorConfig) -> S),
    Given(S),
}

impl DtmfDetectorBuilder<DigitLog> {
    /// Create a builder with defaults for the given sample rate.
    pub fn new(sample_rate_hz: u32) -> Self {
        Self {
            sample_rate_hz,
            config: DetectorConfig::default(),
            sink: SinkSource::FromConfig(|config: &DetectorConfig| {
                DigitLog::with_capacity(config.digit_capacity)
            }),
        }
    }
}

impl<S> DtmfDetectorBuilder<S> {
    /// Replace the whole configuration.
    pub fn config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of consecutive hits required to begin a digit.
    pub fn hits_to_begin(mut self, blocks: usize) -> Self {
        self.config.hits_to_begin = blocks;
        self
    }

    /// Set the number of consecutive misses required to end a digit.
    pub fn misses_to_end(mut self, blocks: usize) -> Self {
        self.config.misses_to_end = blocks;
        self
    }

    /// Provide a custom digit sink instead of the default log.
    pub fn sink<T: DigitSink>(self, sink: T) -> DtmfDetectorBuilder<T> {
        DtmfDetectorBuilder {
            sample_rate_hz: self.sample_rate_hz,
            config: self.config,
            sink: SinkSource::Given(sink),
        }
    }

    /// Build the detector, validating the configuration and sample rate.
    pub fn build(self) -> Result<DtmfDetector<S>> {
        self.config.validate()?;
        let bank = ToneBank::new(self.sample_rate_hz)?;
        let sink = match self.sink {
            SinkSource::FromConfig(make) => make(&self.config),
            SinkSource::Given(sink) => sink,
        };

        Ok(DtmfDetector {
            debouncer: Debouncer::new(self.config.hits_to_begin, self.config.misses_to_end),
            config: self.config,
            sample_rate_hz: self.sample_rate_hz,
            bank,
            energy: 0.0,
            samples_in_block: 0,
            samples_processed: 0,
            blocks_evaluated: 0,
            sink,
        })
    }
}
