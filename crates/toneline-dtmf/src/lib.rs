//! DTMF keypress detection for 16-bit PCM audio.
//!
//! A [`DtmfDetector`] runs a bank of eight fixed-point Goertzel resonators
//! over fixed-size blocks, scores every block for a valid row/column tone
//! pair, and debounces the per-block hits into digit begin/end events that
//! are reported to a [`DigitSink`].
//!
//! ```
//! use toneline_dtmf::{DetectorConfig, DtmfDetector, ProcessOptions};
//!
//! let mut detector = DtmfDetector::new(8000, DetectorConfig::default()).unwrap();
//! let silence = vec![0i16; 1024];
//! assert_eq!(detector.process(&silence, ProcessOptions::default()), None);
//! assert!(detector.sink().is_empty());
//! ```

pub mod config;
pub mod detect;
pub mod digits;
pub mod error;

pub use config::{DetectorConfig, TwistLimits};
pub use detect::debounce::Debouncer;
pub use detect::dsp::{evaluate_block, ToneBank, COL_FREQS, DTMF_KEYS, ROW_FREQS};
pub use detect::goertzel::Resonator;
pub use detect::{DtmfDetector, DtmfDetectorBuilder, ProcessOptions, BLOCK_SIZE, DEFAULT_SAMPLE_RATE};
pub use digits::{DigitEntry, DigitLog, DigitSink};
pub use error::{Error, Result};
