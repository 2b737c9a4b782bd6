pub mod dialer;
pub mod keypad;
mod sine_oscillator;

pub use dialer::DtmfDialer;
pub use keypad::{key_freqs, EncodeError};
