//! Errors raised while setting up a detection session.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("cannot tune resonator to {freq_hz} Hz at a sample rate of {sample_rate_hz} Hz")]
    InvalidFrequency { freq_hz: f32, sample_rate_hz: u32 },

    #[error("invalid detector configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
