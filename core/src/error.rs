use thiserror::Error;

/// Errors reported by this crate.
///
/// Only configuration problems surface as errors; decode-quality conditions
/// (no preamble, short capture, unrecoverable header) are reported through
/// [`crate::decoder::DecodeStatus`] instead, because a failed capture is an
/// expected runtime outcome rather than a programming mistake.
#[derive(Debug, Error)]
pub enum ModemError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported FEC scheme '{0}'")]
    UnsupportedScheme(String),
}

pub type Result<T> = std::result::Result<T, ModemError>;
