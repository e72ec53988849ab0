//! BFSK acoustic modem codec: payload bytes to an audible two-tone waveform
//! and back.
//!
//! The receive side synchronizes itself: unknown capture offset, capture
//! gain and small sample-rate drift are resolved by a windowed preamble
//! search before any bit is read. Everything is pure computation over
//! in-memory sample buffers; audio I/O belongs to callers.

pub mod bfsk;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod fec;
pub mod framing;
pub mod interleave;
pub mod resample;
pub mod sync;

pub use config::{FecConfig, FecScheme, ModemConfig};
pub use decoder::{DecodeMetrics, DecodeOutput, DecodeStatus, Decoder, FecReport};
pub use encoder::{EncodeMetadata, EncodeOutput, Encoder, FecSummary};
pub use error::{ModemError, Result};
pub use fec::{FecCodec, FecStats};
pub use sync::{SyncParams, SyncResult};
