//! Offline decoder for Scottie 1 slow-scan television (SSTV) frames carried
//! in a mono 44.1 kHz / 16-bit PCM buffer.
//!
//! This crate implements only the signal-processing pipeline: header
//! detection, narrowband tone analysis, sync/slant correction and GBR pixel
//! demultiplexing. It performs no file I/O; callers supply a `&[i16]`
//! sample slice (for example read from a WAV file with `hound`) and get a
//! fixed-size RGB raster back.
//!
//! # References
//!
//! - <http://lionel.cordesses.free.fr/gpages/sstv.html>
//! - <https://web.archive.org/web/20120505141047/http://www.cs.helsinki.fi/u/okraisan/slowrx/>
//! - <http://www.barberdsp.com/downloads/Dayton%20Paper.pdf>

pub mod modem;
pub mod scanner;
pub mod util;

pub use modem::sstv::{
    DecodeOptions,
    DecodedFrame,
    Samples,
    SyncStrategy,
    decode_scottie1,
};
