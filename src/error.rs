use crate::chunk::{ChunkType, PNG_MAGIC};
use std::io;
use thiserror::Error;

/// Every failure is fatal: a PNG stream has no resync points.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("bad PNG signature: expected {expected:02x?}, got {actual:02x?}", expected = PNG_MAGIC)]
    Signature { actual: Vec<u8> },

    #[error("truncated chunk {field} at offset {offset}: wanted {wanted} bytes, got {got}")]
    Framing {
        field: &'static str,
        offset: u64,
        wanted: u64,
        got: u64,
    },

    #[error(
        "bad CRC on {chunk_type} chunk ending at offset {offset}: computed {computed:#010x}, stored {stored:#010x}"
    )]
    Checksum {
        chunk_type: ChunkType,
        offset: u64,
        computed: u32,
        stored: u32,
    },

    #[error("unable to allocate {requested} bytes for chunk at offset {offset}")]
    Allocation { requested: u64, offset: u64 },

    #[error("failed to write {len} bytes to output")]
    Write {
        len: usize,
        #[source]
        source: io::Error,
    },

    #[error("failed to flush output")]
    Flush {
        #[source]
        source: io::Error,
    },

    #[error("failed to read input at offset {offset}")]
    Read {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("tEXt keyword contains a NUL byte at position {position}")]
    InvalidKey { position: usize },
}
