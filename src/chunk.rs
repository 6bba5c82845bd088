// Reference used for this module:
// http://www.libpng.org/pub/png/spec/1.2/PNG-Structure.html

use crate::error::StreamError;
use std::{fmt, io::Write};
use tracing::warn;

pub const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Bytes of framing around a chunk payload: length, type and CRC.
pub const CHUNK_OVERHEAD: usize = 12;

/// Conventional tEXt keyword length limit. Only warned about, never enforced.
const MAX_KEY_LEN: usize = 79;

/// 4-byte chunk type tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

impl ChunkType {
    /// Image data. The text chunk must land no later than the first one.
    pub const IDAT: ChunkType = ChunkType(*b"IDAT");
    /// Last chunk in every well-formed stream.
    pub const IEND: ChunkType = ChunkType(*b"IEND");
    pub const TEXT: ChunkType = ChunkType(*b"tEXt");

    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut tag = [0u8; 4];
        tag.copy_from_slice(&bytes[..4]);
        Self(tag)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Whether reaching this chunk forces the text chunk to be written.
    pub fn is_injection_point(self) -> bool {
        self == Self::IDAT || self == Self::IEND
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkType({self})")
    }
}

/// CRC-32 over a chunk's type tag followed by its payload.
pub fn chunk_crc(chunk_type: &[u8], payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(payload);
    hasher.finalize()
}

pub fn read_be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes(bytes[..4].try_into().unwrap())
}

/// The tEXt chunk spliced into the stream, fully serialized up front.
#[derive(Debug, Clone)]
pub struct TextChunk {
    bytes: Vec<u8>,
}

impl TextChunk {
    pub fn new(key: &[u8], content: &[u8]) -> Result<Self, StreamError> {
        if let Some(position) = key.iter().position(|&b| b == 0) {
            return Err(StreamError::InvalidKey { position });
        }
        if key.is_empty() || key.len() > MAX_KEY_LEN {
            warn!(
                key_len = key.len(),
                "tEXt keyword outside the conventional 1..={MAX_KEY_LEN} byte range"
            );
        }

        let payload_len = key.len() + 1 + content.len();
        let length = u32::try_from(payload_len).map_err(|_| StreamError::Allocation {
            requested: payload_len as u64,
            offset: 0,
        })?;

        let mut bytes = Vec::with_capacity(payload_len + CHUNK_OVERHEAD);
        bytes.extend_from_slice(&length.to_be_bytes());
        bytes.extend_from_slice(ChunkType::TEXT.as_bytes());
        bytes.extend_from_slice(key);
        bytes.push(0);
        bytes.extend_from_slice(content);
        // CRC excludes the length field and itself
        let crc = chunk_crc(&bytes[4..8], &bytes[8..]);
        bytes.extend_from_slice(&crc.to_be_bytes());

        Ok(Self { bytes })
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[8..self.bytes.len() - 4]
    }

    pub fn crc(&self) -> u32 {
        read_be_u32(&self.bytes[self.bytes.len() - 4..])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), StreamError> {
        writer
            .write_all(&self.bytes)
            .map_err(|source| StreamError::Write {
                len: self.bytes.len(),
                source,
            })
    }
}
