// Reference used for this module:
// http://www.libpng.org/pub/png/spec/1.2/PNG-Structure.html

use crate::{
    chunk::{chunk_crc, read_be_u32, ChunkType, TextChunk, CHUNK_OVERHEAD, PNG_MAGIC},
    error::StreamError,
};
use serde::Serialize;
use std::io::{self, ErrorKind, Read, Write};
use tracing::{debug, info};

const INITIAL_BUF_SIZE: usize = 1024;

/// Largest step the chunk buffer grows by, so memory follows the bytes that
/// actually arrive rather than the declared length.
const READ_STEP: usize = 64 * 1024;

const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Chunks written to the output, the injected one included.
    pub chunks_written: usize,
    /// Zero-based position of the tEXt chunk among the written chunks.
    pub injected_at: usize,
}

/// Copies one PNG stream chunk by chunk, splicing a tEXt chunk in before the
/// first IDAT or IEND.
pub struct PngTextInjector<R> {
    reader: R,
    // Bytes consumed from the reader so far
    offset: u64,
    // Holds the current chunk: length, type, payload, crc
    buf: Vec<u8>,
    max_chunk_size: Option<u64>,
}

impl<R: Read> PngTextInjector<R> {
    pub fn new(reader: R) -> Self {
        let mut buf = Vec::with_capacity(INITIAL_BUF_SIZE);
        buf.resize(HEADER_LEN, 0);
        Self {
            reader,
            offset: 0,
            buf,
            max_chunk_size: None,
        }
    }

    /// Refuses to buffer chunks whose framed size exceeds `limit` bytes.
    pub fn with_max_chunk_size(mut self, limit: u64) -> Self {
        self.max_chunk_size = Some(limit);
        self
    }

    pub fn copy_into<W: Write>(
        &mut self,
        mut writer: W,
        text: &TextChunk,
    ) -> Result<Summary, StreamError> {
        self.copy_signature(&mut writer)?;

        let mut chunks_written = 0;

        // Pending: copy until the first IDAT or IEND
        let mut chunk_type = loop {
            let chunk_type = self.read_chunk()?;
            if chunk_type.is_injection_point() {
                break chunk_type;
            }
            self.write_chunk(&mut writer)?;
            chunks_written += 1;
        };

        text.write_to(&mut writer)?;
        info!(before = %chunk_type, index = chunks_written, "inserted tEXt chunk");
        let injected_at = chunks_written;
        chunks_written += 1;

        // Inserted: copy the rest through IEND
        loop {
            self.write_chunk(&mut writer)?;
            chunks_written += 1;
            if chunk_type == ChunkType::IEND {
                break;
            }
            chunk_type = self.read_chunk()?;
        }

        writer
            .flush()
            .map_err(|source| StreamError::Flush { source })?;

        Ok(Summary {
            chunks_written,
            injected_at,
        })
    }

    fn copy_signature<W: Write>(&mut self, writer: &mut W) -> Result<(), StreamError> {
        let mut sig = [0u8; 8];
        let got = read_full(&mut self.reader, &mut sig, &mut self.offset).map_err(|source| {
            StreamError::Read {
                offset: self.offset,
                source,
            }
        })?;

        if got != sig.len() || sig != PNG_MAGIC {
            return Err(StreamError::Signature {
                actual: sig[..got].to_vec(),
            });
        }

        writer
            .write_all(&sig)
            .map_err(|source| StreamError::Write {
                len: sig.len(),
                source,
            })
    }

    /// Reads and CRC-checks the next chunk into the buffer.
    fn read_chunk(&mut self) -> Result<ChunkType, StreamError> {
        let chunk_start = self.offset;

        // Read chunk length and type
        self.read_header()?;
        let chunk_len = read_be_u32(&self.buf[0..4]);
        let chunk_type = ChunkType::from_slice(&self.buf[4..8]);

        let framed = chunk_len as u64 + CHUNK_OVERHEAD as u64;
        if self.max_chunk_size.is_some_and(|limit| framed > limit) {
            return Err(StreamError::Allocation {
                requested: framed,
                offset: chunk_start,
            });
        }

        // Payload and CRC footer go right behind the type
        self.read_body(chunk_len as u64 + 4, chunk_start)?;

        let crc_at = self.buf.len() - 4;
        let computed = chunk_crc(&self.buf[4..8], &self.buf[8..crc_at]);
        let stored = read_be_u32(&self.buf[crc_at..]);
        if computed != stored {
            return Err(StreamError::Checksum {
                chunk_type,
                offset: self.offset,
                computed,
                stored,
            });
        }
        debug!(%chunk_type, len = chunk_len, offset = chunk_start, "chunk ok");

        Ok(chunk_type)
    }

    fn write_chunk<W: Write>(&self, writer: &mut W) -> Result<(), StreamError> {
        writer
            .write_all(&self.buf)
            .map_err(|source| StreamError::Write {
                len: self.buf.len(),
                source,
            })
    }

    /// Appends `wanted` bytes to the buffer, growing it at most `READ_STEP`
    /// bytes ahead of the input.
    fn read_body(&mut self, wanted: u64, chunk_start: u64) -> Result<(), StreamError> {
        let mut got = 0;
        while got < wanted {
            let step = (wanted - got).min(READ_STEP as u64) as usize;
            let start = self.buf.len();
            self.buf
                .try_reserve(step)
                .map_err(|_| StreamError::Allocation {
                    requested: HEADER_LEN as u64 + wanted,
                    offset: chunk_start,
                })?;
            self.buf.resize(start + step, 0);

            let n = read_full(&mut self.reader, &mut self.buf[start..], &mut self.offset)
                .map_err(|source| StreamError::Read {
                    offset: self.offset,
                    source,
                })?;
            got += n as u64;

            if n < step {
                return Err(StreamError::Framing {
                    field: "payload",
                    offset: self.offset,
                    wanted,
                    got,
                });
            }
        }
        Ok(())
    }

    fn read_header(&mut self) -> Result<(), StreamError> {
        self.buf.truncate(HEADER_LEN);
        let got = read_full(&mut self.reader, &mut self.buf, &mut self.offset).map_err(
            |source| StreamError::Read {
                offset: self.offset,
                source,
            },
        )?;

        if got != HEADER_LEN {
            return Err(StreamError::Framing {
                field: "header",
                offset: self.offset,
                wanted: HEADER_LEN as u64,
                got: got as u64,
            });
        }
        Ok(())
    }
}

/// Like `read_exact`, but reports how much was read when the input ends early.
/// `offset` advances with every byte received, errors included.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8], offset: &mut u64) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => {
                filled += n;
                *offset += n as u64;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Streams a PNG from `input` to `output` with a `key`/`content` tEXt chunk
/// inserted before the image data.
pub fn process<R: Read, W: Write>(
    input: R,
    output: W,
    key: &[u8],
    content: &[u8],
) -> Result<Summary, StreamError> {
    let text = TextChunk::new(key, content)?;
    PngTextInjector::new(input).copy_into(output, &text)
}
