pub mod chunk;
pub mod error;
pub mod png_stream;

pub use chunk::{ChunkType, TextChunk};
pub use error::StreamError;
pub use png_stream::{process, PngTextInjector, Summary};
