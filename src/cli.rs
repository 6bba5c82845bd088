use clap::Parser;

/// Reads a PNG image, inserts a tEXt chunk (KEY=CONTENT) ahead of the image
/// data and copies all other chunks unchanged.
#[derive(Parser)]
#[command(version)]
pub struct CliOptions {
    /// Source image ('-' for stdin)
    pub input: String,

    /// Destination image ('-' for stdout)
    pub output: String,

    /// tEXt keyword, e.g. "Comment" or "Author"
    pub key: String,

    /// Text stored under KEY
    pub content: String,

    /// Reject chunks larger than this many bytes instead of buffering them
    #[arg(long, value_name = "BYTES")]
    pub max_chunk_size: Option<u64>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}
