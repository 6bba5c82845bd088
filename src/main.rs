mod cli;
mod util;

use clap::Parser;
use cli::CliOptions;
use eyre::{Context, Result};
use pngtext::{PngTextInjector, Summary, TextChunk};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Logs go to stderr so a PNG piped to stdout stays intact
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let opts = CliOptions::parse();
    let summary = add_text_chunk(&opts).context("Adding tEXt chunk failed!")?;
    report(&opts, &summary)
}

fn add_text_chunk(opts: &CliOptions) -> Result<Summary> {
    let text = TextChunk::new(opts.key.as_bytes(), opts.content.as_bytes())?;
    let input = util::open_input(&opts.input)?;
    let output = util::open_output(&opts.output)?;

    let mut injector = PngTextInjector::new(input);
    if let Some(limit) = opts.max_chunk_size {
        injector = injector.with_max_chunk_size(limit);
    }

    let summary = injector
        .copy_into(output, &text)
        .wrap_err_with(|| format!("{:?} -> {:?}", opts.input, opts.output))?;

    Ok(summary)
}

fn report(opts: &CliOptions, summary: &Summary) -> Result<()> {
    let text = if opts.json {
        serde_json::to_string(summary)?
    } else {
        format!(
            "Wrote {} chunks to {:?}, new tEXt chunk inserted at chunk {}",
            summary.chunks_written, opts.output, summary.injected_at
        )
    };

    // Never mix the summary into an image written to stdout
    if util::is_stdio(&opts.output) {
        writeln!(io::stderr(), "{text}")?;
    } else {
        writeln!(io::stdout(), "{text}")?;
    }
    Ok(())
}
