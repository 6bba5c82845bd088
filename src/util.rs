use eyre::{Context, Result};
use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
};

pub const STDIO_PATH: &str = "-";

pub fn is_stdio(path: &str) -> bool {
    path == STDIO_PATH
}

/// Opens `path` for reading, or locks stdin for "-". Stdin is never closed.
pub fn open_input(path: &str) -> Result<Box<dyn Read>> {
    if is_stdio(path) {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).wrap_err_with(|| format!("unable to open input file {path:?}"))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Creates or truncates `path`, or locks stdout for "-". Stdout is never closed.
pub fn open_output(path: &str) -> Result<Box<dyn Write>> {
    if is_stdio(path) {
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    }
    let file =
        File::create(path).wrap_err_with(|| format!("unable to open output file {path:?}"))?;
    Ok(Box::new(BufWriter::new(file)))
}
