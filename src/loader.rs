use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

/// Appended to every loaded text. Smaller than any printable ASCII byte.
pub const SENTINEL: u8 = 0x03;

/// Keeps only printable ASCII (space through `~`).
pub fn normalize_ascii(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().copied().filter(|b| (32..=126).contains(b)).collect()
}

/// Normalizes `bytes` and appends [`SENTINEL`].
pub fn prepare_text(bytes: &[u8]) -> Vec<u8> {
    let mut text = normalize_ascii(bytes);
    text.push(SENTINEL);
    text
}

/// Reads a text file ready for indexing.
pub fn read_text<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let raw = std::fs::read(path).with_context(|| format!("reading text {:?}", path))?;
    Ok(prepare_text(&raw))
}

/// Parses a suffix array stored as one decimal integer per line.
///
/// Blank lines are skipped.
pub fn parse_suffix_array<R: BufRead>(reader: R) -> Result<Vec<usize>> {
    let mut table = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let pos = line
            .parse::<usize>()
            .with_context(|| format!("invalid suffix array entry {:?} on line {}", line, lineno + 1))?;
        table.push(pos);
    }
    Ok(table)
}

pub fn read_suffix_array<P: AsRef<Path>>(path: P) -> Result<Vec<usize>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening suffix array {:?}", path))?;
    parse_suffix_array(BufReader::new(file))
}

pub fn write_suffix_array<P: AsRef<Path>>(path: P, table: &[usize]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {:?}", path))?;
    let mut out = BufWriter::new(file);
    for pos in table {
        writeln!(out, "{}", pos)?;
    }
    out.flush()?;
    Ok(())
}
