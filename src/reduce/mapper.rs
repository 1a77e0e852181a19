//! Map stage: document lines to word pairs.

use std::io::{self, BufRead, Write};

/// Emit `word\t1;doc_id` for every word of one document line.
///
/// The first whitespace token is the document id; acquisition writes each
/// document as a single such line, already lowercased and stripped of
/// punctuation.
pub fn emit_pairs<W: Write>(line: &str, out: &mut W) -> io::Result<()> {
    let mut tokens = line.split_whitespace();
    let Some(doc_id) = tokens.next() else {
        return Ok(());
    };
    for word in tokens {
        writeln!(out, "{}\t1;{}", word, doc_id)?;
    }
    Ok(())
}

/// Run the full map pass over a line stream.
pub fn map_stream<R: BufRead, W: Write>(input: R, mut out: W) -> io::Result<W> {
    for line in input.lines() {
        emit_pairs(line?.trim(), &mut out)?;
    }
    out.flush()?;
    Ok(out)
}
