//! Grouped reduction over the sorted mapper output.

use std::io::{self, BufRead, Write};

/// Running state for the word currently being folded.
///
/// Document counts keep first-seen order so the emitted row is stable for a
/// given input stream.
#[derive(Debug)]
struct WordGroup {
    word: String,
    total: u64,
    doc_counts: Vec<(String, u64)>,
}

impl WordGroup {
    fn start(word: &str, doc_id: &str, count: u64) -> Self {
        WordGroup {
            word: word.to_string(),
            total: count,
            doc_counts: vec![(doc_id.to_string(), count)],
        }
    }

    fn add(&mut self, doc_id: &str, count: u64) {
        self.total += count;
        match self.doc_counts.iter_mut().find(|(d, _)| d == doc_id) {
            Some((_, c)) => *c += count,
            None => self.doc_counts.push((doc_id.to_string(), count)),
        }
    }

    fn render(&self) -> String {
        let docs: Vec<String> = self
            .doc_counts
            .iter()
            .map(|(doc_id, count)| format!("{},{}", doc_id, count))
            .collect();
        format!("{}\t{}:{}", self.word, self.total, docs.join(";"))
    }
}

/// Streaming reducer for `word\t<count>;<doc_id>` lines.
///
/// The input must arrive with equal words contiguous (the cluster's shuffle
/// phase guarantees this). One aggregated row is written per contiguous run;
/// if a word appears in several runs it produces several rows, and the last
/// one wins when the index file is parsed. Malformed lines are skipped and
/// never abort the pass.
pub struct Aggregator<W: Write> {
    out: W,
    current: Option<WordGroup>,
    skipped: u64,
}

impl<W: Write> Aggregator<W> {
    pub fn new(out: W) -> Self {
        Aggregator {
            out,
            current: None,
            skipped: 0,
        }
    }

    /// Feed one input line. Emits the previous word's row when the word
    /// changes; otherwise folds the count into the running group.
    pub fn consume_line(&mut self, line: &str) -> io::Result<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        let Some((word, count, doc_id)) = parse_pair_line(line) else {
            self.skipped += 1;
            return Ok(());
        };
        match &mut self.current {
            Some(group) if group.word == word => group.add(doc_id, count),
            _ => {
                self.emit_current()?;
                self.current = Some(WordGroup::start(word, doc_id, count));
            }
        }
        Ok(())
    }

    /// Flush the final group and hand the writer back.
    pub fn finish(mut self) -> io::Result<W> {
        self.emit_current()?;
        self.out.flush()?;
        if self.skipped > 0 {
            tracing::warn!("Skipped {} malformed reduce input lines", self.skipped);
        }
        Ok(self.out)
    }

    fn emit_current(&mut self) -> io::Result<()> {
        if let Some(group) = self.current.take() {
            writeln!(self.out, "{}", group.render())?;
        }
        Ok(())
    }
}

/// Split `word\t<count>;<doc_id>` into its parts. Returns `None` for lines
/// missing a separator or carrying a non-integer count.
fn parse_pair_line(line: &str) -> Option<(&str, u64, &str)> {
    let (word, value) = line.split_once('\t')?;
    let (count, doc_id) = value.split_once(';')?;
    let count: u64 = count.trim().parse().ok()?;
    Some((word, count, doc_id))
}

/// Run the full reduce pass over a line stream.
pub fn reduce_stream<R: BufRead, W: Write>(input: R, out: W) -> io::Result<W> {
    let mut aggregator = Aggregator::new(out);
    for line in input.lines() {
        aggregator.consume_line(&line?)?;
    }
    aggregator.finish()
}
