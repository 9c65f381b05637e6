//! Lazy, sanitising candidate-name byte stream fed to the mass resolver (§4.2).
//!
//! Grounded on `pkg/procreader/procreader.go` (a pull-based `io.Reader` that only
//! generates the next candidate when asked, rather than materialising the whole
//! cross product up front) and `internal/usecase/resolve/domainreader.go` (word ×
//! parent expansion, `*` placeholder substitution).

use std::io::{self, BufRead, Read};

use crate::sanitize::sanitize;

/// Reads candidate domain names on demand and exposes them as a byte stream
/// (one name per line) suitable for piping directly into an external resolver's
/// stdin, without ever holding the full candidate set in memory.
///
/// With an empty parent list each input line is emitted as-is (resolve mode).
/// With a non-empty parent list, each input line (a wordlist word) is combined
/// with every parent in turn: `word.parent`, or `parent` with its first `*`
/// replaced by `word` when the parent contains one (bruteforce mode, §4.2).
pub struct DomainSource {
    lines: io::Lines<Box<dyn BufRead + Send>>,
    parents: Vec<String>,
    sanitize: bool,
    current_word: Option<String>,
    parent_idx: usize,
    pending: Vec<u8>,
}

impl DomainSource {
    pub fn new(source: Box<dyn BufRead + Send>, parents: Vec<String>, sanitize: bool) -> Self {
        Self {
            lines: source.lines(),
            parents,
            sanitize,
            current_word: None,
            parent_idx: 0,
            pending: Vec::new(),
        }
    }

    fn finish(&self, candidate: String) -> String {
        if self.sanitize {
            sanitize(&candidate)
        } else {
            candidate
        }
    }

    fn next_candidate(&mut self) -> io::Result<Option<String>> {
        if self.parents.is_empty() {
            return match self.lines.next() {
                Some(line) => Ok(Some(self.finish(line?))),
                None => Ok(None),
            };
        }

        loop {
            if self.current_word.is_none() {
                match self.lines.next() {
                    Some(line) => {
                        self.current_word = Some(line?);
                        self.parent_idx = 0;
                    }
                    None => return Ok(None),
                }
            }

            let word = self.current_word.as_ref().unwrap();
            if self.parent_idx >= self.parents.len() {
                self.current_word = None;
                continue;
            }

            let parent = &self.parents[self.parent_idx];
            let candidate = if parent.contains('*') {
                parent.replacen('*', word, 1)
            } else {
                format!("{word}.{parent}")
            };
            self.parent_idx += 1;
            if self.parent_idx >= self.parents.len() {
                self.current_word = None;
            }
            return Ok(Some(self.finish(candidate)));
        }
    }
}

impl Read for DomainSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;

        loop {
            if !self.pending.is_empty() {
                let n = std::cmp::min(buf.len() - written, self.pending.len());
                buf[written..written + n].copy_from_slice(&self.pending[..n]);
                self.pending.drain(..n);
                written += n;
                if written == buf.len() {
                    return Ok(written);
                }
                continue;
            }

            match self.next_candidate()? {
                Some(candidate) => {
                    let mut line = candidate.into_bytes();
                    line.push(b'\n');
                    let n = std::cmp::min(buf.len() - written, line.len());
                    buf[written..written + n].copy_from_slice(&line[..n]);
                    written += n;
                    if n < line.len() {
                        self.pending = line[n..].to_vec();
                        return Ok(written);
                    }
                    if written == buf.len() {
                        return Ok(written);
                    }
                }
                None => return Ok(written),
            }
        }
    }
}
