//! Parser for the external resolver's `Snl` answer-log format (§4.4, §4.5.6).
//!
//! Grounded on `internal/usecase/resolve/cachereader.go`. Each record section is a
//! run of non-blank lines sharing the queried name, terminated by a blank line:
//!
//! ```text
//! www.example.com. A 93.184.216.34
//! www.example.com. CNAME example.com.
//!
//! ftp.example.com. A 93.184.216.35
//!
//! ```
//!
//! A section's first *accepted* line (record type `A`, `AAAA`, or `CNAME`) both
//! emits the domain name once (if an output sink is given) and seeds the DNS
//! cache with every accepted answer in the section.

use std::io::{self, BufRead, Write};

use crate::cache::DnsCache;
use crate::hashing::{hash_question, DnsAnswer, RecordType};

#[derive(PartialEq, Eq, Clone, Copy)]
enum ParseState {
    NewSection,
    SaveAnswer,
    Skip,
}

/// Streams `Read` calls over an `Snl`-format answer log, each call stopping at a
/// section boundary once `max_names` new names have been accepted (or at EOF).
pub struct CacheReader<R> {
    lines: io::Lines<R>,
}

impl<R: BufRead> CacheReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// Reads until `max_names` distinct domains have been accepted (`0` means
    /// unbounded: read to EOF). Returns the count of domains accepted this call.
    ///
    /// `out` receives each accepted domain, one per line, if given. `cache`
    /// receives every accepted answer, keyed by its domain's question-hash, if
    /// given. When both are `None` this only counts domains (§4.4's count-only
    /// mode), skipping the remainder of each section once its name is known.
    pub fn read(
        &mut self,
        mut out: Option<&mut dyn Write>,
        cache: Option<&DnsCache>,
        max_names: usize,
    ) -> io::Result<usize> {
        let count_only = out.is_none() && cache.is_none();
        let mut state = ParseState::NewSection;
        let mut cur_domain = String::new();
        let mut domain_saved = false;
        let mut found = 0usize;

        while let Some(line) = self.lines.next() {
            let line = line?;

            if line.is_empty() {
                state = ParseState::NewSection;
                if max_names > 0 && found == max_names {
                    break;
                }
                continue;
            }

            if state == ParseState::Skip {
                continue;
            }

            if state == ParseState::NewSection {
                let parts: Vec<&str> = line.split(' ').collect();
                if parts.len() != 3 {
                    state = ParseState::Skip;
                    continue;
                }
                let domain = parts[0].trim_end_matches('.');
                if domain.is_empty() {
                    state = ParseState::Skip;
                    continue;
                }
                cur_domain = domain.to_string();
                domain_saved = false;
                state = ParseState::SaveAnswer;

                if count_only {
                    found += 1;
                    state = ParseState::Skip;
                    continue;
                }
                // Fall through: the line that established the section is itself
                // the first answer line and must be processed as one too.
            }

            let parts: Vec<&str> = line.split(' ').collect();
            if parts.len() != 3 {
                state = ParseState::Skip;
                continue;
            }

            let record_type = match RecordType::from_token(parts[1]) {
                Some(t) => t,
                None => continue,
            };
            let data = if record_type == RecordType::Cname {
                parts[2].trim_end_matches('.').to_string()
            } else {
                parts[2].to_string()
            };

            if !domain_saved {
                found += 1;
                domain_saved = true;
                if let Some(w) = out.as_mut() {
                    writeln!(w, "{cur_domain}")?;
                }
            }

            if let Some(cache) = cache {
                let answer = DnsAnswer::new(record_type, data);
                cache.add(hash_question(&cur_domain), &[answer.hash()]);
            }
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn log(text: &str) -> CacheReader<Cursor<Vec<u8>>> {
        CacheReader::new(Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn emits_one_name_per_section_with_multiple_records() {
        let mut reader = log(
            "www.example.com. A 93.184.216.34\nwww.example.com. CNAME example.com.\n\nftp.example.com. A 93.184.216.35\n\n",
        );
        let mut out = Vec::new();
        let count = reader.read(Some(&mut out), None, 0).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "www.example.com\nftp.example.com\n"
        );
    }

    #[test]
    fn malformed_line_skips_rest_of_section() {
        let mut reader = log("not a valid triple here\nwww.example.com. A 1.2.3.4\n\nvalid.example.com. A 5.6.7.8\n\n");
        let mut out = Vec::new();
        let count = reader.read(Some(&mut out), None, 0).unwrap();
        assert_eq!(count, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "valid.example.com\n");
    }

    #[test]
    fn unsupported_record_type_does_not_end_the_section() {
        let mut reader = log("www.example.com. NS ns1.example.com.\nwww.example.com. A 1.2.3.4\n\n");
        let mut out = Vec::new();
        let count = reader.read(Some(&mut out), None, 0).unwrap();
        assert_eq!(count, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "www.example.com\n");
    }

    #[test]
    fn count_only_mode_skips_remainder_of_section() {
        let mut reader = log("a.example.com. A 1.1.1.1\na.example.com. A 1.1.1.2\n\nb.example.com. A 2.2.2.2\n\n");
        let count = reader.read(None, None, 0).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn max_names_stops_at_a_section_boundary() {
        let mut reader = log("a.example.com. A 1.1.1.1\n\nb.example.com. A 2.2.2.2\n\nc.example.com. A 3.3.3.3\n\n");
        let mut out = Vec::new();
        let count = reader.read(Some(&mut out), None, 1).unwrap();
        assert_eq!(count, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "a.example.com\n");

        let mut out2 = Vec::new();
        let count2 = reader.read(Some(&mut out2), None, 0).unwrap();
        assert_eq!(count2, 2);
        assert_eq!(
            String::from_utf8(out2).unwrap(),
            "b.example.com\nc.example.com\n"
        );
    }

    #[test]
    fn seeds_dns_cache_with_accepted_answers() {
        let cache = DnsCache::new();
        let mut reader = log("a.example.com. A 1.1.1.1\n\n");
        reader.read(None, Some(&cache), 0).unwrap();
        assert!(cache.find(hash_question("a.example.com")).is_some());
    }
}
