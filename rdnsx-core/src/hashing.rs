//! DNS answer/question fingerprints and the process-scoped hashing seed.
//!
//! Grounded on `pkg/wildcarder/hashing_hash.go` and `hashing_string.go`: the donor
//! seeds a `maphash.Seed` once per process and reuses it for every hash so that
//! answer-hash equality is stable within a run but never persisted or compared
//! across runs. `DefaultHasher` seeded from a single random `u64` drawn once via
//! `OnceLock` reproduces the same contract without a new dependency.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use rand::RngCore;

static SEED: OnceLock<u64> = OnceLock::new();

fn seed() -> u64 {
    *SEED.get_or_init(|| rand::thread_rng().next_u64())
}

fn hash_str(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed().hash(&mut hasher);
    s.hash(&mut hasher);
    hasher.finish()
}

/// A 64-bit fingerprint of a candidate name.
pub type QuestionHash = u64;

pub fn hash_question(name: &str) -> QuestionHash {
    hash_str(name)
}

/// One of the three record types this system resolves or parses. Other record types
/// encountered in the answer log are ignored by the parser (§3 of the specification).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
}

impl RecordType {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "A" => Some(RecordType::A),
            "AAAA" => Some(RecordType::Aaaa),
            "CNAME" => Some(RecordType::Cname),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
        };
        f.write_str(s)
    }
}

/// A DNS answer: a record type paired with its payload (IP literal or, for CNAME,
/// the target name with any trailing dot already stripped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsAnswer {
    pub record_type: RecordType,
    pub data: String,
}

impl DnsAnswer {
    pub fn new(record_type: RecordType, data: impl Into<String>) -> Self {
        Self {
            record_type,
            data: data.into(),
        }
    }

    pub fn hash(&self) -> AnswerHash {
        AnswerHash {
            record_type: self.record_type,
            data_hash: hash_str(&self.data),
        }
    }
}

/// A value-equal fingerprint of an answer: `(type, 64-bit hash of data)`. Two
/// answers are equal iff their hashes are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnswerHash {
    pub record_type: RecordType,
    pub data_hash: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashing_is_deterministic_within_process() {
        let a = hash_question("www.example.com");
        let b = hash_question("www.example.com");
        assert_eq!(a, b);
    }

    #[test]
    fn different_names_hash_differently_with_overwhelming_probability() {
        assert_ne!(hash_question("a.example.com"), hash_question("b.example.com"));
    }

    #[test]
    fn answer_hash_equality_matches_value_equality() {
        let a1 = DnsAnswer::new(RecordType::A, "192.168.0.5");
        let a2 = DnsAnswer::new(RecordType::A, "192.168.0.5");
        let a3 = DnsAnswer::new(RecordType::A, "192.168.0.6");
        assert_eq!(a1.hash(), a2.hash());
        assert_ne!(a1.hash(), a3.hash());
    }

    #[test]
    fn record_type_from_token_ignores_unsupported_types() {
        assert_eq!(RecordType::from_token("A"), Some(RecordType::A));
        assert_eq!(RecordType::from_token("MX"), None);
    }
}
