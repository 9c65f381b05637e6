//! Process-wide DNS answer cache and wildcard answer cache.
//!
//! Grounded on `pkg/wildcarder/dnscache.go` and `answercache.go`. Spec §5 mandates
//! each map live under a single mutex with readers taking the same lock as writers,
//! so these use `parking_lot::Mutex<HashMap<..>>` rather than `dashmap`.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::hashing::{AnswerHash, QuestionHash};

/// Mapping `question-hash -> ordered set of answer-hashes` (insertion order, set
/// semantics). Mutated by workers; read concurrently.
#[derive(Default)]
pub struct DnsCache {
    entries: Mutex<HashMap<QuestionHash, Vec<AnswerHash>>>,
}

impl DnsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `answers` for `question`. Answers already present are not duplicated;
    /// new ones are appended in the order given. Two successive `add` calls with
    /// the same set never grow the entry (spec §8).
    pub fn add(&self, question: QuestionHash, answers: &[AnswerHash]) {
        let mut entries = self.entries.lock();
        let slot = entries.entry(question).or_default();
        for answer in answers {
            if !slot.contains(answer) {
                slot.push(*answer);
            }
        }
    }

    /// Returns `None` if `question` was never cached, `Some(&[])` if it was cached
    /// with zero answers. This nil-vs-empty distinction lets callers tell "never
    /// queried" from "queried, found nothing" without a second map.
    pub fn find(&self, question: QuestionHash) -> Option<Vec<AnswerHash>> {
        self.entries.lock().get(&question).cloned()
    }

    pub fn contains(&self, question: QuestionHash) -> bool {
        self.entries.lock().contains_key(&question)
    }
}

/// Mapping `answer-hash -> set of wildcard roots` (a root is a name string).
#[derive(Default)]
pub struct AnswerCache {
    entries: Mutex<HashMap<AnswerHash, Vec<String>>>,
}

impl AnswerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `root` is known to produce every answer in `answers`.
    pub fn add(&self, root: &str, answers: &[AnswerHash]) {
        let mut entries = self.entries.lock();
        for answer in answers {
            let roots = entries.entry(*answer).or_default();
            if !roots.iter().any(|r| r == root) {
                roots.push(root.to_string());
            }
        }
    }

    /// The first of `answers` that has any cached roots wins: this mirrors the
    /// donor's `findHash`, which short-circuits on the first matching answer-hash
    /// rather than unioning roots across all of them.
    pub fn find_first(&self, answers: &[AnswerHash]) -> Option<Vec<String>> {
        let entries = self.entries.lock();
        for answer in answers {
            if let Some(roots) = entries.get(answer) {
                if !roots.is_empty() {
                    return Some(roots.clone());
                }
            }
        }
        None
    }

    /// The exact set of roots `r` such that some prior `add(r, ..)` included `a`.
    pub fn find(&self, answer: &AnswerHash) -> Vec<String> {
        self.entries
            .lock()
            .get(answer)
            .cloned()
            .unwrap_or_default()
    }

    /// Every distinct root ever recorded, across all answer-hashes. Used to report
    /// the wildcard roots discovered by a filter pass (`pkg/wildcarder/gather.go`).
    pub fn all_roots(&self) -> Vec<String> {
        let entries = self.entries.lock();
        let mut roots: Vec<String> = Vec::new();
        for rs in entries.values() {
            for r in rs {
                if !roots.iter().any(|existing| existing == r) {
                    roots.push(r.clone());
                }
            }
        }
        roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::RecordType;

    fn ah(data: &str) -> AnswerHash {
        crate::hashing::DnsAnswer::new(RecordType::A, data).hash()
    }

    #[test]
    fn dns_cache_distinguishes_never_cached_from_empty() {
        let cache = DnsCache::new();
        assert_eq!(cache.find(1), None);
        cache.add(1, &[]);
        assert_eq!(cache.find(1), Some(vec![]));
    }

    #[test]
    fn dns_cache_add_is_idempotent_for_repeated_sets() {
        let cache = DnsCache::new();
        let answers = vec![ah("1.2.3.4"), ah("5.6.7.8")];
        cache.add(42, &answers);
        cache.add(42, &answers);
        assert_eq!(cache.find(42).unwrap().len(), 2);
    }

    #[test]
    fn answer_cache_find_returns_exact_root_set() {
        let cache = AnswerCache::new();
        let a = ah("192.168.0.5");
        cache.add("test.com", &[a]);
        cache.add("other.com", &[a]);
        let mut roots = cache.find(&a);
        roots.sort();
        assert_eq!(roots, vec!["other.com".to_string(), "test.com".to_string()]);
    }

    #[test]
    fn answer_cache_find_first_short_circuits() {
        let cache = AnswerCache::new();
        let a1 = ah("1.1.1.1");
        let a2 = ah("2.2.2.2");
        cache.add("root-a.com", &[a1]);
        // a2 has no roots recorded.
        let found = cache.find_first(&[a2, a1]).unwrap();
        assert_eq!(found, vec!["root-a.com".to_string()]);
    }
}
