//! Cache key conventions.
//!
//! Keys are built by callers, never by the router. Every key starts with a task
//! discriminator, then the subject, then whatever input changes the answer
//! (target language, question hash, time bucket), so two different requests can
//! not collide and two identical ones land on the same entry.

use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

/// Hex length of the question digest embedded in `q:` keys.
const QUESTION_HASH_LEN: usize = 16;

/// `a:<slug>`: single-document analysis.
pub fn analyze(slug: &str) -> String {
    format!("a:{}", slug)
}

/// `t:<slug>:<lang>`: translation of one document into one language.
pub fn translate(slug: &str, lang: &str) -> String {
    format!("t:{}:{}", slug, lang)
}

/// `q:<slug>:<digest>`: free-text question asked about one document.
pub fn question(slug: &str, question: &str) -> String {
    format!("q:{}:{}", slug, question_hash(question))
}

/// `s:<slug>`: editorial suggestions for one document.
pub fn suggest(slug: &str) -> String {
    format!("s:{}", slug)
}

/// `d:<topic>:<bucket>`: digest shared by all callers within one time bucket.
pub fn digest(topic: &str, bucket_secs: u64) -> String {
    digest_at(topic, bucket_secs, unix_now_secs())
}

pub fn digest_at(topic: &str, bucket_secs: u64, now_secs: u64) -> String {
    format!("d:{}:{}", topic, time_bucket(now_secs, bucket_secs))
}

pub fn time_bucket(now_secs: u64, bucket_secs: u64) -> u64 {
    now_secs / bucket_secs.max(1)
}

/// Truncated SHA-256 of the question, case and surrounding whitespace folded.
pub fn question_hash(question: &str) -> String {
    let canonical = question.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let hex: String = hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();
    hex[..QUESTION_HASH_LEN].to_string()
}

fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
