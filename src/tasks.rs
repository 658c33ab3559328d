//! Typed payloads, prompts and reply parsers for the built-in tasks.
//!
//! Each parser is a pure function of the reply text, so it can be handed to
//! [`TaskRouter::call_cached`](crate::TaskRouter::call_cached) as-is:
//!
//! ```rust,no_run
//! use llm_task_router::{cache::key, tasks, Task, TaskRouter};
//! use std::time::Duration;
//!
//! # async fn run(router: TaskRouter) -> llm_task_router::Result<()> {
//! let prompt = tasks::translation_prompt("Title", "Body", "ms");
//! let result = router
//!     .call_cached(
//!         Task::Translate,
//!         &key::translate("slug-1", "ms"),
//!         &prompt,
//!         tasks::TRANSLATION_TTL,
//!         tasks::parse_translation("ms"),
//!     )
//!     .await?;
//! println!("{} via {}", result.data.title, result.provider);
//! # Ok(())
//! # }
//! ```

use crate::structured::parse_as;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Analyses only change when the document does.
pub const ANALYSIS_TTL: Duration = Duration::from_secs(7 * 24 * 3600);
pub const TRANSLATION_TTL: Duration = Duration::from_secs(30 * 24 * 3600);
pub const SUGGESTION_TTL: Duration = Duration::from_secs(24 * 3600);
/// Digests are keyed by time bucket; the entry only needs to outlive its bucket.
pub const DIGEST_TTL: Duration = Duration::from_secs(6 * 3600);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub title: String,
    pub content: String,
    /// Target language code. Providers are not asked for it; the caller's value is injected.
    #[serde(default)]
    pub lang: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Digest {
    pub headline: String,
    #[serde(default)]
    pub points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default)]
    pub suggestions: Vec<String>,
}

pub fn analysis_prompt(title: &str, content: &str) -> String {
    format!(
        "Summarize the following document in two or three sentences and list up to five topical tags.\n\
         Reply with JSON only: {{\"summary\": string, \"tags\": [string]}}\n\n\
         Title: {}\n\n{}",
        title, content
    )
}

pub fn translation_prompt(title: &str, content: &str, lang: &str) -> String {
    format!(
        "Translate the title and content below into the language with code '{}'. \
         Keep formatting and proper nouns.\n\
         Reply with JSON only: {{\"title\": string, \"content\": string}}\n\n\
         Title: {}\n\n{}",
        lang, title, content
    )
}

/// `documents` are `(title, summary)` pairs.
pub fn digest_prompt(topic: &str, documents: &[(&str, &str)]) -> String {
    let mut listing = String::new();
    for (i, (title, summary)) in documents.iter().enumerate() {
        listing.push_str(&format!("{}. {}: {}\n", i + 1, title, summary));
    }
    format!(
        "Write a digest about '{}' from the documents below: one headline and a few key points.\n\
         Reply with JSON only: {{\"headline\": string, \"points\": [string]}}\n\n{}",
        topic, listing
    )
}

pub fn suggestion_prompt(draft: &str) -> String {
    format!(
        "Suggest up to three short editorial improvements for this draft.\n\
         Reply with JSON only: {{\"suggestions\": [string]}}\n\n{}",
        draft
    )
}

/// Prompt for a streamed answer about one document.
pub fn chat_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the question using the document below. Be concise.\n\n\
         Document:\n{}\n\nQuestion: {}",
        context, question
    )
}

pub fn parse_analysis(raw: &str) -> Result<Analysis> {
    let analysis: Analysis = parse_as(raw)?;
    if analysis.summary.trim().is_empty() {
        return Err(empty_field("summary", "parse_analysis"));
    }
    Ok(analysis)
}

/// Parser for translation replies into `lang`.
pub fn parse_translation(lang: &str) -> impl Fn(&str) -> Result<Translation> + Send + Sync {
    let lang = lang.to_string();
    move |raw| {
        let mut translation: Translation = parse_as(raw)?;
        if translation.title.trim().is_empty() && translation.content.trim().is_empty() {
            return Err(empty_field("content", "parse_translation"));
        }
        translation.lang = lang.clone();
        Ok(translation)
    }
}

pub fn parse_digest(raw: &str) -> Result<Digest> {
    let digest: Digest = parse_as(raw)?;
    if digest.headline.trim().is_empty() {
        return Err(empty_field("headline", "parse_digest"));
    }
    Ok(digest)
}

pub fn parse_suggestion(raw: &str) -> Result<Suggestion> {
    parse_as(raw)
}

fn empty_field(field: &str, source: &str) -> Error {
    Error::parse_with_context(
        format!("reply has an empty '{}'", field),
        ErrorContext::new()
            .with_field_path(field)
            .with_source(source),
    )
}
