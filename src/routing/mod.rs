//! Task routing table.
//!
//! Pure data: which provider serves each task first, and which one takes over
//! when it cannot. The table is built once, never mutated, and shared by reference,
//! so it needs no synchronization.

use crate::drivers::{CallOptions, ProviderId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of AI-assisted work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    /// Summarize and tag a single document.
    Analyze,
    /// Interactive question answering, streamed.
    Chat,
    /// Translate a document into a target language.
    Translate,
    /// Digest of several documents, shared within a time bucket.
    Digest,
    /// Editorial suggestions for a draft.
    Suggest,
}

impl Task {
    pub const ALL: [Task; 5] = [
        Task::Analyze,
        Task::Chat,
        Task::Translate,
        Task::Digest,
        Task::Suggest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Analyze => "analyze",
            Task::Chat => "chat",
            Task::Translate => "translate",
            Task::Digest => "digest",
            Task::Suggest => "suggest",
        }
    }

    /// Sampling parameters used for this task's provider calls.
    pub fn call_options(&self) -> CallOptions {
        match self {
            Task::Chat => CallOptions::chat(),
            Task::Analyze | Task::Translate | Task::Digest | Task::Suggest => CallOptions::batch(),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Task {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "analyze" => Ok(Task::Analyze),
            "chat" => Ok(Task::Chat),
            "translate" => Ok(Task::Translate),
            "digest" => Ok(Task::Digest),
            "suggest" => Ok(Task::Suggest),
            other => Err(format!(
                "invalid task '{}', expected: analyze, chat, translate, digest, suggest",
                other
            )),
        }
    }
}

/// Primary and fallback provider for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Route {
    pub primary: ProviderId,
    pub fallback: ProviderId,
    pub reason: &'static str,
}

impl Route {
    pub const fn new(primary: ProviderId, fallback: ProviderId, reason: &'static str) -> Self {
        Self {
            primary,
            fallback,
            reason,
        }
    }
}

/// One route per [`Task`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    analyze: Route,
    chat: Route,
    translate: Route,
    digest: Route,
    suggest: Route,
}

impl RoutingTable {
    /// Table with the same route for every task. Mostly useful in tests.
    pub fn uniform(route: Route) -> Self {
        Self {
            analyze: route,
            chat: route,
            translate: route,
            digest: route,
            suggest: route,
        }
    }

    /// Replace one task's route, consuming the table. Only available while building.
    pub fn with_route(mut self, task: Task, route: Route) -> Self {
        *self.slot(task) = route;
        self
    }

    pub fn route(&self, task: Task) -> &Route {
        match task {
            Task::Analyze => &self.analyze,
            Task::Chat => &self.chat,
            Task::Translate => &self.translate,
            Task::Digest => &self.digest,
            Task::Suggest => &self.suggest,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Task, &Route)> + '_ {
        Task::ALL.into_iter().map(move |t| (t, self.route(t)))
    }

    fn slot(&mut self, task: Task) -> &mut Route {
        match task {
            Task::Analyze => &mut self.analyze,
            Task::Chat => &mut self.chat,
            Task::Translate => &mut self.translate,
            Task::Digest => &mut self.digest,
            Task::Suggest => &mut self.suggest,
        }
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        use ProviderId::{Gemini, Groq};
        Self {
            analyze: Route::new(Groq, Gemini, "low-latency single-document summarization"),
            chat: Route::new(Groq, Gemini, "interactive and latency sensitive"),
            translate: Route::new(Gemini, Groq, "multilingual fidelity"),
            digest: Route::new(Gemini, Groq, "long multi-document context"),
            suggest: Route::new(Groq, Gemini, "short, cheap editorial hints"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_has_distinct_fallback() {
        let table = RoutingTable::default();
        for (task, route) in table.iter() {
            assert_ne!(route.primary, route.fallback, "task {}", task);
            assert!(!route.reason.is_empty());
        }
    }

    #[test]
    fn test_translate_prefers_multilingual_provider() {
        let table = RoutingTable::default();
        let route = table.route(Task::Translate);
        assert_eq!(route.primary, ProviderId::Gemini);
        assert_eq!(route.fallback, ProviderId::Groq);
    }

    #[test]
    fn test_chat_prefers_fast_provider() {
        assert_eq!(
            RoutingTable::default().route(Task::Chat).primary,
            ProviderId::Groq
        );
    }

    #[test]
    fn test_with_route_overrides_one_task() {
        let flipped = Route::new(ProviderId::Gemini, ProviderId::Groq, "test");
        let table = RoutingTable::default().with_route(Task::Chat, flipped);
        assert_eq!(table.route(Task::Chat), &flipped);
        assert_eq!(
            table.route(Task::Analyze),
            RoutingTable::default().route(Task::Analyze)
        );
    }

    #[test]
    fn test_task_parse_and_display() {
        for task in Task::ALL {
            assert_eq!(task.to_string().parse::<Task>().unwrap(), task);
        }
        assert!("summarize".parse::<Task>().is_err());
        assert_eq!(Task::Chat.call_options(), CallOptions::chat());
        assert_eq!(Task::Translate.call_options(), CallOptions::batch());
    }
}
