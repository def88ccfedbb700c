use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Oldest entries are dropped past this many.
pub const MAX_ENTRIES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "Tú",
            Role::Assistant => "Asistente Constitucional",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Ordered transcript of one conversation, kept for display only. Owned by
/// whoever hosts the conversation and handed to each query.
#[derive(Debug, Clone, Default)]
pub struct Session {
    entries: Vec<TranscriptEntry>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, role: Role, text: &str) {
        self.entries.push(TranscriptEntry {
            role,
            text: text.to_string(),
            at: Utc::now(),
        });
        if self.entries.len() > MAX_ENTRIES {
            let excess = self.entries.len() - MAX_ENTRIES;
            self.entries.drain(..excess);
        }
    }

    /// Record a question and its answer, in that order.
    pub fn record_exchange(&mut self, question: &str, answer: &str) {
        self.record(Role::User, question);
        self.record(Role::Assistant, answer);
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.entries.last().map(|e| e.at)
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The last `limit` entries (at least one) as Discord markdown, oldest
    /// first.
    pub fn render(&self, limit: usize) -> String {
        let entries = self.entries();
        entries[entries.len().saturating_sub(limit.max(1))..]
            .iter()
            .map(|e| {
                format!(
                    "**{}** ({}):\n{}",
                    e.role.label(),
                    e.at.format("%H:%M UTC"),
                    e.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_order() {
        let mut s = Session::new();
        s.record(Role::User, "¿Qué es el habeas corpus?");
        s.record(Role::Assistant, "Según el Artículo 200...");

        assert_eq!(s.len(), 2);
        assert_eq!(s.entries()[0].role, Role::User);
        assert_eq!(s.entries()[1].text, "Según el Artículo 200...");
        assert!(s.entries()[0].at <= s.entries()[1].at);
    }

    #[test]
    fn test_render_shows_most_recent_entries() {
        let mut s = Session::new();
        for i in 0..4 {
            s.record(Role::User, &format!("pregunta {}", i));
        }

        let out = s.render(2);
        assert!(!out.contains("pregunta 1"));
        assert!(out.find("pregunta 2").unwrap() < out.find("pregunta 3").unwrap());
        assert!(out.contains("**Tú**"));
    }

    #[test]
    fn test_render_empty_and_clear() {
        let mut s = Session::new();
        assert_eq!(s.render(10), "");
        s.record(Role::Assistant, "hola");
        s.clear();
        assert!(s.is_empty());
    }

    #[test]
    fn test_render_zero_limit_still_shows_latest() {
        let mut s = Session::new();
        s.record_exchange("¿Qué es el Congreso?", "Artículo 90...");

        let out = s.render(0);
        assert!(out.contains("Artículo 90..."));
        assert!(!out.contains("¿Qué es el Congreso?"));
    }

    #[test]
    fn test_transcript_is_capped() {
        let mut s = Session::new();
        for i in 0..MAX_ENTRIES + 7 {
            s.record(Role::User, &format!("pregunta {}", i));
        }

        assert_eq!(s.len(), MAX_ENTRIES);
        assert_eq!(s.entries()[0].text, "pregunta 7");
        assert_eq!(
            s.entries()[MAX_ENTRIES - 1].text,
            format!("pregunta {}", MAX_ENTRIES + 6)
        );
    }

    #[test]
    fn test_last_activity() {
        let mut s = Session::new();
        assert!(s.last_activity().is_none());
        s.record_exchange("q", "a");
        assert_eq!(s.last_activity(), Some(s.entries()[1].at));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }
}
