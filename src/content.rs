//! Copy deck: stage labels and call-to-action content.
//!
//! Content is external to the core: the compiled-in defaults ship the
//! campaign copy, and `--content <file>` swaps the whole deck from JSON
//! (fields not present fall back to the defaults).

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// One event row on the call-to-action screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EventItem {
    pub name: String,
    pub location: String,
    pub dates: String,
}

impl EventItem {
    fn new(name: &str, location: &str, dates: &str) -> Self {
        Self { name: name.into(), location: location.into(), dates: dates.into() }
    }
}

/// Call-to-action screen copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CtaContent {
    pub header: String,
    pub title: String,
    pub title_sub: String,
    pub title_highlight: String,
    pub subtitle: String,
    pub subtitle_highlight: String,
    pub events: Vec<EventItem>,
    pub tagline: String,
    pub tagline_highlight: String,
    pub closing: String,
    pub button_text: String,
    pub button_url: String,
}

impl Default for CtaContent {
    fn default() -> Self {
        Self {
            header: "FLUX REAL // H1 2026".into(),
            title: "Experiential Design:".into(),
            title_sub: "Powered by".into(),
            title_highlight: "Conversational AI".into(),
            subtitle: "PropTech · Expos & Events".into(),
            subtitle_highlight: "Hospitality".into(),
            events: vec![
                EventItem::new("PcVue Smart City Conference", "", "Jan 21"),
                EventItem::new("ME PropTech Connect", "Dubai", "Feb 4–5"),
                EventItem::new("EuroShop Trade Fair", "Düsseldorf", "Feb 22–26"),
                EventItem::new("Arabian Travel Market", "Dubai", "May 4–7"),
            ],
            tagline: "Accelerating Global".into(),
            tagline_highlight: "Momentum".into(),
            closing: "LET'S BUILD THE EXTRAORDINARY.".into(),
            button_text: "SCHEDULE A 2026 SYNC".into(),
            button_url: "https://calendar.app.google/j8KygZHUKC8Lsv2w7".into(),
        }
    }
}

/// The full copy deck, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Content {
    /// One label per stage index; empty string means no label.
    pub stage_labels: Vec<String>,
    pub slide_hint_first: String,
    pub slide_hint_rest: String,
    pub cta: CtaContent,
}

impl Default for Content {
    fn default() -> Self {
        Self {
            stage_labels: vec![
                "BEGIN 2026".into(),
                "ALIGN VISION".into(),
                "ACCELERATE GROWTH".into(),
                "LAUNCH TOGETHER".into(),
                "LAUNCH TOGETHER".into(),
                String::new(),
            ],
            slide_hint_first: "SLIDE TO BEGIN".into(),
            slide_hint_rest: "SLIDE TO CONTINUE".into(),
            cta: CtaContent::default(),
        }
    }
}

impl Content {
    pub fn from_json(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading content file {}", path.display()))?;
        let content = serde_json::from_str(&text)
            .with_context(|| format!("parsing content file {}", path.display()))?;
        Ok(content)
    }

    /// Label to overlay for `stage`, if it has one.
    pub fn label_for(&self, stage: Stage) -> Option<&str> {
        self.stage_labels
            .get(stage.index())
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Swipe hint text for the given stage.
    pub fn slide_hint(&self, stage: Stage) -> &str {
        if stage == Stage::Begin { &self.slide_hint_first } else { &self.slide_hint_rest }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_deck_labels_every_sequenced_stage() {
        let content = Content::default();
        for stage in Stage::SEQUENCED {
            assert!(content.label_for(stage).is_some(), "label for {:?}", stage);
        }
        // Terminal stage shows the CTA screen instead of a label.
        assert_eq!(content.label_for(Stage::Cta), None);
    }

    #[test]
    fn slide_hint_switches_after_first_stage() {
        let content = Content::default();
        assert_eq!(content.slide_hint(Stage::Begin), "SLIDE TO BEGIN");
        assert_eq!(content.slide_hint(Stage::Growth), "SLIDE TO CONTINUE");
    }

    #[test]
    fn partial_json_override_keeps_defaults() {
        let json = r#"{ "slide_hint_first": "DRAG TO START" }"#;
        let content: Content = serde_json::from_str(json).unwrap();
        assert_eq!(content.slide_hint_first, "DRAG TO START");
        assert_eq!(content.cta, CtaContent::default());
        assert_eq!(content.label_for(Stage::Begin), Some("BEGIN 2026"));
    }
}
