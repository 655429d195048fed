//! Persisted story shapes shared with the web frontend.
//!
//! `StoryRecord` is the unit the store reads and writes, serialized in the
//! camelCase JSON shape the learner and admin pages consume. The types
//! export TypeScript bindings via `ts-rs` so the frontend stays in sync.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

/// One multiple-choice verb exercise.
///
/// `tenses` is the display order after shuffling; its order carries no
/// meaning beyond display. `correct` is the sole grading signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VerbChoice {
    pub tenses: Vec<String>,
    pub correct: String,
}

impl VerbChoice {
    /// Construct a choice, asserting the grading invariant up front.
    ///
    /// A `correct` value missing from `tenses` would surface later as a
    /// silent grading bug, so it is a fatal precondition here.
    pub fn new(tenses: Vec<String>, correct: String) -> Self {
        assert!(
            tenses.iter().any(|t| *t == correct),
            "correct form {correct:?} must be one of the offered tenses"
        );
        Self { tenses, correct }
    }
}

/// Story difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Level {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        };
        write!(f, "{}", label)
    }
}

impl Level {
    /// Lenient parse used by the front matter reader; unknown values fall
    /// back to the default level.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "beginner" => Level::Beginner,
            "advanced" => Level::Advanced,
            _ => Level::Intermediate,
        }
    }
}

/// The persisted story unit. Mutated only by full replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StoryRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub level: Level,
    pub verb_count: usize,
    pub verb_data: BTreeMap<String, VerbChoice>,
    pub story_text: String,
}

/// Story ids are lowercase alphanumeric plus hyphens, never empty.
pub fn is_valid_slug(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}

/// Derive a slug from free text: lowercase, non-alphanumeric runs become a
/// single hyphen, edges trimmed.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_choice_accepts_member_correct() {
        let choice = VerbChoice::new(
            vec!["walks".into(), "walked".into(), "will walk".into()],
            "walked".into(),
        );
        assert_eq!(choice.correct, "walked");
        assert_eq!(choice.tenses.len(), 3);
    }

    #[test]
    #[should_panic(expected = "must be one of the offered tenses")]
    fn verb_choice_rejects_foreign_correct() {
        let _ = VerbChoice::new(vec!["walks".into(), "walked".into()], "ran".into());
    }

    #[test]
    fn record_serializes_to_persisted_shape() {
        let mut verb_data = BTreeMap::new();
        verb_data.insert(
            "walked".to_string(),
            VerbChoice::new(vec!["walked".into(), "walks".into()], "walked".into()),
        );
        let record = StoryRecord {
            id: "a-story".into(),
            title: "A Story".into(),
            description: "Short".into(),
            level: Level::Beginner,
            verb_count: 1,
            verb_data,
            story_text: "<p>text</p>".into(),
        };

        let json = serde_json::to_value(&record).expect("record should serialize");
        assert_eq!(json["verbCount"], 1);
        assert_eq!(json["level"], "beginner");
        assert_eq!(json["verbData"]["walked"]["correct"], "walked");
        assert_eq!(json["storyText"], "<p>text</p>");

        let back: StoryRecord =
            serde_json::from_value(json).expect("persisted shape should deserialize");
        assert_eq!(back, record);
    }

    #[test]
    fn slug_validation_and_derivation() {
        assert!(is_valid_slug("the-princess-2"));
        assert!(!is_valid_slug("The-Princess"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("with spaces"));

        assert_eq!(slugify("The Princess & the Dragon!"), "the-princess-the-dragon");
        assert_eq!(slugify("  Hello  "), "hello");
        assert_eq!(slugify("***"), "");
    }
}
