//! Verb-choice extraction.
//!
//! Authors write inline arrays of double-quoted tense candidates, e.g.
//! `["walked", "walks", "will walk"]`, first element correct. Each match is
//! replaced by a verb-slot span keyed by a stable identifier derived from
//! the correct form, and the shuffled candidates land in the story's verb
//! data. Anything that does not parse as a quoted array stays literal.

use crate::compiler::sections::SectionMap;
use crate::shuffle::shuffled;
use crate::story::VerbChoice;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

// Quotes may not span lines; an unterminated quote fails the whole match.
static RE_CHOICE_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\[\s*"[^"\n]*"(?:\s*,\s*"[^"\n]*")*\s*\]"#).unwrap());
static RE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"\n]*)""#).unwrap());

/// Result of one extraction pass.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Body text with every matched array replaced by a verb-slot span.
    pub text: String,
    /// Derived key -> shuffled choice data, keys unique per story.
    pub verb_data: BTreeMap<String, VerbChoice>,
}

/// Per-call key registry; collisions resolve deterministically by suffix.
#[derive(Debug, Default)]
struct KeyRegistry {
    used: BTreeSet<String>,
}

impl KeyRegistry {
    /// Derive and reserve a unique key for `correct`: lowercase, whitespace
    /// runs become `_`, other non-alphanumerics are stripped, and duplicate
    /// bases get `_1`, `_2`, … in order of first appearance.
    fn claim(&mut self, correct: &str) -> String {
        let base = normalize_key(correct);
        let key = if self.used.contains(&base) {
            let mut n = 1;
            loop {
                let candidate = format!("{base}_{n}");
                if !self.used.contains(&candidate) {
                    break candidate;
                }
                n += 1;
            }
        } else {
            base
        };
        self.used.insert(key.clone());
        key
    }
}

fn normalize_key(correct: &str) -> String {
    let mut key = String::with_capacity(correct.len());
    let mut pending_sep = false;
    for ch in correct.trim().chars() {
        if ch.is_whitespace() {
            pending_sep = !key.is_empty();
        } else if ch.is_alphanumeric() || ch == '_' {
            if pending_sep {
                key.push('_');
                pending_sep = false;
            }
            key.extend(ch.to_lowercase());
        }
    }
    if key.is_empty() {
        // An all-symbol correct form still needs a usable key.
        key.push_str("verb");
    }
    key
}

/// Replace every verb-choice array in `body` with a verb-slot span and
/// collect the shuffled choice data. Section numbers come from the match's
/// offset in the original body via `sections`.
pub fn extract_verbs(body: &str, sections: &SectionMap) -> Extraction {
    let mut registry = KeyRegistry::default();
    let mut verb_data = BTreeMap::new();

    let text = RE_CHOICE_ARRAY
        .replace_all(body, |caps: &regex::Captures| {
            let whole = caps.get(0).expect("regex match always has group 0");
            let raw_forms: Vec<String> = RE_QUOTED
                .captures_iter(whole.as_str())
                .map(|c| c[1].to_string())
                .collect();

            // First quoted string is canonical-correct, fixed before any
            // shuffling.
            let correct = raw_forms[0].clone();
            let key = registry.claim(&correct);
            let section = sections.section_at(whole.start());

            let tenses = shuffled(&raw_forms);
            verb_data.insert(key.clone(), VerbChoice::new(tenses, correct));

            format!(r#"<span class="verb" data-verb="{key}" data-section="{section}">...</span>"#)
        })
        .into_owned();

    Extraction { text, verb_data }
}
