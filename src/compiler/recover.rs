//! Reverse direction: persisted record back to editable Markdown.
//!
//! Best-effort reconstruction for the admin editor. The author's original
//! option order is not retained in the record, so choice arrays are rebuilt
//! from the stored verb data with the correct form first; only when a slot
//! references an unknown key does a generic placeholder array appear.

use crate::story::StoryRecord;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_H2_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<h2>(.*)</h2>$").unwrap());
static RE_CHECK_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^<div class="check-section"><button class="section-check-btn" onclick="checkSection\((\d+)\)">([^<]*)</button><div class="section-score" id="section-score-\d+"></div></div>$"#,
    )
    .unwrap()
});
static RE_P_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<p>(.*)</p>$").unwrap());
static RE_VERB_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<span class="verb" data-verb="([^"]+)" data-section="\d+">[^<]*</span>"#).unwrap()
});
static RE_ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Re-emit authoring Markdown for an existing record.
pub fn recover_markdown(record: &StoryRecord) -> String {
    let mut out = format!(
        "---\nid: \"{}\"\ntitle: \"{}\"\ndescription: \"{}\"\nlevel: \"{}\"\n---\n",
        record.id, record.title, record.description, record.level
    );

    for block in record.story_text.lines() {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        out.push('\n');

        if let Some(caps) = RE_H2_BLOCK.captures(block) {
            out.push_str("## ");
            out.push_str(caps[1].trim());
        } else if let Some(caps) = RE_CHECK_BLOCK.captures(block) {
            out.push_str(&format!("{{checkSection({}), \"{}\"}}", &caps[1], &caps[2]));
        } else {
            let body = RE_P_BLOCK
                .captures(block)
                .map(|caps| caps[1].to_string())
                .unwrap_or_else(|| block.to_string());
            let with_arrays = RE_VERB_SPAN.replace_all(&body, |caps: &regex::Captures| {
                choice_array(record, &caps[1])
            });
            // Anything still tagged has no Markdown spelling; drop the tags
            // and keep the text.
            let plain = RE_ANY_TAG.replace_all(&with_arrays, "");
            out.push_str(plain.trim());
        }
        out.push('\n');
    }

    out
}

fn choice_array(record: &StoryRecord, key: &str) -> String {
    match record.verb_data.get(key) {
        Some(choice) => {
            let mut forms = Vec::with_capacity(choice.tenses.len());
            forms.push(choice.correct.clone());
            let mut correct_seen = false;
            for tense in &choice.tenses {
                if *tense == choice.correct && !correct_seen {
                    correct_seen = true;
                    continue;
                }
                forms.push(tense.clone());
            }
            let quoted: Vec<String> = forms.iter().map(|f| format!("\"{f}\"")).collect();
            format!("[{}]", quoted.join(", "))
        }
        // Known lossy edge: a slot with no stored data gets a template the
        // author must fill in.
        None => "[\"verb\", \"option1\", \"option2\"]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_story;
    use std::collections::BTreeSet;

    const SOURCE: &str = "---\nid: \"journey\"\ntitle: \"The Journey\"\ndescription: \"A trip\"\nlevel: \"advanced\"\n---\n\n## Departure\nShe [\"left\", \"leaves\", \"will leave\"] at dawn.\n\n{checkSection(1), \"Check departure\"}\n\n## Arrival\nThey [\"arrived\", \"arrive\"] at dusk and [\"slept\", \"sleeps\"] well.\n\n{checkSection(2), \"Check arrival\"}\n";

    #[test]
    fn recovered_markdown_recompiles_to_the_same_story() {
        let first = compile_story(SOURCE).record;
        let markdown = recover_markdown(&first);
        let second = compile_story(&markdown).record;

        assert_eq!(second.id, first.id);
        assert_eq!(second.title, first.title);
        assert_eq!(second.description, first.description);
        assert_eq!(second.level, first.level);
        assert_eq!(second.verb_count, first.verb_count);

        let first_keys: BTreeSet<_> = first.verb_data.keys().cloned().collect();
        let second_keys: BTreeSet<_> = second.verb_data.keys().cloned().collect();
        assert_eq!(first_keys, second_keys);
        for (key, choice) in &first.verb_data {
            let recompiled = &second.verb_data[key];
            assert_eq!(recompiled.correct, choice.correct);
            let offered: BTreeSet<_> = choice.tenses.iter().collect();
            let reoffered: BTreeSet<_> = recompiled.tenses.iter().collect();
            assert_eq!(offered, reoffered);
        }
        assert_eq!(second.story_text, first.story_text);
    }

    #[test]
    fn headings_checks_and_arrays_are_restored() {
        let record = compile_story(SOURCE).record;
        let markdown = recover_markdown(&record);

        assert!(markdown.contains("## Departure"));
        assert!(markdown.contains("{checkSection(1), \"Check departure\"}"));
        assert!(markdown.contains("\"left\","));
        // Correct form leads the rebuilt array.
        let array_start = markdown.find("[\"left\"").expect("left array");
        let span = &markdown[array_start..];
        assert!(span.starts_with("[\"left\", "));
        assert!(!markdown.contains("<p>"));
        assert!(!markdown.contains("<span"));
    }

    #[test]
    fn unknown_slot_key_falls_back_to_generic_placeholder() {
        let mut record = compile_story(SOURCE).record;
        record.verb_data.clear();
        record.verb_count = 0;

        let markdown = recover_markdown(&record);
        assert!(markdown.contains("[\"verb\", \"option1\", \"option2\"]"));
    }
}
