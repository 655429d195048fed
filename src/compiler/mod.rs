//! The Markdown-to-interactive-story compiler.
//!
//! Forward direction: authoring Markdown (front matter + prose + verb-choice
//! arrays + check directives) becomes a normalized `StoryRecord`. The
//! pipeline is pure per call — all bookkeeping (used keys, section map)
//! lives in locals, so concurrent compilations never interfere.
//!
//! Authoring problems are never fatal: malformed spans stay literal and
//! missing metadata degrades to defaults plus advisory warnings.

pub mod extract;
pub mod markup;
pub mod recover;
pub mod sections;

use crate::story::{Level, StoryRecord, is_valid_slug, slugify};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RE_META_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(\w+):\s*"?(.*?)"?\s*$"#).unwrap());

const FALLBACK_ID: &str = "untitled-story";

/// Compiler output: the record plus advisory warnings. Authoring is never
/// blocked; the caller decides how to surface the warnings.
#[derive(Debug, Clone)]
pub struct CompiledStory {
    pub record: StoryRecord,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default)]
struct FrontMatter {
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    level: Option<Level>,
}

/// Split leading `---` fenced metadata from the body. A missing closing
/// fence leaves the whole source as body text, literal and unharmed.
fn split_front_matter(source: &str) -> (FrontMatter, &str) {
    let mut meta = FrontMatter::default();

    let mut lines = source.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return (meta, source);
    };
    if first.trim_end() != "---" {
        return (meta, source);
    }

    let mut offset = first.len();
    let mut body_start = None;
    let mut meta_lines = Vec::new();
    for line in lines {
        offset += line.len();
        if line.trim_end() == "---" {
            body_start = Some(offset);
            break;
        }
        meta_lines.push(line);
    }

    let Some(body_start) = body_start else {
        // Unterminated fence: treat everything as body.
        return (meta, source);
    };

    for line in meta_lines {
        let Some(caps) = RE_META_LINE.captures(line.trim()) else {
            continue;
        };
        let value = caps[2].to_string();
        match &caps[1] {
            "id" => meta.id = Some(value),
            "title" => meta.title = Some(value),
            "description" => meta.description = Some(value),
            "level" => meta.level = Some(Level::parse_lenient(&value)),
            other => debug!(key = other, "Ignoring unknown front matter key"),
        }
    }

    (meta, &source[body_start..])
}

/// Compile authoring Markdown into a persisted story record.
pub fn compile_story(source: &str) -> CompiledStory {
    let (meta, body) = split_front_matter(source);
    let mut warnings = Vec::new();

    let section_map = sections::SectionMap::new(body);
    let extraction = extract::extract_verbs(body, &section_map);
    let story_text = markup::transform_markup(&extraction.text);

    let title = meta.title.unwrap_or_default();
    if title.trim().is_empty() {
        warnings.push("story has no title".to_string());
    }
    if section_map.heading_count() == 0 {
        warnings.push("story has no section headings (## ...)".to_string());
    }

    let id = resolve_id(meta.id, &title, &mut warnings);

    let record = StoryRecord {
        id,
        title,
        description: meta.description.unwrap_or_default(),
        level: meta.level.unwrap_or_default(),
        verb_count: extraction.verb_data.len(),
        verb_data: extraction.verb_data,
        story_text,
    };

    debug!(
        id = %record.id,
        verbs = record.verb_count,
        sections = section_map.heading_count(),
        warnings = warnings.len(),
        "Compiled story"
    );

    CompiledStory { record, warnings }
}

fn resolve_id(explicit: Option<String>, title: &str, warnings: &mut Vec<String>) -> String {
    if let Some(id) = explicit {
        if is_valid_slug(&id) {
            return id;
        }
        let fixed = slugify(&id);
        warnings.push(format!("id {id:?} is not a valid slug; using {fixed:?}"));
        if !fixed.is_empty() {
            return fixed;
        }
    }
    let from_title = slugify(title);
    if from_title.is_empty() {
        FALLBACK_ID.to_string()
    } else {
        from_title
    }
}
