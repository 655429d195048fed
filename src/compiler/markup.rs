//! Markdown-to-HTML transformation.
//!
//! Runs after extraction, so verb-slot spans are already inline and are
//! carried through verbatim. Only the authoring subset is understood:
//! `## ` headings, whole-line `{checkSection(N), "label"}` directives, and
//! blank-line separated paragraphs. Anything else is literal prose.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_CHECK_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\{checkSection\((\d+)\),\s*"([^"\n]*)"\}$"#).unwrap());

/// Markup for one section-check control. The section number is
/// author-supplied in the directive, never recomputed.
fn check_control(section: u32, label: &str) -> String {
    format!(
        "<div class=\"check-section\">\
         <button class=\"section-check-btn\" onclick=\"checkSection({section})\">{label}</button>\
         <div class=\"section-score\" id=\"section-score-{section}\"></div>\
         </div>"
    )
}

/// Convert extracted story text into the final storyText markup.
pub fn transform_markup(text: &str) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    fn flush(paragraph: &mut Vec<&str>, blocks: &mut Vec<String>) {
        if !paragraph.is_empty() {
            blocks.push(format!("<p>{}</p>", paragraph.join(" ")));
            paragraph.clear();
        }
    }

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            flush(&mut paragraph, &mut blocks);
            continue;
        }

        if let Some(heading) = trimmed.strip_prefix("## ") {
            flush(&mut paragraph, &mut blocks);
            blocks.push(format!("<h2>{}</h2>", heading.trim()));
            continue;
        }

        if let Some(caps) = RE_CHECK_DIRECTIVE.captures(trimmed) {
            // A non-numeric or absurd section number fails the capture
            // parse and the line falls through as literal text.
            if let Ok(section) = caps[1].parse::<u32>() {
                flush(&mut paragraph, &mut blocks);
                blocks.push(check_control(section, &caps[2]));
                continue;
            }
        }

        paragraph.push(trimmed);
    }
    flush(&mut paragraph, &mut blocks);

    blocks.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_become_h2_elements() {
        let out = transform_markup("## The Journey Begins\nShe left at dawn.");
        assert_eq!(
            out,
            "<h2>The Journey Begins</h2>\n<p>She left at dawn.</p>"
        );
    }

    #[test]
    fn check_directive_becomes_control_with_author_number() {
        let out = transform_markup("{checkSection(3), \"Check this section\"}");
        assert!(out.contains("onclick=\"checkSection(3)\""));
        assert!(out.contains(">Check this section</button>"));
        assert!(out.contains("id=\"section-score-3\""));
        assert!(!out.contains("<p>"));
    }

    #[test]
    fn blank_lines_separate_paragraphs_and_emit_nothing() {
        let out = transform_markup("First line.\nsame paragraph.\n\nSecond paragraph.\n\n\n");
        assert_eq!(
            out,
            "<p>First line. same paragraph.</p>\n<p>Second paragraph.</p>"
        );
    }

    #[test]
    fn placeholders_survive_verbatim_inside_paragraphs() {
        let span = r#"She <span class="verb" data-verb="walked" data-section="1">...</span> home."#;
        let out = transform_markup(span);
        assert_eq!(out, format!("<p>{span}</p>"));
    }

    #[test]
    fn malformed_directives_stay_literal() {
        let out = transform_markup("{checkSection(one), \"bad\"}\n\n{checkSection(2) \"no comma\"}");
        assert_eq!(
            out,
            "<p>{checkSection(one), \"bad\"}</p>\n<p>{checkSection(2) \"no comma\"}</p>"
        );
    }

    #[test]
    fn mixed_document_keeps_block_order() {
        let src = "## Intro\nHello there.\n\n{checkSection(1), \"Check\"}\n\n## Next\nMore text.";
        let out = transform_markup(src);
        let h2_intro = out.find("<h2>Intro</h2>").unwrap();
        let para = out.find("<p>Hello there.</p>").unwrap();
        let check = out.find("checkSection(1)").unwrap();
        let h2_next = out.find("<h2>Next</h2>").unwrap();
        assert!(h2_intro < para && para < check && check < h2_next);
    }
}
