//! Section attribution over original source offsets.
//!
//! Verb slots and check controls are graded per section, where a section is
//! everything under one `## ` heading. Attribution is computed once against
//! the untransformed body so later text substitution cannot shift numbering.

/// Byte offsets of every level-2 heading line, in source order.
#[derive(Debug, Clone)]
pub struct SectionMap {
    heading_offsets: Vec<usize>,
}

impl SectionMap {
    /// Scan `body` for lines starting with `## ` and record where each one
    /// begins.
    pub fn new(body: &str) -> Self {
        let mut heading_offsets = Vec::new();
        let mut offset = 0;
        for line in body.split_inclusive('\n') {
            if line.trim_end_matches(['\r', '\n']).starts_with("## ") {
                heading_offsets.push(offset);
            }
            offset += line.len();
        }
        Self { heading_offsets }
    }

    /// 1-based count of headings at or before `offset`, floored at 1 so
    /// text before the first heading still lands in section 1.
    pub fn section_at(&self, offset: usize) -> usize {
        let count = self.heading_offsets.partition_point(|&h| h <= offset);
        count.max(1)
    }

    /// Number of headings seen in the body.
    pub fn heading_count(&self) -> usize {
        self.heading_offsets.len()
    }
}
