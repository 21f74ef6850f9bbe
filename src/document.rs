// ABOUTME: Loads a Markdown source file and resolves the title of the page it becomes
// ABOUTME: Title order is explicit override, then front matter title, then file stem

use crate::batch::BlockBatch;
use crate::frontmatter::split_frontmatter;
use crate::util::title_from_path;
use crate::Result;
use std::fs;
use std::path::Path;

/// A Markdown file ready to hand to the importer.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub title: String,
    /// The file's full text. Any front matter header stays in place; the
    /// converter skips it.
    pub markdown: String,
}

impl SourceDocument {
    pub fn load(path: &Path, title: Option<String>) -> Result<Self> {
        let markdown = fs::read_to_string(path)?;
        let (frontmatter, _) = split_frontmatter(&markdown)?;
        let title = title
            .or_else(|| frontmatter.and_then(|fm| fm.title))
            .unwrap_or_else(|| title_from_path(path));

        Ok(SourceDocument { title, markdown })
    }
}

/// One-line report for a conversion that was planned but not sent.
pub fn dry_run_summary(title: &str, batches: &[BlockBatch]) -> String {
    let blocks: usize = batches.iter().map(Vec::len).sum();
    format!(
        "[DRY RUN] \"{}\": {} blocks in {} batch(es), no changes made",
        title,
        blocks,
        batches.len()
    )
}
