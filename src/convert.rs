// ABOUTME: Converts Markdown text into an ordered list of Notion blocks
// ABOUTME: Walks pulldown-cmark events and builds nested list, quote, and table blocks

use crate::frontmatter::strip_frontmatter;
use crate::model::{
    fit_nesting, normalize_runs, split_runs, Annotations, Block, BlockKind, RichText, TextBlock,
    ToDoBlock,
};
use crate::Result;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Turns Markdown into blocks. Implementations must preserve document order.
pub trait BlockConverter {
    fn convert(&self, markdown: &str) -> Result<Vec<Block>>;
}

/// pulldown-cmark backed converter. Accepts any UTF-8 input; a leading YAML
/// front matter header is skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownConverter;

impl MarkdownConverter {
    pub fn new() -> Self {
        MarkdownConverter
    }

    fn options() -> Options {
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
    }
}

impl BlockConverter for MarkdownConverter {
    fn convert(&self, markdown: &str) -> Result<Vec<Block>> {
        let mut builder = BlockBuilder::default();
        for event in Parser::new_ext(strip_frontmatter(markdown), Self::options()) {
            builder.process_event(event);
        }
        Ok(fit_nesting(builder.finish()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Bulleted,
    Numbered,
    Quote,
}

/// A list item or quote whose children are still being collected.
#[derive(Debug)]
struct Container {
    kind: ContainerKind,
    rich_text: Vec<RichText>,
    children: Vec<Block>,
    checked: Option<bool>,
}

impl Container {
    fn new(kind: ContainerKind) -> Self {
        Container {
            kind,
            rich_text: Vec::new(),
            children: Vec::new(),
            checked: None,
        }
    }

    /// Text past one rich text array's capacity leads the children as paragraphs.
    fn into_block(self) -> Block {
        let mut chunks = split_runs(self.rich_text).into_iter();
        let rich_text = chunks.next().unwrap_or_default();
        let mut children: Vec<Block> = chunks.map(Block::paragraph).collect();
        children.extend(self.children);

        if let Some(checked) = self.checked {
            return BlockKind::ToDo(ToDoBlock {
                rich_text,
                checked,
                children,
            })
            .into();
        }
        let body = TextBlock {
            rich_text,
            children,
        };
        match self.kind {
            ContainerKind::Bulleted => BlockKind::BulletedListItem(body),
            ContainerKind::Numbered => BlockKind::NumberedListItem(body),
            ContainerKind::Quote => BlockKind::Quote(body),
        }
        .into()
    }
}

/// Styled text collected between block boundaries.
#[derive(Debug, Default)]
struct Inline {
    runs: Vec<RichText>,
    bold: usize,
    italic: usize,
    strikethrough: usize,
    link: Option<String>,
}

impl Inline {
    fn annotations(&self, code: bool) -> Annotations {
        Annotations {
            bold: self.bold > 0,
            italic: self.italic > 0,
            strikethrough: self.strikethrough > 0,
            code,
        }
    }

    fn push(&mut self, text: &str, code: bool) {
        let annotations = self.annotations(code);
        self.runs
            .push(RichText::new(text, annotations, self.link.clone()));
    }

    fn take(&mut self) -> Vec<RichText> {
        std::mem::take(&mut self.runs)
    }
}

#[derive(Debug, Default)]
struct TableState {
    rows: Vec<Vec<Vec<RichText>>>,
    row: Vec<Vec<RichText>>,
}

#[derive(Debug, Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    containers: Vec<Container>,
    lists: Vec<ContainerKind>,
    inline: Inline,
    heading: Option<u8>,
    code: Option<(String, String)>,
    image: Option<(String, String)>,
    html: Option<String>,
    table: Option<TableState>,
    /// Images found mid-paragraph; emitted once the paragraph closes.
    deferred: Vec<Block>,
}

impl BlockBuilder {
    fn finish(mut self) -> Vec<Block> {
        let runs = self.inline.take();
        self.attach_text(runs);
        while let Some(container) = self.containers.pop() {
            let block = container.into_block();
            self.push_block(block);
        }
        self.flush_deferred();
        self.blocks
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline.push(&code, true),
            Event::Html(html) => match self.html.as_mut() {
                Some(buffer) => buffer.push_str(&html),
                None => self.text(&html),
            },
            Event::InlineHtml(html) => self.text(&html),
            Event::InlineMath(math) | Event::DisplayMath(math) => self.inline.push(&math, true),
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => self.text("\n"),
            Event::Rule => self.push_block(Block::divider()),
            Event::TaskListMarker(checked) => {
                if let Some(container) = self.containers.last_mut() {
                    container.checked = Some(checked);
                }
            }
            Event::FootnoteReference(name) => self.text(&format!("[^{}]", name)),
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.heading = Some(heading_level_to_num(level));
            }
            Tag::BlockQuote(_) => {
                self.flush_loose_text();
                self.containers.push(Container::new(ContainerKind::Quote));
            }
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => {
                        normalize_language(info.split_whitespace().next().unwrap_or(""))
                    }
                    CodeBlockKind::Indented => normalize_language(""),
                };
                self.code = Some((language, String::new()));
            }
            Tag::HtmlBlock => self.html = Some(String::new()),
            Tag::List(start) => {
                self.flush_loose_text();
                self.lists.push(if start.is_some() {
                    ContainerKind::Numbered
                } else {
                    ContainerKind::Bulleted
                });
            }
            Tag::Item => {
                let kind = self.lists.last().copied().unwrap_or(ContainerKind::Bulleted);
                self.containers.push(Container::new(kind));
            }
            Tag::Table(_) => self.table = Some(TableState::default()),
            Tag::TableHead | Tag::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.row.clear();
                }
            }
            Tag::Emphasis => self.inline.italic += 1,
            Tag::Strong => self.inline.bold += 1,
            Tag::Strikethrough => self.inline.strikethrough += 1,
            Tag::Link { dest_url, .. } => self.inline.link = Some(dest_url.to_string()),
            Tag::Image { dest_url, .. } => self.image = Some((dest_url.to_string(), String::new())),
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                let runs = self.inline.take();
                self.attach_text(runs);
                self.flush_deferred();
            }
            TagEnd::Heading(_) => {
                let level = self.heading.take().unwrap_or(1);
                let mut chunks = split_runs(self.inline.take()).into_iter();
                self.push_block(Block::heading(level, chunks.next().unwrap_or_default()));
                for runs in chunks {
                    self.push_block(Block::paragraph(runs));
                }
                self.flush_deferred();
            }
            TagEnd::BlockQuote(_) | TagEnd::Item => {
                self.flush_loose_text();
                if let Some(container) = self.containers.pop() {
                    let block = container.into_block();
                    self.push_block(block);
                }
                self.flush_deferred();
            }
            TagEnd::CodeBlock => {
                if let Some((language, mut content)) = self.code.take() {
                    if content.ends_with('\n') {
                        content.pop();
                    }
                    for block in Block::code_blocks(content, language) {
                        self.push_block(block);
                    }
                }
            }
            TagEnd::HtmlBlock => {
                if let Some(html) = self.html.take() {
                    let trimmed = html.trim();
                    if !trimmed.is_empty() {
                        self.push_block(Block::text(trimmed));
                    }
                }
            }
            TagEnd::List(_) => {
                self.lists.pop();
            }
            TagEnd::TableCell => {
                let runs = normalize_runs(self.inline.take());
                if let Some(table) = self.table.as_mut() {
                    table.row.push(runs);
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.push_block(Block::table(table.rows, true));
                }
            }
            TagEnd::Emphasis => self.inline.italic = self.inline.italic.saturating_sub(1),
            TagEnd::Strong => self.inline.bold = self.inline.bold.saturating_sub(1),
            TagEnd::Strikethrough => {
                self.inline.strikethrough = self.inline.strikethrough.saturating_sub(1)
            }
            TagEnd::Link => self.inline.link = None,
            TagEnd::Image => {
                if let Some((url, alt)) = self.image.take() {
                    if url.starts_with("http://") || url.starts_with("https://") {
                        self.deferred.push(Block::image(url));
                    } else if !alt.is_empty() {
                        self.inline.push(&alt, false);
                    }
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some((_, content)) = self.code.as_mut() {
            content.push_str(text);
        } else if let Some((_, alt)) = self.image.as_mut() {
            alt.push_str(text);
        } else {
            self.inline.push(text, false);
        }
    }

    /// Places finished runs: as the text of the innermost list item or
    /// quote when it has none yet, otherwise as paragraphs.
    fn attach_text(&mut self, runs: Vec<RichText>) {
        let mut chunks = split_runs(runs).into_iter();
        let Some(first) = chunks.next() else {
            return;
        };
        match self.containers.last_mut() {
            Some(container) if container.rich_text.is_empty() && container.children.is_empty() => {
                container.rich_text = first;
            }
            Some(container)
                if container.kind == ContainerKind::Quote && container.children.is_empty() =>
            {
                container.rich_text.push(RichText::plain("\n"));
                container.rich_text.extend(first);
            }
            _ => self.push_block(Block::paragraph(first)),
        }
        for runs in chunks {
            self.push_block(Block::paragraph(runs));
        }
    }

    /// Tight list items carry their text without paragraph events.
    fn flush_loose_text(&mut self) {
        let runs = self.inline.take();
        self.attach_text(runs);
    }

    fn flush_deferred(&mut self) {
        for block in std::mem::take(&mut self.deferred) {
            self.push_block(block);
        }
    }

    fn push_block(&mut self, block: Block) {
        match self.containers.last_mut() {
            Some(container) => container.children.push(block),
            None => self.blocks.push(block),
        }
    }
}

fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

const NOTION_LANGUAGES: &[&str] = &[
    "abap", "arduino", "bash", "basic", "c", "clojure", "coffeescript", "c++", "c#", "css",
    "dart", "diff", "docker", "elixir", "elm", "erlang", "flow", "fortran", "f#", "gherkin",
    "glsl", "go", "graphql", "groovy", "haskell", "html", "java", "javascript", "json", "julia",
    "kotlin", "latex", "less", "lisp", "livescript", "lua", "makefile", "markdown", "markup",
    "matlab", "mermaid", "nix", "objective-c", "ocaml", "pascal", "perl", "php", "plain text",
    "powershell", "prolog", "protobuf", "python", "r", "reason", "ruby", "rust", "sass",
    "scala", "scheme", "scss", "shell", "sql", "swift", "typescript", "vb.net", "verilog",
    "vhdl", "visual basic", "webassembly", "xml", "yaml",
];

/// Maps a fence info string to a language Notion accepts.
pub fn normalize_language(info: &str) -> String {
    let lower = info.trim().to_lowercase();
    let mapped = match lower.as_str() {
        "js" | "jsx" | "mjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "py" => "python",
        "rs" => "rust",
        "sh" | "zsh" | "console" => "shell",
        "yml" => "yaml",
        "cpp" | "cxx" | "hpp" => "c++",
        "cs" | "csharp" => "c#",
        "fs" | "fsharp" => "f#",
        "dockerfile" => "docker",
        "md" => "markdown",
        "rb" => "ruby",
        "kt" | "kts" => "kotlin",
        "golang" => "go",
        "objc" => "objective-c",
        "ps1" | "pwsh" => "powershell",
        "tex" => "latex",
        "proto" => "protobuf",
        "wasm" => "webassembly",
        "make" => "makefile",
        other => other,
    };
    if NOTION_LANGUAGES.contains(&mapped) {
        mapped.to_string()
    } else {
        "plain text".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn convert(markdown: &str) -> Vec<Value> {
        MarkdownConverter::new()
            .convert(markdown)
            .unwrap()
            .iter()
            .map(|b| serde_json::to_value(b).unwrap())
            .collect()
    }

    fn types(blocks: &[Value]) -> Vec<&str> {
        blocks.iter().map(|b| b["type"].as_str().unwrap()).collect()
    }

    fn first_text(block: &Value) -> String {
        let kind = block["type"].as_str().unwrap();
        block[kind]["rich_text"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["text"]["content"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_heading_and_list() {
        let blocks = convert("# H\n- a\n- b");
        assert_eq!(
            types(&blocks),
            vec!["heading_1", "bulleted_list_item", "bulleted_list_item"]
        );
        assert_eq!(first_text(&blocks[0]), "H");
        assert_eq!(first_text(&blocks[2]), "b");
    }

    #[test]
    fn test_empty_input_yields_no_blocks() {
        assert!(convert("").is_empty());
        assert!(convert("  \n\n\t\n").is_empty());
    }

    #[test]
    fn test_heading_levels() {
        let blocks = convert("# one\n## two\n### three\n#### four");
        assert_eq!(
            types(&blocks),
            vec!["heading_1", "heading_2", "heading_3", "heading_3"]
        );
    }

    #[test]
    fn test_inline_annotations() {
        let blocks = convert("This is **bold**, *it*, ~~gone~~ and `code` [link](https://a.b).");
        let runs = blocks[0]["paragraph"]["rich_text"].as_array().unwrap();
        let bold = runs.iter().find(|r| r["text"]["content"] == "bold").unwrap();
        assert_eq!(bold["annotations"]["bold"], true);
        let italic = runs.iter().find(|r| r["text"]["content"] == "it").unwrap();
        assert_eq!(italic["annotations"]["italic"], true);
        let gone = runs.iter().find(|r| r["text"]["content"] == "gone").unwrap();
        assert_eq!(gone["annotations"]["strikethrough"], true);
        let code = runs.iter().find(|r| r["text"]["content"] == "code").unwrap();
        assert_eq!(code["annotations"]["code"], true);
        let link = runs.iter().find(|r| r["text"]["content"] == "link").unwrap();
        assert_eq!(link["text"]["link"]["url"], "https://a.b");
    }

    #[test]
    fn test_soft_break_becomes_space() {
        let blocks = convert("line one\nline two");
        assert_eq!(blocks.len(), 1);
        assert_eq!(first_text(&blocks[0]), "line one line two");
    }

    #[test]
    fn test_ordered_and_task_lists() {
        let blocks = convert("1. first\n2. second\n\n- [ ] todo\n- [x] done");
        assert_eq!(
            types(&blocks),
            vec!["numbered_list_item", "numbered_list_item", "to_do", "to_do"]
        );
        assert_eq!(blocks[2]["to_do"]["checked"], false);
        assert_eq!(blocks[3]["to_do"]["checked"], true);
        assert_eq!(first_text(&blocks[3]), "done");
    }

    #[test]
    fn test_nested_list_becomes_children() {
        let blocks = convert("- parent\n  - child\n- sibling");
        assert_eq!(blocks.len(), 2);
        assert_eq!(first_text(&blocks[0]), "parent");
        let children = blocks[0]["bulleted_list_item"]["children"].as_array().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(first_text(&children[0]), "child");
        assert!(blocks[1]["bulleted_list_item"].get("children").is_none());
    }

    #[test]
    fn test_loose_list_item_with_two_paragraphs() {
        let blocks = convert("- first para\n\n  second para\n\n- next");
        assert_eq!(blocks.len(), 2);
        assert_eq!(first_text(&blocks[0]), "first para");
        let children = blocks[0]["bulleted_list_item"]["children"].as_array().unwrap();
        assert_eq!(types(children), vec!["paragraph"]);
    }

    #[test]
    fn test_quote_joins_paragraphs() {
        let blocks = convert("> This is a quote.\n>\n> Second line.");
        assert_eq!(types(&blocks), vec!["quote"]);
        assert_eq!(first_text(&blocks[0]), "This is a quote.\nSecond line.");
    }

    #[test]
    fn test_code_block_language() {
        let blocks = convert("```rs\nfn main() {}\n```\n\n```\nplain\n```");
        assert_eq!(types(&blocks), vec!["code", "code"]);
        assert_eq!(blocks[0]["code"]["language"], "rust");
        assert_eq!(first_text(&blocks[0]), "fn main() {}");
        assert_eq!(blocks[1]["code"]["language"], "plain text");
    }

    #[test]
    fn test_divider_and_image() {
        let blocks = convert("before\n\n---\n\n![chart](https://img.example/chart.png)");
        assert_eq!(types(&blocks), vec!["paragraph", "divider", "image"]);
        assert_eq!(
            blocks[2]["image"]["external"]["url"],
            "https://img.example/chart.png"
        );
    }

    #[test]
    fn test_local_image_keeps_alt_text() {
        let blocks = convert("![local diagram](./diagram.png)");
        assert_eq!(types(&blocks), vec!["paragraph"]);
        assert_eq!(first_text(&blocks[0]), "local diagram");
    }

    #[test]
    fn test_table() {
        let blocks = convert("| a | b |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |");
        assert_eq!(types(&blocks), vec!["table"]);
        assert_eq!(blocks[0]["table"]["table_width"], 2);
        let rows = blocks[0]["table"]["children"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["table_row"]["cells"][1][0]["text"]["content"], "b");
        assert_eq!(rows[2]["table_row"]["cells"][0][0]["text"]["content"], "3");
    }

    #[test]
    fn test_front_matter_is_skipped() {
        let blocks = convert("---\ntitle: Notes\n---\n\nBody text");
        assert_eq!(types(&blocks), vec!["paragraph"]);
        assert_eq!(first_text(&blocks[0]), "Body text");
    }

    #[test]
    fn test_order_preserved() {
        let markdown: String = (0..20).map(|i| format!("para {}\n\n", i)).collect();
        let blocks = convert(&markdown);
        assert_eq!(blocks.len(), 20);
        for (i, block) in blocks.iter().enumerate() {
            assert_eq!(first_text(block), format!("para {}", i));
        }
    }

    #[test]
    fn test_normalize_language() {
        assert_eq!(normalize_language("JS"), "javascript");
        assert_eq!(normalize_language("python"), "python");
        assert_eq!(normalize_language("yml"), "yaml");
        assert_eq!(normalize_language("brainfuck"), "plain text");
        assert_eq!(normalize_language(""), "plain text");
    }

    fn children(block: &Value) -> Vec<Value> {
        let kind = block["type"].as_str().unwrap();
        block[kind]["children"].as_array().cloned().unwrap_or_default()
    }

    fn depth(block: &Value) -> usize {
        1 + children(block).iter().map(depth).max().unwrap_or(0)
    }

    #[test]
    fn test_front_matter_only_yields_no_blocks() {
        assert!(convert("---\ntitle: Only header\n---\n").is_empty());
    }

    #[test]
    fn test_leading_rule_is_not_front_matter() {
        let blocks = convert("---\n\nIntro paragraph.\n\n---\n\nBody");
        assert_eq!(
            types(&blocks),
            vec!["divider", "paragraph", "divider", "paragraph"]
        );
        assert_eq!(first_text(&blocks[1]), "Intro paragraph.");
    }

    #[test]
    fn test_long_table_splits_into_tables() {
        let mut markdown = String::from("| n |\n|---|\n");
        for i in 0..150 {
            markdown.push_str(&format!("| {} |\n", i));
        }
        let blocks = convert(&markdown);
        assert_eq!(types(&blocks), vec!["table", "table"]);
        assert_eq!(children(&blocks[0]).len(), 100);
        assert_eq!(children(&blocks[1]).len(), 51);
        assert_eq!(blocks[1]["table"]["has_column_header"], false);
    }

    #[test]
    fn test_wide_nested_list_spills_after_parent() {
        let mut markdown = String::from("- parent\n");
        for i in 0..150 {
            markdown.push_str(&format!("  - child {}\n", i));
        }
        let blocks = convert(&markdown);
        assert_eq!(blocks.len(), 51);
        assert_eq!(children(&blocks[0]).len(), 100);
        assert_eq!(first_text(&blocks[1]), "child 100");
        assert_eq!(first_text(&blocks[50]), "child 149");
    }

    #[test]
    fn test_many_styled_runs_split_into_paragraphs() {
        let markdown: String = (0..75).map(|i| format!("**b{}** p{} ", i, i)).collect();
        let blocks = convert(&markdown);
        assert_eq!(types(&blocks), vec!["paragraph", "paragraph"]);
        assert_eq!(blocks[0]["paragraph"]["rich_text"].as_array().unwrap().len(), 100);
        assert_eq!(blocks[1]["paragraph"]["rich_text"].as_array().unwrap().len(), 50);
    }

    #[test]
    fn test_deep_list_flattened_to_nesting_limit() {
        let blocks = convert("- a\n  - b\n    - c\n      - d");
        assert_eq!(blocks.len(), 1);
        assert_eq!(depth(&blocks[0]), 3);
        let b = &children(&blocks[0])[0];
        let grandchildren = children(b);
        assert_eq!(first_text(&grandchildren[0]), "c");
        assert_eq!(first_text(&grandchildren[1]), "d");
    }
}
