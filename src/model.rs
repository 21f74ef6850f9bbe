// ABOUTME: Serde models for Notion blocks and rich text
// ABOUTME: Serializes to the request shapes accepted by the blocks API

use crate::util::chunked;
use serde::{Serialize, Serializer};
use tracing::warn;

/// Notion rejects text runs longer than this many characters.
pub const MAX_TEXT_LENGTH: usize = 2000;

/// Ceiling on items in any one `rich_text` array.
pub const MAX_RICH_TEXT_ITEMS: usize = 100;

/// Ceiling on items in any nested `children` array.
pub const MAX_CHILDREN: usize = 100;

/// Levels of `children` a single request may carry below a top-level block.
pub const MAX_NESTING_DEPTH: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub code: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichText {
    #[serde(rename = "type")]
    kind: &'static str,
    pub text: TextContent,
    pub annotations: Annotations,
}

impl RichText {
    pub fn new(content: impl Into<String>, annotations: Annotations, link: Option<String>) -> Self {
        RichText {
            kind: "text",
            text: TextContent {
                content: content.into(),
                link: link.map(|url| Link { url }),
            },
            annotations,
        }
    }

    pub fn plain(content: impl Into<String>) -> Self {
        Self::new(content, Annotations::default(), None)
    }

    pub fn content(&self) -> &str {
        &self.text.content
    }

    fn same_style(&self, other: &RichText) -> bool {
        self.annotations == other.annotations && self.text.link == other.text.link
    }
}

/// Merges adjacent runs that share styling, splits runs that exceed
/// [`MAX_TEXT_LENGTH`] on char boundaries, and keeps at most
/// [`MAX_RICH_TEXT_ITEMS`] runs.
///
/// Use [`split_runs`] where the overflow can go into further blocks.
pub fn normalize_runs(runs: Vec<RichText>) -> Vec<RichText> {
    let mut out = merge_runs(runs);
    if out.len() > MAX_RICH_TEXT_ITEMS {
        warn!(
            runs = out.len(),
            kept = MAX_RICH_TEXT_ITEMS,
            "rich text truncated"
        );
        out.truncate(MAX_RICH_TEXT_ITEMS);
    }
    out
}

/// Like [`normalize_runs`] but spreads the runs over as many arrays of at
/// most [`MAX_RICH_TEXT_ITEMS`] as needed. Empty input gives no arrays.
pub fn split_runs(runs: Vec<RichText>) -> Vec<Vec<RichText>> {
    chunked(merge_runs(runs), MAX_RICH_TEXT_ITEMS)
}

fn merge_runs(runs: Vec<RichText>) -> Vec<RichText> {
    let mut merged: Vec<RichText> = Vec::with_capacity(runs.len());
    for run in runs {
        if run.text.content.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.same_style(&run) => last.text.content.push_str(&run.text.content),
            _ => merged.push(run),
        }
    }

    let mut out = Vec::with_capacity(merged.len());
    for run in merged {
        if run.text.content.chars().count() <= MAX_TEXT_LENGTH {
            out.push(run);
            continue;
        }
        let chars: Vec<char> = run.text.content.chars().collect();
        for piece in chars.chunks(MAX_TEXT_LENGTH) {
            let mut part = run.clone();
            part.text.content = piece.iter().collect();
            out.push(part);
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextBlock {
    pub rich_text: Vec<RichText>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ToDoBlock {
    pub rich_text: Vec<RichText>,
    pub checked: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeBlock {
    pub rich_text: Vec<RichText>,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExternalFile {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageBlock {
    #[serde(rename = "type")]
    kind: &'static str,
    pub external: ExternalFile,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableBlock {
    pub table_width: usize,
    pub has_column_header: bool,
    pub has_row_header: bool,
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRowBlock {
    pub cells: Vec<Vec<RichText>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Empty {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BlockKind {
    #[serde(rename = "paragraph")]
    Paragraph(TextBlock),
    #[serde(rename = "heading_1")]
    Heading1(TextBlock),
    #[serde(rename = "heading_2")]
    Heading2(TextBlock),
    #[serde(rename = "heading_3")]
    Heading3(TextBlock),
    #[serde(rename = "bulleted_list_item")]
    BulletedListItem(TextBlock),
    #[serde(rename = "numbered_list_item")]
    NumberedListItem(TextBlock),
    #[serde(rename = "to_do")]
    ToDo(ToDoBlock),
    #[serde(rename = "quote")]
    Quote(TextBlock),
    #[serde(rename = "code")]
    Code(CodeBlock),
    #[serde(rename = "divider")]
    Divider(Empty),
    #[serde(rename = "image")]
    Image(ImageBlock),
    #[serde(rename = "table")]
    Table(TableBlock),
    #[serde(rename = "table_row")]
    TableRow(TableRowBlock),
}

impl BlockKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            BlockKind::Paragraph(_) => "paragraph",
            BlockKind::Heading1(_) => "heading_1",
            BlockKind::Heading2(_) => "heading_2",
            BlockKind::Heading3(_) => "heading_3",
            BlockKind::BulletedListItem(_) => "bulleted_list_item",
            BlockKind::NumberedListItem(_) => "numbered_list_item",
            BlockKind::ToDo(_) => "to_do",
            BlockKind::Quote(_) => "quote",
            BlockKind::Code(_) => "code",
            BlockKind::Divider(_) => "divider",
            BlockKind::Image(_) => "image",
            BlockKind::Table(_) => "table",
            BlockKind::TableRow(_) => "table_row",
        }
    }
}

/// One unit of page content. The importer only counts and groups these;
/// the shape matters to the converter and the wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
}

impl From<BlockKind> for Block {
    fn from(kind: BlockKind) -> Self {
        Block { kind }
    }
}

impl Block {
    pub fn paragraph(rich_text: Vec<RichText>) -> Self {
        BlockKind::Paragraph(TextBlock {
            rich_text,
            children: Vec::new(),
        })
        .into()
    }

    pub fn text(content: &str) -> Self {
        Self::paragraph(vec![RichText::plain(content)])
    }

    /// Levels past 3 collapse to `heading_3`, the deepest Notion offers.
    pub fn heading(level: u8, rich_text: Vec<RichText>) -> Self {
        let body = TextBlock {
            rich_text,
            children: Vec::new(),
        };
        match level {
            0 | 1 => BlockKind::Heading1(body),
            2 => BlockKind::Heading2(body),
            _ => BlockKind::Heading3(body),
        }
        .into()
    }

    /// Code longer than one block can hold continues in further code blocks.
    pub fn code_blocks(content: String, language: String) -> Vec<Self> {
        let mut chunks = split_runs(vec![RichText::plain(content)]);
        if chunks.is_empty() {
            chunks.push(Vec::new());
        }
        chunks
            .into_iter()
            .map(|rich_text| {
                BlockKind::Code(CodeBlock {
                    rich_text,
                    language: language.clone(),
                })
                .into()
            })
            .collect()
    }

    pub fn divider() -> Self {
        BlockKind::Divider(Empty {}).into()
    }

    pub fn image(url: String) -> Self {
        BlockKind::Image(ImageBlock {
            kind: "external",
            external: ExternalFile { url },
        })
        .into()
    }

    pub fn table(rows: Vec<Vec<Vec<RichText>>>, has_column_header: bool) -> Self {
        let table_width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let children = rows
            .into_iter()
            .map(|mut cells| {
                cells.resize_with(table_width, Vec::new);
                BlockKind::TableRow(TableRowBlock { cells }).into()
            })
            .collect();
        BlockKind::Table(TableBlock {
            table_width,
            has_column_header,
            has_row_header: false,
            children,
        })
        .into()
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn children(&self) -> &[Block] {
        match &self.kind {
            BlockKind::Paragraph(body)
            | BlockKind::Heading1(body)
            | BlockKind::Heading2(body)
            | BlockKind::Heading3(body)
            | BlockKind::BulletedListItem(body)
            | BlockKind::NumberedListItem(body)
            | BlockKind::Quote(body) => body.children.as_slice(),
            BlockKind::ToDo(body) => body.children.as_slice(),
            BlockKind::Table(table) => table.children.as_slice(),
            _ => &[],
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Block>> {
        match &mut self.kind {
            BlockKind::Paragraph(body)
            | BlockKind::Heading1(body)
            | BlockKind::Heading2(body)
            | BlockKind::Heading3(body)
            | BlockKind::BulletedListItem(body)
            | BlockKind::NumberedListItem(body)
            | BlockKind::Quote(body) => Some(&mut body.children),
            BlockKind::ToDo(body) => Some(&mut body.children),
            BlockKind::Table(table) => Some(&mut table.children),
            _ => None,
        }
    }
}

/// Reshapes a block tree so one request stays inside Notion's limits: no
/// nested `children` array longer than [`MAX_CHILDREN`] and no more than
/// [`MAX_NESTING_DEPTH`] levels of children.
///
/// Document order is kept. Children past the depth limit follow their parent
/// as siblings, children past the count limit follow it the same way, long
/// tables continue in further tables, and a table too deep to hold rows
/// becomes one paragraph per row.
pub fn fit_nesting(blocks: Vec<Block>) -> Vec<Block> {
    fit_level(blocks, 0)
}

fn fit_level(blocks: Vec<Block>, depth: usize) -> Vec<Block> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        let mut block = match block.kind {
            BlockKind::Table(table) => {
                out.extend(fit_table(table, depth));
                continue;
            }
            kind => Block::from(kind),
        };

        let children = block
            .children_mut()
            .map(std::mem::take)
            .unwrap_or_default();
        if children.is_empty() {
            out.push(block);
        } else if depth >= MAX_NESTING_DEPTH {
            out.push(block);
            out.extend(fit_level(children, depth));
        } else {
            let mut children = fit_level(children, depth + 1);
            let overflow = children.split_off(children.len().min(MAX_CHILDREN));
            if let Some(slot) = block.children_mut() {
                *slot = children;
            }
            out.push(block);
            out.extend(overflow);
        }
    }
    out
}

fn fit_table(mut table: TableBlock, depth: usize) -> Vec<Block> {
    let rows = std::mem::take(&mut table.children);
    if depth >= MAX_NESTING_DEPTH {
        return rows.into_iter().flat_map(row_to_paragraphs).collect();
    }

    chunked(rows, MAX_CHILDREN)
        .into_iter()
        .enumerate()
        .map(|(i, rows)| {
            BlockKind::Table(TableBlock {
                table_width: table.table_width,
                has_column_header: table.has_column_header && i == 0,
                has_row_header: table.has_row_header,
                children: rows,
            })
            .into()
        })
        .collect()
}

fn row_to_paragraphs(block: Block) -> Vec<Block> {
    let row = match block.kind {
        BlockKind::TableRow(row) => row,
        kind => return vec![Block::from(kind)],
    };
    let mut runs = Vec::new();
    for (i, cell) in row.cells.into_iter().enumerate() {
        if i > 0 {
            runs.push(RichText::plain(" | "));
        }
        runs.extend(cell);
    }
    split_runs(runs).into_iter().map(Block::paragraph).collect()
}

#[derive(Serialize)]
struct Envelope<'a> {
    object: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    body: &'a BlockKind,
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Envelope {
            object: "block",
            kind: self.kind.type_name(),
            body: &self.kind,
        }
        .serialize(serializer)
    }
}
