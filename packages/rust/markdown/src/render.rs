//! Block tree to Markdown.
//!
//! Rendering is a pure recursive walk. Indentation and list numbering are
//! passed down explicitly; nothing is shared between calls.

use blockscribe_shared::{Block, BlockContent, BlockType, RichText, plain_text};

use crate::inline::render_rich_text;

/// Two spaces per nesting level.
const INDENT: &str = "  ";

/// Ordinal counter for consecutive numbered-list items in one sibling run.
#[derive(Debug, Default)]
struct NumberingScope {
    ordinal: usize,
}

impl NumberingScope {
    /// Ordinal for the next numbered item; restarts at 1 unless the previous
    /// sibling was also a numbered item.
    fn next(&mut self, continues_run: bool) -> usize {
        self.ordinal = if continues_run { self.ordinal + 1 } else { 1 };
        self.ordinal
    }
}

/// Render a block sequence as Markdown. Never fails; the same input always
/// produces the same output.
pub fn render_blocks(blocks: &[Block]) -> String {
    let mut out = String::new();
    render_into(&mut out, blocks, 0, &mut NumberingScope::default());
    out
}

fn render_into(out: &mut String, blocks: &[Block], level: usize, scope: &mut NumberingScope) {
    let indent = INDENT.repeat(level);
    let mut previous: Option<BlockType> = None;

    for block in blocks {
        match &block.content {
            BlockContent::Paragraph(text) => push_lines(out, &indent, &render_rich_text(text)),
            BlockContent::Heading1(text) => push_marked(out, &indent, "# ", text),
            BlockContent::Heading2(text) => push_marked(out, &indent, "## ", text),
            BlockContent::Heading3(text) => push_marked(out, &indent, "### ", text),
            BlockContent::BulletedListItem(text) => push_marked(out, &indent, "- ", text),
            BlockContent::NumberedListItem(text) => {
                let ordinal = scope.next(previous == Some(BlockType::NumberedListItem));
                push_marked(out, &indent, &format!("{ordinal}. "), text);
            }
            BlockContent::ToDo { rich_text, checked } => {
                let marker = if *checked { "- [x] " } else { "- [ ] " };
                push_marked(out, &indent, marker, rich_text);
            }
            BlockContent::Quote(text) | BlockContent::Callout(text) => {
                let quoted = render_rich_text(text)
                    .split('\n')
                    .map(|line| format!("> {line}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                push_lines(out, &indent, &quoted);
            }
            BlockContent::Code {
                rich_text,
                language,
            } => {
                push_lines(out, &indent, &format!("```{language}"));
                push_lines(out, &indent, &plain_text(rich_text));
                push_lines(out, &indent, "```");
            }
            BlockContent::Divider => push_lines(out, &indent, "---"),
            BlockContent::ChildPage { title } => {
                if !title.is_empty() {
                    push_lines(out, &indent, title);
                }
            }
            BlockContent::Toggle(text) => {
                push_lines(
                    out,
                    &indent,
                    &format!("<details><summary>{}</summary>", render_rich_text(text)),
                );
                render_into(out, &block.children, level + 1, &mut NumberingScope::default());
                push_lines(out, &indent, "</details>");
                previous = Some(BlockType::Toggle);
                continue;
            }
            BlockContent::Other { .. } => {}
        }

        if !block.children.is_empty() {
            match block.block_type() {
                BlockType::NumberedListItem | BlockType::BulletedListItem => render_into(
                    out,
                    &block.children,
                    level + 1,
                    &mut NumberingScope::default(),
                ),
                _ => render_into(out, &block.children, level + 1, scope),
            }
        }

        previous = Some(block.block_type());
    }
}

/// Emit `marker` followed by the inline text.
fn push_marked(out: &mut String, indent: &str, marker: &str, text: &[RichText]) {
    push_lines(out, indent, &format!("{marker}{}", render_rich_text(text)));
}

/// Emit each line of `text` with the indent prefix; blank lines stay bare.
fn push_lines(out: &mut String, indent: &str, text: &str) {
    for line in text.split('\n') {
        if !line.is_empty() {
            out.push_str(indent);
            out.push_str(line);
        }
        out.push('\n');
    }
}
