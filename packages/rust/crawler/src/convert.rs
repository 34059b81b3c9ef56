//! Mapping of raw API block records onto the closed [`BlockContent`] set.

use serde_json::Value;

use blockscribe_shared::{Block, BlockContent, BlockRecord, BlockType, RichText};

/// Convert one API block record into a childless [`Block`].
///
/// Never fails: unknown types become [`BlockContent::Other`], and malformed
/// payload fields degrade to empty text, `false`, or an empty language.
pub fn convert_block(record: &BlockRecord) -> Block {
    let body = record.body();
    let text = || rich_text_of(body);

    let content = match BlockType::from_api_name(&record.kind) {
        BlockType::Paragraph => BlockContent::Paragraph(text()),
        BlockType::Heading1 => BlockContent::Heading1(text()),
        BlockType::Heading2 => BlockContent::Heading2(text()),
        BlockType::Heading3 => BlockContent::Heading3(text()),
        BlockType::BulletedListItem => BlockContent::BulletedListItem(text()),
        BlockType::NumberedListItem => BlockContent::NumberedListItem(text()),
        BlockType::Quote => BlockContent::Quote(text()),
        BlockType::Callout => BlockContent::Callout(text()),
        BlockType::Toggle => BlockContent::Toggle(text()),
        BlockType::Code => BlockContent::Code {
            rich_text: text(),
            language: string_field(body, "language"),
        },
        BlockType::ToDo => BlockContent::ToDo {
            rich_text: text(),
            checked: body
                .and_then(|b| b.get("checked"))
                .and_then(Value::as_bool)
                .unwrap_or(false),
        },
        BlockType::Divider => BlockContent::Divider,
        BlockType::ChildPage => BlockContent::ChildPage {
            title: string_field(body, "title"),
        },
        BlockType::Other => BlockContent::Other {
            type_name: record.kind.clone(),
        },
    };

    Block {
        id: record.id.clone(),
        has_children: record.has_children,
        content,
        children: Vec::new(),
    }
}

/// Decode the `rich_text` array, skipping runs that do not parse.
fn rich_text_of(body: Option<&Value>) -> Vec<RichText> {
    body.and_then(|b| b.get("rich_text"))
        .and_then(Value::as_array)
        .map(|runs| {
            runs.iter()
                .filter_map(|run| serde_json::from_value(run.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn string_field(body: Option<&Value>, key: &str) -> String {
    body.and_then(|b| b.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
