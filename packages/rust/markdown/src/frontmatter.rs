//! Page properties as a `key: value` header.

use std::collections::BTreeMap;

use blockscribe_shared::{Page, PropertyValue, plain_text};
use tracing::{debug, instrument};

use crate::render::render_blocks;

/// Line that closes the frontmatter block.
const SEPARATOR: &str = "---";

/// Render the recognised properties as `key: value` lines followed by the
/// separator line. Returns an empty string when no property renders.
pub fn render_frontmatter(properties: &BTreeMap<String, PropertyValue>) -> String {
    let mut out = String::new();
    for (key, value) in properties {
        if let Some(value) = property_text(value).map(single_line) {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(&value);
            out.push('\n');
        }
    }

    if !out.is_empty() {
        out.push_str(SEPARATOR);
        out.push('\n');
    }
    out
}

/// Render a whole page: frontmatter, a blank line, then the block body.
/// Pages with no renderable property get the body alone.
#[instrument(skip_all, fields(page_id = %page.id))]
pub fn render_page(page: &Page) -> String {
    let header = render_frontmatter(&page.properties);
    let body = render_blocks(&page.blocks);
    debug!(
        header_bytes = header.len(),
        body_bytes = body.len(),
        "rendered page"
    );

    if header.is_empty() {
        body
    } else {
        format!("{header}\n{body}")
    }
}

/// Keep each property on one `key: value` line.
fn single_line(value: String) -> String {
    value.lines().collect::<Vec<_>>().join(" ")
}

fn property_text(value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::Title(runs) | PropertyValue::RichText(runs) => Some(plain_text(runs)),
        PropertyValue::Select(name) => name.clone(),
        PropertyValue::MultiSelect(names) => Some(names.join(", ")),
        PropertyValue::Number(n) => n.map(|n| n.to_string()),
        PropertyValue::Checkbox(checked) => Some(checked.to_string()),
        PropertyValue::Url(url) => url.clone(),
        PropertyValue::Status(_) | PropertyValue::Date { .. } | PropertyValue::Other(_) => None,
    }
}
