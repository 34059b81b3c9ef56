//! Core domain types: pages, block trees, rich text, and page properties.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Rich text
// ---------------------------------------------------------------------------

/// Inline formatting flags on a rich-text run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub code: bool,
}

/// One styled run of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    /// Unformatted text of the run.
    #[serde(default)]
    pub plain_text: String,
    /// Link target, if the run is a hyperlink.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
}

impl RichText {
    /// An unstyled, unlinked run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            plain_text: text.into(),
            ..Self::default()
        }
    }

    /// Attach a link target.
    pub fn linked(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }
}

/// Concatenate the unformatted text of every run.
pub fn plain_text(runs: &[RichText]) -> String {
    runs.iter().map(|r| r.plain_text.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// Closed set of block kinds the core understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    BulletedListItem,
    NumberedListItem,
    Code,
    Quote,
    Callout,
    Toggle,
    ToDo,
    Divider,
    ChildPage,
    Other,
}

impl BlockType {
    /// Map the API's `type` discriminator onto the closed set.
    pub fn from_api_name(name: &str) -> Self {
        match name {
            "paragraph" => Self::Paragraph,
            "heading_1" => Self::Heading1,
            "heading_2" => Self::Heading2,
            "heading_3" => Self::Heading3,
            "bulleted_list_item" => Self::BulletedListItem,
            "numbered_list_item" => Self::NumberedListItem,
            "code" => Self::Code,
            "quote" => Self::Quote,
            "callout" => Self::Callout,
            "toggle" => Self::Toggle,
            "to_do" => Self::ToDo,
            "divider" => Self::Divider,
            "child_page" => Self::ChildPage,
            _ => Self::Other,
        }
    }
}

/// Type-specific payload of a block. The variant *is* the block's type.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockContent {
    Paragraph(Vec<RichText>),
    Heading1(Vec<RichText>),
    Heading2(Vec<RichText>),
    Heading3(Vec<RichText>),
    BulletedListItem(Vec<RichText>),
    NumberedListItem(Vec<RichText>),
    Code {
        rich_text: Vec<RichText>,
        language: String,
    },
    Quote(Vec<RichText>),
    Callout(Vec<RichText>),
    Toggle(Vec<RichText>),
    ToDo {
        rich_text: Vec<RichText>,
        checked: bool,
    },
    Divider,
    ChildPage {
        title: String,
    },
    /// A block type outside the closed set; only its API name is kept.
    Other {
        type_name: String,
    },
}

impl BlockContent {
    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Paragraph(_) => BlockType::Paragraph,
            Self::Heading1(_) => BlockType::Heading1,
            Self::Heading2(_) => BlockType::Heading2,
            Self::Heading3(_) => BlockType::Heading3,
            Self::BulletedListItem(_) => BlockType::BulletedListItem,
            Self::NumberedListItem(_) => BlockType::NumberedListItem,
            Self::Code { .. } => BlockType::Code,
            Self::Quote(_) => BlockType::Quote,
            Self::Callout(_) => BlockType::Callout,
            Self::Toggle(_) => BlockType::Toggle,
            Self::ToDo { .. } => BlockType::ToDo,
            Self::Divider => BlockType::Divider,
            Self::ChildPage { .. } => BlockType::ChildPage,
            Self::Other { .. } => BlockType::Other,
        }
    }
}

/// One node of a page's content tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: String,
    /// Whether the API reported children. Independent of `children` being filled.
    pub has_children: bool,
    pub content: BlockContent,
    pub children: Vec<Block>,
}

impl Block {
    /// A childless block with the given payload.
    pub fn new(id: impl Into<String>, content: BlockContent) -> Self {
        Self {
            id: id.into(),
            has_children: false,
            content,
            children: Vec::new(),
        }
    }

    /// Attach an already-fetched subtree.
    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.has_children = !children.is_empty();
        self.children = children;
        self
    }

    pub fn block_type(&self) -> BlockType {
        self.content.block_type()
    }
}

// ---------------------------------------------------------------------------
// Page properties
// ---------------------------------------------------------------------------

/// A normalized page property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Title(Vec<RichText>),
    RichText(Vec<RichText>),
    Select(Option<String>),
    MultiSelect(Vec<String>),
    Status(Option<String>),
    Number(Option<f64>),
    Checkbox(bool),
    Url(Option<String>),
    Date {
        start: Option<String>,
        end: Option<String>,
    },
    /// Any property type not normalized above, kept as raw JSON.
    Other(Value),
}

impl PropertyValue {
    /// Normalize one raw property object (`{"type": "...", "<type>": ...}`).
    pub fn from_api(raw: &Value) -> Self {
        let kind = raw.get("type").and_then(Value::as_str).unwrap_or_default();
        let body = raw.get(kind).unwrap_or(&Value::Null);

        match kind {
            "title" => Self::Title(rich_text_from(body)),
            "rich_text" => Self::RichText(rich_text_from(body)),
            "select" => Self::Select(option_name(body)),
            "status" => Self::Status(option_name(body)),
            "multi_select" => Self::MultiSelect(
                body.as_array()
                    .map(|opts| opts.iter().filter_map(option_name).collect())
                    .unwrap_or_default(),
            ),
            "number" => Self::Number(body.as_f64()),
            "checkbox" => Self::Checkbox(body.as_bool().unwrap_or(false)),
            "url" => Self::Url(body.as_str().map(String::from)),
            "date" => Self::Date {
                start: body.get("start").and_then(Value::as_str).map(String::from),
                end: body.get("end").and_then(Value::as_str).map(String::from),
            },
            _ => Self::Other(raw.clone()),
        }
    }
}

fn rich_text_from(body: &Value) -> Vec<RichText> {
    serde_json::from_value(body.clone()).unwrap_or_default()
}

fn option_name(body: &Value) -> Option<String> {
    body.get("name").and_then(Value::as_str).map(String::from)
}

/// Normalize a raw `properties` object, keyed by property name.
pub fn normalize_properties(
    raw: &serde_json::Map<String, Value>,
) -> BTreeMap<String, PropertyValue> {
    raw.iter()
        .map(|(name, value)| (name.clone(), PropertyValue::from_api(value)))
        .collect()
}

// ---------------------------------------------------------------------------
// Page & metadata
// ---------------------------------------------------------------------------

/// A page with its properties and fully resolved block tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub id: String,
    /// Sorted by property name so rendering is deterministic.
    pub properties: BTreeMap<String, PropertyValue>,
    /// Root-level blocks in API order.
    pub blocks: Vec<Block>,
    pub created_time: DateTime<Utc>,
    pub last_edited_time: DateTime<Utc>,
    pub url: String,
}

impl Page {
    /// Plain text of the page's title property, if it has one.
    pub fn title(&self) -> Option<String> {
        self.properties.values().find_map(|v| match v {
            PropertyValue::Title(runs) => Some(plain_text(runs)),
            _ => None,
        })
    }
}

/// Lightweight page descriptor for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// Lightweight database descriptor for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    pub id: String,
    pub title: String,
    pub url: String,
}
