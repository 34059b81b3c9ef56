//! Raw records as returned by the document API, before normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{DatabaseMetadata, PageMetadata, PropertyValue, RichText, plain_text};

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedList<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

impl<T> PaginatedList<T> {
    /// The cursor to resume from, or `None` when the listing is exhausted.
    pub fn continuation(&self) -> Option<&str> {
        if self.has_more {
            self.next_cursor.as_deref()
        } else {
            None
        }
    }
}

/// A page object as it arrives from the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: String,
    pub created_time: DateTime<Utc>,
    pub last_edited_time: DateTime<Utc>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl PageRecord {
    /// Plain text of the `title`-typed property, or empty.
    pub fn title(&self) -> String {
        self.properties
            .values()
            .find_map(|raw| match PropertyValue::from_api(raw) {
                PropertyValue::Title(runs) => Some(plain_text(&runs)),
                _ => None,
            })
            .unwrap_or_default()
    }
}

impl From<&PageRecord> for PageMetadata {
    fn from(record: &PageRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title(),
            url: record.url.clone(),
        }
    }
}

/// A block object as it arrives from the API.
///
/// The type-specific payload lives under a key named after `type`, which is
/// kept in `payload` alongside any other unrecognised fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl BlockRecord {
    /// The object stored under this block's own type key.
    pub fn body(&self) -> Option<&Value> {
        self.payload.get(&self.kind)
    }
}

/// A database (collection) object as it arrives from the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseRecord {
    pub id: String,
    #[serde(default)]
    pub title: Vec<RichText>,
    #[serde(default)]
    pub url: String,
}

impl From<&DatabaseRecord> for DatabaseMetadata {
    fn from(record: &DatabaseRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: plain_text(&record.title),
            url: record.url.clone(),
        }
    }
}
