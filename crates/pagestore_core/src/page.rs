//! Page records.
//!
//! This module contains the persisted page type and its normalization rules:
//! - `Page` - one record of `pages.json`
//! - `PageType` - plain page or product
//! - lenient field deserializers so hand-edited files still load

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::path_utils::{self, HOME};

/// Sort key forced onto the home page so it always sorts first.
pub const HOME_ORDER: i64 = -1_000_000;

/// Deserializes a value that should be a string, but may be a number or other type.
/// - String: returned as-is
/// - Number/Bool: converted to string
/// - Null/other: returns None
fn deserialize_string_lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    match value {
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        _ => Ok(None),
    }
}

fn deserialize_required_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_string_lenient(deserializer)?.unwrap_or_default())
}

/// Accepts numbers and numeric strings.
fn deserialize_number_lenient<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    match value {
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => Ok(s.trim().parse().ok()),
        _ => Ok(None),
    }
}

fn deserialize_order_lenient<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_number_lenient(deserializer)?
        .map(|n| n as i64)
        .unwrap_or_default())
}

/// Accepts booleans, `"true"`/`"false"` and `0`/`1`.
fn deserialize_bool_lenient<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => matches!(s.trim(), "true" | "1"),
        _ => false,
    })
}

/// Kind of page. Products carry a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    /// A regular content page
    #[default]
    Page,
    /// A page that represents a product for sale
    Product,
}

impl PageType {
    /// Parse a type name; unknown values coerce to [`PageType::Page`].
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("product") {
            PageType::Product
        } else {
            PageType::Page
        }
    }
}

impl<'de> Deserialize<'de> for PageType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(deserialize_string_lenient(deserializer)?
            .map(|raw| PageType::parse(&raw))
            .unwrap_or_default())
    }
}

/// One page record as stored in `pages.json`.
///
/// The body HTML is not part of the record; it lives in a content file
/// addressed by `path`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    /// Unique slash-separated identifier
    #[serde(deserialize_with = "deserialize_required_string")]
    pub path: String,

    /// Display title
    #[serde(deserialize_with = "deserialize_required_string")]
    pub title: String,

    /// Short navigation label
    #[serde(
        deserialize_with = "deserialize_string_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub menu_title: Option<String>,

    /// Page or product
    #[serde(rename = "type")]
    pub page_type: PageType,

    /// Price, present only for products
    #[serde(
        deserialize_with = "deserialize_number_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,

    /// Parent path, empty for "no parent"
    #[serde(deserialize_with = "deserialize_required_string")]
    pub parent: String,

    /// True when `parent` was chosen deliberately and must win over the path structure
    #[serde(deserialize_with = "deserialize_bool_lenient")]
    pub parent_explicit: bool,

    /// Sibling sort key
    #[serde(deserialize_with = "deserialize_order_lenient")]
    #[ts(type = "number")]
    pub order: i64,

    /// Presentation: stretch the layout to the full width
    #[serde(deserialize_with = "deserialize_bool_lenient")]
    pub layout_full_width: bool,

    /// Presentation: block alignment keyword
    #[serde(deserialize_with = "deserialize_required_string")]
    pub layout_block_align: String,
}

impl Page {
    /// Create a normalized page with a derived parent.
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        let mut page = Page {
            path: path.into(),
            title: title.into(),
            ..Default::default()
        };
        page.normalize();
        page
    }

    /// The record every store starts with.
    pub fn home() -> Self {
        Page::new(HOME, "Home")
    }

    /// Returns true for the reserved root page
    pub fn is_home(&self) -> bool {
        self.path == HOME
    }

    /// The parent used for tree construction.
    ///
    /// An explicit parent always wins, even when it disagrees with the path.
    /// Otherwise a stored parent is used, and an empty one falls back to the
    /// path's prefix up to the last slash.
    pub fn effective_parent(&self) -> &str {
        if self.is_home() {
            return "";
        }
        if self.parent_explicit || !self.parent.is_empty() {
            return &self.parent;
        }
        path_utils::parent_of(&self.path)
    }

    /// Label for navigation: menu title, then title, then path.
    pub fn nav_label(&self) -> &str {
        self.menu_title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| Some(self.title.as_str()).filter(|t| !t.trim().is_empty()))
            .unwrap_or(&self.path)
    }

    /// Change the page type, keeping the price invariant.
    pub fn set_page_type(&mut self, page_type: PageType) {
        self.page_type = page_type;
        self.normalize_price();
    }

    /// Fill defaults and enforce record invariants.
    ///
    /// This never re-derives `parent` from `path` for an explicit parent.
    pub fn normalize(&mut self) {
        self.path = self.path.trim().to_string();
        self.parent = self.parent.trim().to_string();

        if self
            .menu_title
            .as_ref()
            .is_some_and(|t| t.trim().is_empty())
        {
            self.menu_title = None;
        }

        self.normalize_price();

        if self.is_home() {
            self.parent.clear();
            self.parent_explicit = true;
            self.order = HOME_ORDER;
        } else if !self.parent_explicit && self.parent.is_empty() {
            self.parent = path_utils::parent_of(&self.path).to_string();
        }
    }

    fn normalize_price(&mut self) {
        match self.page_type {
            PageType::Page => self.price = None,
            PageType::Product => {
                let price = self.price.filter(|p| p.is_finite()).unwrap_or(0.0);
                self.price = Some(price);
            }
        }
    }
}
