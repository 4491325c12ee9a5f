//! Typed reads out of the untyped property bag of a Notion page
//!
//! Every extractor is total: an absent property, a property of an unexpected type or an empty value
//! all map to a documented default, never to an error.
//!
//! The database schema is not statically known, and the same logical field may be stored with
//! different representations (a workflow state may be a `status` or a `select`, categories may be a
//! `multi_select` or a single `select`). Such fields are read by trying an ordered list of
//! representations and keeping the first one that yields a value.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// The `properties` object of a page
pub type PropertyBag = Map<String, Value>;

pub const DEFAULT_TITLE: &str = "No Title";
pub const DEFAULT_STATUS: &str = "Unknown";

/// Workflow states are stored either way, and both must be read identically
pub const STATE_READS: &[Representation] = &[Representation::Status, Representation::Select];
/// Categories are multi-valued in current schemas, single-valued in older ones
pub const CATEGORY_READS: &[Representation] = &[Representation::MultiSelect, Representation::Select];

/// The Notion property types this crate knows about
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    Title,
    RichText,
    Date,
    Status,
    Select,
    MultiSelect,
}

impl Representation {
    /// The key holding the value inside a property object (which is also the property type name)
    pub fn key(&self) -> &'static str {
        match self {
            Representation::Title => "title",
            Representation::RichText => "rich_text",
            Representation::Date => "date",
            Representation::Status => "status",
            Representation::Select => "select",
            Representation::MultiSelect => "multi_select",
        }
    }
}


/// First title run's plain text, or `"No Title"`
pub fn extract_title(bag: &PropertyBag, name: &str) -> String {
    first_run_text(bag, name, Representation::Title)
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

/// First rich-text run's plain text, or `""`
pub fn extract_text(bag: &PropertyBag, name: &str) -> String {
    first_run_text(bag, name, Representation::RichText)
        .unwrap_or_default()
}

/// Start of the date, as a calendar date. Timestamps are truncated to their date part.
pub fn extract_date(bag: &PropertyBag, name: &str) -> Option<NaiveDate> {
    let start = value_of(bag, name, Representation::Date)?
        .get("start")?
        .as_str()?;
    parse_calendar_date(start)
}

/// Status name if any, else select name if any, else `"Unknown"`
pub fn extract_status(bag: &PropertyBag, name: &str) -> String {
    first_choices(bag, name, STATE_READS)
        .into_iter()
        .next()
        .unwrap_or_else(|| DEFAULT_STATUS.to_string())
}

/// Select name, or `""`
pub fn extract_select(bag: &PropertyBag, name: &str) -> String {
    choice_names(bag, name, Representation::Select)
        .into_iter()
        .next()
        .unwrap_or_default()
}

/// Ordered multi-select names, or an empty list
pub fn extract_multi_select(bag: &PropertyBag, name: &str) -> Vec<String> {
    choice_names(bag, name, Representation::MultiSelect)
}

/// Try each representation in order, and return the names of the first one that holds any
pub fn first_choices(bag: &PropertyBag, name: &str, attempts: &[Representation]) -> Vec<String> {
    for representation in attempts {
        let names = choice_names(bag, name, *representation);
        if names.is_empty() == false {
            return names;
        }
        log::trace!("Property {} has no {} value", name, representation.key());
    }
    Vec::new()
}

/// Parse a `YYYY-MM-DD` date, or the date part of a longer timestamp
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let date_part = s.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn value_of<'a>(bag: &'a PropertyBag, name: &str, representation: Representation) -> Option<&'a Value> {
    bag.get(name)?
        .get(representation.key())
        .filter(|value| value.is_null() == false)
}

fn first_run_text(bag: &PropertyBag, name: &str, representation: Representation) -> Option<String> {
    let first_run = value_of(bag, name, representation)?
        .as_array()?
        .first()?;

    // Pages from the server carry `plain_text`, property objects built for writes only carry `text.content`
    let text = first_run.get("plain_text")
        .and_then(Value::as_str)
        .or_else(|| first_run.get("text")?.get("content")?.as_str())?;

    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn choice_names(bag: &PropertyBag, name: &str, representation: Representation) -> Vec<String> {
    let value = match value_of(bag, name, representation) {
        None => return Vec::new(),
        Some(v) => v,
    };

    let options: Vec<&Value> = match representation {
        Representation::MultiSelect => match value.as_array() {
            Some(arr) => arr.iter().collect(),
            None => return Vec::new(),
        },
        Representation::Status | Representation::Select => vec![value],
        _ => return Vec::new(),
    };

    options.into_iter()
        .filter_map(|option| option.get("name")?.as_str())
        .filter(|name| name.is_empty() == false)
        .map(String::from)
        .collect()
}


/// Property object for a title
pub fn title_value(text: &str) -> Value {
    json!({ "title": [ { "text": { "content": text } } ] })
}

/// Property object for a rich text. An empty text clears the property.
pub fn rich_text_value(text: &str) -> Value {
    if text.is_empty() {
        json!({ "rich_text": [] })
    } else {
        json!({ "rich_text": [ { "text": { "content": text } } ] })
    }
}

/// Property object for a date. `None` clears the property.
pub fn date_value(date: Option<NaiveDate>) -> Value {
    match date {
        None => json!({ "date": Value::Null }),
        Some(d) => json!({ "date": { "start": d.format("%Y-%m-%d").to_string() } }),
    }
}

/// Property object for a single choice (`status` or `select`)
pub fn choice_value(representation: Representation, name: &str) -> Value {
    let mut object = Map::new();
    object.insert(representation.key().to_string(), json!({ "name": name }));
    Value::Object(object)
}

/// Property object for a multi-select
pub fn multi_select_value(names: &[String]) -> Value {
    let options: Vec<Value> = names.iter()
        .map(|name| json!({ "name": name }))
        .collect();
    json!({ "multi_select": options })
}
