//! Raw Notion pages, as returned by the remote store

use serde_json::Value;

use crate::property::PropertyBag;

/// A page object that has been checked to be one: it carries the `"object": "page"` discriminator and a `properties` map.
///
/// Anything else the store returns (partial objects, databases, garbage) cannot be turned into a `RawPage`,
/// so it never reaches the normalizers.
#[derive(Clone, Debug, PartialEq)]
pub struct RawPage {
    id: String,
    url: String,
    properties: PropertyBag,
}

impl RawPage {
    /// Validate a JSON value. Returns `None` for anything that is not a full page.
    pub fn from_value(value: &Value) -> Option<Self> {
        if value.get("object").and_then(Value::as_str) != Some("page") {
            return None;
        }
        let properties = value.get("properties")?.as_object()?.clone();
        let id = value.get("id")?.as_str()?;
        if id.is_empty() {
            return None;
        }
        let url = value.get("url")
            .and_then(Value::as_str)
            .unwrap_or_default();

        Some(Self { id: id.to_string(), url: url.to_string(), properties })
    }

    /// Validate every value, dropping (and logging) the ones that are not full pages
    pub fn filter_valid(values: &[Value]) -> Vec<Self> {
        values.iter()
            .filter_map(|value| {
                let page = Self::from_value(value);
                if page.is_none() {
                    log::debug!("Ignoring a record that is not a full page object (id {:?})", value.get("id"));
                }
                page
            })
            .collect()
    }

    pub fn id(&self) -> &str                  { &self.id }
    pub fn url(&self) -> &str                 { &self.url }
    pub fn properties(&self) -> &PropertyBag  { &self.properties }
}
