//! An in-memory task database, that behaves like a (very small) Notion
//!
//! It is mostly useful to mock the remote store in tests, where it can also be told to fail with a [`MockBehaviour`]

use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::error::StoreError;
use crate::mock_behaviour::MockBehaviour;
use crate::property::{self, PropertyBag, Representation};
use crate::query::{Condition, Direction, Filter, PropertyFilter, Query, QueryResponse, MAX_PAGE_SIZE};
use crate::traits::RemoteStore;
use crate::config::Schema;
use crate::task::Task;


/// A remote store that keeps its pages in memory
#[derive(Default)]
pub struct MemoryStore {
    pages: Vec<Value>,
    mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make this store fail or succeed according to `mock_behaviour`
    pub fn set_mock_behaviour(&mut self, mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>) {
        self.mock_behaviour = mock_behaviour;
    }

    /// Add a raw value, as is. This can be used to insert malformed records
    pub fn insert_raw(&mut self, value: Value) {
        self.pages.push(value);
    }

    /// Add a page describing `task`, with the same id
    pub fn insert_task(&mut self, task: &Task, schema: &Schema) {
        self.pages.push(page_value(task.id(), task.to_properties(schema)));
    }

    /// Get a page, unless it has been archived
    pub fn page(&self, id: &str) -> Option<&Value> {
        self.pages.iter()
            .find(|page| page_id(page) == Some(id) && is_archived(page) == false)
    }

    /// How many live (i.e. not archived) pages this store contains
    pub fn len(&self) -> usize {
        self.pages.iter().filter(|page| is_archived(page) == false).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn page_mut(&mut self, id: &str) -> Option<&mut Value> {
        self.pages.iter_mut()
            .find(|page| page_id(page) == Some(id) && is_archived(page) == false)
    }

    fn check(&self, f: fn(&mut MockBehaviour) -> Result<(), StoreError>) -> Result<(), StoreError> {
        match &self.mock_behaviour {
            None => Ok(()),
            Some(behaviour) => match behaviour.lock() {
                Ok(mut behaviour) => f(&mut *behaviour),
                Err(_) => Err(StoreError::new("Mock behaviour is poisoned")),
            },
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn query(&self, query: &Query) -> Result<QueryResponse, StoreError> {
        self.check(MockBehaviour::can_query)?;

        let mut matching: Vec<&Value> = self.pages.iter()
            .filter(|page| is_archived(page) == false)
            .filter(|page| match (query.filter.as_ref(), properties_of(page)) {
                (_, None) => true,  // malformed records are returned as is, just like a store with corrupted data would
                (None, Some(_)) => true,
                (Some(filter), Some(props)) => matches(filter, props),
            })
            .collect();

        // Stable sorts, least significant first
        for sort in query.sorts.iter().rev() {
            matching.sort_by(|a, b| {
                let date_a = properties_of(a).and_then(|props| property::extract_date(props, &sort.property));
                let date_b = properties_of(b).and_then(|props| property::extract_date(props, &sort.property));
                compare_dates_empty_last(date_a, date_b, sort.direction)
            });
        }

        let start = query.start_cursor.as_ref()
            .and_then(|cursor| cursor.parse::<usize>().ok())
            .unwrap_or(0)
            .min(matching.len());
        let page_size = query.page_size.unwrap_or(MAX_PAGE_SIZE).min(MAX_PAGE_SIZE) as usize;
        let end = (start + page_size).min(matching.len());
        let has_more = end < matching.len();

        Ok(QueryResponse {
            results: matching[start..end].iter().map(|page| (*page).clone()).collect(),
            has_more,
            next_cursor: if has_more { Some(end.to_string()) } else { None },
        })
    }

    async fn create_page(&mut self, properties: &PropertyBag) -> Result<Value, StoreError> {
        self.check(MockBehaviour::can_create_page)?;

        let id = uuid::Uuid::new_v4().to_hyphenated().to_string();
        let page = page_value(&id, properties.clone());
        self.pages.push(page.clone());
        Ok(page)
    }

    async fn update_page(&mut self, id: &str, properties: &PropertyBag) -> Result<Value, StoreError> {
        self.check(MockBehaviour::can_update_page)?;

        let page = self.page_mut(id).ok_or_else(|| not_found(id))?;
        if let Some(Value::Object(existing)) = page.get_mut("properties") {
            for (name, value) in properties {
                existing.insert(name.clone(), value.clone());
            }
        }
        Ok(page.clone())
    }

    async fn archive_page(&mut self, id: &str) -> Result<(), StoreError> {
        self.check(MockBehaviour::can_archive_page)?;

        let page = self.page_mut(id).ok_or_else(|| not_found(id))?;
        page["archived"] = Value::Bool(true);
        Ok(())
    }
}


fn page_value(id: &str, properties: PropertyBag) -> Value {
    json!({
        "object": "page",
        "id": id,
        "url": format!("https://www.notion.so/{}", id.replace('-', "")),
        "archived": false,
        "properties": properties,
    })
}

fn not_found(id: &str) -> StoreError {
    StoreError::with_detail("object_not_found", format!("Could not find page with ID: {}", id))
}

fn page_id(page: &Value) -> Option<&str> {
    page.get("id").and_then(Value::as_str)
}

fn is_archived(page: &Value) -> bool {
    page.get("archived").and_then(Value::as_bool).unwrap_or(false)
}

fn properties_of(page: &Value) -> Option<&PropertyBag> {
    page.get("properties").and_then(Value::as_object)
}

fn matches(filter: &Filter, props: &PropertyBag) -> bool {
    match filter {
        Filter::And { and } => and.iter().all(|f| matches(f, props)),
        Filter::Property(f) => matches_property(f, props),
    }
}

fn matches_property(filter: &PropertyFilter, props: &PropertyBag) -> bool {
    if filter.representation == Representation::Date {
        let date = property::extract_date(props, &filter.property);
        return match &filter.condition {
            Condition::Equals(s) => date.is_some() && date == property::parse_calendar_date(s),
            Condition::DoesNotEqual(s) => date != property::parse_calendar_date(s),
            Condition::Contains(_) => false,
        };
    }

    let names = property::first_choices(props, &filter.property, &[filter.representation]);
    match &filter.condition {
        Condition::Equals(s) | Condition::Contains(s) => names.iter().any(|name| name == s),
        Condition::DoesNotEqual(s) => names.iter().all(|name| name != s),
    }
}

/// Notion lists pages with an empty sort property last, whatever the direction
fn compare_dates_empty_last(a: Option<NaiveDate>, b: Option<NaiveDate>, direction: Direction) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match direction {
            Direction::Ascending => a.cmp(&b),
            Direction::Descending => b.cmp(&a),
        },
    }
}
