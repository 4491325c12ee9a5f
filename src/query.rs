//! Database queries (filters and sorts)
//!
//! This module only builds the requests, it never runs them: a [`Query`] serializes to the JSON body of
//! Notion's `POST /databases/{id}/query` and is executed by a [`RemoteStore`](crate::traits::RemoteStore).

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::config::Schema;
use crate::property::Representation;
use crate::task::Task;

/// States of tasks that are not "active" anymore
pub const CLOSED_STATES: &[&str] = &["Done", "Canceled"];
/// The store never returns more than this many results per call. Callers needing more must paginate.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A condition on a property value
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Equals(String),
    DoesNotEqual(String),
    Contains(String),
}

/// A condition on a property, e.g. `{ "property": "State", "status": { "does_not_equal": "Done" } }`
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyFilter {
    pub property: String,
    pub representation: Representation,
    pub condition: Condition,
}

impl PropertyFilter {
    pub fn new<S: ToString>(property: S, representation: Representation, condition: Condition) -> Self {
        Self { property: property.to_string(), representation, condition }
    }
}

impl Serialize for PropertyFilter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("property", &self.property)?;
        map.serialize_entry(self.representation.key(), &self.condition)?;
        map.end()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Filter {
    And { and: Vec<Filter> },
    Property(PropertyFilter),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sort {
    pub property: String,
    pub direction: Direction,
}

/// A database query
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Query {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    pub sorts: Vec<Sort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

impl Query {
    /// Tasks that are neither done nor canceled, by ascending date.
    /// When `target` is given, only the tasks of that day are returned.
    ///
    /// The store sorts undated tasks on its own terms, so results must go through [`sort_by_date_nulls_first`]
    pub fn active_tasks(schema: &Schema, target: Option<NaiveDate>) -> Self {
        let mut conditions: Vec<Filter> = CLOSED_STATES.iter()
            .map(|state| Filter::Property(PropertyFilter::new(
                &schema.state, schema.state_representation, Condition::DoesNotEqual(state.to_string())
            )))
            .collect();

        if let Some(date) = target {
            conditions.push(Filter::Property(PropertyFilter::new(
                &schema.date, Representation::Date, Condition::Equals(date.format("%Y-%m-%d").to_string())
            )));
        }

        Self {
            filter: Some(Filter::And { and: conditions }),
            sorts: vec![Sort { property: schema.date.clone(), direction: Direction::Ascending }],
            page_size: None,
            start_cursor: None,
        }
    }

    /// Active tasks scheduled on `today`, for the focus view
    pub fn todays_tasks(schema: &Schema, today: NaiveDate) -> Self {
        Self::active_tasks(schema, Some(today))
    }

    /// Pages in the "Work" category and the "Meeting" sub-category, most recent first
    pub fn work_meetings(schema: &Schema) -> Self {
        let conditions = vec![
            Filter::Property(PropertyFilter::new(&schema.category, Representation::MultiSelect, Condition::Contains("Work".to_string()))),
            Filter::Property(PropertyFilter::new(&schema.sub_category, Representation::MultiSelect, Condition::Contains("Meeting".to_string()))),
        ];

        Self {
            filter: Some(Filter::And { and: conditions }),
            sorts: vec![Sort { property: schema.date.clone(), direction: Direction::Descending }],
            page_size: Some(MAX_PAGE_SIZE),
            start_cursor: None,
        }
    }

    /// Continue a previous query from the cursor it returned
    pub fn starting_at<S: ToString>(mut self, cursor: S) -> Self {
        self.start_cursor = Some(cursor.to_string());
        self
    }

    /// Set the page size, capped to [`MAX_PAGE_SIZE`]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size.min(MAX_PAGE_SIZE));
        self
    }
}


/// One page of query results
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}


/// Sort tasks by ascending date, undated tasks first.
///
/// The sort is stable: tasks of the same day keep the order they were given in.
pub fn sort_by_date_nulls_first(tasks: &mut [Task]) {
    tasks.sort_by_key(|task| task.date());
}
