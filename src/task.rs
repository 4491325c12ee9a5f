//! To-do tasks, normalized from the pages of the task database

use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use chrono::NaiveDate;
use csscolorparser::Color;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::Schema;
use crate::page::RawPage;
use crate::property::{self, PropertyBag, CATEGORY_READS};

/// Name given to tasks created without one
pub const DEFAULT_NEW_TASK_NAME: &str = "New Task";
/// State given to newly created tasks
pub const INITIAL_STATE: &str = "INBOX";

/// Presentation tag of a task, derived from its categories. It is never stored remotely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Blue,
    Green,
    Gray,
}

impl Theme {
    /// "Work" wins over "Life", which wins over anything else. The order of the categories does not matter.
    pub fn from_categories(categories: &[String]) -> Self {
        if categories.iter().any(|c| c == "Work") {
            Theme::Blue
        } else if categories.iter().any(|c| c == "Life") {
            Theme::Green
        } else {
            Theme::Gray
        }
    }

    /// The accent color the dashboard uses for this theme
    pub fn color(&self) -> Color {
        match self {
            Theme::Blue => Color::from_rgb_u8(0x3b, 0x82, 0xf6),
            Theme::Green => Color::from_rgb_u8(0x22, 0xc5, 0x5e),
            Theme::Gray => Color::from_rgb_u8(0x73, 0x73, 0x73),
        }
    }
}

impl Display for Theme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Theme::Blue => "blue",
            Theme::Green => "green",
            Theme::Gray => "gray",
        };
        f.pad(name)
    }
}


/// A to-do task
///
/// Tasks are only ever built from their categories (see [`Task::new_with_parameters`]), so that `theme`
/// always matches them. That is why there is no `Deserialize` implementation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Page id, assigned by the remote store
    id: String,
    /// The display name of the task
    name: String,
    /// `None` means "unscheduled", i.e. the task belongs to the inbox
    date: Option<NaiveDate>,
    /// Workflow label (INBOX, Doing, Done...)
    state: String,
    /// Primary category
    cat: String,
    /// Full category list, as stored remotely
    #[serde(skip)]
    categories: Vec<String>,
    sub_cats: Vec<String>,
    theme: Theme,
    summary: String,
    /// Link to the page in Notion
    url: String,
}

impl Task {
    /// Create a task with no category, summary nor URL, in the initial state
    pub fn new<S: ToString, T: ToString>(id: S, name: T, date: Option<NaiveDate>) -> Self {
        Self::new_with_parameters(id.to_string(), name.to_string(), date, INITIAL_STATE.to_string(),
                                  Vec::new(), Vec::new(), String::new(), String::new())
    }

    /// Create a task. `categories` is the full category list, its first entry becomes the primary category.
    pub fn new_with_parameters(id: String, name: String, date: Option<NaiveDate>, state: String,
                               categories: Vec<String>, sub_cats: Vec<String>,
                               summary: String, url: String,
                            ) -> Self
    {
        let theme = Theme::from_categories(&categories);
        let cat = categories.first().cloned().unwrap_or_default();
        Self { id, name, date, state, cat, categories, sub_cats, theme, summary, url }
    }

    /// Build a task from a page of the task database
    pub fn from_page(page: &RawPage, schema: &Schema) -> Self {
        let props = page.properties();

        // Multi-select first, then a single select for schemas where the category is single-valued
        let categories = property::first_choices(props, &schema.category, CATEGORY_READS);

        let mut sub_cats = property::extract_multi_select(props, &schema.sub_category);
        if sub_cats.is_empty() {
            sub_cats = categories.iter().skip(1).cloned().collect();
        }

        Self::new_with_parameters(
            page.id().to_string(),
            property::extract_title(props, &schema.name),
            property::extract_date(props, &schema.date),
            property::extract_status(props, &schema.state),
            categories,
            sub_cats,
            property::extract_text(props, &schema.summary),
            page.url().to_string(),
        )
    }

    pub fn id(&self) -> &str                { &self.id }
    pub fn name(&self) -> &str              { &self.name }
    pub fn date(&self) -> Option<NaiveDate> { self.date }
    pub fn state(&self) -> &str             { &self.state }
    pub fn cat(&self) -> &str               { &self.cat }
    pub fn categories(&self) -> &[String]   { &self.categories }
    pub fn sub_cats(&self) -> &[String]     { &self.sub_cats }
    pub fn theme(&self) -> Theme            { self.theme }
    pub fn summary(&self) -> &str           { &self.summary }
    pub fn url(&self) -> &str               { &self.url }

    /// Merge a patch into this task. Fields absent from the patch are left untouched.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(state) = &patch.state {
            self.state = state.clone();
        }
        if let Some(summary) = &patch.summary {
            self.summary = summary.clone();
        }
    }

    /// The page properties that describe this task (the reverse of [`Task::from_page`])
    pub fn to_properties(&self, schema: &Schema) -> PropertyBag {
        let mut props = PropertyBag::new();
        props.insert(schema.name.clone(), property::title_value(&self.name));
        props.insert(schema.date.clone(), property::date_value(self.date));
        props.insert(schema.state.clone(), property::choice_value(schema.state_representation, &self.state));
        props.insert(schema.category.clone(), property::multi_select_value(&self.categories));
        props.insert(schema.sub_category.clone(), property::multi_select_value(&self.sub_cats));
        props.insert(schema.summary.clone(), property::rich_text_value(&self.summary));
        props
    }
}


/// Normalize the results of a task query.
///
/// Records that are not full pages are excluded. In case the same id shows up twice, only its first occurrence is kept.
pub fn normalize_tasks(values: &[Value], schema: &Schema) -> Vec<Task> {
    let mut seen = HashSet::new();
    RawPage::filter_valid(values)
        .iter()
        .filter(|page| {
            let is_new = seen.insert(page.id().to_string());
            if is_new == false {
                log::warn!("Task {} is listed twice in the same result. Ignoring its second occurrence", page.id());
            }
            is_new
        })
        .map(|page| Task::from_page(page, schema))
        .collect()
}


/// A partial update of a task.
///
/// The date can be explicitly cleared, which is different from leaving it untouched: in JSON, `"date": null`
/// (or the string `"null"`) clears it, while a missing `date` key leaves it as is.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_date_patch")]
    pub date: Option<Option<NaiveDate>>,
    #[serde(default, alias = "status", skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl TaskPatch {
    pub fn state<S: ToString>(state: S) -> Self {
        Self { state: Some(state.to_string()), ..Self::default() }
    }

    pub fn date(date: Option<NaiveDate>) -> Self {
        Self { date: Some(date), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// The page properties to send to the store to apply this patch remotely
    pub fn to_properties(&self, schema: &Schema) -> PropertyBag {
        let mut props = PropertyBag::new();
        if let Some(name) = &self.name {
            props.insert(schema.name.clone(), property::title_value(name));
        }
        if let Some(date) = self.date {
            props.insert(schema.date.clone(), property::date_value(date));
        }
        if let Some(state) = &self.state {
            props.insert(schema.state.clone(), property::choice_value(schema.state_representation, state));
        }
        if let Some(summary) = &self.summary {
            props.insert(schema.summary.clone(), property::rich_text_value(summary));
        }
        props
    }
}

fn deserialize_date_patch<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") | Some("null") => Ok(Some(None)),
        Some(s) => match property::parse_calendar_date(s) {
            Some(date) => Ok(Some(Some(date))),
            None => Err(D::Error::custom(format!("invalid date {:?}, expected YYYY-MM-DD", s))),
        },
    }
}


/// What is needed to create a task
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    #[serde(default, alias = "title")]
    pub name: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new<S: ToString>(name: S, date: Option<NaiveDate>) -> Self {
        Self { name: name.to_string(), date }
    }

    /// The page properties of the task to create. New tasks always start in the inbox state.
    pub fn to_properties(&self, schema: &Schema) -> PropertyBag {
        let name = if self.name.trim().is_empty() { DEFAULT_NEW_TASK_NAME } else { self.name.as_str() };

        let mut props = PropertyBag::new();
        props.insert(schema.name.clone(), property::title_value(name));
        if let Some(date) = self.date {
            props.insert(schema.date.clone(), property::date_value(Some(date)));
        }
        props.insert(schema.state.clone(), property::choice_value(schema.state_representation, INITIAL_STATE));
        props
    }
}
