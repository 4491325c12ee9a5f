//! Meeting notes, normalized from the pages of the task database that are tagged as work meetings

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Schema;
use crate::error::Error;
use crate::page::RawPage;
use crate::property;
use crate::query::Query;
use crate::traits::RemoteStore;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    id: String,
    name: String,
    date: Option<NaiveDate>,
    state: String,
    summary: String,
    keywords: Vec<String>,
    url: String,
}

impl Meeting {
    pub fn new_with_parameters(id: String, name: String, date: Option<NaiveDate>, state: String,
                               summary: String, keywords: Vec<String>, url: String) -> Self {
        Self { id, name, date, state, summary, keywords, url }
    }

    /// Build a meeting from a page of the task database
    pub fn from_page(page: &RawPage, schema: &Schema) -> Self {
        let props = page.properties();
        Self {
            id: page.id().to_string(),
            name: property::extract_title(props, &schema.name),
            date: property::extract_date(props, &schema.date),
            state: property::extract_status(props, &schema.state),
            summary: property::extract_text(props, &schema.summary),
            keywords: property::extract_multi_select(props, &schema.keywords),
            url: page.url().to_string(),
        }
    }

    pub fn id(&self) -> &str                { &self.id }
    pub fn name(&self) -> &str              { &self.name }
    pub fn date(&self) -> Option<NaiveDate> { self.date }
    pub fn state(&self) -> &str             { &self.state }
    pub fn summary(&self) -> &str           { &self.summary }
    pub fn keywords(&self) -> &[String]     { &self.keywords }
    pub fn url(&self) -> &str               { &self.url }
}

/// Normalize the results of a meeting query, excluding records that are not full pages
pub fn normalize_meetings(values: &[Value], schema: &Schema) -> Vec<Meeting> {
    RawPage::filter_valid(values)
        .iter()
        .map(|page| Meeting::from_page(page, schema))
        .collect()
}

/// Fetch the most recent work meetings (at most one page of results, see [`crate::query::MAX_PAGE_SIZE`])
pub async fn fetch_meetings<S: RemoteStore>(store: &S, schema: &Schema) -> Result<Vec<Meeting>, Error> {
    let response = store.query(&Query::work_meetings(schema)).await?;
    if response.has_more {
        log::info!("More meetings are available, only the most recent ones are returned");
    }
    Ok(normalize_meetings(&response.results, schema))
}
