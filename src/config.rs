//! Support for library configuration options

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::property::Representation;

/// Root of the Notion REST API. Feel free to override it (e.g. to point to a proxy) when initing this library.
pub static API_BASE_URL: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("https://api.notion.com/v1/".to_string())));

/// Value of the `Notion-Version` header sent with every request.
/// Feel free to override it when initing this library.
pub static NOTION_VERSION: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("2022-06-28".to_string())));

/// Environment variable holding the integration token
pub const API_KEY_VAR: &str = "NOTION_API_KEY";
/// Environment variable holding the id of the task database
pub const DATABASE_ID_VAR: &str = "NOTION_DATABASE_ID";

/// Read the current value of one of the overridable settings
pub fn current(setting: &Lazy<Arc<Mutex<String>>>) -> String {
    match setting.lock() {
        Ok(value) => value.clone(),
        // A panic while overriding a setting cannot leave a half-written String behind
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}


/// Names (and representations) of the database properties this crate reads and writes.
///
/// The remote schema is owned by the user and drifts over time: the workflow state may be a
/// `status` or a `select` property, the summary field carries a localized name, etc.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub date: String,
    pub state: String,
    /// How the state is written and filtered on. Reads always accept both `status` and `select`.
    pub state_representation: Representation,
    pub category: String,
    pub sub_category: String,
    pub summary: String,
    pub keywords: String,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            name: "Name".to_string(),
            date: "Date".to_string(),
            state: "State".to_string(),
            state_representation: Representation::Status,
            category: "Cat".to_string(),
            sub_category: "SubCat".to_string(),
            summary: "要約".to_string(),
            keywords: "FreeKeyWord".to_string(),
        }
    }
}


/// What is needed to reach a Notion database
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    database_id: String,
}

impl Credentials {
    pub fn new<S: ToString, T: ToString>(api_key: S, database_id: T) -> Self {
        Self { api_key: api_key.to_string(), database_id: database_id.to_string() }
    }

    /// Read the credentials from the `NOTION_API_KEY` and `NOTION_DATABASE_ID` environment variables
    pub fn from_env() -> Result<Self, Error> {
        let api_key = read_var(API_KEY_VAR)?;
        let database_id = read_var(DATABASE_ID_VAR)?;
        Ok(Self { api_key, database_id })
    }

    pub fn api_key(&self) -> &str { &self.api_key }
    pub fn database_id(&self) -> &str { &self.database_id }
}

fn read_var(name: &str) -> Result<String, Error> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() == false => Ok(value),
        _ => Err(Error::Config(format!("{} is missing in environment variables.", name))),
    }
}
