use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::property::PropertyBag;
use crate::query::{Query, QueryResponse};

/// The document store holding the task database (usually Notion).
///
/// Every call may be slow and may fail. Values are returned raw: callers decide how to normalize them.
#[async_trait]
pub trait RemoteStore {
    /// Run a query against the task database
    async fn query(&self, query: &Query) -> Result<QueryResponse, StoreError>;

    /// Create a page in the task database, and return it as the store describes it
    async fn create_page(&mut self, properties: &PropertyBag) -> Result<Value, StoreError>;

    /// Set some properties of an existing page, and return the updated page
    async fn update_page(&mut self, id: &str, properties: &PropertyBag) -> Result<Value, StoreError>;

    /// Delete a page. Notion never deletes pages for good, it archives them.
    async fn archive_page(&mut self, id: &str) -> Result<(), StoreError>;
}
