//! This module provides a client to connect to the Notion REST API

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Value};
use url::Url;

use crate::config::{self, Credentials, API_BASE_URL, NOTION_VERSION};
use crate::error::{Error, StoreError};
use crate::property::PropertyBag;
use crate::query::{Query, QueryResponse};
use crate::traits::RemoteStore;


/// A remote store that is an actual Notion database
pub struct Client {
    base_url: Url,
    credentials: Credentials,
    http: reqwest::Client,
}

impl Client {
    /// Create a client for the configured API root. This does not start a connection
    pub fn new(credentials: Credentials) -> Result<Self, Error> {
        Self::with_base_url(credentials, config::current(&API_BASE_URL))
    }

    /// Create a client for a custom API root (e.g. a proxy). This does not start a connection
    pub fn with_base_url<S: AsRef<str>>(credentials: Credentials, base_url: S) -> Result<Self, Error> {
        let mut base_url = Url::parse(base_url.as_ref())
            .map_err(|err| Error::Config(format!("Invalid API URL {:?}: {}", base_url.as_ref(), err)))?;
        // Url::join replaces the last path segment unless the base ends with a slash
        if base_url.path().ends_with('/') == false {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            credentials,
            http: reqwest::Client::new(),
        })
    }

    pub fn database_id(&self) -> &str {
        self.credentials.database_id()
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base_url.join(path)
            .map_err(|err| StoreError::new(format!("Invalid endpoint {}: {}", path, err)))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, StoreError> {
        let response = request
            .bearer_auth(self.credentials.api_key())
            .header("Notion-Version", config::current(&NOTION_VERSION))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        parse_response(status, &text)
    }
}

/// Turn the answer of the API into a JSON value, or into a [`StoreError`] carrying Notion's own error message
fn parse_response(status: StatusCode, text: &str) -> Result<Value, StoreError> {
    let body: Value = serde_json::from_str(text).unwrap_or(Value::Null);

    if status.is_success() == false {
        let code = body.get("code").and_then(Value::as_str).unwrap_or("unknown_error");
        let message = format!("Unexpected HTTP status code {} ({})", status, code);
        log::warn!("{}", message);
        return match body.get("message").and_then(Value::as_str) {
            Some(detail) => Err(StoreError::with_detail(message, detail)),
            None => Err(StoreError::new(message)),
        };
    }

    if body.is_null() {
        return Err(StoreError::with_detail("Unable to parse the response of the store", text));
    }
    Ok(body)
}

#[async_trait]
impl RemoteStore for Client {
    async fn query(&self, query: &Query) -> Result<QueryResponse, StoreError> {
        let url = self.endpoint(&format!("databases/{}/query", self.database_id()))?;
        log::debug!("Querying {}", url);

        let body = self.send(self.http.post(url).json(query)).await?;
        let response: QueryResponse = serde_json::from_value(body)
            .map_err(|err| StoreError::new(format!("Unexpected query response: {}", err)))?;
        log::info!("Got {} result(s) (more: {})", response.results.len(), response.has_more);
        Ok(response)
    }

    async fn create_page(&mut self, properties: &PropertyBag) -> Result<Value, StoreError> {
        let url = self.endpoint("pages")?;
        let body = json!({
            "parent": { "database_id": self.database_id() },
            "properties": properties,
        });
        let page = self.send(self.http.post(url).json(&body)).await?;
        log::info!("Created page {}", page.get("id").and_then(Value::as_str).unwrap_or("<no id>"));
        Ok(page)
    }

    async fn update_page(&mut self, id: &str, properties: &PropertyBag) -> Result<Value, StoreError> {
        let url = self.endpoint(&format!("pages/{}", id))?;
        let body = json!({ "properties": properties });
        self.send(self.http.patch(url).json(&body)).await
    }

    async fn archive_page(&mut self, id: &str) -> Result<(), StoreError> {
        let url = self.endpoint(&format!("pages/{}", id))?;
        let body = json!({ "archived": true });
        self.send(self.http.patch(url).json(&body)).await?;
        log::info!("Archived page {}", id);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints() {
        let credentials = Credentials::new("secret_token", "0123abcd");
        let client = Client::with_base_url(credentials.clone(), "https://api.notion.com/v1").unwrap();
        assert_eq!(client.endpoint("pages/abc-def").unwrap().as_str(), "https://api.notion.com/v1/pages/abc-def");
        assert_eq!(client.endpoint("databases/0123abcd/query").unwrap().as_str(), "https://api.notion.com/v1/databases/0123abcd/query");

        let invalid = Client::with_base_url(credentials, "not a url");
        assert!(matches!(invalid, Err(Error::Config(_))));
    }

    #[test]
    fn error_responses() {
        let body = r#"{"object":"error","status":400,"code":"validation_error","message":"Date is not a property that exists."}"#;
        let err = parse_response(StatusCode::BAD_REQUEST, body).unwrap_err();
        assert_eq!(err.message, "Unexpected HTTP status code 400 Bad Request (validation_error)");
        assert_eq!(err.detail.as_deref(), Some("Date is not a property that exists."));

        let err = parse_response(StatusCode::BAD_GATEWAY, "<html>upstream down</html>").unwrap_err();
        assert_eq!(err.message, "Unexpected HTTP status code 502 Bad Gateway (unknown_error)");
        assert_eq!(err.detail, None);

        let err = parse_response(StatusCode::OK, "not json").unwrap_err();
        assert_eq!(err.detail.as_deref(), Some("not json"));

        let page = parse_response(StatusCode::OK, r#"{"object":"page","id":"abc"}"#).unwrap();
        assert_eq!(page["id"], "abc");
    }
}
