use std::collections::HashMap;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ArtistSource, SourceError, collect_artists};
use crate::{config, types::ArtistRef};

const NOTION_VERSION: &str = "2022-06-28";
const QUERY_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<NotionPage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NotionPage {
    #[serde(default)]
    properties: HashMap<String, Value>,
}

/// Reads artists from a Notion database, one page per artist, taking the
/// Spotify reference from a configurable property.
pub struct NotionArtistSource {
    client: Client,
    api_url: String,
    token: String,
    database_id: String,
    property: String,
}

impl NotionArtistSource {
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        database_id: impl Into<String>,
        property: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            database_id: database_id.into(),
            property: property.into(),
        }
    }

    pub fn from_config() -> Result<Self, SourceError> {
        Ok(Self::new(
            config::notion_api_url(),
            config::notion_token()?,
            config::notion_database_id()?,
            config::notion_artist_property(),
        ))
    }

    async fn query(&self, cursor: Option<&str>) -> Result<QueryResponse, SourceError> {
        let mut body = json!({ "page_size": QUERY_PAGE_SIZE });
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }

        let response = self
            .client
            .post(format!(
                "{}/databases/{}/query",
                self.api_url, self.database_id
            ))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<QueryResponse>().await?)
    }
}

impl ArtistSource for NotionArtistSource {
    fn name(&self) -> &str {
        "Notion"
    }

    async fn list_artists(&self) -> Result<Vec<ArtistRef>, SourceError> {
        let mut raw = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.query(cursor.as_deref()).await?;

            raw.extend(
                page.results
                    .iter()
                    .filter_map(|p| p.properties.get(&self.property))
                    .filter_map(property_text),
            );

            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(collect_artists(raw))
    }
}

/// Extracts the plain text of a Notion property value of type `url`,
/// `rich_text` or `title`. Empty values yield `None`.
pub fn property_text(value: &Value) -> Option<String> {
    let text = match value.get("type").and_then(Value::as_str)? {
        "url" => value.get("url").and_then(Value::as_str)?.to_string(),
        kind @ ("rich_text" | "title") => value
            .get(kind)
            .and_then(Value::as_array)?
            .iter()
            .filter_map(|part| part.get("plain_text").and_then(Value::as_str))
            .collect::<String>(),
        _ => return None,
    };

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
