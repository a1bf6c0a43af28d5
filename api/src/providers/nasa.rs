use async_trait::async_trait;
use serde::Deserialize;

use dayplan_core::apod::Apod;

use super::{ApodProvider, ProviderError, fetch_json};

const PROVIDER: &str = "astronomy picture provider";

/// NASA Astronomy Picture of the Day client
pub struct NasaApodClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl NasaApodClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>, base_url: String) -> Self {
        Self {
            http,
            api_key,
            base_url,
        }
    }
}

#[derive(Deserialize)]
struct ApodPayload {
    title: String,
    #[serde(default)]
    explanation: String,
    url: Option<String>,
    thumbnail_url: Option<String>,
    date: String,
    #[serde(default = "default_media_type")]
    media_type: String,
}

fn default_media_type() -> String {
    "image".to_string()
}

impl From<ApodPayload> for Apod {
    fn from(raw: ApodPayload) -> Self {
        // Videos link to a player page; prefer the still when one is offered.
        let image_url = if raw.media_type == "video" {
            raw.thumbnail_url.or(raw.url)
        } else {
            raw.url
        };
        Apod {
            title: raw.title,
            description: raw.explanation,
            image_url,
            date: raw.date,
            media_type: raw.media_type,
        }
    }
}

#[async_trait]
impl ApodProvider for NasaApodClient {
    async fn today(&self) -> Result<Apod, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::MissingKey {
            provider: PROVIDER,
            env_var: "NASA_API_KEY",
        })?;

        let request = self
            .http
            .get(format!("{}/planetary/apod", self.base_url.trim_end_matches('/')))
            .query(&[("api_key", api_key), ("thumbs", "true")]);

        let raw: ApodPayload = fetch_json(PROVIDER, request).await?;
        Ok(raw.into())
    }
}
