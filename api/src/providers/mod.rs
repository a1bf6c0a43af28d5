//! Clients for the upstream services a plan is built from.

use async_trait::async_trait;
use thiserror::Error;

use dayplan_core::apod::Apod;
use dayplan_core::weather::WeatherSummary;

pub mod completion;
pub mod nasa;
pub mod openweather;

pub use completion::ChatCompletionClient;
pub use nasa::NasaApodClient;
pub use openweather::OpenWeatherClient;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} is not configured: {env_var} is not set")]
    MissingKey {
        provider: &'static str,
        env_var: &'static str,
    },
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("{provider} returned an unexpected payload: {message}")]
    Payload {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    pub fn provider(&self) -> &'static str {
        match self {
            Self::MissingKey { provider, .. }
            | Self::Transport { provider, .. }
            | Self::Status { provider, .. }
            | Self::Payload { provider, .. } => provider,
        }
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, city: &str) -> Result<WeatherSummary, ProviderError>;
}

#[async_trait]
pub trait ApodProvider: Send + Sync {
    async fn today(&self) -> Result<Apod, ProviderError>;
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send `prompt` as a single user turn and return the model's raw text.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Send a prepared request and decode a JSON body, mapping each failure to `provider`.
///
/// Request URLs carry API keys in their query string, so they are stripped
/// from every reqwest error kept here.
pub(crate) async fn fetch_json<T: serde::de::DeserializeOwned>(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|source| ProviderError::Transport {
            provider,
            source: source.without_url(),
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(provider, status = %status, "upstream returned non-success status");
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
            body: body.chars().take(300).collect(),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::Payload {
            provider,
            message: e.without_url().to_string(),
        })
}
