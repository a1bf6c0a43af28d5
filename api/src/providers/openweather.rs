use async_trait::async_trait;
use serde::Deserialize;

use dayplan_core::weather::WeatherSummary;

use super::{ProviderError, WeatherProvider, fetch_json};

const PROVIDER: &str = "weather provider";

/// OpenWeatherMap current-weather client
pub struct OpenWeatherClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>, base_url: String) -> Self {
        Self {
            http,
            api_key,
            base_url,
        }
    }
}

#[derive(Deserialize)]
struct CurrentWeather {
    name: Option<String>,
    #[serde(default)]
    weather: Vec<Condition>,
    main: Option<Readings>,
    wind: Option<Wind>,
}

#[derive(Deserialize)]
struct Condition {
    description: Option<String>,
    icon: Option<String>,
}

#[derive(Deserialize)]
struct Readings {
    temp: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Deserialize)]
struct Wind {
    speed: Option<f64>,
}

fn normalize(requested_city: &str, raw: CurrentWeather) -> WeatherSummary {
    let condition = raw.weather.into_iter().next();
    let (description, icon) = condition.map_or((None, None), |c| (c.description, c.icon));
    let main = raw.main;
    WeatherSummary {
        city: raw.name.unwrap_or_else(|| requested_city.to_string()),
        description,
        temperature: main.as_ref().and_then(|m| m.temp),
        feels_like: main.as_ref().and_then(|m| m.feels_like),
        humidity: main.as_ref().and_then(|m| m.humidity),
        wind_speed: raw.wind.and_then(|w| w.speed),
        icon,
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, city: &str) -> Result<WeatherSummary, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::MissingKey {
            provider: PROVIDER,
            env_var: "OPENWEATHER_API_KEY",
        })?;

        let request = self
            .http
            .get(format!("{}/data/2.5/weather", self.base_url.trim_end_matches('/')))
            .query(&[("q", city), ("units", "metric"), ("appid", api_key)]);

        let raw: CurrentWeather = fetch_json(PROVIDER, request).await?;
        Ok(normalize(city, raw))
    }
}
