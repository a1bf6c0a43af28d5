use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Current conditions for the user's city, normalized from the provider's payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSummary {
    pub city: String,
    pub description: Option<String>,
    /// Degrees Celsius
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    /// Relative humidity, percent
    pub humidity: Option<f64>,
    /// Metres per second
    pub wind_speed: Option<f64>,
    pub icon: Option<String>,
}
