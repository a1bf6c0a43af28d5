use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Astronomy picture of the day, as shown next to a generated plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Apod {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub date: String,
    /// `image` or `video`
    pub media_type: String,
}

impl Apod {
    /// Placeholder returned when the picture service cannot be reached.
    pub fn unavailable() -> Self {
        Self {
            title: "Astronomy Picture Unavailable".to_string(),
            description: "Today's astronomy picture could not be loaded.".to_string(),
            image_url: None,
            date: chrono::Utc::now().date_naive().to_string(),
            media_type: "image".to_string(),
        }
    }
}
