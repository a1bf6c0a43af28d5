pub mod apod;
pub mod error;
pub mod plan;
pub mod preferences;
pub mod prompt;
pub mod repair;
pub mod tasks;
pub mod validation;
pub mod weather;
