use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::providers::{ApodProvider, CompletionProvider, WeatherProvider};
use crate::store::Store;

/// Shared handles cloned into every request. Holds no per-request state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: Arc<dyn TokenVerifier>,
    pub weather: Arc<dyn WeatherProvider>,
    pub apod: Arc<dyn ApodProvider>,
    pub completion: Arc<dyn CompletionProvider>,
}
