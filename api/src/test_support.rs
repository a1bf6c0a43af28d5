//! In-process harness for router tests: memory store, scripted providers
//! and HS256 tokens signed with a shared secret.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use serde_json::{Value, json};
use tower::ServiceExt;

use dayplan_core::apod::Apod;
use dayplan_core::weather::WeatherSummary;

use crate::auth::{AuthError, Claims, TokenVerifier, subject};
use crate::middleware::cors::build_cors_layer;
use crate::providers::{ApodProvider, CompletionProvider, ProviderError, WeatherProvider};
use crate::routes;
use crate::state::AppState;
use crate::store::memory::MemoryStore;

const SECRET: &[u8] = b"dayplan-test-secret";

const DEFAULT_COMPLETION: &str =
    r#"{"schedule": [{"time": "09:00", "activity": "Work", "duration": "60", "type": "task"}], "summary": "Default"}"#;

pub fn preferences_body() -> Value {
    json!({
        "wakeTime": "07:00",
        "sleepTime": "23:00",
        "peakFocus": "morning",
        "city": "Lisbon",
        "breakStyle": "short walk",
        "breakIntervalMinutes": 50,
        "maxWorkHours": 8,
        "commuteMode": "walk"
    })
}

fn outage(provider: &'static str) -> ProviderError {
    ProviderError::Status {
        provider,
        status: 503,
        body: "service unavailable".to_string(),
    }
}

struct SharedSecretVerifier;

#[async_trait]
impl TokenVerifier for SharedSecretVerifier {
    async fn verify(&self, token: &str) -> Result<String, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(SECRET),
            &validation,
        )?;
        subject(data.claims)
    }
}

#[derive(Default)]
pub struct FakeWeather {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl FakeWeather {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn current(&self, city: &str) -> Result<WeatherSummary, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(outage("weather provider"));
        }
        Ok(WeatherSummary {
            city: city.to_string(),
            description: Some("clear sky".to_string()),
            temperature: Some(21.0),
            feels_like: Some(20.0),
            humidity: Some(40.0),
            wind_speed: Some(3.0),
            icon: Some("01d".to_string()),
        })
    }
}

#[derive(Default)]
pub struct FakeApod {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl FakeApod {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApodProvider for FakeApod {
    async fn today(&self) -> Result<Apod, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(outage("astronomy picture provider"));
        }
        Ok(Apod {
            title: "Test Nebula".to_string(),
            description: "A cloud of gas.".to_string(),
            image_url: Some("https://apod.example/nebula.jpg".to_string()),
            date: "2026-03-14".to_string(),
            media_type: "image".to_string(),
        })
    }
}

/// Replies with a scripted completion; `None` makes the call fail.
pub struct FakeCompletion {
    calls: AtomicUsize,
    reply: Mutex<Option<String>>,
    prompts: Mutex<Vec<String>>,
}

impl Default for FakeCompletion {
    fn default() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            reply: Mutex::new(Some(DEFAULT_COMPLETION.to_string())),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl FakeCompletion {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_reply(&self, reply: &str) {
        *self.reply.lock().unwrap() = Some(reply.to_string());
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionProvider for FakeCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| outage("completion model"))
    }
}

#[derive(Serialize)]
struct TestClaims<'a> {
    sub: &'a str,
    exp: u64,
}

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub weather: Arc<FakeWeather>,
    pub apod: Arc<FakeApod>,
    pub completion: Arc<FakeCompletion>,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::default()),
            weather: Arc::new(FakeWeather::default()),
            apod: Arc::new(FakeApod::default()),
            completion: Arc::new(FakeCompletion::default()),
        }
    }

    pub fn with_completion(self, reply: &str) -> Self {
        self.completion.set_reply(reply);
        self
    }

    pub fn with_failing_completion(self) -> Self {
        *self.completion.reply.lock().unwrap() = None;
        self
    }

    pub fn with_failing_weather(self) -> Self {
        self.weather.fail.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_failing_apod(self) -> Self {
        self.apod.fail.store(true, Ordering::SeqCst);
        self
    }

    /// A valid session token for `user_id`
    pub fn token(&self, user_id: &str) -> String {
        let exp = chrono::Utc::now().timestamp() as u64 + 3600;
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &TestClaims { sub: user_id, exp },
            &EncodingKey::from_secret(SECRET),
        )
        .expect("test token should encode")
    }

    fn state(&self) -> AppState {
        AppState {
            store: self.store.clone(),
            auth: Arc::new(SharedSecretVerifier),
            weather: self.weather.clone(),
            apod: self.apod.clone(),
            completion: self.completion.clone(),
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = routes::app(self.state(), build_cors_layer(None))
            .oneshot(builder.body(body).expect("request should build"))
            .await
            .expect("request should succeed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };
        (status, json)
    }
}
