//! Shared fixtures for integration tests: a scripted in-memory transport
//! and a service wired to it.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use azure_translator::translate::{HttpRequest, HttpResponse, HttpTransport};
use azure_translator::{
    CredentialStore, CurrentAuth, Endpoints, MemoryCredentialStore, MemoryPreferences,
    Preferences, ServiceConfig, TranslateError, TranslateResult, TranslationService,
};

pub const BASE: &str = "http://mock.invalid";
pub const KEY: &str = "abcdefg";

pub fn endpoints() -> Endpoints {
    Endpoints::with_base(BASE)
}

#[derive(Clone)]
enum Scripted {
    Respond(HttpResponse),
    Timeout,
}

/// Transport answering from per-URL scripts and recording every request.
/// Each URL's script is consumed front to back; its last step repeats.
#[derive(Default)]
pub struct MockTransport {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) -> &Self {
        self.push(url, Scripted::Respond(HttpResponse::new(status, body)))
    }

    pub fn time_out(&self, url: &str) -> &Self {
        self.push(url, Scripted::Timeout)
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    fn push(&self, url: &str, step: Scripted) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(step);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, url: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url == url)
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_step(&self, url: &str) -> Option<Scripted> {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.get_mut(url)?;
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        }
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> TranslateResult<HttpResponse> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.next_step(&url) {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Timeout) => Err(TranslateError::Timeout),
            None => Ok(HttpResponse::new(404, format!("no script for {url}"))),
        }
    }
}

pub struct Harness {
    pub transport: Arc<MockTransport>,
    pub preferences: Arc<MemoryPreferences>,
    pub credentials: Arc<MemoryCredentialStore>,
    pub service: Arc<TranslationService>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_auth(CurrentAuth::Key)
    }

    pub fn with_auth(current_auth: CurrentAuth) -> Self {
        let transport = MockTransport::new();
        let preferences = Arc::new(MemoryPreferences::new());
        let credentials = Arc::new(MemoryCredentialStore::new());
        credentials.set_credential(azure_translator::prefs::PROPERTY_SUBSCRIPTION_KEY, KEY, false);

        let config = ServiceConfig {
            endpoints: endpoints(),
            current_auth,
            ..ServiceConfig::default()
        };
        let service = TranslationService::with_transport(
            &config,
            transport.clone(),
            preferences.clone(),
            credentials.clone(),
        )
        .expect("valid config");

        Self {
            transport,
            preferences,
            credentials,
            service: Arc::new(service),
        }
    }

    pub fn use_legacy(&self, legacy: bool) {
        self.preferences
            .set(azure_translator::prefs::PROPERTY_V2, &legacy.to_string());
    }

    pub fn token_requests(&self) -> Vec<HttpRequest> {
        self.transport.requests_to(&endpoints().token_url)
    }

    pub fn legacy_requests(&self) -> Vec<HttpRequest> {
        self.transport.requests_to(&endpoints().legacy_url)
    }

    pub fn current_requests(&self) -> Vec<HttpRequest> {
        self.transport.requests_to(&endpoints().current_url)
    }
}

pub fn wrapped(text: &str) -> String {
    format!("<string xmlns=\"http://schemas.microsoft.com/2003/10/Serialization/\">{text}</string>")
}

pub fn v3_body(text: &str) -> String {
    format!(r#"[{{"translations": [ {{"text": "{text}", "to": "de"}}]}}]"#)
}
