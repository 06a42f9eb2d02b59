//! Microsoft Translator connector.
//! Exchanges a subscription key for bearer tokens, sends segments over the
//! V2 (XML) or V3 (JSON) protocol and caches successful translations.

pub mod config;
pub mod metrics;
pub mod prefs;
pub mod translate;

pub use config::{ConfigError, Endpoints, ServiceConfig};
pub use prefs::{ConnectorSettings, CredentialStore, MemoryCredentialStore, MemoryPreferences, Preferences};
pub use translate::{
    CurrentAuth, LanguagePair, Protocol, TranslateError, TranslateResult, TranslationService,
};

/// Install the global tracing subscriber. `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
