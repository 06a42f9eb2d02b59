//! Translation facade: cache lookup, protocol selection, delegation and
//! cache population, serialized per instance.
//!
//! The protocol is re-read from preferences on every call. When it no
//! longer matches the held requester, a fresh requester replaces it, so a
//! settings change applies to the very next segment.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::current::CurrentRequester;
use super::http::{HttpTransport, ReqwestTransport};
use super::legacy::LegacyRequester;
use super::token::TokenProvider;
use super::{
    CurrentAuth, LanguagePair, Protocol, ResponseCache, TranslateError, TranslateResult,
};
use crate::config::{Endpoints, ServiceConfig};
use crate::metrics::{metric_names, MetricsRegistry};
use crate::prefs::{
    ConnectorSettings, CredentialStore, Preferences, PROPERTY_NEURAL, PROPERTY_REGION,
    PROPERTY_SUBSCRIPTION_KEY, PROPERTY_V2,
};

pub const CONNECTOR_NAME: &str = "Microsoft Translator (Azure)";

/// Which requester, if any, the service currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceState {
    NoProtocolSelected,
    UsingLegacy,
    UsingCurrent,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceState::NoProtocolSelected => write!(f, "NoProtocolSelected"),
            ServiceState::UsingLegacy => write!(f, "UsingLegacy"),
            ServiceState::UsingCurrent => write!(f, "UsingCurrent"),
        }
    }
}

enum Requester {
    Legacy(LegacyRequester),
    Current(CurrentRequester),
}

impl Requester {
    fn protocol(&self) -> Protocol {
        match self {
            Requester::Legacy(_) => Protocol::Legacy,
            Requester::Current(_) => Protocol::Current,
        }
    }
}

pub struct TranslationService {
    /// Held requester; the lock also serializes every `translate` call.
    requester: Mutex<Option<Requester>>,
    cache: ResponseCache,
    transport: Arc<dyn HttpTransport>,
    preferences: Arc<dyn Preferences>,
    credentials: Arc<dyn CredentialStore>,
    endpoints: Endpoints,
    current_auth: CurrentAuth,
    metrics: Arc<MetricsRegistry>,
}

impl TranslationService {
    /// Service backed by a pooled reqwest client with the configured timeouts.
    pub fn new(
        config: &ServiceConfig,
        preferences: Arc<dyn Preferences>,
        credentials: Arc<dyn CredentialStore>,
    ) -> TranslateResult<Self> {
        let transport =
            ReqwestTransport::new(config.connect_timeout(), config.request_timeout())?;
        Self::with_transport(config, Arc::new(transport), preferences, credentials)
    }

    pub fn with_transport(
        config: &ServiceConfig,
        transport: Arc<dyn HttpTransport>,
        preferences: Arc<dyn Preferences>,
        credentials: Arc<dyn CredentialStore>,
    ) -> TranslateResult<Self> {
        config
            .validate()
            .map_err(|e| TranslateError::InvalidConfig(e.to_string()))?;
        let capacity = config
            .cache_capacity()
            .map_err(|e| TranslateError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            requester: Mutex::new(None),
            cache: ResponseCache::new(capacity, config.cache_ttl()),
            transport,
            preferences,
            credentials,
            endpoints: config.endpoints.clone(),
            current_auth: config.current_auth,
            metrics: Arc::new(MetricsRegistry::new()),
        })
    }

    pub fn name(&self) -> &'static str {
        CONNECTOR_NAME
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Protocol the preferences currently ask for.
    pub fn selected_protocol(&self) -> Protocol {
        if self.preferences.is_enabled(PROPERTY_V2) {
            Protocol::Legacy
        } else {
            Protocol::Current
        }
    }

    /// Waits for any in-flight translation.
    pub async fn state(&self) -> ServiceState {
        match self.requester.lock().await.as_ref().map(Requester::protocol) {
            None => ServiceState::NoProtocolSelected,
            Some(Protocol::Legacy) => ServiceState::UsingLegacy,
            Some(Protocol::Current) => ServiceState::UsingCurrent,
        }
    }

    /// Translate one segment.
    ///
    /// `Ok(None)` means the vendor answered without a usable translation;
    /// it is never cached, so the next identical call goes to the network.
    pub async fn translate(
        &self,
        source_lang: &str,
        target_lang: &str,
        text: &str,
    ) -> TranslateResult<Option<String>> {
        let request_id = uuid::Uuid::new_v4();
        let pair = LanguagePair::from_tags(source_lang, target_lang);
        if text.trim().is_empty() {
            debug!(%request_id, "empty segment, nothing to translate");
            return Ok(None);
        }

        let mut slot = self.requester.lock().await;

        if let Some(hit) = self.cache.get(&pair, text) {
            self.metrics.incr(metric_names::CACHE_HIT);
            debug!(%request_id, %pair, "cache hit");
            return Ok(Some(hit));
        }
        self.metrics.incr(metric_names::CACHE_MISS);

        let key = self
            .credentials
            .get_credential(PROPERTY_SUBSCRIPTION_KEY)
            .ok_or(TranslateError::MissingCredential)?;

        let protocol = self.selected_protocol();
        if slot.as_ref().is_some_and(|r| r.protocol() != protocol) {
            info!(%request_id, to = %protocol, "protocol switched");
            *slot = None;
        }
        let requester = slot.get_or_insert_with(|| self.build_requester(protocol));

        debug!(%request_id, %pair, %protocol, chars = text.chars().count(), "translate_request");
        let result = match requester {
            Requester::Legacy(legacy) => {
                let neural = self.preferences.is_enabled(PROPERTY_NEURAL);
                legacy.translate(&pair, text, &key, neural).await
            }
            Requester::Current(current) => {
                let region = self.preferences.get(PROPERTY_REGION);
                current.translate(&pair, text, &key, region.as_deref()).await
            }
        };

        match result {
            Ok(Some(translation)) if !translation.is_empty() => {
                self.cache.put(&pair, text, &translation);
                Ok(Some(translation))
            }
            Ok(_) => {
                self.metrics.incr(metric_names::NO_RESULT);
                info!(%request_id, %pair, "no translation returned");
                Ok(None)
            }
            Err(e) => {
                warn!(%request_id, %pair, error = %e, "translation failed");
                Err(e)
            }
        }
    }

    fn build_requester(&self, protocol: Protocol) -> Requester {
        let tokens = || {
            TokenProvider::new(
                self.endpoints.token_url.clone(),
                Arc::clone(&self.transport),
                Arc::clone(&self.metrics),
            )
        };
        let transport = Arc::clone(&self.transport);
        let metrics = Arc::clone(&self.metrics);
        match protocol {
            Protocol::Legacy => Requester::Legacy(LegacyRequester::new(
                self.endpoints.legacy_url.clone(),
                tokens(),
                transport,
                metrics,
            )),
            Protocol::Current => Requester::Current(match self.current_auth {
                CurrentAuth::Key => {
                    CurrentRequester::with_key(self.endpoints.current_url.clone(), transport, metrics)
                }
                CurrentAuth::Token => CurrentRequester::with_token(
                    self.endpoints.current_url.clone(),
                    tokens(),
                    transport,
                    metrics,
                ),
            }),
        }
    }

    /// Drop every cached translation.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Host notification that the translation project closed.
    pub fn on_project_closed(&self) {
        info!("project closed, clearing translation cache");
        self.clear_cache();
    }

    /// Store what the host's configuration dialog confirmed. The neural flag
    /// is only kept together with the legacy protocol.
    pub fn apply_settings(&self, settings: &ConnectorSettings) {
        self.credentials.set_credential(
            PROPERTY_SUBSCRIPTION_KEY,
            settings.subscription_key.trim(),
            settings.temporary,
        );
        self.preferences
            .set(PROPERTY_V2, &settings.use_legacy.to_string());
        self.preferences.set(
            PROPERTY_NEURAL,
            &(settings.use_legacy && settings.neural).to_string(),
        );
        self.preferences.set(PROPERTY_REGION, settings.region.trim());
        info!(use_legacy = settings.use_legacy, "connector settings applied");
    }

    pub fn settings(&self) -> ConnectorSettings {
        let subscription_key = self
            .credentials
            .get_credential(PROPERTY_SUBSCRIPTION_KEY)
            .unwrap_or_default();
        let temporary = !subscription_key.is_empty()
            && !self.credentials.is_persisted(PROPERTY_SUBSCRIPTION_KEY);
        let use_legacy = self.preferences.is_enabled(PROPERTY_V2);
        ConnectorSettings {
            subscription_key,
            temporary,
            region: self.preferences.get(PROPERTY_REGION).unwrap_or_default(),
            use_legacy,
            neural: use_legacy && self.preferences.is_enabled(PROPERTY_NEURAL),
        }
    }
}
