//! Subscription key to bearer token exchange.
//! The token is held until a translate endpoint rejects it; there is no
//! expiry timer.

use std::sync::Arc;

use tracing::{debug, info};

use super::http::{HttpRequest, HttpTransport};
use super::{TranslateError, TranslateResult};
use crate::metrics::{metric_names, MetricsRegistry};

pub const DEFAULT_TOKEN_URL: &str = "https://api.cognitive.microsoft.com/sts/v1.0/issueToken";

pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
pub const SUBSCRIPTION_REGION_HEADER: &str = "Ocp-Apim-Subscription-Region";

/// Opaque signed token returned by the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Bearer <token>`, the form both endpoints expect.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(..)")
    }
}

pub struct TokenProvider {
    endpoint: String,
    transport: Arc<dyn HttpTransport>,
    metrics: Arc<MetricsRegistry>,
    token: Option<BearerToken>,
}

impl TokenProvider {
    pub fn new(
        endpoint: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
            metrics,
            token: None,
        }
    }

    pub fn current(&self) -> Option<&BearerToken> {
        self.token.as_ref()
    }

    /// Drop the held token so the next `token` call fetches a fresh one.
    pub fn invalidate(&mut self) {
        if self.token.take().is_some() {
            debug!("bearer token discarded");
        }
    }

    /// The held token, fetching one first if none is held.
    pub async fn token(&mut self, subscription_key: &str) -> TranslateResult<BearerToken> {
        match &self.token {
            Some(token) => Ok(token.clone()),
            None => self.acquire(subscription_key).await,
        }
    }

    /// Exchange the key for a new token, replacing any held one.
    pub async fn acquire(&mut self, subscription_key: &str) -> TranslateResult<BearerToken> {
        if subscription_key.trim().is_empty() {
            return Err(TranslateError::MissingCredential);
        }

        let request = HttpRequest::post(&self.endpoint)
            .header(SUBSCRIPTION_KEY_HEADER, subscription_key)
            .header("Content-Type", "application/json")
            .header("Accept", "application/jwt")
            .body("");

        self.metrics.incr(metric_names::TOKEN_REQUEST);
        let span = self.metrics.span(metric_names::T_TOKEN);
        let response = self.transport.send(request).await?;
        span.finish();

        if !response.is_success() {
            return Err(TranslateError::rejected(&response));
        }
        let raw = response.body.trim();
        if raw.is_empty() {
            return Err(TranslateError::Transport(
                "token endpoint returned an empty body".into(),
            ));
        }

        let token = BearerToken::new(raw);
        self.token = Some(token.clone());
        info!("bearer token acquired");
        Ok(token)
    }
}
