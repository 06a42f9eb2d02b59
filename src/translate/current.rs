//! V3 translate endpoint: JSON array body, JSON array response.
//! Authenticates with key + region headers, or with a bearer token when the
//! service is configured for `CurrentAuth::Token`.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::http::{HttpRequest, HttpResponse, HttpTransport};
use super::token::{TokenProvider, SUBSCRIPTION_KEY_HEADER, SUBSCRIPTION_REGION_HEADER};
use super::{CurrentAuth, LanguagePair, TranslateError, TranslateResult};
use crate::metrics::{metric_names, MetricsRegistry};

pub const DEFAULT_CURRENT_URL: &str = "https://api.cognitive.microsofttranslator.com/translate";

const API_VERSION: &str = "3.0";

/// V3 answers an expired bearer token with 401.
const AUTH_REJECTED: u16 = 401;

#[derive(Serialize)]
struct TextItem<'a> {
    text: &'a str,
}

enum Authenticator {
    Key,
    Token(TokenProvider),
}

pub struct CurrentRequester {
    url: String,
    auth: Authenticator,
    transport: Arc<dyn HttpTransport>,
    metrics: Arc<MetricsRegistry>,
}

impl CurrentRequester {
    /// Requester that sends the subscription key and region as headers.
    pub fn with_key(
        url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            url: url.into(),
            auth: Authenticator::Key,
            transport,
            metrics,
        }
    }

    /// Requester that exchanges the key for a bearer token first.
    pub fn with_token(
        url: impl Into<String>,
        tokens: TokenProvider,
        transport: Arc<dyn HttpTransport>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            url: url.into(),
            auth: Authenticator::Token(tokens),
            transport,
            metrics,
        }
    }

    pub fn auth_mode(&self) -> CurrentAuth {
        match self.auth {
            Authenticator::Key => CurrentAuth::Key,
            Authenticator::Token(_) => CurrentAuth::Token,
        }
    }

    pub async fn translate(
        &mut self,
        pair: &LanguagePair,
        text: &str,
        subscription_key: &str,
        region: Option<&str>,
    ) -> TranslateResult<Option<String>> {
        let body = request_body(text)?;
        let base = HttpRequest::post(&self.url)
            .query("api-version", API_VERSION)
            .query("from", pair.source())
            .query("to", pair.target())
            .header("Content-Type", "application/json")
            .body(body);

        let response = match &mut self.auth {
            Authenticator::Key => {
                if subscription_key.trim().is_empty() {
                    return Err(TranslateError::MissingCredential);
                }
                let mut request = base.header(SUBSCRIPTION_KEY_HEADER, subscription_key);
                if let Some(region) = region.filter(|r| !r.trim().is_empty()) {
                    request = request.header(SUBSCRIPTION_REGION_HEADER, region.trim());
                }
                send(&*self.transport, &self.metrics, request).await?
            }
            Authenticator::Token(tokens) => {
                let token = tokens.token(subscription_key).await?;
                let request = base.clone().header("Authorization", token.bearer());
                let response = send(&*self.transport, &self.metrics, request).await?;
                if response.status == AUTH_REJECTED {
                    warn!(status = response.status, "re-fetching bearer token after rejection");
                    self.metrics.incr(metric_names::TOKEN_REFRESH);
                    tokens.invalidate();
                    let token = tokens.acquire(subscription_key).await?;
                    let retry = base.header("Authorization", token.bearer());
                    send(&*self.transport, &self.metrics, retry).await?
                } else {
                    response
                }
            }
        };

        if !response.is_success() {
            return Err(TranslateError::rejected(&response));
        }
        Ok(parse_response(&response.body))
    }
}

async fn send(
    transport: &dyn HttpTransport,
    metrics: &Arc<MetricsRegistry>,
    request: HttpRequest,
) -> TranslateResult<HttpResponse> {
    metrics.incr(metric_names::TRANSLATE_ATTEMPT);
    let span = metrics.span(metric_names::T_TRANSLATE);
    let response = transport.send(request).await;
    span.finish();
    response
}

/// `[{"text": ...}]` with full JSON string escaping.
pub fn request_body(text: &str) -> TranslateResult<String> {
    serde_json::to_string(&[TextItem { text }])
        .map_err(|e| TranslateError::Transport(format!("encode request body: {e}")))
}

/// First translation of the first result, or `None` when any level is missing.
pub fn parse_response(body: &str) -> Option<String> {
    let root: Value = match serde_json::from_str(body) {
        Ok(root) => root,
        Err(e) => {
            warn!(error = %e, "translate response is not JSON");
            return None;
        }
    };
    let text = root
        .get(0)
        .and_then(|result| result.get("translations"))
        .and_then(|translations| translations.get(0))
        .and_then(|translation| translation.get("text"))
        .and_then(Value::as_str);
    if text.is_none() {
        warn!("translate response has no translations[0].text");
    }
    text.map(str::to_string)
}
