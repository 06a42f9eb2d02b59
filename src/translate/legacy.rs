//! V2 translate endpoint: bearer token in the `appid` query parameter,
//! response is a single `<string>` element.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use super::http::{HttpRequest, HttpResponse, HttpTransport};
use super::token::{BearerToken, TokenProvider};
use super::{LanguagePair, TranslateError, TranslateResult};
use crate::metrics::{metric_names, MetricsRegistry};

pub const DEFAULT_LEGACY_URL: &str = "https://api.microsofttranslator.com/v2/http.svc/Translate";

/// The V2 endpoint answers an expired or invalid token with 400.
const AUTH_REJECTED: u16 = 400;

const NEURAL_CATEGORY: &str = "generalnn";

static RESPONSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^<string[^>]*>(.+)</string>$").unwrap());

pub struct LegacyRequester {
    url: String,
    tokens: TokenProvider,
    transport: Arc<dyn HttpTransport>,
    metrics: Arc<MetricsRegistry>,
}

impl LegacyRequester {
    pub fn new(
        url: impl Into<String>,
        tokens: TokenProvider,
        transport: Arc<dyn HttpTransport>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            url: url.into(),
            tokens,
            transport,
            metrics,
        }
    }

    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    /// Translate one segment. A 400 answer triggers one token refresh and
    /// one retry; a second rejection is returned as an error.
    pub async fn translate(
        &mut self,
        pair: &LanguagePair,
        text: &str,
        subscription_key: &str,
        neural: bool,
    ) -> TranslateResult<Option<String>> {
        let token = self.tokens.token(subscription_key).await?;
        let mut response = self.send(pair, text, &token, neural).await?;

        if response.status == AUTH_REJECTED {
            warn!(status = response.status, "re-fetching bearer token after rejection");
            self.metrics.incr(metric_names::TOKEN_REFRESH);
            self.tokens.invalidate();
            let token = self.tokens.acquire(subscription_key).await?;
            response = self.send(pair, text, &token, neural).await?;
        }

        if !response.is_success() {
            return Err(TranslateError::rejected(&response));
        }
        Ok(parse_response(&response.body))
    }

    async fn send(
        &self,
        pair: &LanguagePair,
        text: &str,
        token: &BearerToken,
        neural: bool,
    ) -> TranslateResult<HttpResponse> {
        let request = build_request(&self.url, pair, text, token, neural);
        self.metrics.incr(metric_names::TRANSLATE_ATTEMPT);
        let span = self.metrics.span(metric_names::T_TRANSLATE);
        let response = self.transport.send(request).await;
        span.finish();
        response
    }
}

fn build_request(
    url: &str,
    pair: &LanguagePair,
    text: &str,
    token: &BearerToken,
    neural: bool,
) -> HttpRequest {
    let request = HttpRequest::get(url)
        .query("appid", token.bearer())
        .query("text", text)
        .query("from", pair.source())
        .query("to", pair.target())
        .query("contentType", "text/plain");
    if neural {
        request.query("category", NEURAL_CATEGORY)
    } else {
        request
    }
}

/// Extract the payload of the `<string>` wrapper, or `None` when the body
/// has any other shape.
pub fn parse_response(body: &str) -> Option<String> {
    match RESPONSE_RE.captures(body.trim()) {
        Some(caps) => Some(caps[1].replace("&lt;", "<").replace("&gt;", ">")),
        None => {
            warn!(
                body = %body.chars().take(120).collect::<String>(),
                "unexpected response from translate endpoint"
            );
            None
        }
    }
}
