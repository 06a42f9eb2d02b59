//! Translation pipeline: language mapping, token exchange, the two wire
//! protocols, the response cache and the serialized service facade.

pub mod cache;
pub mod current;
pub mod http;
pub mod lang;
pub mod legacy;
pub mod service;
pub mod token;

use serde::{Deserialize, Serialize};

pub use cache::ResponseCache;
pub use http::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};
pub use service::TranslationService;

/// Source and target codes already mapped to the vendor's identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguagePair {
    source: String,
    target: String,
}

impl LanguagePair {
    /// Build a pair from application language tags, normalizing both.
    pub fn from_tags(source_tag: &str, target_tag: &str) -> Self {
        Self {
            source: lang::normalize(source_tag),
            target: lang::normalize(target_tag),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl std::fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

/// Which vendor wire protocol serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// V2: query parameters in, `<string>` XML out, bearer token required.
    Legacy,
    /// V3: JSON array in, JSON array out.
    Current,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Legacy => write!(f, "v2"),
            Protocol::Current => write!(f, "v3"),
        }
    }
}

/// How the current protocol authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrentAuth {
    /// Subscription key and optional region sent as headers.
    #[default]
    Key,
    /// Key exchanged for a bearer token, sent as `Authorization`.
    Token,
}

/// Hard failures of the pipeline.
///
/// A response that arrives but cannot be understood is not an error: the
/// requesters return `Ok(None)` for it.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("subscription key is not configured")]
    MissingCredential,

    #[error("request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TranslateError {
    /// Build a rejection from a non-success response, keeping a short body excerpt.
    pub fn rejected(response: &HttpResponse) -> Self {
        TranslateError::Rejected {
            status: response.status,
            body: response.body.chars().take(200).collect(),
        }
    }
}

pub type TranslateResult<T> = Result<T, TranslateError>;
