//! Host-side preference and credential stores.
//! The host application owns persistence; the connector only reads and
//! writes through these traits.

use std::collections::HashMap;

use parking_lot::RwLock;

pub const PROPERTY_V2: &str = "microsoft.v2";
pub const PROPERTY_NEURAL: &str = "microsoft.neural";
pub const PROPERTY_REGION: &str = "microsoft.api.region";
pub const PROPERTY_SUBSCRIPTION_KEY: &str = "microsoft.api.subscription_key";

pub trait Preferences: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;

    fn set(&self, name: &str, value: &str);

    /// `true` only for a stored value of `"true"` (any case).
    fn is_enabled(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }
}

pub trait CredentialStore: Send + Sync {
    /// The credential, or `None` when unset or empty.
    fn get_credential(&self, id: &str) -> Option<String>;

    /// Store a credential. A temporary credential lives for the session only
    /// and clears any persisted value.
    fn set_credential(&self, id: &str, value: &str, temporary: bool);

    /// Whether a non-empty value survives the session.
    fn is_persisted(&self, id: &str) -> bool;
}

#[derive(Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Preferences for MemoryPreferences {
    fn get(&self, name: &str) -> Option<String> {
        self.values.read().get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) {
        self.values.write().insert(name.to_string(), value.to_string());
    }
}

/// Two-tier credential store: session values shadow persisted ones.
#[derive(Default)]
pub struct MemoryCredentialStore {
    session: RwLock<HashMap<String, String>>,
    persisted: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get_credential(&self, id: &str) -> Option<String> {
        if let Some(value) = self.session.read().get(id) {
            return Some(value.clone()).filter(|v| !v.is_empty());
        }
        self.persisted
            .read()
            .get(id)
            .cloned()
            .filter(|v| !v.is_empty())
    }

    fn set_credential(&self, id: &str, value: &str, temporary: bool) {
        self.session.write().insert(id.to_string(), value.to_string());
        let persisted = if temporary { "" } else { value };
        self.persisted
            .write()
            .insert(id.to_string(), persisted.to_string());
    }

    fn is_persisted(&self, id: &str) -> bool {
        self.persisted
            .read()
            .get(id)
            .is_some_and(|v| !v.is_empty())
    }
}

/// Everything the host's configuration dialog edits.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectorSettings {
    pub subscription_key: String,
    pub temporary: bool,
    pub region: String,
    pub use_legacy: bool,
    pub neural: bool,
}

impl std::fmt::Debug for ConnectorSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorSettings")
            .field("subscription_key", &"..")
            .field("temporary", &self.temporary)
            .field("region", &self.region)
            .field("use_legacy", &self.use_legacy)
            .field("neural", &self.neural)
            .finish()
    }
}
