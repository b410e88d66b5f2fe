use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

const TITLE_KEY: &str = "title";
const DESCRIPTION_KEY: &str = "description";
const BANNER_URL_KEY: &str = "bannerUrl";
const ADMIN_TOKEN_KEY: &str = "adminToken";
const OWNER_KEY: &str = "ownerTelegramId";

/// The singleton site settings record stored in the Config document.
///
/// Reading never fails on a field of the wrong type. Such a value stays in
/// `extra` under its own key, so it is written back unchanged and the typed
/// field reads as unset. The owner id is the exception: see [`OwnerId`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", from = "Map<String, Value>")]
pub struct SiteConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_telegram_id: Option<OwnerId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The stored `ownerTelegramId`. Anything that is not an integer is kept
/// verbatim and locks the command front-end until it is replaced.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum OwnerId {
    Id(i64),
    Unrecognized(Value),
}

/// Who may run mutating commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerClaim {
    Unclaimed,
    Owner(i64),
    /// An owner is recorded but no sender id can equal it.
    Unrecognized,
}

impl From<Map<String, Value>> for SiteConfig {
    fn from(mut raw: Map<String, Value>) -> Self {
        let owner_telegram_id = match raw.remove(OWNER_KEY) {
            None | Some(Value::Null) => None,
            Some(value) => Some(match value.as_i64() {
                Some(id) => OwnerId::Id(id),
                None => OwnerId::Unrecognized(value),
            }),
        };

        SiteConfig {
            title: take_text(&mut raw, TITLE_KEY),
            description: take_text(&mut raw, DESCRIPTION_KEY),
            banner_url: take_text(&mut raw, BANNER_URL_KEY),
            admin_token: take_text(&mut raw, ADMIN_TOKEN_KEY),
            owner_telegram_id,
            extra: raw,
        }
    }
}

/// Moves `key` out of `raw` only when it holds a string.
fn take_text(raw: &mut Map<String, Value>, key: &str) -> Option<String> {
    match raw.remove(key) {
        Some(Value::String(text)) => Some(text),
        None | Some(Value::Null) => None,
        Some(other) => {
            raw.insert(key.to_string(), other);
            None
        }
    }
}

impl SiteConfig {
    /// The configured admin token, if one is set and non-empty.
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref().filter(|token| !token.is_empty())
    }

    /// The owner claim. Zero, `false` and `""` count as unclaimed.
    pub fn claim(&self) -> OwnerClaim {
        match &self.owner_telegram_id {
            None | Some(OwnerId::Id(0)) => OwnerClaim::Unclaimed,
            Some(OwnerId::Id(id)) => OwnerClaim::Owner(*id),
            Some(OwnerId::Unrecognized(raw)) if is_falsy(raw) => OwnerClaim::Unclaimed,
            Some(OwnerId::Unrecognized(_)) => OwnerClaim::Unrecognized,
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("API Site")
    }

    /// Merges the allow-listed fields present in `patch`. A field that is
    /// set replaces any unreadable value kept under the same key.
    pub fn apply(&mut self, patch: SiteConfigPatch) {
        if let Some(title) = patch.title {
            self.extra.remove(TITLE_KEY);
            self.title = Some(title);
        }
        if let Some(description) = patch.description {
            self.extra.remove(DESCRIPTION_KEY);
            self.description = Some(description);
        }
        if let Some(banner_url) = patch.banner_url {
            self.extra.remove(BANNER_URL_KEY);
            self.banner_url = Some(banner_url);
        }
        if let Some(admin_token) = patch.admin_token {
            self.extra.remove(ADMIN_TOKEN_KEY);
            self.admin_token = admin_token;
        }
        if let Some(owner) = patch.owner_telegram_id {
            self.owner_telegram_id = owner.map(OwnerId::Id);
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => !flag,
        Value::String(text) => text.is_empty(),
        Value::Number(number) => number.as_f64() == Some(0.0),
        _ => false,
    }
}
