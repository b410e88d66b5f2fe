use axum::http::HeaderMap;
use serde_json::Value;
use crate::models::{
    errors::AppError,
    site_config::{OwnerClaim, SiteConfig},
};
use super::config_store::ConfigStore;

/// Header carrying the admin token on HTTP requests.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Query parameter and body field carrying the admin token.
pub const ADMIN_TOKEN_FIELD: &str = "adminToken";

/// Decides whether a caller may mutate state, given the current config.
pub trait AccessGuard {
    type Credential: ?Sized;

    fn permits(&self, config: &SiteConfig, credential: &Self::Credential) -> bool;
}

/// Shared-secret check for the HTTP front-end. Plain equality against
/// the configured `adminToken`; an unset or empty token denies everyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenGuard;

/// Owner check for the command front-end. Anyone may act until an owner
/// id is claimed; afterwards only that id may. A recorded owner that is not
/// an integer admits nobody.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityGuard;

impl AccessGuard for TokenGuard {
    type Credential = Option<String>;

    fn permits(&self, config: &SiteConfig, credential: &Option<String>) -> bool {
        match (config.admin_token(), credential.as_deref()) {
            (Some(expected), Some(supplied)) => !supplied.is_empty() && expected == supplied,
            _ => false,
        }
    }
}

impl AccessGuard for IdentityGuard {
    type Credential = i64;

    fn permits(&self, config: &SiteConfig, caller: &i64) -> bool {
        match config.claim() {
            OwnerClaim::Unclaimed => true,
            OwnerClaim::Owner(owner) => owner == *caller,
            OwnerClaim::Unrecognized => false,
        }
    }
}

impl TokenGuard {
    /// Pull the token from the header, the query string, or the JSON body,
    /// in that order. Empty values fall through to the next location.
    pub fn extract_token(
        headers: &HeaderMap,
        query_token: Option<&str>,
        body: Option<&Value>,
    ) -> Option<String> {
        let from_header = headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());
        let from_body = body
            .and_then(|body| body.get(ADMIN_TOKEN_FIELD))
            .and_then(Value::as_str);

        [from_header, query_token, from_body]
            .into_iter()
            .flatten()
            .find(|token| !token.is_empty())
            .map(str::to_string)
    }
}

/// Evaluate `guard` against a fresh read of the config store.
pub async fn authorize<G: AccessGuard>(
    guard: &G,
    store: &ConfigStore,
    credential: &G::Credential,
) -> Result<(), AppError> {
    let config = store.get().await;
    if guard.permits(&config, credential) {
        Ok(())
    } else {
        tracing::warn!("Rejected unauthorized mutation attempt");
        Err(AppError::unauthorized())
    }
}
