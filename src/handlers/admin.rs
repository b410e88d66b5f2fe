use axum::{
    async_trait,
    extract::{FromRequest, Query, Request},
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use crate::AppState;
use crate::models::errors::AppError;
use crate::services::access_guard::{authorize, TokenGuard};

#[derive(Debug, Default, Deserialize)]
struct TokenQuery {
    #[serde(rename = "adminToken")]
    admin_token: Option<String>,
}

/// Extractor for write routes: reads the optional JSON body and rejects
/// the request unless it carries the current admin token.
#[derive(Debug)]
pub struct AdminRequest {
    body: Option<Value>,
}

impl AdminRequest {
    /// Deserialize the body into `T`. A missing body counts as `{}`.
    pub fn parse<T: DeserializeOwned>(self) -> Result<T, AppError> {
        let body = self.body.unwrap_or_else(|| Value::Object(Default::default()));
        serde_json::from_value(body)
            .map_err(|e| AppError::validation_failed(format!("Invalid request body: {}", e)))
    }
}

#[async_trait]
impl FromRequest<AppState> for AdminRequest {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();

        let query_token = Query::<TokenQuery>::try_from_uri(&parts.uri)
            .map(|Query(query)| query.admin_token)
            .unwrap_or_default();

        let bytes = axum::body::to_bytes(body, state.config.max_body_size)
            .await
            .map_err(|e| AppError::validation_failed(format!("Failed to read request body: {}", e)))?;

        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            let value: Value = serde_json::from_slice(&bytes)
                .map_err(|e| AppError::validation_failed(format!("Malformed JSON body: {}", e)))?;
            Some(value)
        };

        let token = TokenGuard::extract_token(&parts.headers, query_token.as_deref(), body.as_ref());
        authorize(&TokenGuard, &state.site_config, &token).await?;

        Ok(AdminRequest { body })
    }
}
