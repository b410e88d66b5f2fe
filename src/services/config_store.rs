use std::path::PathBuf;
use crate::models::{
    errors::AppError,
    site_config::{SiteConfig, SiteConfigPatch},
};
use super::{access_guard::AccessGuard, json_file::JsonDocument};

/// Site settings, read through from disk on every call so edits made by
/// either front-end take effect immediately.
#[derive(Debug)]
pub struct ConfigStore {
    document: JsonDocument<SiteConfig>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            document: JsonDocument::new(path),
        }
    }

    /// Current config, or an empty record when the file is absent or corrupt.
    pub async fn get(&self) -> SiteConfig {
        self.document.load().await
    }

    /// Merge the allow-listed fields of `patch`, persist, and return the
    /// merged record.
    pub async fn update(&self, patch: SiteConfigPatch) -> Result<SiteConfig, AppError> {
        let updated = self
            .document
            .mutate(|config| {
                config.apply(patch);
                Ok(config.clone())
            })
            .await?;

        tracing::info!("Site config updated");
        Ok(updated)
    }

    /// Like [`ConfigStore::update`], but `guard` is evaluated against the
    /// record being rewritten while the document lock is held, so a
    /// concurrent change of the guarded fields cannot slip in between.
    pub async fn update_if<G: AccessGuard>(
        &self,
        guard: &G,
        credential: &G::Credential,
        patch: SiteConfigPatch,
    ) -> Result<SiteConfig, AppError> {
        let updated = self
            .document
            .mutate(|config| {
                if !guard.permits(config, credential) {
                    tracing::warn!("Rejected unauthorized config change");
                    return Err(AppError::unauthorized());
                }
                config.apply(patch);
                Ok(config.clone())
            })
            .await?;

        tracing::info!("Site config updated");
        Ok(updated)
    }
}
