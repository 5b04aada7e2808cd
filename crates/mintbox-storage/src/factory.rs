#[cfg(feature = "storage-github")]
use crate::GitHubStore;
#[cfg(not(feature = "storage-github"))]
use crate::StoreError;
use crate::{AssetStore, StoreResult};
use mintbox_core::EditorConfig;
use std::sync::Arc;

/// Create the remote store described by the configuration
pub fn create_store(config: &EditorConfig) -> StoreResult<Arc<dyn AssetStore>> {
    #[cfg(feature = "storage-github")]
    {
        let settings = &config.github;
        let timeout = settings.timeout_secs.map(std::time::Duration::from_secs);
        let store = GitHubStore::new(&settings.api_url, &settings.api_version, timeout)?;
        tracing::debug!(api_url = %settings.api_url, "Created GitHub store");
        Ok(Arc::new(store))
    }

    #[cfg(not(feature = "storage-github"))]
    {
        let _ = config;
        Err(StoreError::Config(
            "GitHub store not available (storage-github feature not enabled)".to_string(),
        ))
    }
}
