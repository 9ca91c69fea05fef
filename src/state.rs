use std::sync::Arc;

use crate::{
    bria::BriaClient, config::Config, page::PageRenderer, session::SessionStore,
    storage::ArtifactStore,
};

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub bria: Arc<BriaClient>,
    pub artifacts: Arc<ArtifactStore>,
    pub pages: Arc<PageRenderer>,
    pub keep_uploads: bool,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            sessions: Arc::new(SessionStore::new(
                config.default_api_key.clone(),
                config.session_ttl_secs,
            )),
            bria: Arc::new(BriaClient::new(config.api_base.clone())),
            artifacts: Arc::new(ArtifactStore::new(config.static_dir.clone())),
            pages: Arc::new(PageRenderer::new()?),
            keep_uploads: config.keep_uploads,
            max_upload_bytes: config.max_upload_mb * 1024 * 1024,
        })
    }
}
