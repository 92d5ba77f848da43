use crate::core::session::KeggSession;
use crate::domain::model::{KoList, MapRequest, RetrievalOutcome};
use crate::domain::ports::{ConfigProvider, FormBrowser, Storage};
use crate::utils::error::Result;

/// Runs one colour-pathway request from KO file to image file.
pub struct ColorMapper<B: FormBrowser, S: Storage, C: ConfigProvider> {
    session: KeggSession<B, S, C>,
}

impl<B: FormBrowser, S: Storage, C: ConfigProvider> ColorMapper<B, S, C> {
    pub fn new(browser: B, storage: S, config: C) -> Self {
        Self {
            session: KeggSession::new(browser, storage, config),
        }
    }

    pub fn session(&self) -> &KeggSession<B, S, C> {
        &self.session
    }

    pub async fn run(&mut self, request: &MapRequest) -> Result<RetrievalOutcome> {
        tracing::info!("📁 Reading KO list from {}", request.ko_file);
        let data = self.session.storage().read_file(&request.ko_file).await?;
        let kos = KoList::from_bytes(&data);
        if kos.is_empty() {
            tracing::warn!("🔶 KO list {} is empty", request.ko_file);
        } else {
            tracing::info!("Loaded {} KOs", kos.len());
        }

        self.session.initialize().await?;
        self.session
            .search_pathways(&kos.ids, &request.color, request.organism.as_deref())
            .await?;

        let outcome = self
            .session
            .get_pathway_from_submission(&request.pathway, &request.output)
            .await?;

        if let RetrievalOutcome::Downloaded { path, bytes, .. } = &outcome {
            tracing::info!("✅ Saved {} ({} bytes)", path, bytes);
        }
        Ok(outcome)
    }
}
