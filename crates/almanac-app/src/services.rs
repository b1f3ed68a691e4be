//! Service wiring and the depot handler that shares it with routes.

use std::sync::Arc;
use std::time::Duration;

use salvo::async_trait;

use almanac_core::config::Settings;
use almanac_core::error::CoreError;
use almanac_db::db::DbProvider;
use almanac_service::candidates::CandidateService;
use almanac_service::extraction::{BatchExtractor, CompletionClient, HttpCompletionClient};
use almanac_service::import::Importer;
use almanac_service::pipeline::Pipeline;
use almanac_service::series::SeriesService;
use almanac_service::storage::{LocalObjectStorage, ObjectStorage};
use almanac_service::store::PgStore;
use almanac_service::text_extract::{DocumentTextExtractor, RemoteOcrExtractor, TextExtractor};

use crate::error::AppResult;

/// Everything a request handler may call into.
pub struct AppServices {
    pub provider: Arc<dyn DbProvider + Send + Sync>,
    pub pipeline: Pipeline,
    pub importer: Importer,
    pub series: SeriesService,
    pub candidates: CandidateService,
}

impl AppServices {
    /// ## Summary
    /// Builds the Postgres-backed services from settings.
    ///
    /// ## Errors
    /// Returns an error if an HTTP client for the completion or OCR service
    /// cannot be constructed.
    pub fn build(
        provider: Arc<dyn DbProvider + Send + Sync>,
        settings: &Settings,
    ) -> anyhow::Result<Self> {
        let store = Arc::new(PgStore::new(provider.clone()));
        let storage: Arc<dyn ObjectStorage> =
            Arc::new(LocalObjectStorage::new(&settings.storage.root));

        let ocr = match &settings.ocr {
            Some(ocr) => {
                let timeout = Duration::from_secs(settings.extraction.request_timeout_secs);
                let extractor = RemoteOcrExtractor::from_config(ocr, timeout)?;
                Some(Box::new(extractor) as Box<dyn TextExtractor>)
            }
            None => {
                tracing::info!("No OCR endpoint configured, only text documents can be processed");
                None
            }
        };
        let text: Arc<dyn TextExtractor> = Arc::new(DocumentTextExtractor::new(ocr));

        let client: Arc<dyn CompletionClient> =
            Arc::new(HttpCompletionClient::from_config(&settings.extraction)?);
        let extractor = BatchExtractor::from_config(client, &settings.extraction);

        Ok(Self {
            provider,
            pipeline: Pipeline::new(
                store.clone(),
                store.clone(),
                storage,
                text,
                extractor,
                settings.pipeline.clone(),
            ),
            importer: Importer::new(store.clone(), store.clone()),
            series: SeriesService::new(store.clone()),
            candidates: CandidateService::new(store.clone(), store),
        })
    }
}

pub struct ServicesHandler {
    pub services: Arc<AppServices>,
}

#[async_trait]
impl salvo::Handler for ServicesHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(self.services.clone());
    }
}

/// ## Summary
/// Retrieves the application services from the depot.
///
/// ## Errors
/// Returns an error if the services were not injected for this request.
pub fn get_services_from_depot(depot: &salvo::Depot) -> AppResult<Arc<AppServices>> {
    depot
        .obtain::<Arc<AppServices>>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Services not found in depot").into())
}
