use boxlabel_core::{FieldSet, ImageLabel, NormalizedRect, Rotation};
use tracing::debug;

use crate::coordinator::{PassOutcome, PreprocessCoordinator};
use crate::labels::{LabelMap, LabelStore};
use crate::renderer::{Initialized, Renderer};
use crate::store::DerivedStore;
use crate::{ServiceConfig, ServiceError};

/// How [`AnnotationService::list_images`] treats preprocessing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListMode {
    /// Start a pass and list right away.
    #[default]
    Background,
    /// Wait for the pass (or the one already running) before listing.
    AwaitPreprocessing,
}

/// Entry point for the routing layer.
///
/// Cheap to clone; clones share the running set and the label write lock.
#[derive(Debug, Clone)]
pub struct AnnotationService {
    store: DerivedStore,
    coordinator: PreprocessCoordinator,
    labels: LabelStore,
    renderer: Renderer,
}

impl AnnotationService {
    pub fn new(config: &ServiceConfig) -> Self {
        let store = DerivedStore::from_config(config);
        let labels = LabelStore::new(store.clone());
        let coordinator = PreprocessCoordinator::new(
            store.clone(),
            config.compress,
            config.max_concurrent_images,
        );
        let renderer = Renderer::new(
            store.clone(),
            labels.clone(),
            config.overlay,
            config.render_quality,
        );
        Self {
            store,
            coordinator,
            labels,
            renderer,
        }
    }

    pub fn coordinator(&self) -> &PreprocessCoordinator {
        &self.coordinator
    }

    pub async fn list_source_images(&self, folder: &str) -> Result<Vec<String>, ServiceError> {
        self.store.list_source_images(folder).await
    }

    /// Source images of a folder, preprocessing it on the way.
    pub async fn list_images(&self, folder: &str, mode: ListMode) -> Result<Vec<String>, ServiceError> {
        match mode {
            ListMode::Background => {
                self.spawn_preprocessing(folder)?;
            }
            ListMode::AwaitPreprocessing => {
                if let PassOutcome::AlreadyRunning = self.trigger_preprocessing(folder).await? {
                    self.coordinator.wait_idle(folder).await;
                    debug!(folder, "concurrent pass finished");
                }
            }
        }
        self.list_source_images(folder).await
    }

    pub async fn trigger_preprocessing(&self, folder: &str) -> Result<PassOutcome, ServiceError> {
        self.coordinator.trigger(folder).await
    }

    /// Start a pass without waiting. Returns whether a new pass was started.
    pub fn spawn_preprocessing(&self, folder: &str) -> Result<bool, ServiceError> {
        Ok(self.coordinator.spawn(folder)?.is_some())
    }

    pub async fn reprocess(&self, folder: &str) -> Result<PassOutcome, ServiceError> {
        self.coordinator.reprocess(folder).await
    }

    pub async fn get_label(&self, folder: &str, image: &str) -> Result<Option<ImageLabel>, ServiceError> {
        self.labels.get(folder, image).await
    }

    pub async fn list_labels(&self, folder: &str) -> Result<LabelMap, ServiceError> {
        self.labels.list(folder).await
    }

    pub async fn field_set(&self, folder: &str) -> Result<Option<FieldSet>, ServiceError> {
        self.labels.load_field_set(folder).await
    }

    /// Store a label and re-render its processed image.
    ///
    /// The label is saved even when the image has not been preprocessed
    /// yet; the processed file is then created on first display.
    pub async fn save_label(&self, folder: &str, label: ImageLabel) -> Result<ImageLabel, ServiceError> {
        let saved = self.labels.save(folder, label).await?;
        self.refresh_processed(folder, &saved).await?;
        Ok(saved)
    }

    pub async fn remove_box(
        &self,
        folder: &str,
        image: &str,
        box_id: &str,
    ) -> Result<ImageLabel, ServiceError> {
        let label = self.labels.remove_box(folder, image, box_id).await?;
        self.refresh_processed(folder, &label).await?;
        Ok(label)
    }

    pub async fn render_processed(
        &self,
        folder: &str,
        image: &str,
        regions: &[NormalizedRect],
        rotation: Rotation,
    ) -> Result<(), ServiceError> {
        self.renderer
            .render_processed(folder, image, regions, rotation)
            .await
    }

    pub async fn reset_processed(&self, folder: &str, image: &str) -> Result<bool, ServiceError> {
        self.renderer.reset_processed(folder, image).await
    }

    pub async fn initialize_processed(
        &self,
        folder: &str,
        image: &str,
        rotation: Rotation,
    ) -> Result<Initialized, ServiceError> {
        self.renderer
            .initialize_processed(folder, image, rotation)
            .await
    }

    pub async fn rotate_processed(
        &self,
        folder: &str,
        image: &str,
        delta_degrees: i64,
    ) -> Result<ImageLabel, ServiceError> {
        self.renderer
            .rotate_processed(folder, image, delta_degrees)
            .await
    }

    /// Back to a blank, unrotated label with a fresh processed image.
    pub async fn reset_image(&self, folder: &str, image: &str) -> Result<ImageLabel, ServiceError> {
        self.renderer.reset_processed(folder, image).await?;
        let label = self.labels.save(folder, ImageLabel::new(image)).await?;
        self.refresh_processed(folder, &label).await?;
        Ok(label)
    }

    async fn refresh_processed(&self, folder: &str, label: &ImageLabel) -> Result<(), ServiceError> {
        match self.renderer.render_label(folder, label).await {
            Err(ServiceError::NotFound(what)) => {
                debug!(folder, image = %label.image_name, %what, "render deferred");
                Ok(())
            }
            other => other,
        }
    }
}
