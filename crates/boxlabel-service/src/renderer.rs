//! Processed tier: the preprocessed image rotated for display, with the
//! label's regions outlined on top.

use boxlabel_core::decode::decode_upright;
use boxlabel_core::encode::encode_image;
use boxlabel_core::{render_display, ImageLabel, NormalizedRect, OverlayStyle, Rotation};
use tracing::debug;

use crate::labels::LabelStore;
use crate::store::{self, DerivedStore, Tier};
use crate::ServiceError;

/// Result of [`Renderer::initialize_processed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Initialized {
    /// A processed file was written by this call.
    pub created: bool,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    store: DerivedStore,
    labels: LabelStore,
    style: OverlayStyle,
    quality: u8,
}

impl Renderer {
    pub fn new(store: DerivedStore, labels: LabelStore, style: OverlayStyle, quality: u8) -> Self {
        Self {
            store,
            labels,
            style,
            quality,
        }
    }

    /// Write the processed file from the preprocessed one.
    ///
    /// With no regions and no rotation the preprocessed bytes are copied
    /// as they are.
    ///
    /// # Errors
    ///
    /// `ServiceError::NotFound` if the image has not been preprocessed.
    pub async fn render_processed(
        &self,
        folder: &str,
        image: &str,
        regions: &[NormalizedRect],
        rotation: Rotation,
    ) -> Result<(), ServiceError> {
        let src = self.store.tier_path(folder, image, Tier::Preprocessed)?;
        let dest = self.store.tier_path(folder, image, Tier::Processed)?;
        let bytes = store::read_optional(&src)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("preprocessed image {folder}/{image}")))?;

        let output = if regions.is_empty() && rotation == Rotation::None {
            bytes
        } else {
            let regions = regions.to_vec();
            let style = self.style;
            let quality = self.quality;
            tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ServiceError> {
                let decoded = decode_upright(&bytes)?;
                let rendered = render_display(&decoded, rotation, &regions, &style);
                Ok(encode_image(&rendered, quality)?)
            })
            .await??
        };

        store::write_atomic(&dest, &output).await?;
        debug!(
            folder,
            image,
            regions = regions.len(),
            rotation = rotation.degrees(),
            "processed image written"
        );
        Ok(())
    }

    /// Render `label`, outlining its regions unless the folder's field set
    /// turns box drawing off.
    pub async fn render_label(&self, folder: &str, label: &ImageLabel) -> Result<(), ServiceError> {
        let draw_boxes = self
            .labels
            .load_field_set(folder)
            .await?
            .is_none_or(|fields| fields.draw_boxes_on_image);
        let regions = if draw_boxes {
            label.region_rects()
        } else {
            Vec::new()
        };
        self.render_processed(folder, &label.image_name, &regions, label.rotation)
            .await
    }

    /// Remove the processed file. Returns whether one existed.
    pub async fn reset_processed(&self, folder: &str, image: &str) -> Result<bool, ServiceError> {
        let path = self.store.tier_path(folder, image, Tier::Processed)?;
        store::remove_if_exists(&path).await
    }

    /// Make sure a processed file exists.
    ///
    /// An existing file is left alone. Otherwise the stored label decides
    /// rotation and regions; without a label, `rotation` is used and no
    /// regions are drawn.
    pub async fn initialize_processed(
        &self,
        folder: &str,
        image: &str,
        rotation: Rotation,
    ) -> Result<Initialized, ServiceError> {
        let dest = self.store.tier_path(folder, image, Tier::Processed)?;
        if store::file_exists(&dest).await? {
            return Ok(Initialized { created: false });
        }

        match self.labels.get(folder, image).await? {
            Some(label) => self.render_label(folder, &label).await?,
            None => self.render_processed(folder, image, &[], rotation).await?,
        }
        Ok(Initialized { created: true })
    }

    /// Rotate the displayed image by `delta_degrees` and store the new label.
    ///
    /// Regions no longer match the rotated frame, so they are dropped; only
    /// the first record's fields survive, as image-level fields.
    pub async fn rotate_processed(
        &self,
        folder: &str,
        image: &str,
        delta_degrees: i64,
    ) -> Result<ImageLabel, ServiceError> {
        self.reset_processed(folder, image).await?;

        let current = self
            .labels
            .get(folder, image)
            .await?
            .unwrap_or_else(|| ImageLabel::new(image));
        let rotated = current.rotated(delta_degrees);

        self.render_processed(folder, image, &[], rotated.rotation)
            .await?;
        self.labels.save(folder, rotated).await
    }
}
