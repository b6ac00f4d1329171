//! `labels.json` and `fields.json` access.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use boxlabel_core::{FieldSet, ImageLabel};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::debug;

use crate::store::{self, DerivedStore};
use crate::ServiceError;

/// Image name to label, as stored in a folder's `labels.json`.
pub type LabelMap = BTreeMap<String, ImageLabel>;

/// Reads and writes label maps. Writes through one store are serialized.
#[derive(Debug, Clone)]
pub struct LabelStore {
    store: DerivedStore,
    write_lock: Arc<Mutex<()>>,
}

impl LabelStore {
    pub fn new(store: DerivedStore) -> Self {
        Self {
            store,
            write_lock: Arc::default(),
        }
    }

    pub async fn get(&self, folder: &str, image: &str) -> Result<Option<ImageLabel>, ServiceError> {
        store::validate_name(image)?;
        let mut map = self.read_map(folder).await?;
        Ok(map.remove(image))
    }

    pub async fn list(&self, folder: &str) -> Result<LabelMap, ServiceError> {
        self.read_map(folder).await
    }

    /// Normalize `label` and replace its entry.
    pub async fn save(&self, folder: &str, label: ImageLabel) -> Result<ImageLabel, ServiceError> {
        store::validate_name(&label.image_name)?;
        let image = label.image_name.clone();
        self.update(folder, &image, |_| Ok(label)).await
    }

    /// Read-modify-write one entry under the write lock.
    ///
    /// `edit` receives the current label, if any, and returns the new one,
    /// which is normalized before it is stored.
    pub async fn update<F>(&self, folder: &str, image: &str, edit: F) -> Result<ImageLabel, ServiceError>
    where
        F: FnOnce(Option<ImageLabel>) -> Result<ImageLabel, ServiceError>,
    {
        store::validate_name(image)?;
        let path = self.store.labels_path(folder)?;
        let _writer = self.write_lock.lock().await;

        let mut map = self.read_map(folder).await?;
        let mut label = edit(map.remove(image))?;
        label.image_name = image.to_string();
        label.normalize();
        map.insert(image.to_string(), label.clone());

        let json = serde_json::to_vec_pretty(&map).map_err(|source| ServiceError::Json {
            path: path.clone(),
            source,
        })?;
        store::write_atomic(&path, &json).await?;
        debug!(folder, image, boxes = label.boxes.len(), "label saved");
        Ok(label)
    }

    /// Delete a region from a stored label.
    pub async fn remove_box(
        &self,
        folder: &str,
        image: &str,
        box_id: &str,
    ) -> Result<ImageLabel, ServiceError> {
        self.update(folder, image, |current| {
            let mut label =
                current.ok_or_else(|| ServiceError::NotFound(format!("label for {image}")))?;
            label.remove_box(box_id)?;
            Ok(label)
        })
        .await
    }

    /// The folder's field set, preferring the labeled copy over the raw one.
    pub async fn load_field_set(&self, folder: &str) -> Result<Option<FieldSet>, ServiceError> {
        let labeled = self.store.fields_path(folder)?;
        if let Some(fields) = read_json(&labeled).await? {
            return Ok(Some(fields));
        }
        read_json(&self.store.raw_fields_path(folder)?).await
    }

    async fn read_map(&self, folder: &str) -> Result<LabelMap, ServiceError> {
        let path = self.store.labels_path(folder)?;
        Ok(read_json(&path).await?.unwrap_or_default())
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ServiceError> {
    let Some(bytes) = store::read_optional(path).await? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| ServiceError::Json {
            path: path.to_path_buf(),
            source,
        })
}
