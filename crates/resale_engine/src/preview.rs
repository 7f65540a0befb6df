use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;

use bytes::Bytes;
use engine_logging::{engine_debug, engine_warn};
use resale_core::{ImageFile, ImageId};

use crate::form::guess_mime;
use crate::{FailureKind, FetchError};

/// In-memory preview of a selected image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub bytes: Bytes,
    pub mime: &'static str,
}

/// Owns one preview per image id and releases each exactly once.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    previews: HashMap<ImageId, Preview>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the preview unless one is already cached for this id.
    pub fn acquire(&mut self, image: &ImageFile) -> Result<&Preview, FetchError> {
        match self.previews.entry(image.id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let bytes = fs::read(&image.path).map_err(|err| {
                    FetchError::new(
                        FailureKind::Io,
                        format!("failed to read {}: {err}", image.path.display()),
                    )
                })?;
                engine_debug!("Preview acquired image_id={} bytes={}", image.id, bytes.len());
                Ok(entry.insert(Preview {
                    bytes: Bytes::from(bytes),
                    mime: guess_mime(&image.path),
                }))
            }
        }
    }

    pub fn get(&self, image_id: ImageId) -> Option<&Preview> {
        self.previews.get(&image_id)
    }

    /// Returns `false` when nothing was held for `image_id`.
    pub fn release(&mut self, image_id: ImageId) -> bool {
        if self.previews.remove(&image_id).is_some() {
            engine_debug!("Preview released image_id={}", image_id);
            true
        } else {
            engine_warn!("Preview release for unknown image_id={}", image_id);
            false
        }
    }

    pub fn len(&self) -> usize {
        self.previews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previews.is_empty()
    }
}

impl Drop for PreviewRegistry {
    fn drop(&mut self) {
        if !self.previews.is_empty() {
            engine_warn!(
                "Releasing {} previews that were never released",
                self.previews.len()
            );
        }
    }
}
