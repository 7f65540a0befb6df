use std::path::PathBuf;

pub type ImageId = u64;

/// A user-chosen image file. `id` identifies the preview owned for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageFile {
    pub id: ImageId,
    pub path: PathBuf,
}

impl ImageFile {
    pub fn new(id: ImageId, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }
}

/// What the user has entered before starting a run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchInputs {
    pub main_image: Option<ImageFile>,
    pub extra_images: Vec<ImageFile>,
    pub text: String,
    pub item_name: String,
}

impl SearchInputs {
    pub(crate) fn text_field(&self) -> Option<String> {
        non_blank(&self.text)
    }

    pub(crate) fn item_name_field(&self) -> Option<String> {
        non_blank(&self.item_name)
    }

    /// Every image currently held, main image first.
    pub(crate) fn all_images(&self) -> impl Iterator<Item = &ImageFile> {
        self.main_image.iter().chain(self.extra_images.iter())
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
