use std::path::Path;

use reqwest::multipart::{Form, Part};
use resale_core::{ImageFile, LensRequest, RunRequest};

use crate::{FailureKind, FetchError};

/// Best-effort MIME type from the file extension.
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

async fn image_part(image: &ImageFile) -> Result<Part, FetchError> {
    let bytes = tokio::fs::read(&image.path).await.map_err(|err| {
        FetchError::new(
            FailureKind::Io,
            format!("failed to read {}: {err}", image.path.display()),
        )
    })?;
    let file_name = image
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("image-{}", image.id));
    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(guess_mime(&image.path))
        .map_err(|err| FetchError::new(FailureKind::InvalidInput, err.to_string()))
}

/// Multipart body for `/api/py/extract-file-stream`.
pub(crate) async fn run_form(request: &RunRequest) -> Result<Form, FetchError> {
    let mut form = Form::new().part("main_image", image_part(&request.main_image).await?);
    for image in &request.extra_images {
        form = form.part("files", image_part(image).await?);
    }
    if let Some(text) = &request.text {
        form = form.text("text", text.clone());
    }
    if let Some(item_name) = &request.item_name {
        form = form.text("itemName", item_name.clone());
    }
    Ok(form.text("mode", request.mode.as_str()))
}

/// Multipart body for the candidate lookup.
pub(crate) async fn lens_form(request: &LensRequest) -> Result<Form, FetchError> {
    let mut form = Form::new().part("main_image", image_part(&request.main_image).await?);
    if let Some(text) = &request.text {
        form = form.text("text", text.clone());
    }
    Ok(form)
}
