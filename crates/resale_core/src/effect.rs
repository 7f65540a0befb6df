use crate::inputs::{ImageFile, ImageId};
use crate::run::{RunId, RunMode};
use crate::RequestId;

/// Body of one streamed comparison request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub mode: RunMode,
    pub main_image: ImageFile,
    pub extra_images: Vec<ImageFile>,
    pub text: Option<String>,
    pub item_name: Option<String>,
}

/// Body of a candidate lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LensRequest {
    pub main_image: ImageFile,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartRun { run_id: RunId, request: RunRequest },
    CancelRun { run_id: RunId },
    FetchCandidates { request_id: RequestId, request: LensRequest },
    AcquirePreview { image: ImageFile },
    ReleasePreview { image_id: ImageId },
}
