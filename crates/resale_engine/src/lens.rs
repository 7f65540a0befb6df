use engine_logging::engine_info;
use resale_core::LensRequest;

use crate::fetch::{map_reqwest_error, StreamSettings};
use crate::form::lens_form;
use crate::{FailureKind, FetchError, LensResponse};

pub const LENS_PATH: &str = "/extract-file-stream-lens";

#[async_trait::async_trait]
pub trait CandidateSource: Send + Sync {
    async fn fetch_candidates(&self, request: &LensRequest) -> Result<LensResponse, FetchError>;
}

/// Reverse-image lookup over HTTP. The response is a single JSON object.
#[derive(Debug, Clone)]
pub struct ReqwestLensClient {
    settings: StreamSettings,
}

impl ReqwestLensClient {
    pub fn new(settings: StreamSettings) -> Self {
        Self { settings }
    }
}

#[async_trait::async_trait]
impl CandidateSource for ReqwestLensClient {
    async fn fetch_candidates(&self, request: &LensRequest) -> Result<LensResponse, FetchError> {
        let client = self.settings.build_client()?;
        let form = lens_form(request).await?;
        let response = self
            .settings
            .post(&client, &self.settings.lens_base, LENS_PATH)?
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                body.trim(),
            ));
        }

        let parsed: LensResponse = serde_json::from_str(&body)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))?;
        engine_info!(
            "Lens lookup returned {} candidates (total={})",
            parsed.candidates.len(),
            parsed.total
        );
        Ok(parsed)
    }
}
