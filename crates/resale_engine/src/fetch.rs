use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use futures_util::StreamExt;
use reqwest::header::COOKIE;
use resale_core::{parse_frame, RunId, RunRequest, StreamFrame};
use tokio_util::sync::CancellationToken;

use crate::decode::LineDecoder;
use crate::form::run_form;
use crate::{EngineEvent, FailureKind, FetchError, StreamSummary};

pub const STREAM_PATH: &str = "/api/py/extract-file-stream";

#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Origin serving the comparison stream.
    pub api_base: String,
    /// Origin serving the candidate lookup.
    pub lens_base: String,
    pub connect_timeout: Duration,
    /// Forwarded verbatim as a `Cookie` header when set.
    pub auth_cookie: Option<String>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:3000".to_string(),
            lens_base: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            auth_cookie: None,
        }
    }
}

impl StreamSettings {
    pub(crate) fn build_client(&self) -> Result<reqwest::Client, FetchError> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }

    pub(crate) fn post(
        &self,
        client: &reqwest::Client,
        base: &str,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, FetchError> {
        let raw = format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let url = reqwest::Url::parse(&raw)
            .map_err(|err| FetchError::new(FailureKind::InvalidInput, format!("{raw}: {err}")))?;
        let mut builder = client.post(url);
        if let Some(cookie) = &self.auth_cookie {
            builder = builder.header(COOKIE, cookie.as_str());
        }
        Ok(builder)
    }
}

pub trait FrameSink: Send + Sync {
    fn emit(&self, run_id: RunId, frame: StreamFrame);
}

pub struct ChannelFrameSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelFrameSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl FrameSink for ChannelFrameSink {
    fn emit(&self, run_id: RunId, frame: StreamFrame) {
        let _ = self.tx.send(EngineEvent::Frame { run_id, frame });
    }
}

#[async_trait::async_trait]
pub trait Streamer: Send + Sync {
    /// Issues the request and forwards every decoded frame to `sink` until the
    /// body ends, an error frame arrives, or `cancel` fires.
    async fn stream_run(
        &self,
        run_id: RunId,
        request: &RunRequest,
        cancel: &CancellationToken,
        sink: &dyn FrameSink,
    ) -> Result<StreamSummary, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestStreamer {
    settings: StreamSettings,
}

impl ReqwestStreamer {
    pub fn new(settings: StreamSettings) -> Self {
        Self { settings }
    }
}

#[async_trait::async_trait]
impl Streamer for ReqwestStreamer {
    async fn stream_run(
        &self,
        run_id: RunId,
        request: &RunRequest,
        cancel: &CancellationToken,
        sink: &dyn FrameSink,
    ) -> Result<StreamSummary, FetchError> {
        let client = self.settings.build_client()?;
        let form = run_form(request).await?;
        let builder = self
            .settings
            .post(&client, &self.settings.api_base, STREAM_PATH)?
            .multipart(form);

        engine_info!("Streaming run_id={} mode={}", run_id, request.mode);
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::cancelled()),
            sent = builder.send() => sent.map_err(map_reqwest_error)?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::cancelled()),
                body = response.text() => body.unwrap_or_default(),
            };
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                body.trim(),
            ));
        }

        let mut summary = StreamSummary::default();
        let mut decoder = LineDecoder::new();
        let mut stream = response.bytes_stream();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    engine_debug!("run_id={} cancelled after {} bytes", run_id, summary.bytes);
                    return Err(FetchError::cancelled());
                }
                next = stream.next() => next,
            };
            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk.map_err(map_reqwest_error)?;
            summary.bytes += chunk.len() as u64;
            for line in decoder.push(&chunk) {
                deliver(run_id, &line, sink, &mut summary)?;
            }
        }

        if let Some(line) = decoder.finish() {
            deliver(run_id, &line, sink, &mut summary)?;
        }
        engine_info!(
            "run_id={} stream closed bytes={} frames={} result={}",
            run_id,
            summary.bytes,
            summary.frames,
            summary.saw_result
        );
        Ok(summary)
    }
}

/// Parses one line and forwards it. An error frame ends the run.
fn deliver(
    run_id: RunId,
    line: &str,
    sink: &dyn FrameSink,
    summary: &mut StreamSummary,
) -> Result<(), FetchError> {
    let Some(frame) = parse_frame(line) else {
        return Ok(());
    };
    summary.frames += 1;
    match &frame {
        StreamFrame::Result(_) => summary.saw_result = true,
        StreamFrame::Error(message) => {
            engine_warn!("run_id={} service error: {}", run_id, message);
            let error = FetchError::new(FailureKind::Protocol, message.clone());
            sink.emit(run_id, frame);
            return Err(error);
        }
        StreamFrame::Step { .. } => {}
    }
    sink.emit(run_id, frame);
    Ok(())
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_decode() {
        return FetchError::new(FailureKind::Decode, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
