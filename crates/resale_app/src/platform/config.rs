use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use engine_logging::LogDestination;
use resale_core::StepPlan;
use resale_engine::StreamSettings;
use serde::Deserialize;

/// Settings read from `resale.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct ClientConfig {
    pub api_base: String,
    pub lens_base: String,
    pub connect_timeout_secs: u64,
    pub auth_cookie: Option<String>,
    pub step_plan: Vec<String>,
    pub log_destination: LogDestination,
    pub log_file: PathBuf,
    pub verbose: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let stream = StreamSettings::default();
        Self {
            api_base: stream.api_base,
            lens_base: stream.lens_base,
            connect_timeout_secs: stream.connect_timeout.as_secs(),
            auth_cookie: None,
            step_plan: StepPlan::default().ids().to_vec(),
            log_destination: LogDestination::File,
            log_file: PathBuf::from("./resale.log"),
            verbose: false,
        }
    }
}

impl ClientConfig {
    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            api_base: self.api_base.clone(),
            lens_base: self.lens_base.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            auth_cookie: self.auth_cookie.clone(),
        }
    }

    pub fn step_plan(&self) -> StepPlan {
        if self.step_plan.is_empty() {
            StepPlan::default()
        } else {
            StepPlan::new(self.step_plan.iter().cloned())
        }
    }
}

/// Loads the config file. A missing file yields defaults; `false` is returned
/// alongside so the caller can log it once logging is up.
pub(crate) fn load_config(path: &Path) -> anyhow::Result<(ClientConfig, bool)> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok((ClientConfig::default(), false));
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read config {}", path.display()))
        }
    };
    let config = ron::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok((config, true))
}
