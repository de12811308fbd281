use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub ws_url: String,
    pub rest_base_url: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            ws_url: "ws://127.0.0.1:8080/api/ws".to_string(),
            rest_base_url: "http://127.0.0.1:8080/api/".to_string(),
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
        }
    }
}

impl EngineSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        check_scheme("ws_url", &self.ws_url, &["ws", "wss"])?;
        check_scheme("rest_base_url", &self.rest_base_url, &["http", "https"])?;
        Ok(())
    }
}

fn check_scheme(field: &'static str, raw: &str, allowed: &[&str]) -> Result<(), EngineError> {
    let invalid = |reason: String| EngineError::InvalidUrl {
        field,
        url: raw.to_string(),
        reason,
    };
    let parsed = Url::parse(raw).map_err(|err| invalid(err.to_string()))?;
    if !allowed.contains(&parsed.scheme()) {
        return Err(invalid(format!(
            "scheme must be one of {}",
            allowed.join(", ")
        )));
    }
    Ok(())
}
