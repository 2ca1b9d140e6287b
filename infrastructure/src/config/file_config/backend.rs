//! Backend configuration from TOML (`[backend]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use xylos_domain::{ConfigIssue, ConfigIssueCode, Severity};

/// Raw backend configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// Base URL of the hosted backend (functions, storage and auth live under it)
    pub url: String,
    /// Publishable API key sent as `apikey` and as the anonymous bearer token
    pub api_key: String,
    /// Connect timeout for every HTTP request; unset means no timeout
    pub connect_timeout_seconds: Option<u64>,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            connect_timeout_seconds: Some(10),
        }
    }
}

impl FileBackendConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_seconds.map(Duration::from_secs)
    }

    pub(super) fn validate(&self, offline: bool) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.url.trim().is_empty() {
            issues.push(ConfigIssue {
                severity: if offline {
                    Severity::Warning
                } else {
                    Severity::Error
                },
                code: ConfigIssueCode::EmptyValue {
                    field: "backend.url".to_string(),
                },
                message: "backend.url is not set (use [backend] url or XYLOS_BACKEND__URL)"
                    .to_string(),
            });
        }

        if self.api_key.trim().is_empty() {
            issues.push(ConfigIssue {
                severity: Severity::Warning,
                code: ConfigIssueCode::EmptyValue {
                    field: "backend.api_key".to_string(),
                },
                message: "backend.api_key is not set, requests will likely be rejected"
                    .to_string(),
            });
        }

        if self.connect_timeout_seconds == Some(0) {
            issues.push(ConfigIssue {
                severity: Severity::Error,
                code: ConfigIssueCode::ZeroTimeout {
                    field: "backend.connect_timeout_seconds".to_string(),
                },
                message: "backend.connect_timeout_seconds cannot be 0".to_string(),
            });
        }

        issues
    }
}
