use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ResvError, ResvResult};

/// Connection settings for the management endpoint.
///
/// Built by the binaries from parsed flags and handed to the client; no
/// argument-parsing state leaks past this struct.
#[derive(Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Management endpoint address.
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Skip certificate validation for the connection.
    pub insecure: bool,
}

impl EndpointConfig {
    pub fn base_url(&self) -> String {
        format!("https://{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> ResvResult<()> {
        if self.host.is_empty() {
            return Err(ResvError::Config {
                message: "management host cannot be empty".to_string(),
            });
        }
        if self.user.is_empty() {
            return Err(ResvError::Config {
                message: "user name cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

// Keep the password out of log output.
impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("insecure", &self.insecure)
            .finish()
    }
}

/// Settings for one reservation adjustment run.
#[derive(Debug, Clone)]
pub struct AdjustConfig {
    /// Regular expression selecting VM names; must match the whole name.
    pub name_pattern: String,
    /// Delay between task state polls.
    pub poll_interval: Duration,
}

impl AdjustConfig {
    pub fn new(name_pattern: impl Into<String>) -> Self {
        Self {
            name_pattern: name_pattern.into(),
            poll_interval: Duration::from_millis(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_includes_port() {
        let config = EndpointConfig {
            host: "vc.example.org".to_string(),
            port: 8443,
            user: "admin".to_string(),
            password: "secret".to_string(),
            insecure: false,
        };
        assert_eq!(config.base_url(), "https://vc.example.org:8443");
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = EndpointConfig {
            host: "vc".to_string(),
            port: 443,
            user: "admin".to_string(),
            password: "secret".to_string(),
            insecure: false,
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn empty_host_is_rejected() {
        let config = EndpointConfig {
            host: String::new(),
            port: 443,
            user: "admin".to_string(),
            password: "secret".to_string(),
            insecure: false,
        };
        assert!(config.validate().is_err());
    }
}
