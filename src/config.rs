//! Session configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Settings shared by every query issued through a [`crate::session::Session`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Largest accepted page size; `None` means unbounded
    pub max_page_size: Option<u64>,
    /// Log the rendered SQL of every statement at debug level
    pub log_statements: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_page_size: Some(1000),
            log_statements: false,
        }
    }
}

impl SessionConfig {
    pub fn with_max_page_size(mut self, max_page_size: Option<u64>) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    pub fn with_log_statements(mut self, log_statements: bool) -> Self {
        self.log_statements = log_statements;
        self
    }

    /// Reject page sizes of zero or above the configured maximum
    pub fn check_page_size(&self, limit: u64) -> Result<(), ConfigError> {
        if limit == 0 {
            return Err(ConfigError::InvalidPageSize);
        }
        match self.max_page_size {
            Some(max) if limit > max => Err(ConfigError::PageSizeTooLarge {
                requested: limit,
                max,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_partial_json() -> anyhow::Result<()> {
        let config: SessionConfig = serde_json::from_str(r#"{"log_statements": true}"#)?;
        assert_eq!(config.max_page_size, Some(1000));
        assert!(config.log_statements);

        let unbounded: SessionConfig = serde_json::from_str(r#"{"max_page_size": null}"#)?;
        assert_eq!(unbounded.max_page_size, None);
        Ok(())
    }

    #[test]
    fn test_check_page_size() {
        let config = SessionConfig::default().with_max_page_size(Some(50));
        assert_eq!(config.check_page_size(0), Err(ConfigError::InvalidPageSize));
        assert_eq!(config.check_page_size(50), Ok(()));
        assert_eq!(
            config.check_page_size(51),
            Err(ConfigError::PageSizeTooLarge {
                requested: 51,
                max: 50
            })
        );
        assert_eq!(
            SessionConfig::default()
                .with_max_page_size(None)
                .check_page_size(u64::MAX),
            Ok(())
        );
    }
}
