use crate::core::{RelError, Result};
use serde::Deserialize;

/// Batching behaviour of a [`BatchingAggregateChange`](super::BatchingAggregateChange)
///
/// Ordering is never affected by configuration; only how many single
/// actions end up grouped into one batch action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BatchingConfig {
    /// Coalesce same-kind, same-path actions into batch actions
    pub enabled: bool,

    /// Largest number of members per batch action; `None` is unbounded
    pub max_batch_size: Option<usize>,
}

impl BatchingConfig {
    pub fn new() -> Self {
        Self {
            enabled: true,
            max_batch_size: None,
        }
    }

    /// Emit every action on its own
    pub fn disabled() -> Self {
        Self::new().enabled(false)
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = Some(max);
        self
    }

    /// Parse from JSON, e.g. `{"enabled": true, "max_batch_size": 500}`
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size == Some(0) {
            return Err(RelError::InvalidConfig("max_batch_size must be > 0".to_string()));
        }

        Ok(())
    }

    /// Members per emitted action
    pub(crate) fn chunk_size(&self) -> usize {
        if !self.enabled {
            return 1;
        }
        self.max_batch_size.unwrap_or(usize::MAX).max(1)
    }
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BatchingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_batch_size, None);
        assert_eq!(config.chunk_size(), usize::MAX);
    }

    #[test]
    fn test_builder_pattern() {
        let config = BatchingConfig::new().max_batch_size(50);
        assert_eq!(config.chunk_size(), 50);

        let disabled = BatchingConfig::disabled().max_batch_size(50);
        assert_eq!(disabled.chunk_size(), 1);
    }

    #[test]
    fn test_from_json() {
        let config = BatchingConfig::from_json(r#"{"max_batch_size": 100}"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.max_batch_size, Some(100));

        let disabled = BatchingConfig::from_json(r#"{"enabled": false}"#).unwrap();
        assert!(!disabled.enabled);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            BatchingConfig::from_json(r#"{"max_batch_size": 0}"#),
            Err(RelError::InvalidConfig(_))
        ));
        assert!(matches!(
            BatchingConfig::from_json("not json"),
            Err(RelError::ConfigParse(_))
        ));
    }
}
