//! Reconnect policy for the push channel.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the delay between reconnect attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Same delay before every attempt
    #[default]
    Fixed,
    /// `delay_ms * multiplier^attempt`, capped at `max_delay_ms`
    Exponential,
}

impl std::str::FromStr for BackoffStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fixed" => Ok(BackoffStrategy::Fixed),
            "exponential" => Ok(BackoffStrategy::Exponential),
            _ => Err(format!("Invalid backoff strategy: {}", s)),
        }
    }
}

/// Configuration for push channel reconnects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub strategy: BackoffStrategy,
    /// Base delay before reconnecting
    pub delay_ms: u64,
    /// Upper bound for exponential backoff
    pub max_delay_ms: u64,
    /// Growth factor for exponential backoff
    pub multiplier: f64,
    /// Give up on a single connect attempt after this long
    pub connect_timeout_seconds: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::Fixed,
            delay_ms: 3000,
            max_delay_ms: 30_000,
            multiplier: 2.0,
            connect_timeout_seconds: 10,
        }
    }
}

impl ReconnectConfig {
    /// Delay before reconnect attempt number `attempt` (zero-based since the last
    /// successful connect).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.strategy {
            BackoffStrategy::Fixed => Duration::from_millis(self.delay_ms),
            BackoffStrategy::Exponential => {
                let factor = self.multiplier.max(1.0).powi(attempt.min(64) as i32);
                let millis = (self.delay_ms as f64 * factor).min(self.max_delay_ms as f64);
                Duration::from_millis(millis as u64)
            }
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_fixed_three_seconds() {
        let config = ReconnectConfig::default();
        assert_eq!(config.strategy, BackoffStrategy::Fixed);
        assert_eq!(config.delay_for(0), Duration::from_secs(3));
        assert_eq!(config.delay_for(50), Duration::from_secs(3));
    }

    #[test]
    fn test_exponential_growth_is_capped() {
        let config = ReconnectConfig {
            strategy: BackoffStrategy::Exponential,
            delay_ms: 500,
            max_delay_ms: 4000,
            multiplier: 2.0,
            ..Default::default()
        };
        assert_eq!(config.delay_for(0), Duration::from_millis(500));
        assert_eq!(config.delay_for(1), Duration::from_millis(1000));
        assert_eq!(config.delay_for(3), Duration::from_millis(4000));
        assert_eq!(config.delay_for(1000), Duration::from_millis(4000));
    }

    #[test]
    fn test_multiplier_below_one_never_shrinks() {
        let config = ReconnectConfig {
            strategy: BackoffStrategy::Exponential,
            multiplier: 0.5,
            ..Default::default()
        };
        assert_eq!(config.delay_for(4), Duration::from_millis(3000));
    }

    #[test]
    fn test_toml_parsing() {
        let config: ReconnectConfig = toml::from_str(
            r#"
            strategy = "exponential"
            delay_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.strategy, BackoffStrategy::Exponential);
        assert_eq!(config.delay_ms, 250);
        assert_eq!(config.max_delay_ms, 30_000);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(
            "Exponential".parse::<BackoffStrategy>().unwrap(),
            BackoffStrategy::Exponential
        );
        assert!("linear".parse::<BackoffStrategy>().is_err());
    }
}
