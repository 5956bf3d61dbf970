//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (positive capacities, rates, timeouts)
//! - Check addresses parse before anything binds to them
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener bind_address '{0}' is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("listener max_body_size must be greater than zero")]
    ZeroBodySize,

    #[error("timeouts request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("rate_limit capacity must be greater than zero")]
    ZeroCapacity,

    #[error("rate_limit tokens_per_second must be a positive finite number")]
    InvalidRefillRate,

    #[error("rate_limit idle_timeout_secs must be greater than zero")]
    ZeroIdleTimeout,

    #[error("observability metrics_address '{0}' is not a valid socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, collecting every violation.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodySize);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if config.rate_limit.enabled {
        if config.rate_limit.capacity == 0 {
            errors.push(ValidationError::ZeroCapacity);
        }
        let rate = config.rate_limit.tokens_per_second;
        if !(rate.is_finite() && rate > 0.0) {
            errors.push(ValidationError::InvalidRefillRate);
        }
        if config.rate_limit.idle_timeout_secs == 0 {
            errors.push(ValidationError::ZeroIdleTimeout);
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.rate_limit.enabled = true;
        config.rate_limit.capacity = 0;
        config.rate_limit.tokens_per_second = 0.0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::InvalidBindAddress("not-an-address".into())));
        assert!(errors.contains(&ValidationError::ZeroCapacity));
        assert!(errors.contains(&ValidationError::InvalidRefillRate));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn disabled_rate_limit_is_not_range_checked() {
        let mut config = ServerConfig::default();
        config.rate_limit.capacity = 0;
        config.rate_limit.tokens_per_second = -1.0;
        assert!(validate_config(&config).is_ok());
    }
}
