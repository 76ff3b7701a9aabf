//! Configuration for archive access.

use serde::{Deserialize, Serialize};

use crate::error::{HrrrError, Result};

/// Configuration for the HRRR Zarr archive and the query layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Bucket holding the archive.
    pub bucket: String,

    /// AWS region of the bucket.
    pub region: String,

    /// Custom S3 endpoint (MinIO, mirrors). `None` uses AWS.
    pub endpoint: Option<String>,

    /// Send unsigned requests (the public archive allows anonymous reads).
    pub anonymous: bool,

    /// Base URL for human-facing browse links.
    pub browse_host: String,

    /// Level tag of the model runs queried by the series façade.
    pub run_level: String,

    /// Forecast horizon (hours) of the 00/06/12/18z runs.
    pub long_horizon_hours: usize,

    /// Forecast horizon (hours) of every other run.
    pub short_horizon_hours: usize,

    /// Maximum number of analysis tiles fetched concurrently per query.
    pub max_concurrent_fetches: usize,

    /// Reject lat/lng outside [-90, 90] / [-180, 180] instead of
    /// resolving the nearest edge chunk.
    pub strict_coordinates: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            bucket: "hrrrzarr".to_string(),
            region: "us-west-1".to_string(),
            endpoint: None,
            anonymous: true,
            browse_host: "https://hrrrzarr.s3.amazonaws.com".to_string(),
            run_level: "sfc".to_string(),
            long_horizon_hours: 48,
            short_horizon_hours: 18,
            max_concurrent_fetches: 8,
            strict_coordinates: false,
        }
    }
}

impl ArchiveConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("HRRR_BUCKET") {
            config.bucket = val;
        }

        if let Ok(val) = std::env::var("HRRR_REGION") {
            config.region = val;
        }

        if let Ok(val) = std::env::var("HRRR_ENDPOINT") {
            if !val.is_empty() {
                config.endpoint = Some(val);
            }
        }

        if let Ok(val) = std::env::var("HRRR_ANONYMOUS") {
            config.anonymous = parse_bool(&val);
        }

        if let Ok(val) = std::env::var("HRRR_BROWSE_HOST") {
            config.browse_host = val.trim_end_matches('/').to_string();
        }

        if let Ok(val) = std::env::var("HRRR_RUN_LEVEL") {
            config.run_level = val;
        }

        if let Ok(val) = std::env::var("HRRR_LONG_HORIZON_HOURS") {
            if let Ok(hours) = val.parse() {
                config.long_horizon_hours = hours;
            }
        }

        if let Ok(val) = std::env::var("HRRR_SHORT_HORIZON_HOURS") {
            if let Ok(hours) = val.parse() {
                config.short_horizon_hours = hours;
            }
        }

        if let Ok(val) = std::env::var("HRRR_MAX_CONCURRENT_FETCHES") {
            if let Ok(n) = val.parse() {
                config.max_concurrent_fetches = n;
            }
        }

        if let Ok(val) = std::env::var("HRRR_STRICT_COORDINATES") {
            config.strict_coordinates = parse_bool(&val);
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(HrrrError::Config("bucket must not be empty".to_string()));
        }

        if self.run_level.is_empty() || self.run_level.contains('/') {
            return Err(HrrrError::Config(format!(
                "invalid run level {:?}",
                self.run_level
            )));
        }

        if self.long_horizon_hours == 0 || self.short_horizon_hours == 0 {
            return Err(HrrrError::Config(
                "forecast horizons must be > 0".to_string(),
            ));
        }

        if self.max_concurrent_fetches == 0 {
            return Err(HrrrError::Config(
                "max_concurrent_fetches must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Forecast horizon in hours of the run issued at `cycle_hour` (UTC).
    pub fn forecast_horizon(&self, cycle_hour: u32) -> usize {
        if cycle_hour % 6 == 0 {
            self.long_horizon_hours
        } else {
            self.short_horizon_hours
        }
    }
}

fn parse_bool(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ArchiveConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = ArchiveConfig {
            max_concurrent_fetches: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(HrrrError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_nested_run_level() {
        let config = ArchiveConfig {
            run_level: "sfc/extra".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_forecast_horizon_by_cycle() {
        let config = ArchiveConfig::default();
        assert_eq!(config.forecast_horizon(0), 48);
        assert_eq!(config.forecast_horizon(18), 48);
        assert_eq!(config.forecast_horizon(7), 18);
        assert_eq!(config.forecast_horizon(23), 18);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("no"));
    }
}
