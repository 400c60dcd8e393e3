use crate::archive::ArchiveTimestamp;
use crate::config::MirrorConfig;
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates a run configuration before the frontier starts.
pub fn validate(config: &MirrorConfig) -> ConfigResult<()> {
    validate_domain(&config.domain)?;

    if config.cutoff.is_none() && config.exact_timestamp.is_none() {
        return Err(ConfigError::Validation(
            "either cutoff or exact-timestamp is required".to_string(),
        ));
    }
    if let Some(cutoff) = &config.cutoff {
        ArchiveTimestamp::from_cutoff_date(cutoff)?;
    }
    if let Some(exact) = &config.exact_timestamp {
        ArchiveTimestamp::parse(exact)?;
    }

    if let Some(prefix) = &config.scope.path_prefix {
        if !prefix.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "path-prefix must start with '/', got '{}'",
                prefix
            )));
        }
    }

    let base = Url::parse(&config.archive.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("archive base-url: {}", e)))?;
    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "archive base-url must be http(s), got '{}'",
            config.archive.base_url
        )));
    }

    if !(config.archive.rps > 0.0 && config.archive.rps.is_finite()) {
        return Err(ConfigError::Validation(format!(
            "rps must be a positive number, got {}",
            config.archive.rps
        )));
    }

    if config.archive.burst < 1 {
        return Err(ConfigError::Validation(
            "burst must be >= 1".to_string(),
        ));
    }

    if config.archive.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.limits.concurrency < 1 || config.limits.concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 64, got {}",
            config.limits.concurrency
        )));
    }

    Ok(())
}

/// A bare hostname: no scheme, no path, sane characters.
fn validate_domain(domain: &str) -> ConfigResult<()> {
    if domain.is_empty() {
        return Err(ConfigError::Validation(
            "domain cannot be empty".to_string(),
        ));
    }

    if domain.contains("://") || domain.contains('/') {
        return Err(ConfigError::Validation(format!(
            "domain must be a bare hostname, got '{}'",
            domain
        )));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::Validation(format!(
            "domain '{}' must not start or end with '.' or '-'",
            domain
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> MirrorConfig {
        let mut config = MirrorConfig::new("example.org");
        config.cutoff = Some("2023-01-01".to_string());
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid()).is_ok());
    }

    #[test]
    fn test_domain_with_scheme_rejected() {
        let mut config = valid();
        config.domain = "https://example.org".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_domain_rejected() {
        let mut config = valid();
        config.domain = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_cutoff_and_exact_rejected() {
        let mut config = valid();
        config.cutoff = None;
        assert!(validate(&config).is_err());

        config.exact_timestamp = Some("20221201000000".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_bad_cutoff_rejected() {
        let mut config = valid();
        config.cutoff = Some("january".to_string());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_path_prefix_must_be_absolute() {
        let mut config = valid();
        config.scope.path_prefix = Some("en/".to_string());
        assert!(validate(&config).is_err());

        config.scope.path_prefix = Some("/en/".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_rps_must_be_positive() {
        let mut config = valid();
        config.archive.rps = 0.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut config = valid();
        config.limits.concurrency = 0;
        assert!(validate(&config).is_err());

        config.limits.concurrency = 65;
        assert!(validate(&config).is_err());

        config.limits.concurrency = 8;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_archive_base_must_be_http() {
        let mut config = valid();
        config.archive.base_url = "ftp://archive.test".to_string();
        assert!(validate(&config).is_err());
    }
}
