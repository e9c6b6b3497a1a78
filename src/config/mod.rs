//! # Config Module
//!
//! Engine settings with environment overrides.
//!
//! Every knob has a default suitable for local runs; deployments override
//! individual fields through `SCAN_*` environment variables. Host lists are
//! comma-separated. Policy fields (`scan_max_photos`,
//! `scan_consent_threshold`, `enforce_scan_limits`) are enforced by the
//! caller, not by the engine itself.

use crate::core::grouping::SimilarityThresholds;
use std::time::Duration;
use tracing::warn;

/// Settings for one scan deployment
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Deployment environment name ("local", "staging", "prod")
    pub environment: String,
    /// Upper bound on items per scan (caller-enforced)
    pub scan_max_photos: usize,
    /// Item count beyond which explicit consent is required (caller-enforced)
    pub scan_consent_threshold: usize,
    /// Hostnames (and their subdomains) downloads may come from
    pub scan_allowed_download_hosts: Vec<String>,
    pub scan_dhash_threshold_very: u32,
    pub scan_dhash_threshold_possible: u32,
    pub scan_phash_threshold_very: u32,
    pub scan_phash_threshold_possible: u32,
    pub scan_cost_per_download: f64,
    pub scan_cost_per_byte_hash: f64,
    pub scan_cost_per_perceptual_hash: f64,
    pub scan_cost_per_comparison: f64,
    /// Per-fetch timeout for the HTTPS downloader
    pub download_timeout: Duration,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            environment: "local".to_string(),
            scan_max_photos: 250,
            scan_consent_threshold: 200,
            scan_allowed_download_hosts: vec![
                "photos.google.com".to_string(),
                "lh3.googleusercontent.com".to_string(),
                "googleusercontent.com".to_string(),
            ],
            scan_dhash_threshold_very: 5,
            scan_dhash_threshold_possible: 10,
            scan_phash_threshold_very: 6,
            scan_phash_threshold_possible: 12,
            scan_cost_per_download: 0.0002,
            scan_cost_per_byte_hash: 0.00005,
            scan_cost_per_perceptual_hash: 0.00008,
            scan_cost_per_comparison: 0.00001,
            download_timeout: Duration::from_secs(30),
        }
    }
}

impl ScanSettings {
    /// Load settings, overriding defaults from the process environment.
    ///
    /// Unparsable values are ignored with a warning rather than failing the
    /// whole process.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Some(value) = env_string("ENVIRONMENT") {
            settings.environment = value;
        }
        if let Some(value) = env_parse("SCAN_MAX_PHOTOS") {
            settings.scan_max_photos = value;
        }
        if let Some(value) = env_parse("SCAN_CONSENT_THRESHOLD") {
            settings.scan_consent_threshold = value;
        }
        if let Some(value) = env_string("SCAN_ALLOWED_DOWNLOAD_HOSTS") {
            settings.scan_allowed_download_hosts = split_host_list(&value);
        }
        if let Some(value) = env_parse("SCAN_DHASH_THRESHOLD_VERY") {
            settings.scan_dhash_threshold_very = value;
        }
        if let Some(value) = env_parse("SCAN_DHASH_THRESHOLD_POSSIBLE") {
            settings.scan_dhash_threshold_possible = value;
        }
        if let Some(value) = env_parse("SCAN_PHASH_THRESHOLD_VERY") {
            settings.scan_phash_threshold_very = value;
        }
        if let Some(value) = env_parse("SCAN_PHASH_THRESHOLD_POSSIBLE") {
            settings.scan_phash_threshold_possible = value;
        }
        if let Some(value) = env_parse("SCAN_COST_PER_DOWNLOAD") {
            settings.scan_cost_per_download = value;
        }
        if let Some(value) = env_parse("SCAN_COST_PER_BYTE_HASH") {
            settings.scan_cost_per_byte_hash = value;
        }
        if let Some(value) = env_parse("SCAN_COST_PER_PERCEPTUAL_HASH") {
            settings.scan_cost_per_perceptual_hash = value;
        }
        if let Some(value) = env_parse("SCAN_COST_PER_COMPARISON") {
            settings.scan_cost_per_comparison = value;
        }
        if let Some(value) = env_parse("SCAN_DOWNLOAD_TIMEOUT_SECONDS") {
            settings.download_timeout = Duration::from_secs(value);
        }

        settings
    }

    /// Whether scan size limits are enforced in this environment
    pub fn enforce_scan_limits(&self) -> bool {
        self.environment.eq_ignore_ascii_case("prod")
    }

    /// The similarity thresholds configured for near-duplicate grouping
    pub fn thresholds(&self) -> SimilarityThresholds {
        SimilarityThresholds {
            dhash_very: self.scan_dhash_threshold_very,
            dhash_possible: self.scan_dhash_threshold_possible,
            phash_very: self.scan_phash_threshold_very,
            phash_possible: self.scan_phash_threshold_possible,
        }
    }
}

/// Split a comma-separated host list, dropping empty entries
pub fn split_host_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env_string(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = ScanSettings::default();

        assert_eq!(settings.scan_max_photos, 250);
        assert_eq!(settings.scan_consent_threshold, 200);
        assert_eq!(settings.scan_dhash_threshold_very, 5);
        assert_eq!(settings.scan_dhash_threshold_possible, 10);
        assert_eq!(settings.scan_phash_threshold_very, 6);
        assert_eq!(settings.scan_phash_threshold_possible, 12);
        assert_eq!(settings.scan_cost_per_download, 0.0002);
        assert!(!settings.enforce_scan_limits());
    }

    #[test]
    fn limits_enforced_only_in_prod() {
        let mut settings = ScanSettings::default();

        settings.environment = "prod".to_string();
        assert!(settings.enforce_scan_limits());

        settings.environment = "PROD".to_string();
        assert!(settings.enforce_scan_limits());

        settings.environment = "staging".to_string();
        assert!(!settings.enforce_scan_limits());
    }

    #[test]
    fn host_list_splits_on_commas_and_trims() {
        let hosts = split_host_list(" photos.google.com, googleusercontent.com ,,");

        assert_eq!(
            hosts,
            vec![
                "photos.google.com".to_string(),
                "googleusercontent.com".to_string()
            ]
        );
    }

    #[test]
    fn from_env_overrides_defaults_and_ignores_garbage() {
        std::env::set_var("SCAN_MAX_PHOTOS", "50");
        std::env::set_var("SCAN_ALLOWED_DOWNLOAD_HOSTS", "a.example.com,b.example.com");
        std::env::set_var("SCAN_DHASH_THRESHOLD_VERY", "3");
        std::env::set_var("SCAN_COST_PER_DOWNLOAD", "not-a-number");

        let settings = ScanSettings::from_env();

        std::env::remove_var("SCAN_MAX_PHOTOS");
        std::env::remove_var("SCAN_ALLOWED_DOWNLOAD_HOSTS");
        std::env::remove_var("SCAN_DHASH_THRESHOLD_VERY");
        std::env::remove_var("SCAN_COST_PER_DOWNLOAD");

        assert_eq!(settings.scan_max_photos, 50);
        assert_eq!(
            settings.scan_allowed_download_hosts,
            vec!["a.example.com".to_string(), "b.example.com".to_string()]
        );
        assert_eq!(settings.scan_dhash_threshold_very, 3);
        // unparsable override falls back to the default
        assert_eq!(settings.scan_cost_per_download, 0.0002);
    }

    #[test]
    fn thresholds_mirror_settings() {
        let settings = ScanSettings::default();
        let thresholds = settings.thresholds();

        assert_eq!(thresholds.dhash_very, 5);
        assert_eq!(thresholds.dhash_possible, 10);
        assert_eq!(thresholds.phash_very, 6);
        assert_eq!(thresholds.phash_possible, 12);
    }
}
