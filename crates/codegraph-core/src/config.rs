//! Environment-driven configuration, read once at startup.

use crate::scoring::NoiseConfig;

/// Minimum severity a security finding must carry to be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

/// Process-wide configuration. Construct with [`Config::from_env`]; every
/// field has a spec-mandated default so a bare environment still works.
#[derive(Debug, Clone)]
pub struct Config {
    pub noise: NoiseConfig,
    pub security_min_confidence: f32,
    pub security_min_severity: Severity,
    pub security_osv_enabled: bool,
    pub security_suppressions_path: Option<String>,
    pub max_export_depth: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            noise: NoiseConfig::default(),
            security_min_confidence: 0.5,
            security_min_severity: Severity::Medium,
            security_osv_enabled: false,
            security_suppressions_path: None,
            max_export_depth: 4,
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes"))
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from the recognized `AST_*`/`SECURITY_*` env vars,
    /// falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Config::default();
        let stoplist_extra = std::env::var("AST_STOPLIST_EXTRA")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        Config {
            noise: NoiseConfig {
                min_name_length: env_usize("AST_MIN_NAME_LENGTH", defaults.noise.min_name_length),
                stoplist_extra,
                min_inferred_confidence: env_f32(
                    "MIN_INFERRED_CONFIDENCE",
                    defaults.noise.min_inferred_confidence,
                ),
            },
            security_min_confidence: env_f32("SECURITY_MIN_CONFIDENCE", defaults.security_min_confidence),
            security_min_severity: std::env::var("SECURITY_MIN_SEVERITY")
                .ok()
                .and_then(|v| Severity::parse(&v))
                .unwrap_or(defaults.security_min_severity),
            security_osv_enabled: env_bool("SECURITY_OSV_ENABLED", defaults.security_osv_enabled),
            security_suppressions_path: std::env::var("SECURITY_SUPPRESSIONS").ok(),
            max_export_depth: env_u32("MAX_EXPORT_DEPTH", defaults.max_export_depth),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::default();
        assert_eq!(cfg.noise.min_name_length, 3);
        assert_eq!(cfg.noise.min_inferred_confidence, 0.5);
        assert_eq!(cfg.security_min_confidence, 0.5);
        assert_eq!(cfg.max_export_depth, 4);
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Critical > Severity::Low);
        assert!(Severity::parse("bogus").is_none());
    }
}
