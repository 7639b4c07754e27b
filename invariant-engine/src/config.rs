//! Engine configuration

/// Configuration for scenario replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// NAV lifespan in seconds for vaults that don't set one
    pub default_lifespan: u64,

    /// Virtual share offset exponent for vaults that don't set one
    pub decimals_offset: u8,

    /// Arm the built-in checks for steps that name none
    pub arm_defaults: bool,

    /// Stop replaying at the first violation
    pub stop_on_violation: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_lifespan: 1_000,
            decimals_offset: 3,
            arm_defaults: true,
            stop_on_violation: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let default_lifespan = lookup("SVS_ENGINE_DEFAULT_LIFESPAN")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.default_lifespan);

        let decimals_offset = lookup("SVS_ENGINE_DECIMALS_OFFSET")
            .and_then(|v| v.parse().ok())
            .filter(|offset| *offset <= svs_3::constants::MAX_DECIMALS)
            .unwrap_or(defaults.decimals_offset);

        let arm_defaults = lookup("SVS_ENGINE_ARM_DEFAULTS")
            .and_then(|v| parse_flag(&v))
            .unwrap_or(defaults.arm_defaults);

        let stop_on_violation = lookup("SVS_ENGINE_STOP_ON_VIOLATION")
            .and_then(|v| parse_flag(&v))
            .unwrap_or(defaults.stop_on_violation);

        Self {
            default_lifespan,
            decimals_offset,
            arm_defaults,
            stop_on_violation,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> EngineConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_without_env() {
        assert_eq!(config(&[]), EngineConfig::default());
    }

    #[test]
    fn test_reads_overrides() {
        let cfg = config(&[
            ("SVS_ENGINE_DEFAULT_LIFESPAN", "3600"),
            ("SVS_ENGINE_DECIMALS_OFFSET", "6"),
            ("SVS_ENGINE_ARM_DEFAULTS", "false"),
            ("SVS_ENGINE_STOP_ON_VIOLATION", "0"),
        ]);
        assert_eq!(cfg.default_lifespan, 3600);
        assert_eq!(cfg.decimals_offset, 6);
        assert!(!cfg.arm_defaults);
        assert!(!cfg.stop_on_violation);
    }

    #[test]
    fn test_ignores_malformed_values() {
        let cfg = config(&[
            ("SVS_ENGINE_DEFAULT_LIFESPAN", "soon"),
            ("SVS_ENGINE_DECIMALS_OFFSET", "12"),
            ("SVS_ENGINE_ARM_DEFAULTS", "maybe"),
        ]);
        assert_eq!(cfg, EngineConfig::default());
    }
}
