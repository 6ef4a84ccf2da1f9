//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file and
//! convert into the settings types the use cases consume.

use conductor_application::use_cases::conflict::ResolverSettings;
use conductor_application::use_cases::orchestrator::OrchestratorSettings;
use conductor_application::use_cases::specialization::SpecializationSettings;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Planning and execution settings
    pub orchestrator: FileOrchestratorConfig,
    /// Conflict resolution settings
    pub resolver: FileResolverConfig,
    /// Specialization and assignment settings
    pub specialization: FileSpecializationConfig,
}

/// `[orchestrator]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestratorConfig {
    pub history_cap: usize,
    pub retry_base_delay_ms: u64,
    pub quality_floor: f64,
    pub fast_tool_ceiling_ms: f64,
    pub success_pattern_threshold: f64,
}

impl Default for FileOrchestratorConfig {
    fn default() -> Self {
        let settings = OrchestratorSettings::default();
        Self {
            history_cap: settings.history_cap,
            retry_base_delay_ms: settings.retry_base_delay_ms,
            quality_floor: settings.quality_floor,
            fast_tool_ceiling_ms: settings.fast_tool_ceiling_ms,
            success_pattern_threshold: settings.success_pattern_threshold,
        }
    }
}

impl FileOrchestratorConfig {
    pub fn into_settings(self) -> OrchestratorSettings {
        OrchestratorSettings {
            history_cap: self.history_cap,
            retry_base_delay_ms: self.retry_base_delay_ms,
            quality_floor: self.quality_floor,
            fast_tool_ceiling_ms: self.fast_tool_ceiling_ms,
            success_pattern_threshold: self.success_pattern_threshold,
        }
    }
}

/// `[resolver]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileResolverConfig {
    pub agreement_threshold: f64,
    pub max_mediation_rounds: u32,
    pub urgent_time_ms: u64,
}

impl Default for FileResolverConfig {
    fn default() -> Self {
        let settings = ResolverSettings::default();
        Self {
            agreement_threshold: settings.agreement_threshold,
            max_mediation_rounds: settings.max_mediation_rounds,
            urgent_time_ms: settings.urgent_time_ms,
        }
    }
}

impl FileResolverConfig {
    pub fn into_settings(self) -> ResolverSettings {
        ResolverSettings {
            agreement_threshold: self.agreement_threshold.clamp(0.0, 1.0),
            max_mediation_rounds: self.max_mediation_rounds.max(1),
            urgent_time_ms: self.urgent_time_ms,
        }
    }
}

/// `[specialization]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSpecializationConfig {
    pub learning_rate: f64,
    pub decay_rate: f64,
    pub candidate_threshold: f64,
    pub focus_swap_margin: f64,
    pub expert_level: f64,
}

impl Default for FileSpecializationConfig {
    fn default() -> Self {
        let settings = SpecializationSettings::default();
        Self {
            learning_rate: settings.learning_rate,
            decay_rate: settings.decay_rate,
            candidate_threshold: settings.candidate_threshold,
            focus_swap_margin: settings.focus_swap_margin,
            expert_level: settings.expert_level,
        }
    }
}

impl FileSpecializationConfig {
    pub fn into_settings(self) -> SpecializationSettings {
        SpecializationSettings {
            learning_rate: self.learning_rate.clamp(0.0, 1.0),
            decay_rate: self.decay_rate.clamp(0.0, 1.0),
            candidate_threshold: self.candidate_threshold,
            focus_swap_margin: self.focus_swap_margin,
            expert_level: self.expert_level.clamp(0.0, 100.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_use_case_settings() {
        let config = FileConfig::default();
        assert_eq!(config.orchestrator.history_cap, 100);
        assert_eq!(config.resolver.agreement_threshold, 0.7);
        assert_eq!(config.specialization.learning_rate, 0.15);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: FileConfig = toml::from_str(
            r#"
            [orchestrator]
            retry_base_delay_ms = 50

            [specialization]
            learning_rate = 0.2
            "#,
        )
        .unwrap();

        assert_eq!(config.orchestrator.retry_base_delay_ms, 50);
        assert_eq!(config.orchestrator.history_cap, 100);
        assert_eq!(config.specialization.learning_rate, 0.2);
        assert_eq!(config.resolver.max_mediation_rounds, 5);
    }

    #[test]
    fn test_conversion_clamps_out_of_range_values() {
        let resolver = FileResolverConfig {
            agreement_threshold: 3.0,
            max_mediation_rounds: 0,
            urgent_time_ms: 5000,
        };
        let settings = resolver.into_settings();
        assert_eq!(settings.agreement_threshold, 1.0);
        assert_eq!(settings.max_mediation_rounds, 1);
    }
}
