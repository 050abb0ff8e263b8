// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Planner configuration.
//!
//! `PlannerConfig` bundles the resolver tuning, the solving mode and the
//! limits of the exact backend. It is plain serde data, so it can be read
//! from a JSON file. Unknown fields are rejected and missing fields take
//! their defaults:
//!
//! ```json
//! {
//!   "mode": "exact_with_hints",
//!   "resolver": { "penalty_multiplier": 2.0 },
//!   "exact": { "time_limit_ms": 5000 }
//! }
//! ```

use crate::error::ConfigError;
use beltplan_encode::backend::SearchLimits;
use beltplan_presolve::{error::PresolveError, resolver::ResolverConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which solving path a planner takes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
    /// Conflict resolution over per-line dynamic programs.
    #[default]
    Heuristic,
    /// The exact backend alone.
    Exact,
    /// The exact backend, hinted with the heuristic layout when one exists.
    ExactWithHints,
    /// The exact backend with the heuristic layout fixed.
    ExactForced,
}

impl PlanMode {
    /// Returns `true` if the mode runs the conflict resolver.
    #[inline]
    pub fn uses_heuristic(&self) -> bool {
        !matches!(self, PlanMode::Exact)
    }

    /// Returns `true` if the mode runs the exact backend.
    #[inline]
    pub fn uses_exact(&self) -> bool {
        !matches!(self, PlanMode::Heuristic)
    }
}

impl std::fmt::Display for PlanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanMode::Heuristic => write!(f, "Heuristic"),
            PlanMode::Exact => write!(f, "Exact"),
            PlanMode::ExactWithHints => write!(f, "ExactWithHints"),
            PlanMode::ExactForced => write!(f, "ExactForced"),
        }
    }
}

/// Complete configuration of a `BeltPlanner`.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerConfig {
    pub mode: PlanMode,
    pub resolver: ResolverConfig,
    /// Limits of the exact backend. Ignored in `PlanMode::Heuristic`.
    pub exact: SearchLimits,
}

impl PlannerConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_json_file<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolver.validate().map_err(|err| match err {
            PresolveError::InvalidConfig {
                field,
                value,
                expected,
            } => ConfigError::InvalidValue {
                field,
                value,
                expected,
            },
            other => ConfigError::InvalidValue {
                field: "resolver",
                value: other.to_string(),
                expected: "a valid resolver configuration",
            },
        })?;
        if self.exact.node_limit == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "exact.node_limit",
                value: "0".to_string(),
                expected: "a positive node count",
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for PlannerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Planner Configuration:")?;
        writeln!(f, "  Mode:                 {}", self.mode)?;
        match self.exact.node_limit {
            Some(nodes) => writeln!(f, "  Exact node limit:     {}", nodes)?,
            None => writeln!(f, "  Exact node limit:     none")?,
        }
        match self.exact.time_limit() {
            Some(limit) => writeln!(f, "  Exact time limit:     {:.2?}", limit)?,
            None => writeln!(f, "  Exact time limit:     none")?,
        }
        writeln!(f, "  Resolver:             {}", self.resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = PlannerConfig::default();
        assert_eq!(config.mode, PlanMode::Heuristic);
        assert_eq!(config.resolver, ResolverConfig::default());
        assert_eq!(config.exact, SearchLimits::unlimited());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mode_paths() {
        assert!(PlanMode::Heuristic.uses_heuristic());
        assert!(!PlanMode::Heuristic.uses_exact());
        assert!(!PlanMode::Exact.uses_heuristic());
        assert!(PlanMode::Exact.uses_exact());
        assert!(PlanMode::ExactWithHints.uses_heuristic());
        assert!(PlanMode::ExactForced.uses_exact());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = PlannerConfig::from_json_str(
            r#"{ "mode": "exact_forced", "resolver": { "max_iterations": 7 } }"#,
        )
        .unwrap();
        assert_eq!(config.mode, PlanMode::ExactForced);
        assert_eq!(config.resolver.max_iterations, 7);
        assert_eq!(
            config.resolver.penalty_multiplier,
            ResolverConfig::default().penalty_multiplier
        );
        assert_eq!(config.exact, SearchLimits::unlimited());
    }

    #[test]
    fn test_exact_limits_from_json() {
        let config =
            PlannerConfig::from_json_str(r#"{ "exact": { "node_limit": 50, "time_limit_ms": 250 } }"#)
                .unwrap();
        assert_eq!(config.exact.node_limit, Some(50));
        assert_eq!(config.exact.time_limit(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = PlannerConfig::from_json_str(r#"{ "moed": "exact" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let err = PlannerConfig::from_json_str(r#"{ "mode": "fastest" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_resolver_value() {
        let err = PlannerConfig::from_json_str(r#"{ "resolver": { "penalty_multiplier": 1.0 } }"#)
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { field, .. } => assert_eq!(field, "penalty_multiplier"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_node_limit_is_rejected() {
        let err = PlannerConfig::from_json_str(r#"{ "exact": { "node_limit": 0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "exact.node_limit",
                ..
            }
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let config = PlannerConfig {
            mode: PlanMode::ExactWithHints,
            resolver: ResolverConfig::builder().max_iterations(12).build().unwrap(),
            exact: SearchLimits::unlimited().with_node_limit(1_000),
        };
        let json = config.to_json_string().unwrap();
        assert!(json.contains("exact_with_hints"));
        assert_eq!(PlannerConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_display_lists_mode_and_limits() {
        let config = PlannerConfig {
            mode: PlanMode::Exact,
            exact: SearchLimits::unlimited().with_node_limit(10),
            ..PlannerConfig::default()
        };
        let text = config.to_string();
        assert!(text.contains("Mode:                 Exact"));
        assert!(text.contains("Exact node limit:     10"));
        assert!(text.contains("Exact time limit:     none"));
    }
}
