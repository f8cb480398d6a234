//! Configuration system for fleetplan.
//!
//! Load penalty weights, scheduling policy and solver run options from TOML
//! or YAML without code changes. Every section is optional and falls back to
//! documented defaults; unknown keys are rejected at load time.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use fleetplan_config::PlannerConfig;
//! use std::time::Duration;
//!
//! let config = PlannerConfig::from_toml_str(r#"
//!     [weights]
//!     delay_weight = 2.0
//!     cancellation_weight = 8000.0
//!
//!     [policy]
//!     turnaround_minutes = 30
//!
//!     [solver]
//!     time_limit_seconds = 30.0
//!     thread_count = 4
//! "#).unwrap();
//!
//! assert_eq!(config.weights.delay_weight, 2.0);
//! assert_eq!(config.weights.sla_weight, 500.0);
//! assert_eq!(config.policy.turnaround_minutes, 30);
//! assert_eq!(config.solver.time_limit(), Some(Duration::from_secs(30)));
//! ```
//!
//! Unknown keys are errors:
//!
//! ```
//! use fleetplan_config::PlannerConfig;
//!
//! let result = PlannerConfig::from_toml_str(r#"
//!     [weights]
//!     dealy_weight = 2.0
//! "#);
//! assert!(result.is_err());
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unknown configuration option: {0}")]
    UnknownOption(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main planner configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerConfig {
    /// Objective weights.
    pub weights: PenaltyWeights,

    /// Numeric scheduling policies.
    pub policy: SchedulingPolicy,

    /// Solver run options.
    pub solver: SolverOptions,
}

impl PlannerConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file, choosing the format by extension.
    ///
    /// `.yaml` and `.yml` files are parsed as YAML; everything else as TOML.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist, fails to parse, or holds
    /// out-of-range values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section for out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.policy.validate()?;
        self.solver.validate()
    }

    /// Replaces the penalty weights.
    pub fn with_weights(mut self, weights: PenaltyWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Sets the aircraft turnaround buffer.
    pub fn with_turnaround_minutes(mut self, minutes: i64) -> Self {
        self.policy.turnaround_minutes = minutes;
        self
    }

    /// Sets the duty-hour reference window.
    pub fn with_duty_window_hours(mut self, hours: f64) -> Self {
        self.policy.duty_window_hours = hours;
        self
    }

    /// Sets the solver time limit.
    pub fn with_time_limit_seconds(mut self, seconds: f64) -> Self {
        self.solver.time_limit_seconds = Some(seconds);
        self
    }

    /// Sets the relative optimality gap.
    pub fn with_optimality_gap(mut self, gap: f64) -> Self {
        self.solver.optimality_gap = gap;
        self
    }
}

/// Objective weights. All values are non-negative reals.
///
/// Delay, SLA and cancellation penalties are additionally scaled by each
/// flight's priority.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PenaltyWeights {
    /// Per minute of departure delay.
    pub delay_weight: f64,

    /// Per flight departing after its SLA deadline.
    pub sla_weight: f64,

    /// Per crew hour above standard duty.
    pub overtime_weight: f64,

    /// Per aircraft flight hour beyond maintenance due.
    pub maintenance_weight: f64,

    /// Per cancelled flight.
    pub cancellation_weight: f64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            delay_weight: 1.0,
            sla_weight: 500.0,
            overtime_weight: 600.0,
            maintenance_weight: 1000.0,
            cancellation_weight: 5000.0,
        }
    }
}

impl PenaltyWeights {
    /// Recognized option keys, in objective order.
    pub const OPTIONS: [&'static str; 5] = [
        "delay_weight",
        "sla_weight",
        "overtime_weight",
        "maintenance_weight",
        "cancellation_weight",
    ];

    /// Builds weights from loosely-typed key/value pairs.
    ///
    /// Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownOption`] for any key outside
    /// [`PenaltyWeights::OPTIONS`], or [`ConfigError::Invalid`] for a
    /// negative or non-finite value.
    ///
    /// # Examples
    ///
    /// ```
    /// use fleetplan_config::PenaltyWeights;
    ///
    /// let weights = PenaltyWeights::from_options([("sla_weight", 750.0)]).unwrap();
    /// assert_eq!(weights.sla_weight, 750.0);
    /// assert_eq!(weights.delay_weight, 1.0);
    ///
    /// assert!(PenaltyWeights::from_options([("fuel_weight", 1.0)]).is_err());
    /// ```
    pub fn from_options<'a, I>(options: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut weights = Self::default();
        for (key, value) in options {
            let slot = match key {
                "delay_weight" => &mut weights.delay_weight,
                "sla_weight" => &mut weights.sla_weight,
                "overtime_weight" => &mut weights.overtime_weight,
                "maintenance_weight" => &mut weights.maintenance_weight,
                "cancellation_weight" => &mut weights.cancellation_weight,
                other => return Err(ConfigError::UnknownOption(other.to_string())),
            };
            *slot = value;
        }
        weights.validate()?;
        Ok(weights)
    }

    /// Returns the weights as `(key, value)` pairs in objective order.
    pub fn options(&self) -> [(&'static str, f64); 5] {
        [
            ("delay_weight", self.delay_weight),
            ("sla_weight", self.sla_weight),
            ("overtime_weight", self.overtime_weight),
            ("maintenance_weight", self.maintenance_weight),
            ("cancellation_weight", self.cancellation_weight),
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in self.options() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{key} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Numeric policies used while building and decoding the model.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulingPolicy {
    /// Idle time an aircraft needs after arrival before its next departure.
    pub turnaround_minutes: i64,

    /// Length of the sliding window over which crew duty hours are capped.
    pub duty_window_hours: f64,

    /// Binary values within this distance of 0 or 1 count as integral.
    pub decode_tolerance: f64,

    /// Relative tolerance when cross-checking the reported objective.
    pub reporting_tolerance: f64,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            turnaround_minutes: 45,
            duty_window_hours: 24.0,
            decode_tolerance: 1e-4,
            reporting_tolerance: 1e-6,
        }
    }
}

impl SchedulingPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.turnaround_minutes < 0 {
            return Err(ConfigError::Invalid(format!(
                "turnaround_minutes must be non-negative, got {}",
                self.turnaround_minutes
            )));
        }
        if !self.duty_window_hours.is_finite() || self.duty_window_hours <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "duty_window_hours must be positive, got {}",
                self.duty_window_hours
            )));
        }
        if !(self.decode_tolerance > 0.0 && self.decode_tolerance < 0.5) {
            return Err(ConfigError::Invalid(format!(
                "decode_tolerance must lie in (0, 0.5), got {}",
                self.decode_tolerance
            )));
        }
        if !self.reporting_tolerance.is_finite() || self.reporting_tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "reporting_tolerance must be non-negative, got {}",
                self.reporting_tolerance
            )));
        }
        Ok(())
    }
}

/// Solver run options passed through to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverOptions {
    /// Wall-clock limit for one solve; `None` means unlimited.
    pub time_limit_seconds: Option<f64>,

    /// Relative optimality gap at which the backend may stop.
    pub optimality_gap: f64,

    /// Worker threads; the backend chooses when absent.
    pub thread_count: Option<usize>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            time_limit_seconds: Some(60.0),
            optimality_gap: 1e-4,
            thread_count: None,
        }
    }
}

impl SolverOptions {
    /// Returns the time limit as a `Duration`, if configured.
    ///
    /// # Examples
    ///
    /// ```
    /// use fleetplan_config::SolverOptions;
    /// use std::time::Duration;
    ///
    /// let options = SolverOptions { time_limit_seconds: Some(1.5), ..Default::default() };
    /// assert_eq!(options.time_limit(), Some(Duration::from_millis(1500)));
    /// ```
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_seconds
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(Duration::from_secs_f64)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(seconds) = self.time_limit_seconds {
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "time_limit_seconds must be positive, got {seconds}"
                )));
            }
        }
        if !self.optimality_gap.is_finite() || self.optimality_gap < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "optimality_gap must be non-negative, got {}",
                self.optimality_gap
            )));
        }
        if self.thread_count == Some(0) {
            return Err(ConfigError::Invalid(
                "thread_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
