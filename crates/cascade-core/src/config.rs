//! Configuration loading and typed config structures for the Resistance
//! Cascade simulation.
//!
//! The canonical configuration lives in `cascade-config.yaml` at the
//! project root. Every field has a default matching the reference model,
//! so an empty document (or a missing file) yields a runnable setup.

use std::path::Path;

use serde::Deserialize;

/// Seed used when neither the file nor the environment provides one.
pub const DEFAULT_SEED: u64 = 42;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is outside its allowed range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `cascade-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CascadeConfig {
    /// Grid size and seeding.
    #[serde(default)]
    pub world: WorldConfig,

    /// Population sizes, vision, and movement.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Trait distributions.
    #[serde(default)]
    pub preferences: PreferenceConfig,

    /// Run bounds and jail terms.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CascadeConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `CASCADE_SEED` overrides `world.seed` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Override values with environment variables when set.
    ///
    /// - `CASCADE_SEED` overrides `world.seed` (ignored if not a `u64`)
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides read through `lookup` instead of the process
    /// environment.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("CASCADE_SEED") {
            match val.trim().parse::<u64>() {
                Ok(seed) => self.world.seed = Some(seed),
                Err(_) => tracing::warn!(value = %val, "Ignoring unparseable CASCADE_SEED"),
            }
        }
    }

    /// Number of cells on the grid.
    pub fn area(&self) -> u64 {
        u64::from(self.world.width).saturating_mul(u64::from(self.world.height))
    }

    /// Number of citizens the densities produce on this grid.
    pub fn citizen_count(&self) -> u32 {
        population_count(self.area(), self.population.citizen_density)
    }

    /// Number of security officers the densities produce on this grid.
    pub fn security_count(&self) -> u32 {
        population_count(self.area(), self.population.security_density)
    }

    /// Check every value against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        if world.width == 0 || world.height == 0 {
            return Err(invalid(
                "world.width",
                format!("grid must be non-empty, got {}x{}", world.width, world.height),
            ));
        }

        check_density("population.citizen_density", self.population.citizen_density)?;
        check_density("population.security_density", self.population.security_density)?;

        let shortest = world.width.min(world.height);
        check_vision("population.citizen_vision", self.population.citizen_vision, shortest)?;
        check_vision("population.security_vision", self.population.security_vision, shortest)?;

        let prefs = &self.preferences;
        check_finite("preferences.private_preference_mean", prefs.private_preference_mean)?;
        check_finite("preferences.threshold", prefs.threshold)?;
        check_spread("preferences.standard_deviation", prefs.standard_deviation)?;
        check_spread("preferences.epsilon", prefs.epsilon)?;

        if !self.population.multiple_agents_per_cell {
            let total = u64::from(self.citizen_count())
                .saturating_add(u64::from(self.security_count()));
            if total > self.area() {
                return Err(invalid(
                    "population.multiple_agents_per_cell",
                    format!(
                        "{total} agents cannot fit one per cell on {} cells",
                        self.area()
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// `round(area * density)`, ties to even.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn population_count(area: u64, density: f64) -> u32 {
    let raw = (area as f64 * density).round_ties_even();
    if raw.is_finite() && raw > 0.0 {
        raw.min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite, got {value}")))
    }
}

fn check_density(field: &'static str, value: f64) -> Result<(), ConfigError> {
    check_finite(field, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("must be within [0, 1], got {value}")))
    }
}

fn check_spread(field: &'static str, value: f64) -> Result<(), ConfigError> {
    check_finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be non-negative, got {value}")))
    }
}

/// A radius reaching half the shortest side would count wrapped cells twice.
fn check_vision(field: &'static str, vision: u32, shortest_side: u32) -> Result<(), ConfigError> {
    if vision.saturating_mul(2) < shortest_side {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("radius {vision} must be less than half of the shortest side {shortest_side}"),
        ))
    }
}

/// Grid size and seeding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Grid width in cells.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Grid height in cells.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Seed for the run's random stream; [`DEFAULT_SEED`] when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Draw a fresh seed instead of using `seed`.
    #[serde(default)]
    pub random_seed: bool,
}

impl WorldConfig {
    /// The configured seed, or [`DEFAULT_SEED`].
    pub fn seed_or_default(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            seed: None,
            random_seed: false,
        }
    }
}

/// Population sizes, vision, and movement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopulationConfig {
    /// Fraction of cells that receive a citizen.
    #[serde(default = "default_citizen_density")]
    pub citizen_density: f64,

    /// Fraction of cells that receive a security officer.
    #[serde(default)]
    pub security_density: f64,

    /// Citizen sensing radius.
    #[serde(default = "default_vision")]
    pub citizen_vision: u32,

    /// Security sensing radius.
    #[serde(default = "default_vision")]
    pub security_vision: u32,

    /// Whether actors take a random step when they commit.
    #[serde(default = "default_true")]
    pub movement: bool,

    /// Whether a cell may hold more than one actor.
    #[serde(default = "default_true")]
    pub multiple_agents_per_cell: bool,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            citizen_density: default_citizen_density(),
            security_density: 0.0,
            citizen_vision: default_vision(),
            security_vision: default_vision(),
            movement: true,
            multiple_agents_per_cell: true,
        }
    }
}

/// Trait distributions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PreferenceConfig {
    /// Mean private preference (negative = opposed to the regime).
    #[serde(default)]
    pub private_preference_mean: f64,

    /// Spread of private preference.
    #[serde(default = "default_standard_deviation")]
    pub standard_deviation: f64,

    /// Spread of per-citizen perception noise.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Center of the threshold distribution.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for PreferenceConfig {
    fn default() -> Self {
        Self {
            private_preference_mean: 0.0,
            standard_deviation: default_standard_deviation(),
            epsilon: default_epsilon(),
            threshold: default_threshold(),
        }
    }
}

/// Run bounds and jail terms.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// The run ends once the step counter exceeds this.
    #[serde(default = "default_max_iters")]
    pub max_iters: u64,

    /// Longest sentence, inclusive.
    #[serde(default = "default_max_jail_term")]
    pub max_jail_term: u32,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_iters: default_max_iters(),
            max_jail_term: default_max_jail_term(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,

    /// Log the model report every N steps (0 disables).
    #[serde(default = "default_report_interval")]
    pub report_interval: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            report_interval: default_report_interval(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_width() -> u32 {
    40
}

const fn default_height() -> u32 {
    40
}

const fn default_citizen_density() -> f64 {
    0.7
}

const fn default_vision() -> u32 {
    7
}

const fn default_true() -> bool {
    true
}

const fn default_standard_deviation() -> f64 {
    1.0
}

const fn default_epsilon() -> f64 {
    0.5
}

const fn default_threshold() -> f64 {
    3.66356
}

const fn default_max_iters() -> u64 {
    1000
}

const fn default_max_jail_term() -> u32 {
    100
}

fn default_log_level() -> String {
    String::from("info")
}

const fn default_report_interval() -> u64 {
    10
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_reference_defaults() {
        let config = CascadeConfig::parse("{}").unwrap();
        assert_eq!(config.world.width, 40);
        assert_eq!(config.world.height, 40);
        assert_eq!(config.world.seed_or_default(), DEFAULT_SEED);
        assert!(!config.world.random_seed);
        assert_eq!(config.population.citizen_vision, 7);
        assert!(config.population.movement);
        assert!(config.population.multiple_agents_per_cell);
        assert!((config.preferences.threshold - 3.66356).abs() < f64::EPSILON);
        assert_eq!(config.simulation.max_iters, 1000);
        assert_eq!(config.simulation.max_jail_term, 100);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config, CascadeConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = "
world:
  width: 10
  height: 12
  seed: 7
population:
  security_density: 0.05
  citizen_vision: 3
  security_vision: 2
";
        let config = CascadeConfig::parse(yaml).unwrap();
        assert_eq!(config.world.width, 10);
        assert_eq!(config.world.seed, Some(7));
        assert!((config.population.citizen_density - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.population.security_vision, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn counts_round_half_to_even() {
        let mut config = CascadeConfig::default();
        config.world.width = 10;
        config.world.height = 1;
        config.population.citizen_vision = 0;
        config.population.security_vision = 0;
        config.population.citizen_density = 0.25;
        config.population.security_density = 0.35;
        assert_eq!(config.citizen_count(), 2);
        assert_eq!(config.security_count(), 4);

        config.world.width = 40;
        config.world.height = 40;
        config.population.citizen_density = 0.7;
        assert_eq!(config.citizen_count(), 1120);
    }

    #[test]
    fn rejects_out_of_range_density() {
        let mut config = CascadeConfig::default();
        config.population.citizen_density = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "population.citizen_density",
                ..
            })
        ));

        let mut config = CascadeConfig::default();
        config.population.security_density = -0.1;
        assert!(config.validate().is_err());

        let mut config = CascadeConfig::default();
        config.population.security_density = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_grid() {
        let mut config = CascadeConfig::default();
        config.world.height = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "world.width",
                ..
            })
        ));
    }

    #[test]
    fn rejects_vision_that_wraps_onto_itself() {
        let mut config = CascadeConfig::default();
        config.world.width = 10;
        config.world.height = 14;
        config.population.citizen_vision = 5;
        config.population.security_vision = 4;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "population.citizen_vision",
                ..
            })
        ));
        config.population.citizen_vision = 4;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_negative_spread() {
        let mut config = CascadeConfig::default();
        config.preferences.epsilon = -0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "preferences.epsilon",
                ..
            })
        ));
    }

    #[test]
    fn rejects_overfull_single_occupancy_grid() {
        let mut config = CascadeConfig::default();
        config.world.width = 10;
        config.world.height = 10;
        config.population.citizen_vision = 2;
        config.population.security_vision = 2;
        config.population.citizen_density = 0.8;
        config.population.security_density = 0.3;
        config.population.multiple_agents_per_cell = false;
        assert!(config.validate().is_err());

        config.population.multiple_agents_per_cell = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn seed_override_replaces_world_seed() {
        let mut config = CascadeConfig::default();
        config.apply_overrides_from(|key| (key == "CASCADE_SEED").then(|| " 9001 ".to_owned()));
        assert_eq!(config.world.seed, Some(9001));
        assert_eq!(config.world.seed_or_default(), 9001);
    }

    #[test]
    fn unparseable_seed_override_is_ignored() {
        let mut config = CascadeConfig::parse("world:\n  seed: 7\n").unwrap();
        config.apply_overrides_from(|_| Some("abc".to_owned()));
        assert_eq!(config.world.seed, Some(7));

        config.apply_overrides_from(|_| Some("-3".to_owned()));
        assert_eq!(config.world.seed, Some(7));

        config.apply_overrides_from(|_| None);
        assert_eq!(config.world.seed, Some(7));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("cascade-config.yaml");
        if path.exists() {
            let loaded = CascadeConfig::from_file(&path);
            assert!(loaded.is_ok(), "Failed to load project config: {loaded:?}");

            let contents = std::fs::read_to_string(&path).unwrap();
            let config = CascadeConfig::parse(&contents).unwrap();
            let mut expected = CascadeConfig::default();
            expected.world.seed = Some(DEFAULT_SEED);
            assert_eq!(config, expected);
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn invalid_yaml_is_reported() {
        assert!(matches!(
            CascadeConfig::parse("world: [unterminated"),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
