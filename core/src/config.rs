//! Loading and validation of the generator's static configuration tables.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    Adaptation, EnemyTypeRegistry, EnemyTypeSpec, Strategy, UnknownStrategy, WavePatternLibrary,
    WavePatternTemplate, FALLBACK_ENEMY,
};

/// Errors raised while loading or validating generator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration at {}", path.display())]
    Read {
        /// Location that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The configuration document was not valid TOML for this schema.
    #[error("could not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A pattern was keyed by a name that is not a strategy.
    #[error(transparent)]
    UnknownStrategy(#[from] UnknownStrategy),
    /// The enemy registry holds no entries.
    #[error("enemy registry is empty")]
    EmptyRegistry,
    /// A strategy maps to an empty template.
    #[error("template for strategy `{strategy}` is empty")]
    EmptyTemplate {
        /// Strategy whose template is empty.
        strategy: Strategy,
    },
    /// A template references an enemy missing from the registry.
    #[error("template for strategy `{strategy}` references unknown enemy `{enemy}`")]
    UnknownEnemy {
        /// Strategy whose template holds the reference.
        strategy: Strategy,
        /// Name that failed to resolve.
        enemy: String,
    },
    /// An enemy the generator emits on its own is missing from the registry.
    #[error("enemy `{enemy}` is required by the generator but not registered")]
    MissingRequiredEnemy {
        /// Name of the required enemy.
        enemy: String,
    },
}

/// Static tables consumed by the wave generator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeneratorConfig {
    registry: EnemyTypeRegistry,
    patterns: WavePatternLibrary,
}

impl GeneratorConfig {
    /// Pairs a registry with a pattern library without validating them.
    #[must_use]
    pub fn new(registry: EnemyTypeRegistry, patterns: WavePatternLibrary) -> Self {
        Self { registry, patterns }
    }

    /// Parses and validates a TOML configuration document.
    ///
    /// Sections absent from the document keep their built-in tables.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let document: ConfigDocument = toml::from_str(contents)?;

        let registry = match document.enemies {
            Some(enemies) => EnemyTypeRegistry::from_specs(enemies.into_iter().map(
                |(name, stats)| {
                    EnemyTypeSpec::new(name, stats.cost, stats.speed, stats.hp, stats.flying)
                },
            )),
            None => EnemyTypeRegistry::builtin(),
        };

        let patterns = match document.patterns {
            Some(patterns) => {
                let mut templates = Vec::with_capacity(patterns.len());
                for (name, enemies) in patterns {
                    let strategy: Strategy = name.parse()?;
                    templates.push((strategy, WavePatternTemplate::new(enemies)));
                }
                WavePatternLibrary::from_templates(templates)
            }
            None => WavePatternLibrary::builtin(),
        };

        let config = Self::new(registry, patterns);
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the TOML configuration stored at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Checks that every name the generator can emit resolves in the registry.
    ///
    /// A library lacking some strategy passes validation; the generator falls
    /// back to a single grunt for it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.is_empty() {
            return Err(ConfigError::EmptyRegistry);
        }

        for (strategy, template) in self.patterns.iter() {
            if template.is_empty() {
                return Err(ConfigError::EmptyTemplate { strategy });
            }
            if let Some(enemy) = template
                .enemies()
                .iter()
                .find(|enemy| !self.registry.contains(enemy.as_str()))
            {
                return Err(ConfigError::UnknownEnemy {
                    strategy,
                    enemy: enemy.to_string(),
                });
            }
        }

        let required = Adaptation::PRIORITY
            .into_iter()
            .flat_map(Adaptation::bonus_group)
            .copied()
            .chain([FALLBACK_ENEMY]);
        for enemy in required {
            if !self.registry.contains(enemy) {
                return Err(ConfigError::MissingRequiredEnemy {
                    enemy: enemy.to_owned(),
                });
            }
        }

        for strategy in self.patterns.missing_strategies() {
            log::warn!(
                "no wave pattern configured for strategy `{strategy}`; \
                 waves will fall back to `{FALLBACK_ENEMY}`"
            );
        }

        Ok(())
    }

    /// Enemy type registry.
    #[must_use]
    pub fn registry(&self) -> &EnemyTypeRegistry {
        &self.registry
    }

    /// Wave pattern library.
    #[must_use]
    pub fn patterns(&self) -> &WavePatternLibrary {
        &self.patterns
    }

    /// Splits the configuration into its tables.
    #[must_use]
    pub fn into_parts(self) -> (EnemyTypeRegistry, WavePatternLibrary) {
        (self.registry, self.patterns)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigDocument {
    enemies: Option<BTreeMap<String, EnemyStats>>,
    patterns: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnemyStats {
    cost: u32,
    speed: u32,
    hp: u32,
    #[serde(default)]
    flying: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_keeps_builtin_tables() {
        let config = GeneratorConfig::from_toml_str("").expect("empty document");
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn parses_custom_enemies_and_patterns() {
        let contents = r#"
            [enemies.grunt]
            cost = 4
            speed = 70
            hp = 55

            [enemies.fast]
            cost = 6
            speed = 160
            hp = 35

            [enemies.tank]
            cost = 25
            speed = 40
            hp = 300

            [enemies.flying]
            cost = 12
            speed = 110
            hp = 50
            flying = true

            [patterns]
            balanced = ["grunt", "tank"]
            swarm = ["grunt", "grunt", "grunt"]
        "#;
        let config = GeneratorConfig::from_toml_str(contents).expect("valid config");

        let grunt = config.registry().get("grunt").expect("grunt registered");
        assert_eq!((grunt.cost(), grunt.speed(), grunt.hp()), (4, 70, 55));
        assert!(!grunt.is_flying());
        assert!(config.registry().get("flying").expect("flying").is_flying());
        assert_eq!(config.registry().len(), 4);

        let balanced = config
            .patterns()
            .template(Strategy::Balanced)
            .expect("balanced template");
        assert_eq!(balanced.len(), 2);
        assert!(config.patterns().template(Strategy::Mixed).is_none());
    }

    #[test]
    fn rejects_unknown_strategy_keys() {
        let error = GeneratorConfig::from_toml_str("[patterns]\nturtle = [\"grunt\"]\n")
            .expect_err("unknown strategy");
        assert!(matches!(error, ConfigError::UnknownStrategy(_)));
    }

    #[test]
    fn rejects_templates_with_unregistered_enemies() {
        let error = GeneratorConfig::from_toml_str("[patterns]\nmixed = [\"grunt\", \"dragon\"]\n")
            .expect_err("unknown enemy");
        match error {
            ConfigError::UnknownEnemy { strategy, enemy } => {
                assert_eq!(strategy, Strategy::Mixed);
                assert_eq!(enemy, "dragon");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_empty_templates() {
        let error = GeneratorConfig::from_toml_str("[patterns]\nswarm = []\n")
            .expect_err("empty template");
        assert!(matches!(
            error,
            ConfigError::EmptyTemplate {
                strategy: Strategy::Swarm
            }
        ));
    }

    #[test]
    fn rejects_registry_without_adaptation_enemies() {
        let contents = r#"
            [enemies.grunt]
            cost = 5
            speed = 80
            hp = 60

            [patterns]
            balanced = ["grunt"]
        "#;
        let error = GeneratorConfig::from_toml_str(contents).expect_err("missing flyers");
        assert!(matches!(error, ConfigError::MissingRequiredEnemy { .. }));
    }

    #[test]
    fn rejects_empty_registry() {
        let config = GeneratorConfig::new(
            EnemyTypeRegistry::from_specs(Vec::new()),
            WavePatternLibrary::from_templates(Vec::new()),
        );
        assert!(matches!(config.validate(), Err(ConfigError::EmptyRegistry)));
    }

    #[test]
    fn rejects_malformed_documents() {
        let error = GeneratorConfig::from_toml_str("[enemies.grunt]\ncost = \"cheap\"\n")
            .expect_err("malformed");
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn shipped_config_matches_builtin_tables() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../config/normal.toml");
        let config = GeneratorConfig::from_path(path).expect("shipped config loads");
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn reports_missing_files() {
        let error = GeneratorConfig::from_path("does/not/exist.toml").expect_err("missing file");
        assert!(matches!(error, ConfigError::Read { .. }));
    }
}
