#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Siege wave generator.
//!
//! This crate defines the static configuration surface consumed by the
//! generator (the enemy type registry and the wave pattern library), the
//! difficulty phases and strategies the generator chooses between, the tower
//! view it reacts to, and the [`Wave`] value it produces. Nothing in here
//! draws random numbers or reads a clock; systems own those concerns.

mod config;

use std::{borrow::Borrow, collections::BTreeMap, fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use config::{ConfigError, GeneratorConfig};

/// Enemy emitted in place of a template when the library lacks a strategy.
pub const FALLBACK_ENEMY: &str = "grunt";

/// Waves below this number belong to the early phase.
pub const MID_PHASE_START_WAVE: u32 = 4;

/// Waves at or above this number belong to the late phase.
pub const LATE_PHASE_START_WAVE: u32 = 9;

/// Name of an enemy type as keyed by the [`EnemyTypeRegistry`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnemyName(String);

impl EnemyName {
    /// Creates a new enemy name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrows the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EnemyName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EnemyName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl PartialEq<str> for EnemyName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EnemyName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for EnemyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stat block describing a single enemy type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyTypeSpec {
    name: EnemyName,
    cost: u32,
    speed: u32,
    hp: u32,
    is_flying: bool,
}

impl EnemyTypeSpec {
    /// Creates a new enemy type description.
    #[must_use]
    pub fn new(name: impl Into<String>, cost: u32, speed: u32, hp: u32, is_flying: bool) -> Self {
        Self {
            name: EnemyName::new(name),
            cost,
            speed,
            hp,
            is_flying,
        }
    }

    /// Name the registry keys this enemy type by.
    #[must_use]
    pub fn name(&self) -> &EnemyName {
        &self.name
    }

    /// Resource cost of spawning a single enemy of this type.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Movement speed expressed in world units.
    #[must_use]
    pub const fn speed(&self) -> u32 {
        self.speed
    }

    /// Hit points of a freshly spawned enemy.
    #[must_use]
    pub const fn hp(&self) -> u32 {
        self.hp
    }

    /// Whether the enemy ignores ground-only defences.
    #[must_use]
    pub const fn is_flying(&self) -> bool {
        self.is_flying
    }
}

/// Immutable table of every enemy type a wave may contain.
///
/// Entries are ordered by name so that uniform draws over the key set are
/// reproducible for a fixed random stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnemyTypeRegistry {
    entries: BTreeMap<EnemyName, EnemyTypeSpec>,
}

impl EnemyTypeRegistry {
    /// Builds a registry from the provided specs. Later duplicates replace earlier ones.
    #[must_use]
    pub fn from_specs(specs: impl IntoIterator<Item = EnemyTypeSpec>) -> Self {
        let entries = specs
            .into_iter()
            .map(|spec| (spec.name.clone(), spec))
            .collect();
        Self { entries }
    }

    /// Registry shipped with the game.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_specs([
            EnemyTypeSpec::new("grunt", 5, 80, 60, false),
            EnemyTypeSpec::new("fast", 7, 150, 40, false),
            EnemyTypeSpec::new("tank", 20, 45, 250, false),
            EnemyTypeSpec::new("flying", 10, 120, 45, true),
            EnemyTypeSpec::new("swarm", 3, 95, 20, false),
        ])
    }

    /// Looks up the stats registered for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EnemyTypeSpec> {
        self.entries.get(name)
    }

    /// Reports whether `name` is a registered enemy type.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Enemy names in registry order.
    pub fn names(&self) -> impl ExactSizeIterator<Item = &EnemyName> + '_ {
        self.entries.keys()
    }

    /// Iterates over every registered spec in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemyTypeSpec> + '_ {
        self.entries.values()
    }

    /// Number of registered enemy types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the registry holds no enemy types.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EnemyTypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Named wave composition policies the generator can follow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Grunts with a single fast runner.
    Balanced,
    /// A large group of cheap swarmers.
    Swarm,
    /// Tanks escorting a grunt.
    TankPush,
    /// Mostly fast runners.
    FastRush,
    /// One of everything.
    Mixed,
}

impl Strategy {
    /// Every strategy in declaration order.
    pub const ALL: [Strategy; 5] = [
        Strategy::Balanced,
        Strategy::Swarm,
        Strategy::TankPush,
        Strategy::FastRush,
        Strategy::Mixed,
    ];

    /// Canonical configuration name of the strategy.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Strategy::Balanced => "balanced",
            Strategy::Swarm => "swarm",
            Strategy::TankPush => "tank_push",
            Strategy::FastRush => "fast_rush",
            Strategy::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raised when a strategy name does not match any [`Strategy`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown strategy `{0}`")]
pub struct UnknownStrategy(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == value)
            .ok_or_else(|| UnknownStrategy(value.to_owned()))
    }
}

/// Unmutated, ordered enemy list associated with a strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WavePatternTemplate {
    enemies: Vec<EnemyName>,
}

impl WavePatternTemplate {
    /// Creates a template from the provided enemy names.
    #[must_use]
    pub fn new<I, S>(enemies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enemies: enemies.into_iter().map(EnemyName::new).collect(),
        }
    }

    /// Template entries in spawn order.
    #[must_use]
    pub fn enemies(&self) -> &[EnemyName] {
        &self.enemies
    }

    /// Number of enemies in the template.
    #[must_use]
    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    /// Reports whether the template holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }
}

/// Templates keyed by strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WavePatternLibrary {
    templates: BTreeMap<Strategy, WavePatternTemplate>,
}

impl WavePatternLibrary {
    /// Creates a library from strategy and template pairs.
    #[must_use]
    pub fn from_templates(
        templates: impl IntoIterator<Item = (Strategy, WavePatternTemplate)>,
    ) -> Self {
        Self {
            templates: templates.into_iter().collect(),
        }
    }

    /// Library shipped with the game.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_templates([
            (
                Strategy::Balanced,
                WavePatternTemplate::new(["grunt", "grunt", "fast", "grunt"]),
            ),
            (Strategy::Swarm, WavePatternTemplate::new(["swarm"; 10])),
            (
                Strategy::TankPush,
                WavePatternTemplate::new(["tank", "grunt", "tank"]),
            ),
            (
                Strategy::FastRush,
                WavePatternTemplate::new(["fast", "fast", "fast", "grunt"]),
            ),
            (
                Strategy::Mixed,
                WavePatternTemplate::new(["grunt", "fast", "tank", "grunt", "flying"]),
            ),
        ])
    }

    /// Template registered for `strategy`, if any.
    #[must_use]
    pub fn template(&self, strategy: Strategy) -> Option<&WavePatternTemplate> {
        self.templates.get(&strategy)
    }

    /// Iterates over strategies and their templates in strategy order.
    pub fn iter(&self) -> impl Iterator<Item = (Strategy, &WavePatternTemplate)> + '_ {
        self.templates
            .iter()
            .map(|(strategy, template)| (*strategy, template))
    }

    /// Strategies with no registered template.
    pub fn missing_strategies(&self) -> impl Iterator<Item = Strategy> + '_ {
        Strategy::ALL
            .into_iter()
            .filter(|strategy| !self.templates.contains_key(strategy))
    }
}

impl Default for WavePatternLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Difficulty tier derived from the wave counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DifficultyPhase {
    /// Waves 1 through 3.
    Early,
    /// Waves 4 through 8.
    Mid,
    /// Wave 9 onwards.
    Late,
}

impl DifficultyPhase {
    /// Resolves the phase a wave number belongs to.
    #[must_use]
    pub const fn for_wave(wave_number: u32) -> Self {
        if wave_number < MID_PHASE_START_WAVE {
            DifficultyPhase::Early
        } else if wave_number < LATE_PHASE_START_WAVE {
            DifficultyPhase::Mid
        } else {
            DifficultyPhase::Late
        }
    }

    /// Minimum delay between consecutive waves while in this phase.
    #[must_use]
    pub const fn cooldown(self) -> Duration {
        match self {
            DifficultyPhase::Early => Duration::from_secs(6),
            DifficultyPhase::Mid => Duration::from_secs(5),
            DifficultyPhase::Late => Duration::from_secs(4),
        }
    }

    /// Strategies the generator may pick from while in this phase.
    #[must_use]
    pub const fn candidate_strategies(self) -> &'static [Strategy] {
        match self {
            DifficultyPhase::Early => &[Strategy::Balanced, Strategy::Swarm],
            DifficultyPhase::Mid => &[Strategy::Balanced, Strategy::FastRush, Strategy::Mixed],
            DifficultyPhase::Late => &[Strategy::TankPush, Strategy::Mixed, Strategy::Swarm],
        }
    }
}

impl fmt::Display for DifficultyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DifficultyPhase::Early => "early",
            DifficultyPhase::Mid => "mid",
            DifficultyPhase::Late => "late",
        };
        f.write_str(label)
    }
}

/// Tower traits the adaptation rule reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TowerCapability {
    /// Tower cannot hit airborne enemies.
    AntiGroundOnly,
    /// Tower fires slowly.
    SlowShooter,
    /// Tower only reaches nearby enemies.
    ShortRange,
}

impl TowerCapability {
    /// Parses a tower classification tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "anti_ground_only" => Some(TowerCapability::AntiGroundOnly),
            "slow_shooter" => Some(TowerCapability::SlowShooter),
            "short_range" => Some(TowerCapability::ShortRange),
            _ => None,
        }
    }
}

/// Player-built tower as observed by the generator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tower {
    classification: String,
}

impl Tower {
    /// Creates a tower view with the given classification tag. The tag may be empty.
    #[must_use]
    pub fn new(classification: impl Into<String>) -> Self {
        Self {
            classification: classification.into(),
        }
    }

    /// Raw classification tag supplied by the game.
    #[must_use]
    pub fn classification(&self) -> &str {
        &self.classification
    }

    /// Capability recognised from the classification tag, if any.
    #[must_use]
    pub fn capability(&self) -> Option<TowerCapability> {
        TowerCapability::from_tag(&self.classification)
    }
}

/// Bonus group appended to a wave in response to the player's towers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Adaptation {
    /// Flyers sent past ground-only defences.
    CounterAntiGround,
    /// Fast runners sent past slow shooters.
    CounterSlowShooter,
    /// A tank sent to soak short-range fire.
    CounterShortRange,
}

impl Adaptation {
    /// Adaptations in the order they are considered. The first match wins.
    pub const PRIORITY: [Adaptation; 3] = [
        Adaptation::CounterAntiGround,
        Adaptation::CounterSlowShooter,
        Adaptation::CounterShortRange,
    ];

    /// Tower capability that triggers this adaptation.
    #[must_use]
    pub const fn trigger(self) -> TowerCapability {
        match self {
            Adaptation::CounterAntiGround => TowerCapability::AntiGroundOnly,
            Adaptation::CounterSlowShooter => TowerCapability::SlowShooter,
            Adaptation::CounterShortRange => TowerCapability::ShortRange,
        }
    }

    /// Enemies appended to the wave when this adaptation fires.
    #[must_use]
    pub const fn bonus_group(self) -> &'static [&'static str] {
        match self {
            Adaptation::CounterAntiGround => &["flying", "flying"],
            Adaptation::CounterSlowShooter => &["fast", "fast", "fast"],
            Adaptation::CounterShortRange => &["tank"],
        }
    }

    /// Highest priority adaptation triggered by the provided towers.
    #[must_use]
    pub fn select(towers: &[Tower]) -> Option<Self> {
        Adaptation::PRIORITY.into_iter().find(|adaptation| {
            towers
                .iter()
                .any(|tower| tower.capability() == Some(adaptation.trigger()))
        })
    }
}

impl fmt::Display for Adaptation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Adaptation::CounterAntiGround => "counter anti-ground",
            Adaptation::CounterSlowShooter => "counter slow shooter",
            Adaptation::CounterShortRange => "counter short range",
        };
        f.write_str(label)
    }
}

/// Ordered batch of enemies produced by a single successful generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    number: u32,
    phase: DifficultyPhase,
    strategy: Strategy,
    adaptation: Option<Adaptation>,
    enemies: Vec<EnemyName>,
}

impl Wave {
    /// Assembles a wave record.
    #[must_use]
    pub fn new(
        number: u32,
        phase: DifficultyPhase,
        strategy: Strategy,
        adaptation: Option<Adaptation>,
        enemies: Vec<EnemyName>,
    ) -> Self {
        Self {
            number,
            phase,
            strategy,
            adaptation,
            enemies,
        }
    }

    /// Wave counter value the wave was produced under.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// Phase active when the wave was produced.
    #[must_use]
    pub const fn phase(&self) -> DifficultyPhase {
        self.phase
    }

    /// Strategy the template was drawn from.
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Adaptation appended to the wave, if one fired.
    #[must_use]
    pub const fn adaptation(&self) -> Option<Adaptation> {
        self.adaptation
    }

    /// Enemies to spawn, in order.
    #[must_use]
    pub fn enemies(&self) -> &[EnemyName] {
        &self.enemies
    }

    /// Enemy names borrowed as string slices.
    #[must_use]
    pub fn enemy_names(&self) -> Vec<&str> {
        self.enemies.iter().map(EnemyName::as_str).collect()
    }

    /// Number of enemies in the wave.
    #[must_use]
    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    /// Reports whether the wave holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    /// Aggregates the stats of every enemy in the wave.
    ///
    /// Names missing from `registry` contribute nothing.
    #[must_use]
    pub fn summary(&self, registry: &EnemyTypeRegistry) -> WaveSummary {
        self.enemies
            .iter()
            .filter_map(|name| registry.get(name.as_str()))
            .fold(WaveSummary::default(), |summary, spec| WaveSummary {
                total_cost: summary.total_cost.saturating_add(spec.cost()),
                total_hp: summary.total_hp.saturating_add(spec.hp()),
                flying: summary.flying + usize::from(spec.is_flying()),
            })
    }
}

/// Aggregate stats of a wave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WaveSummary {
    /// Combined spawn cost.
    pub total_cost: u32,
    /// Combined hit points.
    pub total_hp: u32,
    /// Number of flying enemies.
    pub flying: usize,
}
