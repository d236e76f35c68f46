#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Normal-difficulty wave generation system.
//!
//! [`WaveGeneration`] is polled once per game tick with the player's towers.
//! It derives the difficulty phase from its wave counter, waits out the
//! phase's cooldown, then picks a strategy, lightly mutates that strategy's
//! template and occasionally appends a bonus group countering the towers.

mod clock;
mod rng;

use std::time::Duration;

use log::{debug, trace, warn};
use siege_core::{
    Adaptation, ConfigError, DifficultyPhase, EnemyName, EnemyTypeRegistry, GeneratorConfig,
    Strategy, Tower, Wave, WavePatternLibrary, FALLBACK_ENEMY,
};

pub use clock::{Clock, ManualClock, SystemClock};
pub use rng::WaveRng;

/// Chance that any single template entry is replaced by a random enemy type.
pub const MUTATION_PROBABILITY: f64 = 0.12;

/// Chance that a generated wave even considers reacting to the player's towers.
pub const ADAPTATION_PROBABILITY: f64 = 0.20;

/// Stateful wave generator owned by a single game session.
#[derive(Debug)]
pub struct WaveGeneration<R, C = SystemClock> {
    registry: EnemyTypeRegistry,
    patterns: WavePatternLibrary,
    roster: Vec<EnemyName>,
    rng: R,
    clock: C,
    phase: DifficultyPhase,
    cooldown: Duration,
    wave_number: u32,
    last_wave_time: Option<Duration>,
}

impl<R: WaveRng, C: Clock> WaveGeneration<R, C> {
    /// Creates a generator over validated configuration tables.
    pub fn new(config: GeneratorConfig, rng: R, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let (registry, patterns) = config.into_parts();
        Ok(Self::from_tables(registry, patterns, rng, clock))
    }

    /// Creates a generator over the built-in enemy registry and pattern library.
    #[must_use]
    pub fn with_builtin_tables(rng: R, clock: C) -> Self {
        Self::from_tables(
            EnemyTypeRegistry::builtin(),
            WavePatternLibrary::builtin(),
            rng,
            clock,
        )
    }

    fn from_tables(
        registry: EnemyTypeRegistry,
        patterns: WavePatternLibrary,
        rng: R,
        clock: C,
    ) -> Self {
        let roster = registry.names().cloned().collect();
        let phase = DifficultyPhase::for_wave(1);
        Self {
            registry,
            patterns,
            roster,
            rng,
            clock,
            phase,
            cooldown: phase.cooldown(),
            wave_number: 1,
            last_wave_time: None,
        }
    }

    /// Produces the next wave if the current phase's cooldown has elapsed.
    ///
    /// Returns `None` without touching the wave counter or the last wave time
    /// when the wave is not yet due.
    pub fn generate_wave(&mut self, towers: &[Tower]) -> Option<Wave> {
        self.refresh_phase();

        let now = self.clock.elapsed();
        if !self.cooldown_elapsed(now) {
            trace!(
                "wave {} not due: {:?} cooldown at {:?}",
                self.wave_number,
                self.cooldown,
                now
            );
            return None;
        }

        let strategy = select_strategy(self.phase, &mut self.rng);
        let mut enemies = match self.patterns.template(strategy) {
            Some(template) => mutate_template(template.enemies(), &self.roster, &mut self.rng),
            None => {
                warn!("no template for strategy `{strategy}`; sending a lone {FALLBACK_ENEMY}");
                let fallback = [EnemyName::from(FALLBACK_ENEMY)];
                mutate_template(&fallback, &self.roster, &mut self.rng)
            }
        };

        let adaptation = adapt(towers, &mut self.rng);
        if let Some(adaptation) = adaptation {
            enemies.extend(adaptation.bonus_group().iter().copied().map(EnemyName::from));
        }

        let wave = Wave::new(self.wave_number, self.phase, strategy, adaptation, enemies);
        debug!(
            "wave {} ({} phase, {strategy}{}): {:?}",
            wave.number(),
            wave.phase(),
            adaptation
                .map(|adaptation| format!(", {adaptation}"))
                .unwrap_or_default(),
            wave.enemy_names()
        );

        self.wave_number = self.wave_number.saturating_add(1);
        self.last_wave_time = Some(now);
        Some(wave)
    }

    fn refresh_phase(&mut self) {
        let phase = DifficultyPhase::for_wave(self.wave_number);
        if phase != self.phase {
            debug!(
                "difficulty advanced from {} to {phase} at wave {}",
                self.phase, self.wave_number
            );
        }
        self.phase = phase;
        self.cooldown = phase.cooldown();
    }

    fn cooldown_elapsed(&self, now: Duration) -> bool {
        match self.last_wave_time {
            Some(last) => now.saturating_sub(last) >= self.cooldown,
            None => true,
        }
    }

    /// Number the next produced wave will carry. Starts at one.
    #[must_use]
    pub const fn wave_number(&self) -> u32 {
        self.wave_number
    }

    /// Phase resolved by the most recent call.
    #[must_use]
    pub const fn phase(&self) -> DifficultyPhase {
        self.phase
    }

    /// Cooldown resolved by the most recent call.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Cooldown resolved by the most recent call, in seconds.
    #[must_use]
    pub fn cooldown_seconds(&self) -> f64 {
        self.cooldown.as_secs_f64()
    }

    /// Clock reading recorded when the last wave was produced.
    #[must_use]
    pub const fn last_wave_time(&self) -> Option<Duration> {
        self.last_wave_time
    }

    /// Enemy registry the generator draws substitutes from.
    #[must_use]
    pub fn registry(&self) -> &EnemyTypeRegistry {
        &self.registry
    }
}

/// Picks a strategy uniformly from the phase's candidate set.
pub fn select_strategy<R: WaveRng + ?Sized>(phase: DifficultyPhase, rng: &mut R) -> Strategy {
    let candidates = phase.candidate_strategies();
    let index = rng.choose_index(candidates.len());
    candidates[index % candidates.len()]
}

/// Copies `template`, replacing each entry with a uniformly drawn `roster`
/// name with probability [`MUTATION_PROBABILITY`].
///
/// Each position draws its gate independently and only draws a substitute
/// when the gate fires. Output order and length match the template.
pub fn mutate_template<R: WaveRng + ?Sized>(
    template: &[EnemyName],
    roster: &[EnemyName],
    rng: &mut R,
) -> Vec<EnemyName> {
    template
        .iter()
        .map(|enemy| {
            if roster.is_empty() || rng.next_unit() >= MUTATION_PROBABILITY {
                return enemy.clone();
            }
            let index = rng.choose_index(roster.len());
            let substitute = roster[index % roster.len()].clone();
            trace!("mutated {enemy} into {substitute}");
            substitute
        })
        .collect()
}

/// Rolls the adaptation gate and, when it fires, returns the highest priority
/// adaptation the towers trigger.
pub fn adapt<R: WaveRng + ?Sized>(towers: &[Tower], rng: &mut R) -> Option<Adaptation> {
    if rng.next_unit() >= ADAPTATION_PROBABILITY {
        return None;
    }
    Adaptation::select(towers)
}
