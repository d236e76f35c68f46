use std::{collections::VecDeque, time::Duration};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use siege_core::{Adaptation, DifficultyPhase, EnemyTypeRegistry, Strategy, Tower, Wave};
use siege_system_wave_generation::{ManualClock, WaveGeneration, WaveRng};

/// Replays scripted draws, then repeats the configured defaults.
#[derive(Debug)]
struct ScriptedRng {
    units: VecDeque<f64>,
    indices: VecDeque<usize>,
    default_unit: f64,
    default_index: usize,
}

impl ScriptedRng {
    /// Never mutates, never adapts, always picks candidate `index`.
    fn quiet(index: usize) -> Self {
        Self {
            units: VecDeque::new(),
            indices: VecDeque::new(),
            default_unit: 0.99,
            default_index: index,
        }
    }

    fn with_units(mut self, units: &[f64]) -> Self {
        self.units.extend(units.iter().copied());
        self
    }

    fn with_indices(mut self, indices: &[usize]) -> Self {
        self.indices.extend(indices.iter().copied());
        self
    }
}

impl WaveRng for ScriptedRng {
    fn next_unit(&mut self) -> f64 {
        self.units.pop_front().unwrap_or(self.default_unit)
    }

    fn choose_index(&mut self, _len: usize) -> usize {
        self.indices.pop_front().unwrap_or(self.default_index)
    }
}

fn generator(rng: ScriptedRng) -> (WaveGeneration<ScriptedRng, ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    (
        WaveGeneration::with_builtin_tables(rng, clock.clone()),
        clock,
    )
}

#[test]
fn fresh_generator_emits_balanced_template() {
    let (mut generation, _clock) = generator(ScriptedRng::quiet(0));

    let wave = generation.generate_wave(&[]).expect("first wave is due");

    assert_eq!(wave.enemy_names(), ["grunt", "grunt", "fast", "grunt"]);
    assert_eq!(wave.strategy(), Strategy::Balanced);
    assert_eq!(wave.phase(), DifficultyPhase::Early);
    assert_eq!(wave.adaptation(), None);
    assert_eq!(generation.wave_number(), 2);
}

#[test]
fn immediate_second_call_is_rejected() {
    let (mut generation, clock) = generator(ScriptedRng::quiet(0));

    assert!(generation.generate_wave(&[]).is_some());
    let after_first = generation.wave_number();
    let last_time = generation.last_wave_time();

    clock.advance(Duration::from_millis(16));
    assert!(generation.generate_wave(&[]).is_none());
    assert_eq!(generation.wave_number(), after_first);
    assert_eq!(generation.last_wave_time(), last_time);
}

#[test]
fn wave_becomes_due_exactly_at_cooldown() {
    let (mut generation, clock) = generator(ScriptedRng::quiet(0));
    assert!(generation.generate_wave(&[]).is_some());

    clock.advance(Duration::from_millis(5_999));
    assert!(generation.generate_wave(&[]).is_none());

    clock.advance(Duration::from_millis(1));
    let wave = generation.generate_wave(&[]).expect("cooldown elapsed");
    assert_eq!(wave.number(), 2);
    assert_eq!(generation.last_wave_time(), Some(Duration::from_secs(6)));
}

#[test]
fn counter_increments_once_per_wave() {
    let (mut generation, clock) = generator(ScriptedRng::quiet(1));
    for expected in 1..=12 {
        assert_eq!(generation.wave_number(), expected);
        let wave = generation.generate_wave(&[]).expect("wave due");
        assert_eq!(wave.number(), expected);
        assert_eq!(generation.wave_number(), expected + 1);
        assert!(generation.generate_wave(&[]).is_none());
        assert_eq!(generation.wave_number(), expected + 1);
        clock.advance(Duration::from_secs(6));
    }
}

#[test]
fn ninth_wave_is_late_swarm() {
    // Balanced for the three early waves, mixed for the five mid waves, then swarm.
    let rng = ScriptedRng::quiet(0).with_indices(&[0, 0, 0, 2, 2, 2, 2, 2, 2]);
    let (mut generation, clock) = generator(rng);
    for number in 1..9 {
        let wave = generation.generate_wave(&[]).expect("wave due");
        let expected = if number < 4 {
            Strategy::Balanced
        } else {
            Strategy::Mixed
        };
        assert_eq!(wave.strategy(), expected);
        clock.advance(Duration::from_secs(6));
    }
    assert_eq!(generation.wave_number(), 9);

    let wave = generation.generate_wave(&[]).expect("ninth wave");

    assert_eq!(wave.strategy(), Strategy::Swarm);
    assert_eq!(wave.enemy_names(), ["swarm"; 10]);
    assert_eq!(wave.phase(), DifficultyPhase::Late);
    assert_eq!(generation.phase(), DifficultyPhase::Late);
    assert_eq!(generation.cooldown_seconds(), 4.0);
}

#[test]
fn cooldown_follows_the_upcoming_wave_phase() {
    let (mut generation, clock) = generator(ScriptedRng::quiet(0));
    for step in 0..3 {
        clock.set(Duration::from_secs(6 * step));
        assert!(generation.generate_wave(&[]).is_some());
        assert_eq!(generation.cooldown(), Duration::from_secs(6));
    }

    clock.set(Duration::from_millis(16_900));
    assert!(generation.generate_wave(&[]).is_none());
    assert_eq!(generation.phase(), DifficultyPhase::Mid);

    clock.set(Duration::from_secs(17));
    let wave = generation.generate_wave(&[]).expect("mid phase cooldown is shorter");
    assert_eq!(wave.number(), 4);
    assert_eq!(wave.phase(), DifficultyPhase::Mid);
    assert_eq!(generation.cooldown_seconds(), 5.0);
}

#[test]
fn short_range_towers_draw_a_tank() {
    // Four mutation gates stay closed, then the adaptation gate opens.
    let rng = ScriptedRng::quiet(0).with_units(&[0.5, 0.5, 0.5, 0.5, 0.1]);
    let (mut generation, _clock) = generator(rng);

    let wave = generation
        .generate_wave(&[Tower::new("short_range")])
        .expect("first wave");

    assert_eq!(wave.enemy_names(), ["grunt", "grunt", "fast", "grunt", "tank"]);
    assert_eq!(wave.adaptation(), Some(Adaptation::CounterShortRange));
}

#[test]
fn slow_shooters_draw_three_runners() {
    let rng = ScriptedRng::quiet(0).with_units(&[0.5, 0.5, 0.5, 0.5, 0.1]);
    let (mut generation, _clock) = generator(rng);

    let wave = generation
        .generate_wave(&[Tower::new("slow_shooter")])
        .expect("first wave");

    assert_eq!(
        wave.enemy_names(),
        ["grunt", "grunt", "fast", "grunt", "fast", "fast", "fast"]
    );
    assert_eq!(wave.adaptation(), Some(Adaptation::CounterSlowShooter));
}

#[test]
fn slow_shooter_counter_outranks_short_range() {
    let rng = ScriptedRng::quiet(0).with_units(&[0.5, 0.5, 0.5, 0.5, 0.1]);
    let (mut generation, _clock) = generator(rng);
    let towers = [Tower::new("short_range"), Tower::new("slow_shooter")];

    let wave = generation.generate_wave(&towers).expect("first wave");

    assert_eq!(
        wave.enemy_names(),
        ["grunt", "grunt", "fast", "grunt", "fast", "fast", "fast"]
    );
    assert_eq!(wave.adaptation(), Some(Adaptation::CounterSlowShooter));
}

#[test]
fn anti_ground_counter_outranks_slow_shooter() {
    let rng = ScriptedRng::quiet(0).with_units(&[0.5, 0.5, 0.5, 0.5, 0.0]);
    let (mut generation, _clock) = generator(rng);
    let towers = [Tower::new("slow_shooter"), Tower::new("anti_ground_only")];

    let wave = generation.generate_wave(&towers).expect("first wave");

    assert_eq!(
        wave.enemy_names(),
        ["grunt", "grunt", "fast", "grunt", "flying", "flying"]
    );
}

#[test]
fn unrecognised_towers_never_adapt() {
    let rng = ScriptedRng::quiet(0).with_units(&[0.5, 0.5, 0.5, 0.5, 0.0]);
    let (mut generation, _clock) = generator(rng);

    let wave = generation
        .generate_wave(&[Tower::new(""), Tower::new("ballista")])
        .expect("first wave");

    assert_eq!(wave.adaptation(), None);
    assert_eq!(wave.len(), 4);
}

fn seeded_run(seed: u64, towers: &[Tower]) -> Vec<Wave> {
    let clock = ManualClock::new();
    let mut generation =
        WaveGeneration::with_builtin_tables(ChaCha8Rng::seed_from_u64(seed), clock.clone());
    let mut waves = Vec::new();
    while waves.len() < 40 {
        if let Some(wave) = generation.generate_wave(towers) {
            waves.push(wave);
        }
        clock.advance(Duration::from_millis(250));
    }
    waves
}

#[test]
fn seeded_runs_replay_identically() {
    let towers = [Tower::new("slow_shooter"), Tower::new("short_range")];
    assert_eq!(seeded_run(0xdead_beef, &towers), seeded_run(0xdead_beef, &towers));
}

#[test]
fn seeded_runs_respect_invariants() {
    let registry = EnemyTypeRegistry::builtin();
    let towers = [Tower::new("anti_ground_only")];
    let waves = seeded_run(7, &towers);

    for (index, wave) in waves.iter().enumerate() {
        let number = u32::try_from(index).expect("small index") + 1;
        assert_eq!(wave.number(), number);
        assert_eq!(wave.phase(), DifficultyPhase::for_wave(number));
        assert!(wave.phase().candidate_strategies().contains(&wave.strategy()));
        assert!(!wave.is_empty());
        assert!(wave
            .enemies()
            .iter()
            .all(|enemy| registry.contains(enemy.as_str())));
        if wave.adaptation().is_some() {
            assert_eq!(wave.adaptation(), Some(Adaptation::CounterAntiGround));
            assert_eq!(wave.enemy_names()[wave.len() - 2..], ["flying", "flying"]);
        }
    }
}
