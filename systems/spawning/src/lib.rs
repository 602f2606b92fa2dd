#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn pacing system that turns a round's plan into live enemies.

use std::time::Duration;

use last_stand_core::{
    duration_secs, Collaborators, EnemyArchetype, Event, RoundState, SpawnRequest,
};
use last_stand_system_wave_generation::{health_factor, SpawnPlan};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

const DEFAULT_MAX_ALIVE: u32 = 30;
const DEFAULT_SPAWN_INTERVAL: Duration = Duration::from_millis(100);

/// Cadence applied while a round is spawning.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingMode {
    /// At most one spawn per interval.
    #[default]
    Delayed,
    /// Spawn every allowed enemy in the same tick.
    Uncapped,
}

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Cadence of the spawns.
    pub mode: PacingMode,
    /// Maximum number of enemies alive at once.
    pub max_alive: u32,
    /// Minimum time between two spawns in delayed mode.
    #[serde(with = "duration_secs")]
    pub spawn_interval: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            mode: PacingMode::default(),
            max_alive: DEFAULT_MAX_ALIVE,
            spawn_interval: DEFAULT_SPAWN_INTERVAL,
        }
    }
}

/// Pure system that spawns the next planned enemies while the alive cap allows.
#[derive(Debug)]
pub struct Spawning {
    config: PacingConfig,
    since_last_spawn: Duration,
    warned_without_points: bool,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: PacingConfig) -> Self {
        let mut spawning = Self {
            config,
            since_last_spawn: Duration::ZERO,
            warned_without_points: false,
        };
        spawning.reset();
        spawning
    }

    /// Configuration the system was created with.
    #[must_use]
    pub const fn config(&self) -> &PacingConfig {
        &self.config
    }

    /// Prepares for a new round; the first spawn after a reset is immediate.
    pub fn reset(&mut self) {
        self.since_last_spawn = self.config.spawn_interval;
        self.warned_without_points = false;
    }

    /// Performs the spawns allowed during a tick of length `dt`.
    ///
    /// Returns the number of enemies spawned. Nothing happens once the round
    /// reached its target, the plan ran dry or the alive cap is hit.
    #[allow(clippy::too_many_arguments)]
    pub fn handle<R: RngCore>(
        &mut self,
        dt: Duration,
        round: &mut RoundState,
        plan: &mut SpawnPlan,
        archetypes: &[EnemyArchetype],
        rng: &mut R,
        collaborators: &mut Collaborators<'_>,
        out: &mut Vec<Event>,
    ) -> u32 {
        self.since_last_spawn = self.since_last_spawn.saturating_add(dt);

        let mut spawned = 0;
        match self.config.mode {
            PacingMode::Delayed => {
                if self.since_last_spawn >= self.config.spawn_interval
                    && self.can_spawn(round, plan)
                    && self.spawn_next(round, plan, archetypes, rng, collaborators, out)
                {
                    self.since_last_spawn = Duration::ZERO;
                    spawned += 1;
                }
            }
            PacingMode::Uncapped => {
                while self.can_spawn(round, plan)
                    && self.spawn_next(round, plan, archetypes, rng, collaborators, out)
                {
                    spawned += 1;
                }
            }
        }
        spawned
    }

    fn can_spawn(&self, round: &RoundState, plan: &SpawnPlan) -> bool {
        !round.spawning_finished() && !plan.is_empty() && round.alive() < self.config.max_alive
    }

    fn spawn_next<R: RngCore>(
        &mut self,
        round: &mut RoundState,
        plan: &mut SpawnPlan,
        archetypes: &[EnemyArchetype],
        rng: &mut R,
        collaborators: &mut Collaborators<'_>,
        out: &mut Vec<Event>,
    ) -> bool {
        let Some(position) = collaborators.spawn_points.pick_random(rng) else {
            if !self.warned_without_points {
                warn!(round = round.round(), "no spawn points registered; waiting");
                self.warned_without_points = true;
            }
            return false;
        };

        let Some(entry) = plan.pop() else {
            return false;
        };
        let Some(archetype) = archetypes.iter().find(|a| a.id() == entry.archetype) else {
            error!(
                round = round.round(),
                archetype = entry.archetype.get(),
                "planned archetype is not loaded"
            );
            return false;
        };

        let request = SpawnRequest {
            archetype: entry.archetype,
            position,
            strength: round.strength(),
            health_factor: health_factor(round.round()),
            tier: entry.tier,
        };
        let enemy = collaborators.enemies.spawn(&request, archetype);
        collaborators.cues.notify_spawn(position);
        let _ = round.record_spawn();

        debug!(
            round = round.round(),
            enemy = enemy.get(),
            archetype = archetype.name(),
            tier = ?entry.tier,
            spawned = round.spawned(),
            alive = round.alive(),
            "enemy spawned"
        );
        out.push(Event::EnemySpawned {
            enemy,
            archetype: entry.archetype,
            tier: entry.tier,
            position,
        });
        true
    }
}
