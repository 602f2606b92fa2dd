#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave director driving round progression for a co-op survival session.
//!
//! The director owns the round state and advances it only when the caller
//! ticks it through [`WaveDirector::update`]. Everything it needs from the
//! host (enemy creation, the player registry, spawn points and cues) is lent
//! per call through [`Collaborators`]; enemy deaths are learned exclusively
//! through [`WaveDirector::on_enemy_died`].

mod config;
mod snapshot;

use std::{collections::HashSet, time::Duration};

use last_stand_core::{Collaborators, EnemyArchetype, EnemyId, Event, RoundState};
use last_stand_system_respawn::Respawn;
use last_stand_system_spawning::Spawning;
use last_stand_system_wave_generation::{enemy_count, PlanOutcome, PoolResolution, SpawnPlan};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info, warn};

pub use config::{DirectorConfig, DirectorError};
pub use last_stand_system_respawn::RespawnConfig;
pub use last_stand_system_spawning::{PacingConfig, PacingMode};
pub use last_stand_system_wave_generation::PoolFallback;
pub use snapshot::{DirectorSnapshot, Phase};

/// Round state machine that paces enemy spawns and respawns players.
#[derive(Debug)]
pub struct WaveDirector {
    config: DirectorConfig,
    archetypes: Vec<EnemyArchetype>,
    state: RoundState,
    plan: SpawnPlan,
    spawning: Spawning,
    respawn: Respawn,
    rng: ChaCha8Rng,
    seed: u64,
    pause_elapsed: Duration,
    live: HashSet<EnemyId>,
    stalled: bool,
}

impl WaveDirector {
    /// Creates a director that has not started its first round yet.
    pub fn new(
        config: DirectorConfig,
        archetypes: Vec<EnemyArchetype>,
    ) -> Result<Self, DirectorError> {
        config.validate()?;
        config::validate_archetypes(&archetypes)?;

        let seed = config
            .rng_seed
            .unwrap_or_else(|| ChaCha8Rng::from_entropy().next_u64());

        Ok(Self {
            spawning: Spawning::new(config.pacing),
            respawn: Respawn::new(config.respawn),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            config,
            archetypes,
            state: RoundState::default(),
            plan: SpawnPlan::default(),
            pause_elapsed: Duration::ZERO,
            live: HashSet::new(),
            stalled: false,
        })
    }

    /// Starts round one. Calling it again after the session began does nothing.
    pub fn initialize(&mut self, collaborators: &mut Collaborators<'_>, out: &mut Vec<Event>) {
        if self.state.round() != 0 {
            debug!(round = self.state.round(), "director already initialised");
            return;
        }

        info!(
            seed = self.seed,
            archetypes = self.archetypes.len(),
            "wave director initialised"
        );
        self.start_round(collaborators, out);
    }

    /// Prepares the next round and enters its inter-round pause.
    ///
    /// The enemy count is computed from the players standing before downed
    /// players are respawned.
    pub fn start_round(&mut self, collaborators: &mut Collaborators<'_>, out: &mut Vec<Event>) {
        let round = self.state.round().saturating_add(1);
        let strength = if round > 1 {
            self.state.strength() * self.config.growth_factor
        } else {
            self.state.strength()
        };
        let players = collaborators.players.living_count();
        let target = enemy_count(round, players);

        if !self.live.is_empty() {
            warn!(
                round,
                stale = self.live.len(),
                "previous round still had live enemies; their deaths will not count"
            );
            self.live.clear();
        }
        self.state.begin(round, target, strength);
        self.pause_elapsed = Duration::ZERO;
        self.stalled = false;
        out.push(Event::RoundStarted {
            round,
            target,
            strength,
        });

        let PlanOutcome { plan, pool } = SpawnPlan::build(
            round,
            target,
            &self.archetypes,
            self.config.pool_fallback,
            &mut self.rng,
        );
        self.plan = plan;
        match pool {
            PoolResolution::InWindow(available) => {
                debug!(round, available, "archetype pool resolved");
            }
            PoolResolution::FellBack(available) => {
                warn!(
                    round,
                    available, "no archetype window covers the round; sampling every archetype"
                );
                out.push(Event::ArchetypePoolFallback { round });
            }
            PoolResolution::Empty => {
                error!(round, target, "no archetype available; round stalled");
                self.stalled = true;
                out.push(Event::RoundStalled { round, target });
            }
        }

        let summary = self
            .respawn
            .process(round, &mut *collaborators.players, &mut self.rng, out);

        info!(
            round,
            target,
            strength,
            players,
            respawned = summary.respawned,
            "round started"
        );
    }

    /// Advances the director by one tick of length `dt`.
    pub fn update(
        &mut self,
        dt: Duration,
        collaborators: &mut Collaborators<'_>,
        out: &mut Vec<Event>,
    ) {
        if self.state.round() == 0 {
            return;
        }

        if !self.state.is_active() {
            self.pause_elapsed = self.pause_elapsed.saturating_add(dt);
            if self.pause_elapsed >= self.config.round_delay {
                self.state.activate();
                self.spawning.reset();
                info!(round = self.state.round(), "round activated");
                out.push(Event::RoundActivated {
                    round: self.state.round(),
                });
            }
            return;
        }

        if !self.state.spawning_finished() {
            let first_new = out.len();
            let _ = self.spawning.handle(
                dt,
                &mut self.state,
                &mut self.plan,
                &self.archetypes,
                &mut self.rng,
                collaborators,
                out,
            );
            for event in &out[first_new..] {
                if let Event::EnemySpawned { enemy, .. } = event {
                    let _ = self.live.insert(*enemy);
                }
            }
            return;
        }

        if self.state.is_cleared() {
            let round = self.state.round();
            info!(round, killed = self.state.dead(), "round cleared");
            out.push(Event::RoundCleared { round });
            self.start_round(collaborators, out);
        }
    }

    /// Records the death of an enemy spawned by this director.
    ///
    /// Returns `false` when the handle is unknown or was already reported.
    pub fn on_enemy_died(&mut self, enemy: EnemyId) -> bool {
        if !self.live.remove(&enemy) {
            debug!(enemy = enemy.get(), "ignoring death of unknown enemy");
            return false;
        }
        self.state.record_death()
    }

    /// Forwards every enemy death contained in `events`.
    ///
    /// Returns the number of deaths that were counted.
    pub fn observe(&mut self, events: &[Event]) -> u32 {
        let mut counted = 0;
        for event in events {
            if let Event::EnemyKilled { enemy } = event {
                if self.on_enemy_died(*enemy) {
                    counted += 1;
                }
            }
        }
        counted
    }

    /// Current round; zero until [`WaveDirector::initialize`] runs.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.state.round()
    }

    /// Stage of the current round.
    #[must_use]
    pub fn phase(&self) -> Phase {
        if !self.state.is_active() {
            Phase::Pausing
        } else if !self.state.spawning_finished() {
            Phase::Spawning
        } else {
            Phase::Draining
        }
    }

    /// Counters of the current round.
    #[must_use]
    pub const fn state(&self) -> &RoundState {
        &self.state
    }

    /// Spawns still planned for the current round.
    #[must_use]
    pub const fn plan(&self) -> &SpawnPlan {
        &self.plan
    }

    /// Configuration the director was created with.
    #[must_use]
    pub const fn config(&self) -> &DirectorConfig {
        &self.config
    }

    /// Seed of the random source; reuse it as `rng_seed` to replay a session.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Reports whether the current round can never complete.
    #[must_use]
    pub const fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Point-in-time copy of the director's counters.
    #[must_use]
    pub fn snapshot(&self) -> DirectorSnapshot {
        DirectorSnapshot {
            round: self.state.round(),
            phase: self.phase(),
            target: self.state.target(),
            spawned: self.state.spawned(),
            alive: self.state.alive(),
            dead: self.state.dead(),
            strength: self.state.strength(),
            planned_tiers: self.plan.tier_histogram(),
            total_killed: self.state.total_killed(),
            stalled: self.stalled,
        }
    }
}
