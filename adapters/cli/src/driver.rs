//! Headless tick loop standing in for a game engine.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use glam::Vec3;
use last_stand_core::{Command, Event, PlayerIdentity, PlayerRecord};
use last_stand_system_director::WaveDirector;
use last_stand_world::{self as world, query, World};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::session::{SessionFile, ZoneFile};

const PLAYER_SPACING: f32 = 1.5;
const DRIVER_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// Knobs of a simulated session.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DriverOptions {
    pub(crate) players: u32,
    pub(crate) rounds: u32,
    pub(crate) tick: Duration,
    pub(crate) kills_per_second: f64,
    pub(crate) down_chance: f64,
    pub(crate) max_ticks: u64,
}

/// Totals reported once the session ends.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Report {
    pub(crate) rounds_cleared: u32,
    pub(crate) total_killed: u64,
    pub(crate) respawns: u32,
    pub(crate) ticks: u64,
    pub(crate) players: Vec<PlayerRecord>,
}

/// Drives a session until `options.rounds` rounds were cleared.
pub(crate) struct Driver {
    world: World,
    director: WaveDirector,
    pending_zones: Vec<ZoneFile>,
    options: DriverOptions,
    rng: ChaCha8Rng,
    kill_budget: f64,
}

impl Driver {
    pub(crate) fn new(session: SessionFile, options: DriverOptions) -> Result<Self> {
        let director = WaveDirector::new(session.director, session.archetypes)
            .context("failed to create wave director")?;

        let mut world = World::new();
        let spawn = session.player_spawn.unwrap_or(Vec3::ZERO);
        if let Some(position) = session.player_spawn {
            world.set_player_spawn(position);
        }

        let mut events = Vec::new();
        for slot in 0..options.players.max(1) {
            world::apply(
                &mut world,
                Command::JoinPlayer {
                    identity: PlayerIdentity::new(slot, format!("pad-{slot}"), "gamepad"),
                    position: spawn + Vec3::X * PLAYER_SPACING * slot as f32,
                },
                &mut events,
            );
        }

        let rng = ChaCha8Rng::seed_from_u64(director.seed() ^ DRIVER_STREAM);
        Ok(Self {
            world,
            director,
            pending_zones: session.zones,
            options,
            rng,
            kill_budget: 0.0,
        })
    }

    /// Runs the tick loop and prints a status line whenever a round starts.
    pub(crate) fn run(mut self) -> Result<Report> {
        println!("{}", query::welcome_banner(&self.world));
        info!(seed = self.director.seed(), "session seed");

        let mut events = Vec::new();
        self.unlock_zones(1);
        self.director
            .initialize(&mut self.world.collaborators(), &mut events);
        println!("{}", self.director.snapshot());

        let mut rounds_cleared = 0;
        let mut respawns = 0;
        let mut ticks = 0;
        while rounds_cleared < self.options.rounds {
            if ticks >= self.options.max_ticks {
                bail!(
                    "gave up after {ticks} ticks in round {}",
                    self.director.round()
                );
            }
            if self.director.is_stalled() {
                bail!(
                    "round {} stalled: no archetype can spawn",
                    self.director.round()
                );
            }
            ticks += 1;

            events.clear();
            self.director.update(
                self.options.tick,
                &mut self.world.collaborators(),
                &mut events,
            );

            for event in &events {
                match event {
                    Event::RoundCleared { .. } => rounds_cleared += 1,
                    Event::RoundStarted { round, .. } => {
                        self.unlock_zones(*round);
                        println!("{}", self.director.snapshot());
                    }
                    Event::RoundActivated { .. } => self.down_players(),
                    Event::PlayerRespawned { .. } => respawns += 1,
                    _ => {}
                }
            }

            self.kill_enemies();
        }

        Ok(Report {
            rounds_cleared,
            total_killed: self.director.state().total_killed(),
            respawns,
            ticks,
            players: query::players(&self.world),
        })
    }

    fn unlock_zones(&mut self, round: u32) {
        let (ready, waiting): (Vec<_>, Vec<_>) = self
            .pending_zones
            .drain(..)
            .partition(|zone| zone.unlock_round <= round);
        self.pending_zones = waiting;

        let mut events = Vec::new();
        for zone in ready {
            world::apply(
                &mut self.world,
                Command::UnlockZone { points: zone.points },
                &mut events,
            );
        }
        for event in events {
            if let Event::ZoneUnlocked { points } = event {
                info!(round, points, "zone unlocked");
            }
        }
    }

    fn kill_enemies(&mut self) {
        self.kill_budget += self.options.kills_per_second * self.options.tick.as_secs_f64();

        let mut events = Vec::new();
        while self.kill_budget >= 1.0 {
            let Some(enemy) = query::live_enemies(&self.world)
                .choose(&mut self.rng)
                .map(|enemy| enemy.id())
            else {
                break;
            };
            world::apply(&mut self.world, Command::KillEnemy { enemy }, &mut events);
            self.kill_budget -= 1.0;
        }

        let _ = self.director.observe(&events);
    }

    /// Knocks players down at random, always leaving one standing.
    fn down_players(&mut self) {
        let mut standing: Vec<u32> = query::players(&self.world)
            .iter()
            .filter(|player| player.alive)
            .map(|player| player.identity.slot())
            .collect();

        let mut events = Vec::new();
        while standing.len() > 1 {
            let index = self.rng.gen_range(0..standing.len());
            if !self.rng.gen_bool(self.options.down_chance.clamp(0.0, 1.0)) {
                break;
            }
            let slot = standing.swap_remove(index);
            world::apply(&mut self.world, Command::DownPlayer { slot }, &mut events);
        }

        for event in events {
            if let Event::PlayerDowned { slot } = event {
                debug!(slot, round = self.director.round(), "player downed");
            }
        }
    }
}
