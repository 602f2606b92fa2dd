#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative in-memory session state for Last Stand.
//!
//! The [`World`] plays the part of the game engine: it owns the enemies, the
//! players, the unlocked spawn zones and the cue log, and lends them to the
//! wave director through [`World::collaborators`].

use glam::Vec3;
use last_stand_core::{
    ArchetypeId, Collaborators, Command, CueSink, EnemyArchetype, EnemyFactory, EnemyId,
    EnemyStats, Event, PlayerIdentity, PlayerRecord, PlayerRegistry, RejoinError, SpawnPointProvider,
    SpawnRequest, SpeedTier, WELCOME_BANNER,
};
use rand::{seq::SliceRandom, RngCore};
use tracing::debug;

/// Live enemy owned by the session.
#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    id: EnemyId,
    archetype: ArchetypeId,
    tier: SpeedTier,
    position: Vec3,
    stats: EnemyStats,
}

impl Enemy {
    /// Handle reported to the director when the enemy dies.
    #[must_use]
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Archetype the enemy was created from.
    #[must_use]
    pub const fn archetype(&self) -> ArchetypeId {
        self.archetype
    }

    /// Speed tier assigned at spawn time.
    #[must_use]
    pub const fn tier(&self) -> SpeedTier {
        self.tier
    }

    /// Spawn position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Scaled stats the enemy was created with.
    #[must_use]
    pub const fn stats(&self) -> EnemyStats {
        self.stats
    }
}

/// Enemy factory backed by a plain roster.
#[derive(Debug, Default)]
pub struct EnemyRoster {
    enemies: Vec<Enemy>,
    next_id: u32,
}

impl EnemyRoster {
    fn remove(&mut self, enemy: EnemyId) -> Option<Enemy> {
        let index = self.enemies.iter().position(|live| live.id == enemy)?;
        Some(self.enemies.remove(index))
    }
}

impl EnemyFactory for EnemyRoster {
    fn spawn(&mut self, request: &SpawnRequest, archetype: &EnemyArchetype) -> EnemyId {
        let id = EnemyId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.enemies.push(Enemy {
            id,
            archetype: request.archetype,
            tier: request.tier,
            position: request.position,
            stats: request.stats(archetype),
        });
        id
    }
}

#[derive(Clone, Debug)]
struct PlayerSlot {
    identity: PlayerIdentity,
    position: Vec3,
    alive: bool,
    points: i64,
    instantiated: bool,
}

impl PlayerSlot {
    fn record(&self) -> PlayerRecord {
        PlayerRecord {
            identity: self.identity.clone(),
            position: self.position,
            alive: self.alive,
            points: self.points,
        }
    }
}

/// Player registry that keeps each slot's points across instances.
#[derive(Debug, Default)]
pub struct PlayerRoster {
    slots: Vec<PlayerSlot>,
    default_spawn: Option<Vec3>,
}

impl PlayerRoster {
    fn slot(&self, slot: u32) -> Option<&PlayerSlot> {
        self.slots.iter().find(|entry| entry.identity.slot() == slot)
    }

    fn slot_mut(&mut self, slot: u32) -> Option<&mut PlayerSlot> {
        self.slots.iter_mut().find(|entry| entry.identity.slot() == slot)
    }

    fn instance_mut(&mut self, slot: u32) -> Option<&mut PlayerSlot> {
        self.slot_mut(slot).filter(|entry| entry.instantiated)
    }
}

impl PlayerRegistry for PlayerRoster {
    fn players(&self) -> Vec<PlayerRecord> {
        self.slots
            .iter()
            .filter(|entry| entry.instantiated)
            .map(PlayerSlot::record)
            .collect()
    }

    fn living_count(&self) -> u32 {
        self.slots
            .iter()
            .filter(|entry| entry.instantiated && entry.alive)
            .count() as u32
    }

    fn destroy(&mut self, identity: &PlayerIdentity) {
        if let Some(entry) = self.instance_mut(identity.slot()) {
            entry.instantiated = false;
            entry.alive = false;
        }
    }

    fn rejoin(&mut self, identity: &PlayerIdentity) -> Result<PlayerRecord, RejoinError> {
        let slot = identity.slot();
        let entry = self
            .slot_mut(slot)
            .ok_or(RejoinError::UnknownPlayer(slot))?;
        if entry.instantiated {
            return Err(RejoinError::StillActive(slot));
        }
        entry.identity = identity.clone();
        entry.instantiated = true;
        entry.alive = true;
        Ok(entry.record())
    }

    fn place(&mut self, identity: &PlayerIdentity, position: Vec3) {
        if let Some(entry) = self.instance_mut(identity.slot()) {
            entry.position = position;
        }
    }

    fn grant_points(&mut self, identity: &PlayerIdentity, amount: i64) {
        if let Some(entry) = self.slot_mut(identity.slot()) {
            entry.points = entry.points.saturating_add(amount);
        }
    }

    fn default_spawn(&self) -> Option<Vec3> {
        self.default_spawn
    }
}

/// Append-only list of unlocked enemy spawn points.
#[derive(Debug, Default)]
pub struct SpawnZones {
    points: Vec<Vec3>,
    zones: usize,
}

impl SpawnPointProvider for SpawnZones {
    fn add_zone(&mut self, points: Vec<Vec3>) {
        self.zones += 1;
        self.points.extend(points);
    }

    fn pick_random(&self, rng: &mut dyn RngCore) -> Option<Vec3> {
        self.points.choose(rng).copied()
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

/// Cue sink that records every spawn cue in order.
#[derive(Debug, Default)]
pub struct CueLog {
    spawns: Vec<Vec3>,
}

impl CueSink for CueLog {
    fn notify_spawn(&mut self, position: Vec3) {
        self.spawns.push(position);
    }
}

/// Represents the authoritative Last Stand session state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    enemies: EnemyRoster,
    players: PlayerRoster,
    zones: SpawnZones,
    cues: CueLog,
}

impl World {
    /// Creates an empty session without players, enemies or spawn points.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            enemies: EnemyRoster::default(),
            players: PlayerRoster::default(),
            zones: SpawnZones::default(),
            cues: CueLog::default(),
        }
    }

    /// Sets the point players respawn around when nobody is standing.
    pub fn set_player_spawn(&mut self, position: Vec3) {
        self.players.default_spawn = Some(position);
    }

    /// Lends every collaborator the director needs for a single call.
    pub fn collaborators(&mut self) -> Collaborators<'_> {
        Collaborators {
            enemies: &mut self.enemies,
            players: &mut self.players,
            spawn_points: &mut self.zones,
            cues: &mut self.cues,
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::JoinPlayer { identity, position } => {
            let slot = identity.slot();
            if world.players.slot(slot).is_some() {
                debug!(slot, "slot already taken; join ignored");
                return;
            }
            world.players.slots.push(PlayerSlot {
                identity,
                position,
                alive: true,
                points: 0,
                instantiated: true,
            });
            out_events.push(Event::PlayerJoined { slot });
        }
        Command::MovePlayer { slot, position } => {
            if let Some(entry) = world.players.instance_mut(slot) {
                if entry.alive {
                    entry.position = position;
                }
            }
        }
        Command::DownPlayer { slot } => {
            if let Some(entry) = world.players.instance_mut(slot) {
                if entry.alive {
                    entry.alive = false;
                    out_events.push(Event::PlayerDowned { slot });
                }
            }
        }
        Command::KillEnemy { enemy } => {
            if world.enemies.remove(enemy).is_some() {
                out_events.push(Event::EnemyKilled { enemy });
            }
        }
        Command::UnlockZone { points } => {
            let count = points.len();
            world.zones.add_zone(points);
            out_events.push(Event::ZoneUnlocked { points: count });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec3;
    use last_stand_core::{EnemyId, PlayerRecord, PlayerRegistry};

    use super::{Enemy, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Snapshot of every instantiated player.
    #[must_use]
    pub fn players(world: &World) -> Vec<PlayerRecord> {
        world.players.players()
    }

    /// Enemies currently alive, in spawn order.
    #[must_use]
    pub fn live_enemies(world: &World) -> &[Enemy] {
        &world.enemies.enemies
    }

    /// Looks up a live enemy.
    #[must_use]
    pub fn enemy(world: &World, id: EnemyId) -> Option<&Enemy> {
        world.enemies.enemies.iter().find(|enemy| enemy.id == id)
    }

    /// Number of unlocked spawn points.
    #[must_use]
    pub fn spawn_point_count(world: &World) -> usize {
        world.zones.points.len()
    }

    /// Number of unlocked zones.
    #[must_use]
    pub fn zone_count(world: &World) -> usize {
        world.zones.zones
    }

    /// Spawn cues emitted so far, oldest first.
    #[must_use]
    pub fn cues(world: &World) -> &[Vec3] {
        &world.cues.spawns
    }
}
